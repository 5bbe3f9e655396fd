//! Package facts: the shape of per-package type information that crosses
//! the analysis boundary (§3 "Package fact", §4.2).
//!
//! A pass exports exactly one fact for its own package and imports facts
//! for the packages it depends on. The fact store itself is owned by the
//! driver harness (§1 "out of scope", §5 "Shared resources") — `callreach`
//! only specifies the fact's shape ([`PackageFact`]) and the trait a
//! harness-owned store must satisfy ([`FactProvider`]). [`InMemoryFactStore`]
//! is a reference implementation used by this crate's own tests, analogous
//! to the `analysistest` harness the original analyzer is tested under.

use std::collections::HashMap;

use crate::ir::{PackageId, Signature, SourcePosition, TypeString};

/// A declared function as seen by the harness's type checker, before IR
/// construction. This is the "typed file bundle" content of a
/// [`PackageFact`] — deliberately flatter than a real typed AST, since
/// `callreach` never parses or type-checks anything itself (§1).
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub signature: Signature,
    /// Declaring file path, relative to the package. `None` for
    /// compiler-synthesized declarations the harness still chooses to
    /// surface (rare; usually synthesis happens in [`crate::builder`]
    /// instead).
    pub file: Option<String>,
    pub position: Option<SourcePosition>,
    pub is_package_init: bool,
    /// Declared types of this function's parameters, positional.
    pub param_types: Vec<TypeString>,
    /// Declared names of this function's parameters, positional and the
    /// same length as `param_types`. Used to resolve [`RawArg::Parameter`]
    /// references by name against the enclosing function's own parameter
    /// list.
    pub param_names: Vec<String>,
    pub body: Vec<RawCallSite>,
}

impl Declaration {
    #[must_use]
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
            file: None,
            position: None,
            is_package_init: false,
            param_types: Vec::new(),
            param_names: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        let file = self.file.clone().unwrap_or_default();
        self.position = Some(SourcePosition { file, line, column });
        self
    }

    #[must_use]
    pub fn with_params(mut self, param_types: Vec<TypeString>) -> Self {
        self.param_types = param_types;
        self
    }

    /// Attach parameter names, positional with `param_types`. Required only
    /// for functions whose body forwards a parameter as a first-class
    /// value ([`RawArg::Parameter`]); harmless to omit otherwise.
    #[must_use]
    pub fn with_param_names(mut self, param_names: Vec<String>) -> Self {
        self.param_names = param_names;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<RawCallSite>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn as_package_init(mut self) -> Self {
        self.is_package_init = true;
        self
    }
}

/// A reference to another function, qualified by package when it crosses a
/// package boundary. `package: None` means "the package currently being
/// declared".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub package: Option<PackageId>,
    pub name: String,
    /// Concrete type arguments this reference instantiates a generic
    /// function with, if any (§4.3 "generic instantiation bookkeeping").
    pub type_args: Vec<TypeString>,
    /// The referenced function's signature, as already known from the
    /// *referencing* package's own type information. Real type checkers
    /// always resolve this regardless of whether the referenced package
    /// was itself analyzed by this tool — only the referenced package's
    /// *body* is unavailable when its fact is missing (§4.2). The builder
    /// uses this to synthesize a stub function the first time a reference
    /// into a fact-less package is encountered. Unused when the reference
    /// resolves against an already-registered declaration.
    pub signature: Option<Signature>,
}

impl FunctionRef {
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            package: None,
            name: name.into(),
            type_args: Vec::new(),
            signature: None,
        }
    }

    #[must_use]
    pub fn qualified(package: impl Into<PackageId>, name: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            name: name.into(),
            type_args: Vec::new(),
            signature: None,
        }
    }

    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    #[must_use]
    pub fn instantiate(mut self, type_args: Vec<TypeString>) -> Self {
        self.type_args = type_args;
        self
    }
}

/// An argument operand as the harness observed it, before the builder
/// resolves it against a concrete [`crate::ir::Function`] arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArg {
    /// A statically named function used as a first-class value.
    NamedFunction(FunctionRef),
    /// A closure literal; `body` is the closure's own declaration (always
    /// local to the enclosing function's package).
    Closure(Box<Declaration>),
    /// A parameter of the function this call site lives in, forwarded
    /// as-is. Identified by the enclosing function's own parameter name —
    /// the builder resolves this to a [`ParamId`] when it assigns each
    /// declaration's parameters their stable identities.
    Parameter(String),
    /// Anything else: a field, a map/slice element, a type-asserted
    /// `interface{}`/`any` value, ...
    Other,
}

/// A call site within a [`Declaration`]'s body, as the harness observed it.
#[derive(Debug, Clone)]
pub struct RawCallSite {
    pub form: crate::ir::CallForm,
    pub is_invoke: bool,
    pub args: Vec<RawArg>,
    pub target: RawTarget,
}

impl RawCallSite {
    #[must_use]
    pub fn direct(target: FunctionRef, args: Vec<RawArg>) -> Self {
        Self {
            form: crate::ir::CallForm::Direct,
            is_invoke: false,
            args,
            target: RawTarget::Direct(target),
        }
    }

    #[must_use]
    pub fn indirect(
        form: crate::ir::CallForm,
        is_invoke: bool,
        declared_signature: Signature,
        args: Vec<RawArg>,
    ) -> Self {
        Self {
            form,
            is_invoke,
            args,
            target: RawTarget::Indirect { declared_signature },
        }
    }

    /// A call whose target is a closure value with a statically known
    /// origin at this call site (e.g. `f := func(){...}; f()`). Real
    /// SSA construction resolves such a call as static rather than
    /// indirect (`CallCommon.StaticCallee` sees straight through the
    /// single assignment), so the builder treats it as a direct edge to a
    /// freshly synthesized function rather than creating a signature-based
    /// indirect edge (§4.3).
    #[must_use]
    pub fn closure_call(closure: Declaration, args: Vec<RawArg>) -> Self {
        Self {
            form: crate::ir::CallForm::ClosureCall,
            is_invoke: false,
            args,
            target: RawTarget::Closure(Box::new(closure)),
        }
    }
}

/// The target of a [`RawCallSite`], before resolution into a
/// [`crate::ir::CallTarget`].
#[derive(Debug, Clone)]
pub enum RawTarget {
    Direct(FunctionRef),
    /// A statically known closure, synthesized into its own function by
    /// the builder and called directly.
    Closure(Box<Declaration>),
    Indirect { declared_signature: Signature },
}

/// A typed package bundle: everything the program builder needs to turn a
/// package into IR (§3 "Package fact"). This is what a [`PackageFact`]
/// carries, and what the primary package under analysis is handed to
/// `run_pass` as directly (it does not need to round-trip through the fact
/// store, matching `pass.Files` / `pass.TypesInfo` in the original).
#[derive(Debug, Clone, Default)]
pub struct TypedFileBundle {
    pub declarations: Vec<Declaration>,
}

impl TypedFileBundle {
    #[must_use]
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }
}

/// The payload exported for one package and consumed by analyses of its
/// importers (§3 "Package fact").
#[derive(Debug, Clone)]
pub struct PackageFact {
    pub package: PackageId,
    pub imports: Vec<PackageId>,
    pub files: TypedFileBundle,
}

/// The shape of a fact store, owned by the driver harness (§4.2, §5).
/// `callreach` never writes to this itself outside of tests; a pass simply
/// returns the fact it wants exported from [`crate::run_pass`], and the
/// harness is responsible for publishing it before any importer's pass
/// runs.
pub trait FactProvider {
    /// Retrieve the fact for `package`, if this tool analyzed it. Absence
    /// is not an error (§4.2): the caller treats the package as a stub.
    fn import_fact(&self, package: &PackageId) -> Option<PackageFact>;
}

/// A reference, in-memory fact store used by this crate's own test suite.
/// Production harnesses own their own store (e.g. backed by
/// `golang.org/x/tools/go/analysis`'s fact mechanism in the original, or
/// whatever the host ecosystem's analysis framework provides).
#[derive(Debug, Default)]
pub struct InMemoryFactStore {
    facts: HashMap<PackageId, PackageFact>,
}

impl InMemoryFactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a fact, as a pass would at the start of its run (§4.2).
    pub fn export(&mut self, fact: PackageFact) {
        self.facts.insert(fact.package.clone(), fact);
    }
}

impl FactProvider for InMemoryFactStore {
    fn import_fact(&self, package: &PackageId) -> Option<PackageFact> {
        self.facts.get(package).cloned()
    }
}
