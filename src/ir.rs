//! The typed intermediate representation built by [`crate::builder`] and
//! consumed by [`crate::callgraph`], [`crate::callerscan`] and
//! [`crate::traversal`].
//!
//! This is the "Program" and "Call site" data model of the spec (§3):
//! a flat arena of [`Function`]s (source-backed or synthetic), grouped into
//! [`Package`]s, each with a simplified control-flow body that is just the
//! ordered list of [`CallSite`]s it contains — sufficient for call-graph
//! construction and reachability, which is all this crate ever needs a body
//! for.

use std::collections::HashMap;
use std::fmt;

/// Canonical package identity: an import path, e.g. `"callers/caller"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(pub String);

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        PackageId(s.to_string())
    }
}

/// A canonical, fully qualified textual type form (§6): stable under
/// aliasing, e.g. `"callers/caller.Param"`, `"context.Context"`, `"error"`.
/// Generic instantiations embed their type arguments in the same form, e.g.
/// `"slices.SortFunc[string]"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeString(pub String);

impl fmt::Display for TypeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeString {
    fn from(s: &str) -> Self {
        TypeString(s.to_string())
    }
}
impl From<String> for TypeString {
    fn from(s: String) -> Self {
        TypeString(s)
    }
}

/// Ordered parameter and result types of a function, by canonical textual
/// form (§3 "Program").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<TypeString>,
    pub results: Vec<TypeString>,
}

impl Signature {
    #[must_use]
    pub fn new(params: Vec<TypeString>, results: Vec<TypeString>) -> Self {
        Self { params, results }
    }

    /// True if `self` is the same shape as `other` — same arity, identical
    /// canonical type strings, positionally. This is the raw equality used
    /// both for caller/callee filtering and for indirect-edge signature
    /// compatibility (§4.5).
    #[must_use]
    pub fn equals(&self, other: &Signature) -> bool {
        self.params == other.params && self.results == other.results
    }
}

/// Source position within a declaration's file, 1-based (§6 "Canonical type
/// strings", §4.7 diagnostics positions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A source-backed function's declaration site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDecl {
    pub position: SourcePosition,
}

/// Stable identity of a parameter within its owning function's parameter
/// list. Per §9 Design Notes, pruning matches parameters by this identity,
/// never by name string, since IR lowering may rename parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub usize);

/// Opaque handle into a [`Program`]'s function arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub usize);

/// The syntactic form of a call site (§3 "Call site").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallForm {
    /// A direct call to a statically named function.
    Direct,
    /// A call through a function value bound from a method (`recv.Method`).
    MethodValue,
    /// Interface method dispatch; the first semantic argument is the
    /// receiver.
    InterfaceInvoke,
    /// A call to a closure value.
    ClosureCall,
}

/// How a call's target is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// Statically bound: exactly one callee.
    Direct(FunctionId),
    /// Not statically bound: the declared signature of the function-typed
    /// or interface-typed value being called. The call graph resolves this
    /// to every function in the program with a compatible signature
    /// (§4.5).
    Indirect { declared_signature: Signature },
}

/// Classification of a single argument operand at a call site, used by the
/// pruning rule (§4.6) to determine what (if anything) is known about the
/// value flowing into a function-typed parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgOperand {
    /// A statically named function used as a value, e.g. `other.Callee`.
    NamedFunction(FunctionId),
    /// A closure literal; carries the underlying synthesized function.
    Closure(FunctionId),
    /// A parameter of the *enclosing* function (the function whose body
    /// contains this call site) passed straight through. The value is
    /// unknown at this call site.
    Parameter(ParamId),
    /// Anything else (a struct field, a map lookup, a type assertion on an
    /// opaque value, ...). The value is unknown.
    Other,
}

/// An instruction denoting a call (§3 "Call site").
#[derive(Debug, Clone)]
pub struct CallSite {
    pub form: CallForm,
    pub is_invoke: bool,
    pub args: Vec<ArgOperand>,
    pub target: CallTarget,
}

/// A function in the typed program (§3 "Program").
#[derive(Debug, Clone)]
pub struct Function {
    pub id: FunctionId,
    /// Short (unqualified) name, e.g. `"Test1"`.
    pub name: String,
    /// Owning package; `None` only for the synthetic call-graph root.
    pub package: Option<PackageId>,
    pub signature: Signature,
    /// `Some` for source-backed functions (including the package
    /// initializer); `None` for every other synthetic function.
    pub source: Option<SourceDecl>,
    /// Stable identities of this function's parameters, positional.
    pub params: Vec<ParamId>,
    /// Declared types of `params`, positional and same length — kept
    /// alongside `signature.params` so pruning can classify a parameter's
    /// *declared* type as function-typed without re-deriving it from the
    /// signature (generic instantiation may specialize `signature.params`
    /// away from the declared shape in exotic cases).
    pub param_types: Vec<TypeString>,
    /// Flattened call sites in this function's body. The exact control
    /// flow between them is irrelevant to reachability; what matters is
    /// which sites exist and what their operands are.
    pub body: Vec<CallSite>,
    pub synthetic: bool,
    /// True only for the package-level initializer, which is always
    /// source-backed even though it has no user-written declaration
    /// (§3 invariant).
    pub is_package_init: bool,
    /// Declaring file path, used by the skip-file filter (§4.4) — absent
    /// for non-source-backed functions.
    pub file: Option<String>,
}

impl Function {
    /// A function that is neither synthetic nor the package initializer,
    /// and thus eligible to even be *considered* as a candidate caller
    /// (§3 "Synthetic exclusion").
    #[must_use]
    pub fn is_source_backed(&self) -> bool {
        !self.synthetic
    }

    #[must_use]
    pub fn has_function_typed_param(&self) -> bool {
        self.param_types.iter().any(|t| is_function_typed(t))
    }
}

/// Whether a canonical type string denotes a function-typed value.
///
/// The IR surfaces this directly rather than re-deriving it from a
/// `types.Signature`-equivalent: function- and interface-typed parameters
/// are recorded with a `"func(...)"`-shaped canonical string by the
/// harness, mirroring `*types.Signature` in the original analyzer.
#[must_use]
pub fn is_function_typed(t: &TypeString) -> bool {
    t.0.starts_with("func(")
}

/// A package built into the program (§4.3).
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    /// True for every package except the one the current pass is analyzing.
    pub imported: bool,
    /// True if no fact was available for this package: its functions have
    /// signatures but empty bodies (§3 "Stub package").
    pub stub: bool,
    pub functions: Vec<FunctionId>,
}

/// A built program: the transitive closure of the analyzed package and its
/// imports (§3 "Program").
#[derive(Debug, Clone)]
pub struct Program {
    functions: Vec<Function>,
    packages: HashMap<PackageId, Package>,
    root: FunctionId,
}

impl Program {
    pub(crate) fn new(functions: Vec<Function>, packages: HashMap<PackageId, Package>) -> Self {
        let root = FunctionId(functions.len() - 1);
        Self {
            functions,
            packages,
            root,
        }
    }

    #[must_use]
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    #[must_use]
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    #[must_use]
    pub fn package(&self, id: &PackageId) -> Option<&Package> {
        self.packages.get(id)
    }

    #[must_use]
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// The synthetic call-graph root. It has no package, no signature
    /// constraints, and is never itself a candidate caller or callee.
    #[must_use]
    pub fn root(&self) -> FunctionId {
        self.root
    }

    /// Every function whose signature is compatible with `declared`,
    /// excluding the synthetic root. Used to resolve indirect call edges
    /// (§4.5).
    pub fn signature_compatible(&self, declared: &Signature) -> impl Iterator<Item = FunctionId> + '_ {
        self.functions
            .iter()
            .filter(move |f| f.id != self.root && f.signature.equals(declared))
            .map(|f| f.id)
    }
}
