//! Program builder: turns a primary package's [`TypedFileBundle`] plus its
//! transitive import closure (resolved through a [`FactProvider`]) into a
//! [`Program`] (§4.3).
//!
//! Mirrors how the original analyzer's dependency runs build SSA for each
//! imported package before the primary package's pass body executes: a
//! package can only be built once every package it imports has already
//! contributed its functions to the registry, so [`discover_import_closure`]
//! produces a dependency-first (postorder) build order before any IR is
//! constructed.

use std::collections::{HashMap, HashSet};

use crate::fact::{Declaration, FactProvider, RawArg, RawCallSite, RawTarget, TypedFileBundle};
use crate::ir::{
    ArgOperand, CallSite, CallTarget, Function, FunctionId, Package, PackageId, ParamId, Program,
    Signature, SourceDecl, TypeString,
};

/// Mutable state threaded through a build: the function arena, the
/// name-to-id registry used to resolve references, and the packages
/// assembled so far.
struct BuildCtx {
    functions: Vec<Function>,
    registry: HashMap<(PackageId, String), FunctionId>,
    packages: HashMap<PackageId, Package>,
}

impl BuildCtx {
    fn new() -> Self {
        Self {
            functions: Vec::new(),
            registry: HashMap::new(),
            packages: HashMap::new(),
        }
    }

    fn alloc(&mut self, f: Function) -> FunctionId {
        let id = FunctionId(self.functions.len());
        let mut f = f;
        f.id = id;
        self.functions.push(f);
        id
    }
}

/// Builds a [`Program`] from typed facts, grounded on the original
/// analyzer's `run()` walking `pass.Pkg.Imports()` before examining the
/// current package's own declarations (§4.3).
pub struct ProgramBuilder<'a, F: FactProvider> {
    facts: &'a F,
}

impl<'a, F: FactProvider> ProgramBuilder<'a, F> {
    #[must_use]
    pub fn new(facts: &'a F) -> Self {
        Self { facts }
    }

    /// Build the program for `primary`, which is handed its own typed file
    /// bundle directly (it never round-trips through the fact store — the
    /// pass currently running owns it) alongside its declared imports.
    pub fn build(
        &self,
        primary: &PackageId,
        primary_imports: &[PackageId],
        primary_bundle: &TypedFileBundle,
    ) -> Program {
        crate::instrument_block!("program_builder", {
            let build_order = discover_import_closure(primary, primary_imports, self.facts);
            let mut ctx = BuildCtx::new();

            for pid in &build_order {
                match self.facts.import_fact(pid) {
                    Some(fact) => build_package(pid, &fact.files.declarations, true, &mut ctx),
                    None => {
                        // No fact available: register as an empty stub so
                        // any reference into it resolves to a signature-only
                        // stand-in the first time it is actually referenced.
                        ctx.packages.entry(pid.clone()).or_insert_with(|| Package {
                            id: pid.clone(),
                            imported: true,
                            stub: true,
                            functions: Vec::new(),
                        });
                    }
                }
            }

            build_package(primary, &primary_bundle.declarations, false, &mut ctx);

            ctx.alloc(Function {
                id: FunctionId(0),
                name: "<root>".to_string(),
                package: None,
                signature: Signature::default(),
                source: None,
                params: Vec::new(),
                param_types: Vec::new(),
                body: Vec::new(),
                synthetic: true,
                is_package_init: false,
                file: None,
            });

            Program::new(ctx.functions, ctx.packages)
        })
    }
}

/// Two-phase stack frame used by [`discover_import_closure`] to compute a
/// postorder without recursion (§9 Design Notes: import graphs may be
/// arbitrarily deep, so traversal must not consume host stack depth).
enum Frame {
    Expand(PackageId),
    Finish(PackageId),
}

/// Iterative postorder DFS over the import graph rooted at `primary`,
/// using each visited package's exported [`crate::fact::PackageFact::imports`]
/// to keep expanding. A package with no fact contributes no further imports
/// (it is a leaf stub) but is still included in the returned order.
fn discover_import_closure(
    primary: &PackageId,
    primary_imports: &[PackageId],
    facts: &impl FactProvider,
) -> Vec<PackageId> {
    let mut visited: HashSet<PackageId> = HashSet::new();
    visited.insert(primary.clone());

    let mut stack: Vec<Frame> = Vec::new();
    // Push in reverse so the stack (LIFO) pops direct imports in their
    // original order.
    for imp in primary_imports.iter().rev() {
        if visited.insert(imp.clone()) {
            stack.push(Frame::Expand(imp.clone()));
        }
    }

    let mut order: Vec<PackageId> = Vec::new();
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Expand(pid) => {
                // Re-push as Finish so it is emitted only after every
                // import it expands to below has itself finished —
                // the standard iterative-postorder trick.
                stack.push(Frame::Finish(pid.clone()));
                if let Some(fact) = facts.import_fact(&pid) {
                    for imp in fact.imports.iter().rev() {
                        if visited.insert(imp.clone()) {
                            stack.push(Frame::Expand(imp.clone()));
                        }
                    }
                }
            }
            Frame::Finish(pid) => order.push(pid),
        }
    }
    order
}

/// Register and resolve every declaration in one package, in two passes so
/// that sibling declarations (which may call each other in any order) are
/// all name-resolvable before any call site is resolved.
fn build_package(pid: &PackageId, decls: &[Declaration], imported: bool, ctx: &mut BuildCtx) {
    let stub = false;
    let mut fn_ids = Vec::with_capacity(decls.len());

    // Pass A: allocate every declaration with an empty body.
    for decl in decls {
        let params: Vec<ParamId> = (0..decl.param_types.len()).map(ParamId).collect();
        let id = ctx.alloc(Function {
            id: FunctionId(0),
            name: decl.name.clone(),
            package: Some(pid.clone()),
            signature: decl.signature.clone(),
            source: decl.position.clone().map(|position| SourceDecl { position }),
            params,
            param_types: decl.param_types.clone(),
            body: Vec::new(),
            synthetic: false,
            is_package_init: decl.is_package_init,
            file: decl.file.clone(),
        });
        ctx.registry.insert((pid.clone(), decl.name.clone()), id);
        fn_ids.push(id);
    }

    // Pass B: resolve bodies now that every sibling name is registered.
    for (decl, id) in decls.iter().zip(fn_ids.iter().copied()) {
        let param_names = &decl.param_names;
        let body = decl
            .body
            .iter()
            .map(|site| resolve_call_site(site, pid, param_names, ctx))
            .collect();
        ctx.functions[id.0].body = body;
    }

    ctx.packages
        .entry(pid.clone())
        .and_modify(|p| p.functions.extend(fn_ids.iter().copied()))
        .or_insert_with(|| Package {
            id: pid.clone(),
            imported,
            stub,
            functions: fn_ids,
        });
}

fn resolve_call_site(
    site: &RawCallSite,
    owner: &PackageId,
    owner_params: &[String],
    ctx: &mut BuildCtx,
) -> CallSite {
    let args = site
        .args
        .iter()
        .map(|a| resolve_arg(a, owner, owner_params, ctx))
        .collect();

    let target = match &site.target {
        RawTarget::Direct(fref) => CallTarget::Direct(resolve_ref(fref, owner, ctx)),
        RawTarget::Closure(decl) => CallTarget::Direct(build_closure(decl, owner, ctx)),
        RawTarget::Indirect { declared_signature } => CallTarget::Indirect {
            declared_signature: declared_signature.clone(),
        },
    };

    CallSite {
        form: site.form,
        is_invoke: site.is_invoke,
        args,
        target,
    }
}

fn resolve_arg(
    arg: &RawArg,
    owner: &PackageId,
    owner_params: &[String],
    ctx: &mut BuildCtx,
) -> ArgOperand {
    match arg {
        RawArg::NamedFunction(fref) => ArgOperand::NamedFunction(resolve_ref(fref, owner, ctx)),
        RawArg::Closure(decl) => ArgOperand::Closure(build_closure(decl, owner, ctx)),
        RawArg::Parameter(name) => owner_params
            .iter()
            .position(|p| p == name)
            .map(|idx| ArgOperand::Parameter(ParamId(idx)))
            .unwrap_or(ArgOperand::Other),
        RawArg::Other => ArgOperand::Other,
    }
}

/// Synthesize a function for an inline closure literal and resolve its own
/// body using its own parameter names — a closure does not forward-resolve
/// captured parameters from an enclosing function's scope in this model
/// (captured values are only ever observed, never re-identified, past the
/// closure boundary).
fn build_closure(decl: &Declaration, owner: &PackageId, ctx: &mut BuildCtx) -> FunctionId {
    let params: Vec<ParamId> = (0..decl.param_types.len()).map(ParamId).collect();
    let id = ctx.alloc(Function {
        id: FunctionId(0),
        name: decl.name.clone(),
        package: Some(owner.clone()),
        signature: decl.signature.clone(),
        source: decl.position.clone().map(|position| SourceDecl { position }),
        params,
        param_types: decl.param_types.clone(),
        body: Vec::new(),
        synthetic: true,
        is_package_init: false,
        file: decl.file.clone(),
    });
    let body = decl
        .body
        .iter()
        .map(|site| resolve_call_site(site, owner, &decl.param_names, ctx))
        .collect();
    ctx.functions[id.0].body = body;
    id
}

/// Resolve a [`crate::fact::FunctionRef`] to a [`FunctionId`], synthesizing
/// a signature-only stub the first time a reference targets a declaration
/// this build has not (or cannot) register directly — a reference into a
/// package with no fact, or a generic instantiation whose specialized name
/// was never supplied by the harness (§4.3 "generic instantiation
/// bookkeeping", §4.2 "stub package").
fn resolve_ref(fref: &crate::fact::FunctionRef, owner: &PackageId, ctx: &mut BuildCtx) -> FunctionId {
    let target_pkg = fref.package.clone().unwrap_or_else(|| owner.clone());

    let qualified_name = if fref.type_args.is_empty() {
        fref.name.clone()
    } else {
        let args = fref
            .type_args
            .iter()
            .map(|t| t.0.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}[{args}]", fref.name)
    };

    if let Some(id) = ctx.registry.get(&(target_pkg.clone(), qualified_name.clone())) {
        return *id;
    }
    // Fall back to the unspecialized generic template name, if distinct.
    if qualified_name != fref.name {
        if let Some(id) = ctx.registry.get(&(target_pkg.clone(), fref.name.clone())) {
            return *id;
        }
    }

    synthesize_stub(&target_pkg, &qualified_name, fref.signature.clone().unwrap_or_default(), ctx)
}

fn synthesize_stub(
    pkg: &PackageId,
    name: &str,
    signature: Signature,
    ctx: &mut BuildCtx,
) -> FunctionId {
    let params: Vec<ParamId> = (0..signature.params.len()).map(ParamId).collect();
    let param_types = signature.params.clone();
    let id = ctx.alloc(Function {
        id: FunctionId(0),
        name: name.to_string(),
        package: Some(pkg.clone()),
        signature,
        source: None,
        params,
        param_types,
        body: Vec::new(),
        synthetic: true,
        is_package_init: false,
        file: None,
    });
    ctx.registry.insert((pkg.clone(), name.to_string()), id);
    ctx.packages
        .entry(pkg.clone())
        .and_modify(|p| p.functions.push(id))
        .or_insert_with(|| Package {
            id: pkg.clone(),
            imported: true,
            stub: true,
            functions: vec![id],
        });
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{FunctionRef, InMemoryFactStore, PackageFact};

    fn sig(params: Vec<&str>, results: Vec<&str>) -> Signature {
        Signature::new(
            params.into_iter().map(TypeString::from).collect(),
            results.into_iter().map(TypeString::from).collect(),
        )
    }

    #[test]
    fn single_package_direct_call() {
        let store = InMemoryFactStore::new();
        let pkg: PackageId = "callers/caller".into();

        let callee = Declaration::new("Callee", sig(vec![], vec![]));
        let caller = Declaration::new("Test1", sig(vec![], vec![])).with_body(vec![
            RawCallSite::direct(FunctionRef::local("Callee"), vec![]),
        ]);
        let bundle = TypedFileBundle::new(vec![caller, callee]);

        let program = ProgramBuilder::new(&store).build(&pkg, &[], &bundle);

        let test1 = program
            .functions()
            .find(|f| f.name == "Test1")
            .expect("Test1 present");
        assert_eq!(test1.body.len(), 1);
        match &test1.body[0].target {
            CallTarget::Direct(callee_id) => {
                assert_eq!(program.function(*callee_id).name, "Callee");
            }
            CallTarget::Indirect { .. } => panic!("expected a direct edge"),
        }
    }

    #[test]
    fn unresolved_cross_package_reference_becomes_stub() {
        let store = InMemoryFactStore::new();
        let pkg: PackageId = "callers/caller".into();
        let other: PackageId = "callers/other".into();

        let caller = Declaration::new("Test1", sig(vec![], vec![])).with_body(vec![
            RawCallSite::direct(
                FunctionRef::qualified(other.clone(), "Callee").with_signature(sig(vec![], vec![])),
                vec![],
            ),
        ]);
        let bundle = TypedFileBundle::new(vec![caller]);

        let program = ProgramBuilder::new(&store).build(&pkg, &[other.clone()], &bundle);

        let test1 = program.functions().find(|f| f.name == "Test1").unwrap();
        match &test1.body[0].target {
            CallTarget::Direct(callee_id) => {
                let f = program.function(*callee_id);
                assert_eq!(f.name, "Callee");
                assert!(f.synthetic);
                assert_eq!(f.package.as_ref(), Some(&other));
            }
            CallTarget::Indirect { .. } => panic!("expected a stub direct edge"),
        }
    }

    #[test]
    fn generic_instantiation_resolved_by_qualified_name() {
        let store = InMemoryFactStore::new();
        let pkg: PackageId = "pkgtest/pkg1".into();

        let specialized = Declaration::new("SortFunc[string]", sig(vec!["[]string".into()], vec![]));
        let caller = Declaration::new("Test1", sig(vec![], vec![])).with_body(vec![
            RawCallSite::direct(
                FunctionRef::local("SortFunc").instantiate(vec!["string".into()]),
                vec![],
            ),
        ]);
        let bundle = TypedFileBundle::new(vec![caller, specialized]);

        let program = ProgramBuilder::new(&store).build(&pkg, &[], &bundle);

        let test1 = program.functions().find(|f| f.name == "Test1").unwrap();
        match &test1.body[0].target {
            CallTarget::Direct(callee_id) => {
                assert_eq!(program.function(*callee_id).name, "SortFunc[string]");
            }
            CallTarget::Indirect { .. } => panic!("expected a direct edge to the specialization"),
        }
    }

    #[test]
    fn closure_call_synthesizes_direct_edge() {
        let store = InMemoryFactStore::new();
        let pkg: PackageId = "callers/caller".into();

        let callee = Declaration::new("Callee", sig(vec![], vec![]));
        let closure = Declaration::new("Test1$1", sig(vec![], vec![])).with_body(vec![
            RawCallSite::direct(FunctionRef::local("Callee"), vec![]),
        ]);
        let caller = Declaration::new("Test1", sig(vec![], vec![]))
            .with_body(vec![RawCallSite::closure_call(closure, vec![])]);
        let bundle = TypedFileBundle::new(vec![caller, callee]);

        let program = ProgramBuilder::new(&store).build(&pkg, &[], &bundle);

        let test1 = program.functions().find(|f| f.name == "Test1").unwrap();
        let closure_id = match &test1.body[0].target {
            CallTarget::Direct(id) => *id,
            CallTarget::Indirect { .. } => panic!("expected a direct call to the closure"),
        };
        let closure_fn = program.function(closure_id);
        assert!(closure_fn.synthetic);
        match &closure_fn.body[0].target {
            CallTarget::Direct(callee_id) => {
                assert_eq!(program.function(*callee_id).name, "Callee");
            }
            CallTarget::Indirect { .. } => panic!("closure body should call Callee directly"),
        }
    }

    #[test]
    fn import_closure_builds_dependency_first() {
        let mut store = InMemoryFactStore::new();
        let leaf: PackageId = "pkgtest/pkg3".into();
        let mid: PackageId = "pkgtest/pkg2".into();
        let primary: PackageId = "pkgtest/pkg1".into();

        store.export(PackageFact {
            package: leaf.clone(),
            imports: vec![],
            files: TypedFileBundle::new(vec![Declaration::new("C", sig(vec![], vec![]))]),
        });
        store.export(PackageFact {
            package: mid.clone(),
            imports: vec![leaf.clone()],
            files: TypedFileBundle::new(vec![
                Declaration::new("B", sig(vec![], vec![])).with_body(vec![RawCallSite::direct(
                    FunctionRef::qualified(leaf.clone(), "C"),
                    vec![],
                )]),
            ]),
        });

        let primary_decl = Declaration::new("Test1", sig(vec![], vec![])).with_body(vec![
            RawCallSite::direct(FunctionRef::qualified(mid.clone(), "B"), vec![]),
        ]);
        let bundle = TypedFileBundle::new(vec![primary_decl]);

        let program = ProgramBuilder::new(&store).build(&primary, &[mid.clone()], &bundle);

        let b = program.functions().find(|f| f.name == "B").unwrap();
        match &b.body[0].target {
            CallTarget::Direct(c_id) => assert_eq!(program.function(*c_id).name, "C"),
            CallTarget::Indirect { .. } => panic!("B should resolve C directly"),
        }
    }

    #[test]
    fn root_is_last_allocated_function() {
        let store = InMemoryFactStore::new();
        let pkg: PackageId = "callers/caller".into();
        let bundle = TypedFileBundle::new(vec![Declaration::new("Test1", sig(vec![], vec![]))]);
        let program = ProgramBuilder::new(&store).build(&pkg, &[], &bundle);
        assert_eq!(program.function(program.root()).name, "<root>");
    }
}
