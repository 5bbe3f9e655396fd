//! Cross-package reachability analysis: for every function in a package
//! that looks like a caller, decide whether it transitively calls a
//! function that looks like a callee, over an inter-procedural call graph
//! built with variant-type analysis (VTA).
//!
//! The crate is the analysis core only (§1): it consumes already
//! type-checked packages (via [`fact::Declaration`]/[`fact::FactProvider`])
//! and emits diagnostics against source positions. Enumerating packages,
//! parsing source, running type checking and collecting diagnostics across
//! a whole build are the responsibility of an external driver harness.

pub mod builder;
pub mod callerscan;
pub mod callgraph;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fact;
pub mod ir;
pub mod prescan;
pub mod telemetry;
pub mod traversal;

use config::AnalysisConfig;
use diagnostics::Diagnostic;
use fact::{FactProvider, PackageFact, TypedFileBundle};
use ir::PackageId;
use prescan::PreScanResult;

/// Everything one pass of [`run_pass`] needs about the package currently
/// being analyzed (§6 "Inputs per pass").
pub struct PassInput<'a> {
    pub package: PackageId,
    pub imports: Vec<PackageId>,
    pub files: TypedFileBundle,
    pub config: &'a AnalysisConfig,
}

/// The result of one pass: the diagnostics to report, and the fact this
/// package exports for its importers (§6 "Outputs per pass").
pub struct PassOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub fact: PackageFact,
}

/// Run one analysis pass end to end, mirroring the original analyzer's
/// `run()`: pre-scan short-circuit, program construction, caller scan, call
/// graph construction, per-caller traversal, diagnostic emission (§4,
/// leaves-first: fact store → pre-scan → program builder → caller scan →
/// call graph → traversal/pruning → diagnostics).
///
/// `prescan_result` is a required input rather than recomputed here,
/// matching §7's "missing pre-scan result" being a programmer error: a
/// harness that skips the pre-scan has violated this function's contract,
/// and the type signature makes that unrepresentable rather than modeling
/// it as a recoverable [`error::Error`].
pub fn run_pass(input: &PassInput<'_>, prescan_result: PreScanResult, facts: &impl FactProvider) -> PassOutput {
    let fact = PackageFact {
        package: input.package.clone(),
        imports: input.imports.clone(),
        files: input.files.clone(),
    };

    if !prescan_result.has_caller {
        return PassOutput {
            diagnostics: Vec::new(),
            fact,
        };
    }

    let program = builder::ProgramBuilder::new(facts).build(&input.package, &input.imports, &input.files);

    let candidates = callerscan::scan_callers(
        &program,
        &input.package,
        &input.config.caller,
        &input.config.skip_file,
    );
    if candidates.is_empty() {
        return PassOutput {
            diagnostics: Vec::new(),
            fact,
        };
    }

    let graph = callgraph::build_call_graph(&program);
    let is_callee = |id: ir::FunctionId| callerscan::is_callee(&program, id, &input.config.callee);

    let mut diagnostics = Vec::new();
    for candidate in &candidates {
        if traversal::has_path(&program, &graph, candidate.function, &is_callee) {
            continue;
        }
        if candidate.skip {
            continue;
        }
        let f = program.function(candidate.function);
        let position = f
            .source
            .as_ref()
            .map(|s| s.position.clone())
            .unwrap_or_else(|| ir::SourcePosition {
                file: f.file.clone().unwrap_or_default(),
                line: 0,
                column: 0,
            });
        diagnostics.push(Diagnostic::no_path_to_callee(position, &f.name));
    }

    PassOutput { diagnostics, fact }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalleeOptions, CallerOptions};
    use crate::fact::{Declaration, FunctionRef, InMemoryFactStore, RawCallSite};
    use crate::ir::Signature;

    fn sig(params: Vec<&str>, results: Vec<&str>) -> Signature {
        Signature::new(
            params.into_iter().map(Into::into).collect(),
            results.into_iter().map(Into::into).collect(),
        )
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            caller: CallerOptions {
                params: Some(vec!["callers/caller.Param".into()]),
                results: Some(vec!["callers/caller.Result".into()]),
                ..Default::default()
            },
            callee: CalleeOptions {
                name: "Callee".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn caller_result_sig() -> Signature {
        sig(
            vec!["callers/caller.Param"],
            vec!["callers/caller.Result"],
        )
    }

    #[test]
    fn reports_caller_with_no_path_to_callee() {
        let store = InMemoryFactStore::new();
        let cfg = config();
        let pkg: PackageId = "callers/caller".into();

        let callee = Declaration::new("Callee", sig(vec![], vec![]));
        let other = Declaration::new("DoNotCallCallee", sig(vec![], vec![]));
        let failing = Declaration::new("Test1_fail", caller_result_sig())
            .with_position(5, 1)
            .with_file("caller.go")
            .with_body(vec![RawCallSite::direct(
                FunctionRef::local("DoNotCallCallee"),
                vec![],
            )]);

        let input = PassInput {
            package: pkg.clone(),
            imports: vec![],
            files: TypedFileBundle::new(vec![failing, other, callee]),
            config: &cfg,
        };
        let prescan_result = PreScanResult { has_caller: true };
        let output = run_pass(&input, prescan_result, &store);

        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(
            output.diagnostics[0].message,
            "Test1_fail does not call callee function"
        );
        assert_eq!(output.fact.package, pkg);
    }

    #[test]
    fn no_diagnostic_when_caller_reaches_callee() {
        let store = InMemoryFactStore::new();
        let cfg = config();
        let pkg: PackageId = "callers/caller".into();

        let callee = Declaration::new("Callee", sig(vec![], vec![]));
        let passing = Declaration::new("Test1", caller_result_sig())
            .with_position(5, 1)
            .with_file("caller.go")
            .with_body(vec![RawCallSite::direct(FunctionRef::local("Callee"), vec![])]);

        let input = PassInput {
            package: pkg,
            imports: vec![],
            files: TypedFileBundle::new(vec![passing, callee]),
            config: &cfg,
        };
        let output = run_pass(&input, PreScanResult { has_caller: true }, &store);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn no_caller_short_circuits_without_building_ir() {
        let store = InMemoryFactStore::new();
        let cfg = config();
        let pkg: PackageId = "callers/caller".into();

        let unrelated = Declaration::new("Helper", sig(vec![], vec![]));
        let input = PassInput {
            package: pkg,
            imports: vec![],
            files: TypedFileBundle::new(vec![unrelated]),
            config: &cfg,
        };
        let output = run_pass(&input, PreScanResult { has_caller: false }, &store);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn skipped_candidate_is_not_reported() {
        let store = InMemoryFactStore::new();
        let cfg = AnalysisConfig {
            skip_file: crate::config::SkipFileOptions {
                suffixes: vec!["_test.go".into()],
            },
            ..config()
        };
        let pkg: PackageId = "callers/caller".into();

        let failing = Declaration::new("Test1_fail", caller_result_sig())
            .with_file("caller_test.go")
            .with_body(vec![]);

        let input = PassInput {
            package: pkg,
            imports: vec![],
            files: TypedFileBundle::new(vec![failing]),
            config: &cfg,
        };
        let output = run_pass(&input, PreScanResult { has_caller: true }, &store);
        assert!(output.diagnostics.is_empty());
    }
}
