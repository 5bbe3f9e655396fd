//! Caller scan: enumerate the current package's IR functions and decide
//! which are candidate callers (§4.4).
//!
//! §4.4's skip-file rule is stated in terms of exclusion from *reporting*,
//! not from the graph: "Skipped candidates are retained as caller nodes for
//! traversal purposes but are not reported at the end... removing them
//! would cause the search to terminate spuriously at their edges from other
//! callers." The original Go analyzer's own `callerFns` loop does drop
//! skipped functions from its returned slice outright — but that slice only
//! ever feeds the per-caller search loop, never the graph itself (the
//! underlying `*callgraph.Graph` node for a skipped function still exists
//! and is still traversable through `ssa.Program.AllFunctions()`). Both
//! behaviors are consistent with §4.4's stated rationale; this module keeps
//! every candidate as a [`Candidate`] with a `skip` flag so callers of this
//! module make the skip/report distinction explicit rather than relying on
//! a function having quietly disappeared from a list.

use crate::config::{CalleeOptions, CallerOptions, SkipFileOptions};
use crate::ir::{FunctionId, Program};

/// A function accepted as a candidate caller, with its skip status (§4.4,
/// §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub function: FunctionId,
    /// True if the declaring file matches a configured skip suffix: still a
    /// valid traversal node, excluded from final diagnostic reporting.
    pub skip: bool,
}

/// Scan every function of `primary`'s package for candidate callers (§4.4).
/// Order follows [`Program::functions`]'s iteration order, per §5's ordering
/// guarantee ("scanned in the iteration order of the program's function
/// set, which is unspecified but stable within one pass").
#[must_use]
pub fn scan_callers(program: &Program, primary: &crate::ir::PackageId, caller: &CallerOptions, skip_file: &SkipFileOptions) -> Vec<Candidate> {
    crate::instrument_block!("caller_scan", {
        program
            .functions()
            .filter(|f| f.package.as_ref() == Some(primary))
            .filter(|f| f.is_source_backed())
            .filter(|f| caller.name_matches(&f.name))
            .filter(|f| caller.signature().matches(&f.signature))
            .map(|f| Candidate {
                function: f.id,
                skip: f.file.as_deref().is_some_and(|file| skip_file.matches(file)),
            })
            .collect()
    })
}

/// Whether a function satisfies the callee predicate (§4.5, §4.6, GLOSSARY
/// "Callee predicate"): `name == callee-name ∧ signature matches callee
/// filter`.
#[must_use]
pub fn is_callee(program: &Program, id: FunctionId, callee: &CalleeOptions) -> bool {
    let f = program.function(id);
    f.name == callee.name
        && callee.signature().matches(&f.signature)
        && callee.pkg_matches(f.package.as_ref().map_or("", |p| p.0.as_str()))
}
