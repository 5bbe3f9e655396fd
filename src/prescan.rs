//! Pre-scan: a cheap declaration-only sweep answering "could this package
//! contain a caller at all?" before the costly work of building IR for the
//! whole import closure (§4.1).

use crate::config::CallerOptions;
use crate::fact::Declaration;
use crate::ir::PackageId;

/// Result of the pre-scan pass, matching `preScanResult` / `AnalyzerHasCaller`
/// in the original — a required input to [`crate::run_pass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreScanResult {
    pub has_caller: bool,
}

/// Sweep `declarations` for any function that could match `caller`, without
/// building any IR. Declarations are checked by name, signature and the
/// package prefix of `package` itself — the same three filters
/// [`crate::callerscan`] applies later, minus the synthetic/skip-file
/// exclusions that only make sense once IR exists.
///
/// Per §4.1, failure to resolve a declaration's signature is a harness
/// contract violation, not a recoverable condition — callers are expected
/// to have type-checked the package already, so this never happens for
/// well-formed input and is not modeled as a `Result`.
#[must_use]
pub fn prescan(package: &PackageId, declarations: &[Declaration], caller: &CallerOptions) -> PreScanResult {
    crate::instrument_block!("prescan", {
        let pkg_ok = caller.pkg_matches(&package.0);
        let has_caller = pkg_ok
            && declarations.iter().any(|decl| {
                caller.name_matches(&decl.name) && caller.signature().matches(&decl.signature)
            });
        PreScanResult { has_caller }
    })
}
