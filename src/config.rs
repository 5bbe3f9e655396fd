//! Explicit, per-pass configuration (§6, §9 "Process-wide configuration").
//!
//! The original analyzer keeps `opts`, `callerOpts` and `calleeOpts` as
//! module-global `var`s, mutated by flag parsing and swapped out for tests
//! via `SetOpts`. §9 Design Notes calls for a cleaner re-architecture:
//! configuration scoped into an explicit context value threaded through
//! each pass, so tests can construct independent configurations without any
//! side-channel state. [`AnalysisConfig`] is that context value.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ir::{Signature, TypeString};

/// The predicate for accepting a function as a caller (§3 "Caller
/// options"). A component being absent (`None`) means "do not constrain";
/// present-but-empty means "must be exactly empty".
#[derive(Debug, Clone, Default)]
pub struct CallerOptions {
    /// Short names a caller must be one of. `None` or empty set means
    /// unconstrained.
    pub names: Option<HashSet<String>>,
    pub params: Option<Vec<TypeString>>,
    pub results: Option<Vec<TypeString>>,
    /// Package-path prefixes a caller's package must satisfy one of.
    pub pkg_prefixes: Option<Vec<String>>,
}

impl CallerOptions {
    #[must_use]
    pub fn signature(&self) -> SignatureFilter<'_> {
        SignatureFilter {
            params: self.params.as_deref(),
            results: self.results.as_deref(),
        }
    }

    /// Whether `name` is acceptable under `names` (§4.4 "If a caller name
    /// set is provided...").
    #[must_use]
    pub fn name_matches(&self, name: &str) -> bool {
        match &self.names {
            None => true,
            Some(names) if names.is_empty() => true,
            Some(names) => names.contains(name),
        }
    }

    /// Whether `package` satisfies the configured prefixes (§4.1
    /// `checkPkg`): absent filter or nil package always match.
    #[must_use]
    pub fn pkg_matches(&self, package: &str) -> bool {
        check_pkg_prefix(package, self.pkg_prefixes.as_deref())
    }
}

/// The callee predicate (§3 "Callee options"): same shape as
/// [`CallerOptions`] except the name is a single required value, not a set.
#[derive(Debug, Clone, Default)]
pub struct CalleeOptions {
    pub name: String,
    pub params: Option<Vec<TypeString>>,
    pub results: Option<Vec<TypeString>>,
    pub pkg_prefixes: Option<Vec<String>>,
}

impl CalleeOptions {
    #[must_use]
    pub fn signature(&self) -> SignatureFilter<'_> {
        SignatureFilter {
            params: self.params.as_deref(),
            results: self.results.as_deref(),
        }
    }

    #[must_use]
    pub fn pkg_matches(&self, package: &str) -> bool {
        check_pkg_prefix(package, self.pkg_prefixes.as_deref())
    }
}

/// An ordered list of path suffixes excluded from *reporting* (§3
/// "File-suffix filter", §4.4).
#[derive(Debug, Clone, Default)]
pub struct SkipFileOptions {
    pub suffixes: Vec<String>,
}

impl SkipFileOptions {
    #[must_use]
    pub fn matches(&self, file: &str) -> bool {
        // Checked in reverse, same as the original `chkSig`/skip-suffix
        // loop: configs tend to append broader suffixes later, so scanning
        // from the end finds a match sooner on average.
        self.suffixes.iter().rev().any(|suf| file.ends_with(suf.as_str()))
    }
}

/// All per-pass configuration bundled together, constructed by the harness
/// (not read from globals) and passed explicitly to [`crate::run_pass`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub skip_file: SkipFileOptions,
    pub caller: CallerOptions,
    pub callee: CalleeOptions,
}

impl AnalysisConfig {
    /// Merge harness-supplied file overrides on top of `self`, returning a
    /// new config. Any field present in `overrides` replaces the
    /// corresponding field in `self`; absent fields are left untouched.
    #[must_use]
    pub fn with_file_overrides(mut self, overrides: FileOverrides) -> Self {
        if let Some(skip) = overrides.skip_file {
            self.skip_file.suffixes = skip;
        }
        if let Some(callee) = overrides.callee {
            if let Some(name) = callee.name {
                self.callee.name = name;
            }
            if callee.params.is_some() {
                self.callee.params = callee.params.map(|p| p.into_iter().map(Into::into).collect());
            }
            if callee.results.is_some() {
                self.callee.results = callee.results.map(|r| r.into_iter().map(Into::into).collect());
            }
            if callee.pkg.is_some() {
                self.callee.pkg_prefixes = callee.pkg;
            }
        }
        if let Some(caller) = overrides.caller {
            if let Some(names) = caller.names {
                self.caller.names = Some(names.into_iter().collect());
            }
            if caller.params.is_some() {
                self.caller.params = caller.params.map(|p| p.into_iter().map(Into::into).collect());
            }
            if caller.results.is_some() {
                self.caller.results = caller.results.map(|r| r.into_iter().map(Into::into).collect());
            }
            if caller.pkg.is_some() {
                self.caller.pkg_prefixes = caller.pkg;
            }
        }
        self
    }
}

/// A filter over a function signature: each side is independently
/// optional, matching §3 "absent list means... unconstrained".
#[derive(Debug, Clone, Copy)]
pub struct SignatureFilter<'a> {
    params: Option<&'a [TypeString]>,
    results: Option<&'a [TypeString]>,
}

impl SignatureFilter<'_> {
    /// Port of `chkSig`: positional, exact-arity comparison of canonical
    /// type strings, skipped entirely when the corresponding filter list is
    /// absent.
    #[must_use]
    pub fn matches(&self, sig: &Signature) -> bool {
        if let Some(params) = self.params {
            if sig.params.len() != params.len() {
                return false;
            }
            // Scan in reverse: context.Context-shaped first parameters are
            // common, so a mismatch is usually found faster from the tail.
            if !sig
                .params
                .iter()
                .zip(params.iter())
                .rev()
                .all(|(a, b)| a == b)
            {
                return false;
            }
        }
        if let Some(results) = self.results {
            if sig.results.len() != results.len() {
                return false;
            }
            if !sig.results.iter().zip(results.iter()).all(|(a, b)| a == b) {
                return false;
            }
        }
        true
    }
}

fn check_pkg_prefix(package: &str, prefixes: Option<&[String]>) -> bool {
    match prefixes {
        None => true,
        Some(prefixes) => prefixes.iter().rev().any(|p| package.starts_with(p.as_str())),
    }
}

/// TOML-deserializable configuration overrides (§8 ambient stack), for
/// harnesses that want file-based configuration of `skip.file` /
/// `callee.*` / `caller.*` alongside or instead of programmatic
/// construction via [`CallerOptions`]/[`CalleeOptions`] directly.
#[derive(Debug, Default, Deserialize)]
pub struct FileOverrides {
    #[serde(default, rename = "skip.file")]
    pub skip_file: Option<Vec<String>>,
    #[serde(default)]
    pub caller: Option<CallerFileOptions>,
    #[serde(default)]
    pub callee: Option<CalleeFileOptions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallerFileOptions {
    pub names: Option<Vec<String>>,
    pub params: Option<Vec<String>>,
    pub results: Option<Vec<String>>,
    pub pkg: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalleeFileOptions {
    pub name: Option<String>,
    pub params: Option<Vec<String>>,
    pub results: Option<Vec<String>>,
    pub pkg: Option<Vec<String>>,
}

/// Load `FileOverrides` from a harness-supplied TOML path (§7
/// "Configuration parse error" → "Report before pass runs").
pub fn load_file_overrides(path: &Path) -> Result<FileOverrides> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    let overrides: FileOverrides = toml::from_str(&raw)?;
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_filter_unconstrained_matches_anything() {
        let filter = SignatureFilter {
            params: None,
            results: None,
        };
        let sig = Signature::new(vec!["int".into()], vec!["error".into()]);
        assert!(filter.matches(&sig));
    }

    #[test]
    fn signature_filter_empty_means_must_be_empty() {
        let filter = SignatureFilter {
            params: Some(&[]),
            results: None,
        };
        assert!(!filter.matches(&Signature::new(vec!["int".into()], vec![])));
        assert!(filter.matches(&Signature::new(vec![], vec!["error".into()])));
    }

    #[test]
    fn caller_name_matching() {
        let mut opts = CallerOptions::default();
        assert!(opts.name_matches("anything"));
        opts.names = Some(["Test1".to_string()].into_iter().collect());
        assert!(opts.name_matches("Test1"));
        assert!(!opts.name_matches("Test2"));
    }

    #[test]
    fn skip_file_suffix_matching() {
        let skip = SkipFileOptions {
            suffixes: vec!["_test.go".into(), "/gen/api.go".into()],
        };
        assert!(skip.matches("pkg/foo_test.go"));
        assert!(skip.matches("pkg/gen/api.go"));
        assert!(!skip.matches("pkg/foo.go"));
    }

    #[test]
    fn pkg_prefix_matching() {
        assert!(check_pkg_prefix("callers/caller", None));
        assert!(check_pkg_prefix(
            "callers/caller",
            Some(&["callers".to_string()])
        ));
        assert!(!check_pkg_prefix(
            "other/pkg",
            Some(&["callers".to_string()])
        ));
    }

    #[test]
    fn file_overrides_load_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir should create");
        let path = dir.path().join("callreach.toml");
        std::fs::write(
            &path,
            r#"
                "skip.file" = ["_test.go"]

                [callee]
                name = "Callee"
            "#,
        )
        .expect("fixture file should write");

        let overrides = load_file_overrides(&path).expect("load should succeed");
        assert_eq!(overrides.skip_file, Some(vec!["_test.go".to_string()]));
        assert_eq!(overrides.callee.unwrap().name, Some("Callee".to_string()));
    }

    #[test]
    fn load_file_overrides_missing_file_is_config_read_error() {
        let dir = tempfile::tempdir().expect("temp dir should create");
        let path = dir.path().join("does-not-exist.toml");

        let err = load_file_overrides(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn file_overrides_parse_from_toml() {
        let toml_src = r#"
            "skip.file" = ["_test.go"]

            [caller]
            params = ["callers/caller.Param"]
            results = ["callers/caller.Result"]

            [callee]
            name = "Callee"
        "#;
        let overrides: FileOverrides = toml::from_str(toml_src).unwrap();
        assert_eq!(overrides.skip_file, Some(vec!["_test.go".to_string()]));
        assert_eq!(overrides.callee.unwrap().name, Some("Callee".to_string()));
    }
}
