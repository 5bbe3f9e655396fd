//! Unified error type for `callreach`.
//!
//! Per §7 of the spec, only two conditions are ever fatal to a pass: a
//! missing pre-scan result (a contract violation between `prescan` and
//! `run_pass`) and type information absent for a declaration (malformed
//! harness input). Everything else — missing import facts, candidates with
//! no path — is a normal outcome expressed as data, not an error.

use thiserror::Error as ThisError;

/// Errors a pass can fail with.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A function declaration has no resolvable signature. Indicates the
    /// harness handed `callreach` a package that was not actually
    /// type-checked.
    #[error("type information absent for declaration {name} in package {package}")]
    MissingTypeInfo {
        /// Package containing the declaration.
        package: String,
        /// Short name of the declaration.
        name: String,
    },

    /// Configuration could not be parsed from a harness-supplied TOML file.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    ConfigRead {
        /// Path the harness asked us to load.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a missing-type-info error.
    pub fn missing_type_info(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingTypeInfo {
            package: package.into(),
            name: name.into(),
        }
    }
}

/// Result type alias used throughout the crate's library surface.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_type_info_message() {
        let err = Error::missing_type_info("callers/caller", "Test1");
        assert!(err.to_string().contains("Test1"));
        assert!(err.to_string().contains("callers/caller"));
    }

    #[test]
    fn config_parse_converts_from_toml() {
        let bad: std::result::Result<crate::config::FileOverrides, toml::de::Error> =
            toml::from_str("not = [valid");
        let err: Error = bad.unwrap_err().into();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
