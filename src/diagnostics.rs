//! Diagnostic emission (§4.7, §6 "Outputs per pass").

use crate::ir::SourcePosition;

/// A single finding produced by a pass: a candidate caller with no path to
/// a callee (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Diagnostic {
    pub position: SourcePosition,
    pub message: String,
}

impl Diagnostic {
    /// Construct the diagnostic for `fn_name` not reaching the callee,
    /// matching the original's exact message text: `"<name> does not call
    /// callee function"` (§6).
    pub fn no_path_to_callee(position: SourcePosition, fn_name: &str) -> Self {
        Self {
            position,
            message: format!("{fn_name} does not call callee function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_matches_spec_wording() {
        let pos = SourcePosition {
            file: "caller.go".into(),
            line: 10,
            column: 1,
        };
        let d = Diagnostic::no_path_to_callee(pos, "Test1_fail");
        assert_eq!(d.message, "Test1_fail does not call callee function");
    }
}
