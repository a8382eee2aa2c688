//! @ai:module:intent Non-fatal findings collected during a conversion run
//! @ai:module:layer domain
//! @ai:module:public_api Diagnostic, DiagnosticCode, Severity
//! @ai:module:depends_on entity
//! @ai:module:stateless true

use crate::entity::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// @ai:intent Severity level for diagnostics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Error,
}

/// @ai:intent Stable codes for every diagnostic the converter can raise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Malformed `@implements`/`@justification` tag.
    ParseError,
    /// Both `@implements` and `@justification` on one comment.
    ConflictingTags,
    /// More than one `@justification` on one comment.
    DuplicateJustification,
    /// Declaration matches more than one definition or vice versa.
    AmbiguousDeclDef,
    /// Both halves of a declaration/definition pair carry tags.
    DuplicateDeclDefTags,
    /// Inner reference to a compound that does not exist.
    DanglingReference,
    /// Compound reachable from itself through inner references.
    ReferenceCycle,
    /// Tags on a file entity.
    FileLevelTags,
    /// Tags on a container and one of its direct children.
    NestedTags,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ParseError => "E100",
            DiagnosticCode::AmbiguousDeclDef => "E200",
            DiagnosticCode::ConflictingTags => "W100",
            DiagnosticCode::DuplicateJustification => "W101",
            DiagnosticCode::DuplicateDeclDefTags => "W200",
            DiagnosticCode::DanglingReference => "W300",
            DiagnosticCode::ReferenceCycle => "W301",
            DiagnosticCode::FileLevelTags => "R001",
            DiagnosticCode::NestedTags => "R002",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// @ai:intent A single finding, attributed to a source location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location,
        }
    }

    pub fn warning(
        code: DiagnosticCode,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            location,
        }
    }

    /// @ai:intent Emit this diagnostic as a tracing event at matching level
    /// @ai:effects log
    pub fn log(&self) {
        match self.severity {
            Severity::Error => {
                tracing::error!(code = %self.code, location = %self.location, "{}", self.message)
            }
            Severity::Warning => {
                tracing::warn!(code = %self.code, location = %self.location, "{}", self.message)
            }
            Severity::Info => {
                tracing::info!(code = %self.code, location = %self.location, "{}", self.message)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.location, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_display_includes_code_and_location() {
        let diag = Diagnostic::warning(
            DiagnosticCode::ConflictingTags,
            "justification ignored",
            SourceLocation::new("Foo.h", 12),
        );
        assert_eq!(diag.to_string(), "Foo.h:12 [W100] justification ignored");
    }
}
