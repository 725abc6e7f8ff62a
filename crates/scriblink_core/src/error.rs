//! Caller-facing error taxonomy shared by all services.
//!
//! Each service keeps its own precise error enum; `kind()` on those enums
//! maps every variant onto one of these categories so callers can branch
//! without matching every variant.

use std::fmt::{Display, Formatter};

/// Category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Folder, item, summary or parent id did not resolve.
    NotFound,
    /// Caller does not own the target, or owners differ.
    PermissionDenied,
    /// Self-move, cyclic move or duplicate root initialization.
    StructuralViolation,
    /// Candidate summary rejected by the validator.
    ValidationFailed,
    /// Text-generation collaborator failed.
    UpstreamUnavailable,
    /// Required text was empty or malformed.
    InvalidInput,
    /// Storage transport or schema failure.
    Storage,
}

impl ErrorKind {
    /// Stable snake_case code used in log events and client payloads.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::StructuralViolation => "structural_violation",
            Self::ValidationFailed => "validation_failed",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::InvalidInput => "invalid_input",
            Self::Storage => "storage",
        }
    }

    /// Whether the caller can fix the failure by changing its request.
    pub fn is_caller_error(self) -> bool {
        !matches!(self, Self::UpstreamUnavailable | Self::Storage)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(ErrorKind::StructuralViolation.code(), "structural_violation");
        assert_eq!(ErrorKind::UpstreamUnavailable.to_string(), "upstream_unavailable");
    }

    #[test]
    fn storage_and_upstream_are_not_caller_errors() {
        assert!(!ErrorKind::Storage.is_caller_error());
        assert!(!ErrorKind::UpstreamUnavailable.is_caller_error());
        assert!(ErrorKind::NotFound.is_caller_error());
    }
}
