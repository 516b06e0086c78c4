// ── Core error types ──
//
// Every fallible operation in the core returns `HeadError`. Nothing is
// caught or retried internally; errors surface to the caller that drove
// the operation.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeadError {
    /// A render value does not match its controller kind's contract.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    /// Malformed constructor input (e.g. an add-listener without a remove-listener).
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The listener engine was driven through an illegal sequence of calls.
    #[error("Invariant violated: {message}")]
    InvariantViolation { message: String },

    /// Continuous rendering was requested without a usable document.
    #[error("Environment error: {message}")]
    Environment { message: String },
}

impl HeadError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub(crate) fn environment(message: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
        }
    }

    /// Whether this error signals a caller protocol violation rather than bad data.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
