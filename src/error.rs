//! Error types for sherpa.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for sherpa operations.
///
/// Each variant maps to a specific exit code. `NotFound` is the one
/// recoverable variant: memory loading treats a missing file as an empty
/// document rather than a failure.
#[derive(Error, Debug)]
pub enum SherpaError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// A requested file does not exist on the host.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Host file or shell operation failed.
    #[error("Host operation failed: {0}")]
    HostError(String),

    /// An agent invocation failed.
    #[error("Agent invocation failed: {0}")]
    AgentError(String),

    /// A workflow was marked failed; the message carries the causing error.
    #[error("Workflow failed: {0}")]
    WorkflowError(String),
}

impl SherpaError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SherpaError::UserError(_) => exit_codes::USER_ERROR,
            SherpaError::NotFound(_) => exit_codes::HOST_FAILURE,
            SherpaError::HostError(_) => exit_codes::HOST_FAILURE,
            SherpaError::AgentError(_) => exit_codes::AGENT_FAILURE,
            SherpaError::WorkflowError(_) => exit_codes::WORKFLOW_FAILURE,
        }
    }

    /// Returns true when this error means a file was absent rather than broken.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SherpaError::NotFound(_))
    }
}

/// Result type alias for sherpa operations.
pub type Result<T> = std::result::Result<T, SherpaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = SherpaError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn not_found_maps_to_host_failure_code() {
        let err = SherpaError::NotFound("activeContext.md".to_string());
        assert_eq!(err.exit_code(), exit_codes::HOST_FAILURE);
        assert!(err.is_not_found());
    }

    #[test]
    fn host_error_has_correct_exit_code() {
        let err = SherpaError::HostError("write denied".to_string());
        assert_eq!(err.exit_code(), exit_codes::HOST_FAILURE);
        assert!(!err.is_not_found());
    }

    #[test]
    fn agent_error_has_correct_exit_code() {
        let err = SherpaError::AgentError("builder crashed".to_string());
        assert_eq!(err.exit_code(), exit_codes::AGENT_FAILURE);
    }

    #[test]
    fn workflow_error_has_correct_exit_code() {
        let err = SherpaError::WorkflowError("reviewer task blocked".to_string());
        assert_eq!(err.exit_code(), exit_codes::WORKFLOW_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = SherpaError::NotFound("progress.md".to_string());
        assert_eq!(err.to_string(), "File not found: progress.md");

        let err = SherpaError::AgentError("timeout".to_string());
        assert_eq!(err.to_string(), "Agent invocation failed: timeout");
    }
}
