//! Gate error types
//!
//! Every failure a single caller invocation can hit before, during or after
//! the permission round-trip. Each variant carries a stable wire code so the
//! outcome can be rendered back to JSON callers.

use thiserror::Error;

/// Errors that can occur while gating an action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The caller did not name an action
    #[error("Missing action name")]
    MissingAction,

    /// The action name is not in the static action table
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// No tool is registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Named-action payload failed structural validation
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Cloud request failed structural validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A process invocation outside the command allow-list
    #[error("Command not allowed: {0}")]
    CommandNotAllowed(String),

    /// The authority was unreachable or answered garbage while creating a grant
    #[error("Permission request failed: {0}")]
    PermissionRequestFailed(String),

    /// The proxy asked for permission but did not say which grant to wait on
    #[error("Permission required: missing permission id")]
    MissingPermissionId,

    /// A response body was not the JSON object we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GateError {
    /// Stable code reported in the `error` field of a JSON outcome
    pub fn code(&self) -> &'static str {
        match self {
            GateError::MissingAction => "missing_action",
            GateError::UnknownAction(_) => "unknown_action",
            GateError::UnknownTool(_) => "unknown_tool",
            GateError::InvalidPayload(_) => "invalid_payload",
            GateError::InvalidRequest(_) => "invalid_request",
            GateError::CommandNotAllowed(_) => "command_not_allowed",
            GateError::PermissionRequestFailed(_) => "permission_request_failed",
            GateError::MissingPermissionId => "permission_required",
            GateError::InvalidResponse(_) => "invalid_response",
            GateError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Optional human-readable detail reported next to the code
    pub fn detail(&self) -> Option<String> {
        match self {
            GateError::MissingAction => None,
            GateError::MissingPermissionId => Some("missing permission id".to_string()),
            GateError::UnknownAction(s)
            | GateError::UnknownTool(s)
            | GateError::InvalidPayload(s)
            | GateError::InvalidRequest(s)
            | GateError::CommandNotAllowed(s)
            | GateError::PermissionRequestFailed(s)
            | GateError::InvalidResponse(s)
            | GateError::InvalidConfig(s) => {
                if s.is_empty() {
                    None
                } else {
                    Some(s.clone())
                }
            }
        }
    }

    /// True for rejections that happen before any network call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            GateError::MissingAction
                | GateError::UnknownAction(_)
                | GateError::UnknownTool(_)
                | GateError::InvalidPayload(_)
                | GateError::InvalidRequest(_)
                | GateError::CommandNotAllowed(_)
                | GateError::InvalidConfig(_)
        )
    }
}

/// Result type alias for gate operations
pub type GateResult<T> = Result<T, GateError>;
