//! Caller-facing result of a gated action
//!
//! Every invocation ends in exactly one [`ActionOutcome`]. Nothing is raised
//! past the boundary of a single call; JSON callers get the shape produced
//! by [`ActionOutcome::to_json`].

use serde_json::{json, Value};

use super::error::GateError;
use crate::permissions::GrantRecord;
use crate::transport::Exchange;

/// Result of dispatching a named action or running a cloud request
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action ran and returned a body
    Ok {
        http_status: Option<u16>,
        body: Value,
    },
    /// The action endpoint answered with a non-2xx status
    HttpError { status: u16, body: Value },
    /// The network round-trip failed
    TransportError(String),
    /// Approval is pending; the caller drives it using this grant record
    PermissionRequired(GrantRecord),
    /// A human rejected the grant
    Denied,
    /// No decision arrived before the deadline
    Timeout,
    /// Rejected locally or by a failed permission step
    Rejected(GateError),
}

impl ActionOutcome {
    /// Map a raw exchange onto an outcome
    pub fn from_exchange(exchange: Exchange) -> Self {
        match exchange {
            Exchange::Ok { http_status, body } => ActionOutcome::Ok {
                http_status: Some(http_status),
                body,
            },
            Exchange::HttpError { http_status, body } => ActionOutcome::HttpError {
                status: http_status,
                body,
            },
            Exchange::TransportError { detail } => ActionOutcome::TransportError(detail),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ActionOutcome::Ok { .. })
    }

    pub fn is_permission_required(&self) -> bool {
        matches!(self, ActionOutcome::PermissionRequired(_))
    }

    /// Short label used in logs and the CLI
    pub fn label(&self) -> &'static str {
        match self {
            ActionOutcome::Ok { .. } => "ok",
            ActionOutcome::HttpError { .. } => "http_error",
            ActionOutcome::TransportError(_) => "transport_error",
            ActionOutcome::PermissionRequired(_) => "permission_required",
            ActionOutcome::Denied => "permission_denied",
            ActionOutcome::Timeout => "permission_timeout",
            ActionOutcome::Rejected(e) => e.code(),
        }
    }

    /// Render the JSON shape callers of the tool interface expect
    pub fn to_json(&self) -> Value {
        match self {
            ActionOutcome::Ok { body, .. } => body.clone(),
            ActionOutcome::HttpError { status, body } => json!({
                "status": "http_error",
                "http_status": status,
                "body": body,
            }),
            ActionOutcome::TransportError(detail) => json!({
                "status": "error",
                "error": "transport_error",
                "detail": detail,
            }),
            ActionOutcome::PermissionRequired(record) => json!({
                "status": "permission_required",
                "request": record.to_value(),
            }),
            ActionOutcome::Denied => json!({"status": "error", "error": "permission_denied"}),
            ActionOutcome::Timeout => json!({"status": "error", "error": "permission_timeout"}),
            ActionOutcome::Rejected(err) => {
                let mut out = json!({"status": "error", "error": err.code()});
                if let Some(detail) = err.detail() {
                    out["detail"] = Value::String(detail);
                }
                out
            }
        }
    }
}

impl From<GateError> for ActionOutcome {
    fn from(err: GateError) -> Self {
        ActionOutcome::Rejected(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_renders_body_verbatim() {
        let outcome = ActionOutcome::Ok {
            http_status: Some(200),
            body: json!({"status": "ok", "value": [1, 2]}),
        };
        assert_eq!(outcome.to_json(), json!({"status": "ok", "value": [1, 2]}));
        assert!(outcome.is_ok());
    }

    #[test]
    fn test_terminal_permission_shapes() {
        assert_eq!(
            ActionOutcome::Denied.to_json(),
            json!({"status": "error", "error": "permission_denied"})
        );
        assert_eq!(
            ActionOutcome::Timeout.to_json(),
            json!({"status": "error", "error": "permission_timeout"})
        );
    }

    #[test]
    fn test_permission_required_carries_record() {
        let record = GrantRecord::from_value(&json!({"id": "g-9", "status": "requested"})).unwrap();
        let outcome = ActionOutcome::PermissionRequired(record);

        assert!(outcome.is_permission_required());
        assert_eq!(
            outcome.to_json(),
            json!({"status": "permission_required", "request": {"id": "g-9", "status": "requested"}})
        );
    }

    #[test]
    fn test_rejected_shape() {
        let outcome: ActionOutcome = GateError::MissingAction.into();
        assert_eq!(outcome.to_json(), json!({"status": "error", "error": "missing_action"}));

        let outcome: ActionOutcome = GateError::MissingPermissionId.into();
        assert_eq!(
            outcome.to_json(),
            json!({"status": "error", "error": "permission_required", "detail": "missing permission id"})
        );
    }

    #[test]
    fn test_from_exchange() {
        let outcome = ActionOutcome::from_exchange(Exchange::HttpError {
            http_status: 500,
            body: json!({"raw": "boom"}),
        });
        assert_eq!(
            outcome.to_json(),
            json!({"status": "http_error", "http_status": 500, "body": {"raw": "boom"}})
        );

        let outcome = ActionOutcome::from_exchange(Exchange::TransportError {
            detail: "connection refused".into(),
        });
        assert_eq!(outcome.label(), "transport_error");
    }
}
