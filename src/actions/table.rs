//! Static action table
//!
//! Each named action maps to one method/path pair and a flag saying whether
//! it needs a grant. The table is plain data; the only per-action logic is
//! [`validate_payload`].

use reqwest::Method;
use serde_json::{Map, Value};

use crate::core::{GateError, GateResult};
use crate::permissions::{CapabilityKey, Scope};

/// Action whose `cmd` is checked against [`ALLOWED_COMMANDS`]
pub const SHELL_EXEC_ACTION: &str = "shell.exec";

/// Executables `shell.exec` may run
pub const ALLOWED_COMMANDS: &[&str] = &["python", "pip", "uv", "curl"];

/// Payload field carrying the grant id to a gated endpoint
pub const PERMISSION_ID_FIELD: &str = "permission_id";

/// Longest default grant detail, in characters
pub const MAX_DETAIL_CHARS: usize = 240;

const SSH_PIN_PREFIX: &str = "ssh.pin.";
const SECRET_KEY_MARKERS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "passphrase",
    "credential",
    "authorization",
];
const REDACTED: &str = "***";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_method(&self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    /// GET requests go out without a body
    pub fn sends_body(&self) -> bool {
        *self == HttpMethod::Post
    }
}

/// One entry of the action table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub requires_permission: bool,
}

const fn action(
    name: &'static str,
    method: HttpMethod,
    path: &'static str,
    requires_permission: bool,
) -> ActionSpec {
    ActionSpec {
        name,
        method,
        path,
        requires_permission,
    }
}

/// Every action the dispatcher knows
pub const ACTIONS: &[ActionSpec] = &[
    action("python.status", HttpMethod::Get, "/python/status", false),
    action("python.restart", HttpMethod::Post, "/python/restart", true),
    action("ssh.status", HttpMethod::Get, "/ssh/status", false),
    action("ssh.config", HttpMethod::Post, "/ssh/config", true),
    action("ssh.pin.status", HttpMethod::Get, "/ssh/pin/status", false),
    action("ssh.pin.start", HttpMethod::Post, "/ssh/pin/start", true),
    action("ssh.pin.stop", HttpMethod::Post, "/ssh/pin/stop", true),
    action(SHELL_EXEC_ACTION, HttpMethod::Post, "/shell/exec", true),
    action("brain.memory.get", HttpMethod::Get, "/brain/memory", false),
    action("brain.memory.set", HttpMethod::Post, "/brain/memory", true),
];

/// Find an action by (already trimmed) name
pub fn lookup(name: &str) -> Option<&'static ActionSpec> {
    ACTIONS.iter().find(|spec| spec.name == name)
}

/// Check the payload before anything touches the network
pub fn validate_payload<'a>(
    spec: &ActionSpec,
    payload: &'a Value,
) -> GateResult<&'a Map<String, Value>> {
    let object = payload
        .as_object()
        .ok_or_else(|| GateError::InvalidPayload("payload must be an object".to_string()))?;

    if spec.name == SHELL_EXEC_ACTION {
        let cmd = object.get("cmd").and_then(Value::as_str).unwrap_or_default();
        if !ALLOWED_COMMANDS.contains(&cmd) {
            return Err(GateError::CommandNotAllowed(cmd.to_string()));
        }
    }

    Ok(object)
}

/// Capability key the grant for `action` is requested under
pub fn capability_for(action: &str, dispatcher_tool: &str) -> CapabilityKey {
    if action.starts_with(SSH_PIN_PREFIX) {
        CapabilityKey::new("ssh_pin", "ssh.pin", Scope::Session)
    } else {
        CapabilityKey::new(dispatcher_tool, dispatcher_tool, Scope::Persistent)
    }
}

/// `"<action>: <payload>"` with secret-looking values masked, capped at
/// [`MAX_DETAIL_CHARS`] characters
pub fn default_detail(action: &str, payload: &Value) -> String {
    let rendered = serde_json::to_string(&redact(payload)).unwrap_or_default();
    format!("{}: {}", action, rendered)
        .chars()
        .take(MAX_DETAIL_CHARS)
        .collect()
}

fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if looks_secret(k) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn looks_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_KEY_MARKERS.iter().any(|marker| key.contains(marker))
}
