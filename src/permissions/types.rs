//! Grant data model
//!
//! - `Scope`: lifetime hint sent to the authority
//! - `CapabilityKey`: what a grant authorizes, used as the cache key
//! - `GrantStatus`: remote and locally synthesized grant states
//! - `GrantRecord`: a grant object as the authority returns it

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Grant lifetime hint. Not enforced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Valid for the current session
    Session,
    /// Valid until revoked
    Persistent,
    /// Valid for a single use
    Once,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Session => "session",
            Scope::Persistent => "persistent",
            Scope::Once => "once",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies what is being gated: `(tool, capability, scope)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityKey {
    pub tool: String,
    pub capability: String,
    pub scope: Scope,
}

impl CapabilityKey {
    pub fn new(tool: impl Into<String>, capability: impl Into<String>, scope: Scope) -> Self {
        Self {
            tool: tool.into(),
            capability: capability.into(),
            scope,
        }
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.tool, self.capability, self.scope)
    }
}

/// Status of a grant.
///
/// The authority only ever reports `requested`, `approved`, `denied` and
/// `used`. `timeout` and `invalid` are produced locally by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Requested,
    Approved,
    Denied,
    Used,
    Timeout,
    Invalid,
}

impl GrantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantStatus::Requested => "requested",
            GrantStatus::Approved => "approved",
            GrantStatus::Denied => "denied",
            GrantStatus::Used => "used",
            GrantStatus::Timeout => "timeout",
            GrantStatus::Invalid => "invalid",
        }
    }

    /// True for statuses that end a remote wait
    pub fn is_remote_terminal(&self) -> bool {
        matches!(
            self,
            GrantStatus::Approved | GrantStatus::Denied | GrantStatus::Used
        )
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "requested" => Ok(GrantStatus::Requested),
            "approved" => Ok(GrantStatus::Approved),
            "denied" => Ok(GrantStatus::Denied),
            "used" => Ok(GrantStatus::Used),
            "timeout" => Ok(GrantStatus::Timeout),
            "invalid" => Ok(GrantStatus::Invalid),
            other => Err(format!("unknown grant status: {}", other)),
        }
    }
}

/// A grant object as returned by the authority.
///
/// Fields beyond `id` and `status` are kept untouched in `extra` so the
/// record can be handed back to callers verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub status: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GrantRecord {
    /// Record for a grant already known to be approved
    pub fn approved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: GrantStatus::Approved.as_str().to_string(),
            extra: Map::new(),
        }
    }

    /// Parse a record from a JSON body. Only objects qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Parsed status, `None` when missing or unrecognized
    pub fn grant_status(&self) -> Option<GrantStatus> {
        self.status.parse().ok()
    }

    pub fn is_approved(&self) -> bool {
        self.grant_status() == Some(GrantStatus::Approved)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Accept strings and numbers; anything else reads as empty
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
