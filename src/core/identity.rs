//! Caller identity
//!
//! The identity tag travels with every outbound request as a header and is
//! embedded in grant requests. It is resolved once from the environment and
//! can be replaced at any time through [`Identity::set`].

use std::sync::{PoisonError, RwLock};

/// Identity used when nothing else is configured
pub const DEFAULT_IDENTITY: &str = "default";

/// Shared, mutable identity tag
#[derive(Debug)]
pub struct Identity {
    value: RwLock<String>,
}

impl Identity {
    /// Create an identity from an explicit value (blank means default)
    pub fn new(value: impl AsRef<str>) -> Self {
        Self {
            value: RwLock::new(normalize(value.as_ref())),
        }
    }

    /// Resolve the identity from the first non-blank environment variable
    pub fn from_env<S: AsRef<str>>(vars: &[S]) -> Self {
        let found = vars
            .iter()
            .filter_map(|name| std::env::var(name.as_ref()).ok())
            .find(|v| !v.trim().is_empty());

        match found {
            Some(value) => Self::new(value),
            None => Self::default(),
        }
    }

    /// Current identity
    pub fn get(&self) -> String {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the identity (blank resets to the default)
    pub fn set(&self, value: impl AsRef<str>) {
        let value = normalize(value.as_ref());
        tracing::info!("Identity set to {}", value);
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY)
    }
}

fn normalize(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        DEFAULT_IDENTITY.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_identity_is_default() {
        assert_eq!(Identity::new("").get(), "default");
        assert_eq!(Identity::new("   ").get(), "default");
        assert_eq!(Identity::new("  alice ").get(), "alice");
    }

    #[test]
    fn test_set_identity() {
        let identity = Identity::default();
        identity.set("session-42");
        assert_eq!(identity.get(), "session-42");

        identity.set("");
        assert_eq!(identity.get(), "default");
    }

    #[test]
    fn test_from_env_order() {
        std::env::set_var("APPROVAL_GATE_TEST_ID_PRIMARY", "  ");
        std::env::set_var("APPROVAL_GATE_TEST_ID_FALLBACK", "sess-7");

        let identity = Identity::from_env(&[
            "APPROVAL_GATE_TEST_ID_MISSING",
            "APPROVAL_GATE_TEST_ID_PRIMARY",
            "APPROVAL_GATE_TEST_ID_FALLBACK",
        ]);
        assert_eq!(identity.get(), "sess-7");
    }

    #[test]
    fn test_from_env_nothing_set() {
        let identity = Identity::from_env(&["APPROVAL_GATE_TEST_ID_NEVER_SET"]);
        assert_eq!(identity.get(), DEFAULT_IDENTITY);
    }
}
