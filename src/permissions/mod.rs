//! Permission grant choreography
//!
//! This module drives the request/wait side of remote human approval:
//! - **Cache**: process-local map from capability key to last known grant id
//! - **Broker**: reuse an approved grant or request a new one
//! - **Poller**: wait (bounded) for a human decision on one grant
//!
//! ## Lifecycle
//!
//! A grant is requested on first use of a capability key, or whenever the
//! cached one no longer reads as `approved`. The poller follows it to a
//! terminal status. Nothing is ever revoked remotely from here.
//!
//! ## Example
//!
//! ```rust,ignore
//! use approval_gate::permissions::{CapabilityKey, Obtained, Scope};
//!
//! let key = CapabilityKey::new("device_api", "device_api", Scope::Persistent);
//! match broker.obtain(&key, "shell.exec: {\"cmd\":\"pip\"}").await? {
//!     Obtained::Approved(grant) => { /* attach grant.id */ }
//!     Obtained::Pending(request) => {
//!         let outcome = poller.wait(&request.id, DEFAULT_WAIT_TIMEOUT).await;
//!     }
//! }
//! ```

mod authority;
mod broker;
mod cache;
mod poller;
mod types;

pub use authority::{grant_path, GRANT_REQUEST_PATH};
pub use broker::{Obtained, PermissionBroker};
pub use cache::GrantCache;
pub use poller::{
    PermissionPoller, WaitOutcome, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT, MIN_WAIT_TIMEOUT,
};
pub use types::{CapabilityKey, GrantRecord, GrantStatus, Scope};
