//! Client-side permission-grant protocol
//!
//! Gates sensitive remote actions behind an out-of-band human approval.
//! A caller asks for an action; when the action is gated the client obtains
//! a grant from the permission authority, waits (bounded) for a human to
//! decide, and retries the action carrying the grant id.
//!
//! - [`actions::ActionDispatcher`] - named actions, approval deferred to the caller
//! - [`actions::CloudActionClient`] - proxied requests, approval awaited in-line
//! - [`permissions`] - grant cache, broker and poller
//! - [`tools::ToolRouter`] - name-based routing of JSON invocations

pub mod actions;
pub mod config;
pub mod core;
pub mod permissions;
pub mod tools;
pub mod transport;

// Optional components
pub mod cli;
pub mod logging;

pub use actions::{ActionDispatcher, CloudActionClient};
pub use config::GateConfig;
pub use core::{ActionOutcome, GateError, GateResult, Identity};
pub use tools::{GatedTool, ToolRouter};
