//! Core types shared by every component
//!
//! - `GateError` - Error taxonomy with stable wire codes
//! - `ActionOutcome` - The single result shape returned to callers
//! - `Identity` - Caller identity attached to outbound requests

pub mod error;
pub mod identity;
pub mod outcome;

pub use error::{GateError, GateResult};
pub use identity::{Identity, DEFAULT_IDENTITY};
pub use outcome::ActionOutcome;
