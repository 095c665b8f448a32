//! Gated tool trait
//!
//! Every client that can be invoked by name through the router implements
//! this trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::ActionOutcome;

/// A named entry point taking JSON arguments
///
/// Implementations never fail past a single call: problems come back as an
/// [`ActionOutcome`].
#[async_trait]
pub trait GatedTool: Send + Sync {
    /// Name the tool is registered under
    fn name(&self) -> &str;

    /// One-line description shown by the CLI
    fn description(&self) -> &str;

    /// Run the tool with the given arguments
    async fn run(&self, args: &Value) -> ActionOutcome;
}
