//! Gated action clients
//!
//! - `ActionDispatcher` - named actions from a static table; defers approval to the caller
//! - `CloudActionClient` - arbitrary requests through the cloud proxy; waits for approval
//! - `table` - the action table and its payload policy

mod cloud;
mod dispatcher;
pub mod table;

pub use cloud::{CloudActionClient, CLOUD_REQUEST_PATH, CLOUD_TOOL_NAME};
pub use dispatcher::ActionDispatcher;
pub use table::{ActionSpec, HttpMethod, ACTIONS, ALLOWED_COMMANDS, PERMISSION_ID_FIELD};
