//! Tool routing
//!
//! This module provides:
//! - `GatedTool` trait - Interface shared by the gated clients
//! - `ToolRouter` - Name-based routing of JSON invocations

mod registry;
mod tool;

pub use registry::ToolRouter;
pub use tool::GatedTool;
