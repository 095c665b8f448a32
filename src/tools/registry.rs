//! Tool router
//!
//! Holds the gated clients by name and routes JSON invocations to them.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::tool::GatedTool;
use crate::actions::{ActionDispatcher, CloudActionClient};
use crate::config::GateConfig;
use crate::core::{ActionOutcome, GateError, GateResult};

/// Routes invocations to registered tools
pub struct ToolRouter {
    tools: HashMap<String, Arc<dyn GatedTool>>,
}

impl ToolRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Router with the device dispatcher and the cloud client registered
    pub fn from_config(config: &GateConfig) -> GateResult<Self> {
        let mut router = Self::new();
        router.register(ActionDispatcher::new(config)?);
        router.register(CloudActionClient::new(config)?);
        Ok(router)
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: GatedTool + 'static>(&mut self, tool: T) {
        self.register_shared(Arc::new(tool));
    }

    /// Register an already shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn GatedTool>) {
        let name = tool.name().to_string();
        tracing::info!("Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn GatedTool>> {
        self.tools.get(name).cloned()
    }

    /// Invoke a tool by name; unregistered names yield `unknown_tool`
    pub async fn invoke(&self, name: &str, args: &Value) -> ActionOutcome {
        let Some(tool) = self.tools.get(name.trim()) else {
            tracing::warn!("Unknown tool: {}", name);
            return ActionOutcome::Rejected(GateError::UnknownTool(name.trim().to_string()));
        };

        tracing::info!("Invoking tool: {}", name);
        tool.run(args).await
    }

    /// Registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}
