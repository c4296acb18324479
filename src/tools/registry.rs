use std::collections::HashMap;
use std::sync::Arc;

use crate::core::tool::Tool;

/// Name-keyed catalogue of tools, enumerable in registration order.
///
/// Populated once at startup and thereafter only read; callers may rely on
/// `get_all`/`names` matching the order tools were registered in.
#[derive(Default)]
pub struct ToolRegistry {
    ordered: Vec<Arc<dyn Tool>>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert tools, preserving order. The first registration of a name
    /// wins; later attempts are skipped with a warning, never an error.
    pub fn register<I>(&mut self, tools: I)
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        for tool in tools {
            if self.by_name.contains_key(tool.name()) {
                tracing::warn!(tool = tool.name(), "tool already registered, skipping");
                continue;
            }
            tracing::debug!(tool = tool.name(), "registered tool");
            self.by_name.insert(tool.name(), self.ordered.len());
            self.ordered.push(tool);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| &self.ordered[i])
    }

    pub fn get_all(&self) -> &[Arc<dyn Tool>] {
        &self.ordered
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.ordered.len()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.ordered.iter().map(|t| t.name()).collect()
    }
}
