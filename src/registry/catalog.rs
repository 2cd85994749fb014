//! Tool registry: the client-side cache of the backend's tool listing
//!
//! Holds descriptors in display order and provides lookup by name.

use std::collections::HashMap;

use log::debug;

use crate::domain::{ToolDescriptor, UsageSet};

/// Registry of known tools, keyed by name.
///
/// Display order puts user-supplied tools (custom, generated, git) before
/// builtin ones; within each group the listing order is kept.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a listing
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        let mut registry = Self::new();
        registry.replace_all(descriptors);
        registry
    }

    /// Replace the whole contents with `descriptors`.
    ///
    /// A name that appears twice keeps the position of its first occurrence
    /// and the contents of its last one.
    pub fn replace_all(&mut self, descriptors: impl IntoIterator<Item = ToolDescriptor>) {
        let mut unique: Vec<ToolDescriptor> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for descriptor in descriptors {
            match seen.get(&descriptor.name) {
                Some(&pos) => {
                    debug!("Tool '{}' listed twice, keeping the later entry", descriptor.name);
                    unique[pos] = descriptor;
                }
                None => {
                    seen.insert(descriptor.name.clone(), unique.len());
                    unique.push(descriptor);
                }
            }
        }

        // sort_by_key is stable, so listing order survives within each group
        unique.sort_by_key(|tool| tool.origin.is_builtin());

        self.index = unique
            .iter()
            .enumerate()
            .map(|(pos, tool)| (tool.name.clone(), pos))
            .collect();
        self.tools = unique;

        debug!("Registry now holds {} tools", self.tools.len());
    }

    /// Get a tool by exact name
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&pos| &self.tools[pos])
    }

    /// Whether `name` appears in the conversation's usage set
    pub fn is_used(&self, name: &str, usage: &UsageSet) -> bool {
        usage.contains(name)
    }

    /// All descriptors in display order
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Tool names in display order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
