//! The derived set of tool names used in the current conversation

use std::collections::BTreeSet;

use super::turn::Invocation;

/// Distinct tool names seen across all invocations of a conversation.
///
/// Derived state: the conversation store rebuilds it on every append and
/// clears it on reset. Iteration is in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSet {
    names: BTreeSet<String>,
}

impl UsageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from any sequence of invocations
    pub fn from_invocations<'a>(invocations: impl IntoIterator<Item = &'a Invocation>) -> Self {
        let mut set = Self::new();
        set.extend(invocations);
        set
    }

    pub(crate) fn extend<'a>(&mut self, invocations: impl IntoIterator<Item = &'a Invocation>) {
        self.names
            .extend(invocations.into_iter().map(|call| call.tool_name.clone()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when every name in `self` is also in `other`
    pub fn is_subset(&self, other: &UsageSet) -> bool {
        self.names.is_subset(&other.names)
    }
}
