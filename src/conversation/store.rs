//! Append-only conversation history with derived tool usage

use log::debug;

use crate::backend::ChatMessage;
use crate::domain::{Invocation, ToolDescriptor, Turn, TurnId, UsageSet};
use crate::error::{Result, SessionError};
use crate::registry::ToolRegistry;
use crate::trace;

/// Ordered turns of one conversation.
///
/// Turn ids come from a counter that survives `reset()`, so an id is never
/// handed out twice by the same store.
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
    usage: UsageSet,
    next_id: u64,
    generation: u64,
}

impl ConversationStore {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn; blank text is rejected
    pub fn append_user_turn(&mut self, text: &str) -> Result<TurnId> {
        if text.trim().is_empty() {
            return Err(SessionError::validation("Message must not be empty"));
        }

        let id = self.allocate_id();
        self.turns.push(Turn::user(id, text));
        debug!("Appended user {}", id);
        Ok(id)
    }

    /// Append an assistant turn with its invocations and normalized trace lines
    pub fn append_assistant_turn<I, S>(&mut self, text: &str, invocations: Vec<Invocation>, raw_trace_lines: I) -> TurnId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = self.allocate_id();
        let trace_entries = trace::normalize_all(raw_trace_lines);

        debug!(
            "Appended assistant {} with {} invocations, {} trace entries",
            id,
            invocations.len(),
            trace_entries.len()
        );
        self.turns.push(Turn::assistant(id, text, invocations, trace_entries));
        self.recompute_usage();
        id
    }

    /// Drop every turn and the usage set
    pub fn reset(&mut self) {
        self.turns.clear();
        self.usage = UsageSet::new();
        self.generation += 1;
        debug!("Conversation reset (generation {})", self.generation);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id() == id)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Tool names used so far in this conversation
    pub fn usage(&self) -> &UsageSet {
        &self.usage
    }

    /// Registered tools that were used, in registry display order
    pub fn used_tools<'a>(&self, registry: &'a ToolRegistry) -> Vec<&'a ToolDescriptor> {
        registry
            .descriptors()
            .iter()
            .filter(|tool| registry.is_used(&tool.name, &self.usage))
            .collect()
    }

    /// History in the shape the backend's chat endpoint expects
    pub fn history(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|turn| ChatMessage::new(turn.text(), turn.role()))
            .collect()
    }

    /// Bumped by every reset; requests compare it to detect a stale response
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn allocate_id(&mut self) -> TurnId {
        self.next_id += 1;
        TurnId::new(self.next_id)
    }

    fn recompute_usage(&mut self) {
        self.usage = UsageSet::from_invocations(self.turns.iter().flat_map(|turn| turn.invocations()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, ToolOrigin};

    fn call(id: &str, name: &str) -> Invocation {
        Invocation::new(id, name, "{}")
    }

    const NO_TRACE: [&str; 0] = [];

    #[test]
    fn test_hello_hi() {
        let mut store = ConversationStore::new();
        store.append_user_turn("hello").unwrap();
        store.append_assistant_turn("hi", Vec::new(), NO_TRACE);

        assert_eq!(store.len(), 2);
        assert!(store.usage().is_empty());
    }

    #[test]
    fn test_single_invocation_usage() {
        let mut store = ConversationStore::new();
        store.append_assistant_turn("sent", vec![call("1", "send_mail")], NO_TRACE);

        assert_eq!(store.usage().iter().collect::<Vec<_>>(), vec!["send_mail"]);
    }

    #[test]
    fn test_blank_user_turn_rejected() {
        let mut store = ConversationStore::new();
        for text in ["", "   ", "\n\t"] {
            let err = store.append_user_turn(text).unwrap_err();
            assert!(err.is_validation());
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_user_turn_keeps_text_and_has_no_attachments() {
        let mut store = ConversationStore::new();
        let id = store.append_user_turn("  take my photo ").unwrap();

        let turn = store.get(id).unwrap();
        assert_eq!(turn.text(), "  take my photo ");
        assert_eq!(turn.role(), Role::User);
        assert!(turn.invocations().is_empty());
        assert!(turn.trace_entries().is_empty());
    }

    #[test]
    fn test_usage_is_union_across_turns() {
        let batches = vec![
            vec![call("1", "take_a_picture"), call("2", "call_diffusion_model")],
            vec![],
            vec![call("3", "send_mail"), call("4", "take_a_picture")],
            vec![call("5", "post_slack_message")],
        ];

        let mut store = ConversationStore::new();
        let mut previous = UsageSet::new();
        for batch in &batches {
            store.append_assistant_turn("ok", batch.clone(), NO_TRACE);
            assert!(previous.is_subset(store.usage()), "usage must never shrink");
            previous = store.usage().clone();
        }

        let expected = UsageSet::from_invocations(batches.iter().flatten());
        assert_eq!(store.usage(), &expected);
        assert_eq!(store.usage().len(), 4);
    }

    #[test]
    fn test_trace_lines_normalized() {
        let mut store = ConversationStore::new();
        let id = store.append_assistant_turn(
            "done",
            Vec::new(),
            ["[DEBUG] [MainProcess(1):MainThread(2)] [pocket_logger] did X", "raw line"],
        );

        assert_eq!(store.get(id).unwrap().trace_entries(), &["did X".to_string(), "raw line".to_string()]);
    }

    #[test]
    fn test_turn_order_is_append_order() {
        let mut store = ConversationStore::new();
        let a = store.append_user_turn("one").unwrap();
        let b = store.append_assistant_turn("two", Vec::new(), NO_TRACE);
        let c = store.append_user_turn("three").unwrap();

        let ids: Vec<_> = store.turns().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![a, b, c]);
        assert!(a < b && b < c);
        assert_eq!(store.last().map(|t| t.text()), Some("three"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = ConversationStore::new();
        let before = store.append_user_turn("hello").unwrap();
        store.append_assistant_turn("hi", vec![call("1", "send_mail")], NO_TRACE);

        store.reset();
        assert!(store.is_empty());
        assert!(store.usage().is_empty());
        assert_eq!(store.generation(), 1);

        // ids keep counting after a reset
        let after = store.append_user_turn("again").unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_history_shape() {
        let mut store = ConversationStore::new();
        store.append_user_turn("hello").unwrap();
        store.append_assistant_turn("hi", Vec::new(), NO_TRACE);

        let history = store.history();
        assert_eq!(history[0], ChatMessage::new("hello", Role::User));
        assert_eq!(history[1], ChatMessage::new("hi", Role::Assistant));
    }

    #[test]
    fn test_used_tools_follow_registry_order() {
        let registry = ToolRegistry::from_descriptors(vec![
            ToolDescriptor::new("send_mail", "", ToolOrigin::Builtin),
            ToolDescriptor::new("joke", "", ToolOrigin::Custom),
            ToolDescriptor::new("take_a_picture", "", ToolOrigin::Builtin),
        ]);

        let mut store = ConversationStore::new();
        store.append_assistant_turn(
            "ok",
            vec![call("1", "take_a_picture"), call("2", "joke"), call("3", "unregistered")],
            NO_TRACE,
        );

        let used: Vec<_> = store.used_tools(&registry).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(used, vec!["joke", "take_a_picture"]);
    }
}
