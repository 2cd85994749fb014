//! Conversation turns and the tool invocations attached to them

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a turn, assigned from a monotonically increasing sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(u64);

impl TurnId {
    pub(crate) fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One tool call the backend reported for an assistant turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub id: String,
    pub tool_name: String,
    /// Opaque structured text; compared and displayed, never parsed
    pub arguments_payload: String,
}

impl Invocation {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments_payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments_payload: arguments_payload.into(),
        }
    }

    /// Tool name with underscores shown as spaces
    pub fn display_name(&self) -> String {
        self.tool_name.replace('_', " ")
    }
}

/// One message unit in the conversation.
///
/// Turns are only built by the conversation store and cannot be changed once
/// appended, so all fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    id: TurnId,
    role: Role,
    text: String,
    invocations: Vec<Invocation>,
    trace_entries: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub(crate) fn user(id: TurnId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
            invocations: Vec::new(),
            trace_entries: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn assistant(
        id: TurnId,
        text: impl Into<String>,
        invocations: Vec<Invocation>,
        trace_entries: Vec<String>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            text: text.into(),
            invocations,
            trace_entries,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    pub fn trace_entries(&self) -> &[String] {
        &self.trace_entries
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
