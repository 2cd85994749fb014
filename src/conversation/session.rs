//! Chat session: one request/response cycle per user message

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use tokio::sync::RwLock;

use crate::backend::BackendGateway;
use crate::domain::{Turn, TurnId, UsageSet};
use crate::error::Result;
use crate::registry::ToolRegistry;

use super::store::ConversationStore;

/// Message shown when a chat request fails without a backend detail
pub const CHAT_FALLBACK_ERROR: &str = "Failed to get response";

/// Read-only view of the chat request state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatStatus {
    /// A chat request is in flight
    pub loading: bool,
    /// Message of the last failed send, cleared by the next send
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct StatusInner {
    in_flight: usize,
    error: Option<String>,
}

fn lock(status: &Mutex<StatusInner>) -> MutexGuard<'_, StatusInner> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counts one chat request as in flight until dropped, including when the
/// `send` future is cancelled mid-request
struct InFlight<'a> {
    status: &'a Mutex<StatusInner>,
}

impl<'a> InFlight<'a> {
    fn begin(status: &'a Mutex<StatusInner>) -> Self {
        let mut inner = lock(status);
        inner.in_flight += 1;
        inner.error = None;
        Self { status }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = lock(self.status);
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }
}

/// A conversation bound to a backend.
///
/// The user turn is appended before the request goes out, so it stays in the
/// history even when the request fails. The assistant turn is appended only
/// once a response arrives, and only if the conversation was not reset in
/// the meantime.
pub struct ChatSession {
    gateway: Arc<dyn BackendGateway>,
    store: RwLock<ConversationStore>,
    status: Mutex<StatusInner>,
}

impl ChatSession {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            gateway,
            store: RwLock::new(ConversationStore::new()),
            status: Mutex::new(StatusInner::default()),
        }
    }

    /// Send a user message and wait for the assistant's answer.
    ///
    /// Returns the id of the assistant turn, or `None` when the conversation
    /// was reset while the request was in flight and the answer was dropped.
    pub async fn send(&self, text: &str) -> Result<Option<TurnId>> {
        let (history, generation) = {
            let mut store = self.store.write().await;
            if let Err(err) = store.append_user_turn(text) {
                lock(&self.status).error = Some(err.user_message(CHAT_FALLBACK_ERROR));
                return Err(err);
            }
            (store.history(), store.generation())
        };

        let request = InFlight::begin(&self.status);
        debug!("Sending chat request with {} messages", history.len());
        let result = self.gateway.chat(&history).await;
        drop(request);

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                warn!("Chat request failed: {}", err);
                // checked under the store lock so reset() cannot slip in between
                let store = self.store.read().await;
                if store.generation() == generation {
                    lock(&self.status).error = Some(err.user_message(CHAT_FALLBACK_ERROR));
                } else {
                    info!("Not reporting failure of a request from before the reset");
                }
                return Err(err);
            }
        };

        let mut store = self.store.write().await;
        if store.generation() != generation {
            info!("Dropping chat response for a conversation that was reset");
            return Ok(None);
        }

        let id = store.append_assistant_turn(&reply.response, reply.invocations, &reply.debug_logs);
        Ok(Some(id))
    }

    /// Clear the conversation and any error
    pub async fn reset(&self) {
        let mut store = self.store.write().await;
        store.reset();
        lock(&self.status).error = None;
    }

    pub async fn status(&self) -> ChatStatus {
        let status = lock(&self.status);
        ChatStatus {
            loading: status.in_flight > 0,
            error: status.error.clone(),
        }
    }

    /// Copy of all turns in conversation order
    pub async fn turns(&self) -> Vec<Turn> {
        self.store.read().await.turns().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn usage(&self) -> UsageSet {
        self.store.read().await.usage().clone()
    }

    /// Names of registered tools used in this conversation, in registry order
    pub async fn used_tool_names(&self, registry: &ToolRegistry) -> Vec<String> {
        self.store
            .read()
            .await
            .used_tools(registry)
            .into_iter()
            .map(|tool| tool.name.clone())
            .collect()
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession").finish_non_exhaustive()
    }
}
