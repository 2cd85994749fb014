//! The contract of the backend service

use async_trait::async_trait;

use crate::error::Result;

use super::messages::{AddToolReply, ChatMessage, ChatReply, ToolListing};

/// Remote backend that runs the model, executes tools and stores tool code.
///
/// Every method is one request. Non-success responses come back as
/// `SessionError::Request` carrying the backend's `detail`, network and
/// decoding failures as `SessionError::Transport`.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// `GET tools`: the authoritative tool listing
    async fn list_tools(&self) -> Result<Vec<ToolListing>>;

    /// `POST chat` with the full conversation history
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatReply>;

    /// `POST tools/add`: register a tool from pasted source
    async fn add_tool(&self, code: &str) -> Result<AddToolReply>;

    /// `POST tools/generate`: produce tool source from a description
    async fn generate_tool(&self, prompt: &str) -> Result<String>;

    /// `POST tools/from-git`: register a tool from a repository file URL
    async fn import_from_git(&self, url: &str) -> Result<AddToolReply>;

    /// `GET tools/{name}/code`: source text of a registered tool
    async fn tool_source(&self, name: &str) -> Result<String>;
}
