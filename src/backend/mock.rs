//! In-memory backend for tests and offline use
//!
//! Behaves like the real backend closely enough to drive the session and
//! the ingestion pipeline: pasted code registers its first `def`, git imports
//! register the last URL segment, chat answers from a script or echoes.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::Role;
use crate::error::{Result, SessionError};

use super::gateway::BackendGateway;
use super::messages::{AddToolReply, ChatMessage, ChatReply, ToolListing};

static DEF_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").expect("valid def regex"));

/// Backend endpoint, used to script failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListTools,
    Chat,
    AddTool,
    GenerateTool,
    ImportFromGit,
    ToolSource,
}

/// A scripted failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Non-success status with an optional `detail`
    Request { status: u16, detail: Option<String> },
    /// Connection-level failure
    Transport(String),
}

impl MockFailure {
    pub fn detail(status: u16, detail: impl Into<String>) -> Self {
        Self::Request {
            status,
            detail: Some(detail.into()),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Request { status, detail: None }
    }

    fn into_error(self) -> SessionError {
        match self {
            MockFailure::Request { status, detail } => SessionError::Request { status, detail },
            MockFailure::Transport(message) => SessionError::Transport(message),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    tools: Vec<ToolListing>,
    sources: HashMap<String, String>,
    chat_replies: VecDeque<ChatReply>,
    generated: VecDeque<String>,
    failures: HashMap<Endpoint, VecDeque<MockFailure>>,
    delays: HashMap<Endpoint, VecDeque<Duration>>,
    calls: HashMap<Endpoint, usize>,
    last_history: Vec<ChatMessage>,
}

/// In-memory [`BackendGateway`]
#[derive(Debug, Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
    latency: HashMap<Endpoint, Duration>,
}

impl MockGateway {
    /// Create a backend with no tools
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend listing the usual builtin tools
    pub fn with_builtin_tools() -> Self {
        let mock = Self::new();
        for (name, description) in [
            ("send_mail", "Send an email"),
            ("take_a_picture", "Take a picture with the webcam"),
            ("call_diffusion_model", "Transform an image with a diffusion model"),
            ("get_slack_messages", "Read recent Slack messages"),
        ] {
            mock.add_listing(ToolListing::new(name, description), format!("def {}():\n    ...", name));
        }
        mock
    }

    /// Delay every call to `endpoint`
    pub fn with_latency(mut self, endpoint: Endpoint, delay: Duration) -> Self {
        self.latency.insert(endpoint, delay);
        self
    }

    /// Add a tool to the listing together with its source
    pub fn add_listing(&self, listing: ToolListing, source: impl Into<String>) {
        let mut state = self.lock();
        state.sources.insert(listing.name.clone(), source.into());
        state.tools.retain(|t| t.name != listing.name);
        state.tools.push(listing);
    }

    /// Queue the reply for the next chat request
    pub fn push_chat_reply(&self, reply: ChatReply) {
        self.lock().chat_replies.push_back(reply);
    }

    /// Queue the code returned by the next generate request
    pub fn push_generated_code(&self, code: impl Into<String>) {
        self.lock().generated.push_back(code.into());
    }

    /// Make the next call to `endpoint` fail
    pub fn fail_next(&self, endpoint: Endpoint, failure: MockFailure) {
        self.lock().failures.entry(endpoint).or_default().push_back(failure);
    }

    /// Delay only the next call to `endpoint`, on top of any fixed latency
    pub fn delay_next(&self, endpoint: Endpoint, delay: Duration) {
        self.lock().delays.entry(endpoint).or_default().push_back(delay);
    }

    /// Number of calls made to `endpoint`
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// History sent with the most recent chat request
    pub fn last_history(&self) -> Vec<ChatMessage> {
        self.lock().last_history.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call, wait out any latency, then fail if a failure is queued
    async fn enter(&self, endpoint: Endpoint) -> Result<()> {
        let (failure, once) = {
            let mut state = self.lock();
            *state.calls.entry(endpoint).or_insert(0) += 1;
            (
                state.failures.get_mut(&endpoint).and_then(VecDeque::pop_front),
                state.delays.get_mut(&endpoint).and_then(VecDeque::pop_front),
            )
        };

        let delay = self.latency.get(&endpoint).copied().unwrap_or_default() + once.unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    fn register(&self, listing: ToolListing, source: String) -> AddToolReply {
        let name = listing.name.clone();
        self.add_listing(listing, source);
        AddToolReply {
            message: format!("Successfully added tool: {}", name),
            name,
        }
    }
}

#[async_trait]
impl BackendGateway for MockGateway {
    async fn list_tools(&self) -> Result<Vec<ToolListing>> {
        self.enter(Endpoint::ListTools).await?;
        Ok(self.lock().tools.clone())
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatReply> {
        self.enter(Endpoint::Chat).await?;
        let mut state = self.lock();
        state.last_history = messages.to_vec();

        if let Some(reply) = state.chat_replies.pop_front() {
            return Ok(reply);
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role != Some(Role::Assistant))
            .map(|m| m.text.as_str())
            .unwrap_or_default();
        Ok(ChatReply::text(format!("echo: {}", last_user)))
    }

    async fn add_tool(&self, code: &str) -> Result<AddToolReply> {
        self.enter(Endpoint::AddTool).await?;

        let name = DEF_NAME
            .captures(code)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| SessionError::Request {
                status: 400,
                detail: Some("Failed to add tool: No function_tool found in the code.".to_string()),
            })?;

        let listing = ToolListing::new(&name, format!("Custom tool {}", name)).custom();
        Ok(self.register(listing, code.to_string()))
    }

    async fn generate_tool(&self, prompt: &str) -> Result<String> {
        self.enter(Endpoint::GenerateTool).await?;

        if let Some(code) = self.lock().generated.pop_front() {
            return Ok(code);
        }

        Ok(format!(
            "@function_tool\ndef generated_tool(query: str) -> str:\n    \"\"\"{}\"\"\"\n    return query",
            prompt.trim()
        ))
    }

    async fn import_from_git(&self, url: &str) -> Result<AddToolReply> {
        self.enter(Endpoint::ImportFromGit).await?;

        if !url.starts_with("https://github.com/") {
            return Err(SessionError::Request {
                status: 400,
                detail: Some("Invalid GitHub URL".to_string()),
            });
        }

        let name = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url).to_string();
        let listing = ToolListing::new(&name, format!("GitHub tool from: {}", url)).github(url);
        Ok(self.register(listing, String::new()))
    }

    async fn tool_source(&self, name: &str) -> Result<String> {
        self.enter(Endpoint::ToolSource).await?;

        self.lock()
            .sources
            .get(name)
            .cloned()
            .ok_or_else(|| SessionError::Request {
                status: 404,
                detail: Some(format!("Tool '{}' not found", name)),
            })
    }
}
