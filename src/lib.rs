//! Toolsession - client-side session manager for a tool-augmented chat agent
//!
//! Keeps the conversation with the agent backend, tracks which tools the
//! agent invoked, normalizes its diagnostic trace output, and manages the
//! three ways new tools are ingested (pasted source, generated from a
//! description, imported from a repository).

pub mod backend;
pub mod conversation;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod registry;
pub mod trace;

pub use backend::{BackendGateway, HttpGateway, HttpGatewayConfig, MockGateway};
pub use conversation::{ChatSession, ChatStatus, ConversationStore};
pub use domain::{Invocation, Role, ToolDescriptor, ToolOrigin, Turn, TurnId, UsageSet};
pub use error::{Result, SessionError};
pub use ingest::{PathwayKind, PathwaySnapshot, PathwayStatus, ToolIngestionPipeline, ToolSource};
pub use registry::{ToolIcon, ToolRegistry};
