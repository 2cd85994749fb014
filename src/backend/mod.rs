//! Backend Gateway - the remote service that runs the model and owns tool code
//!
//! This module provides:
//! - Wire types for the backend's JSON endpoints
//! - BackendGateway trait for API abstraction
//! - HttpGateway implementation over reqwest
//! - MockGateway for tests and offline use

pub mod gateway;
pub mod http;
pub mod messages;
pub mod mock;

pub use gateway::BackendGateway;
pub use http::{DEFAULT_BASE_URL, HttpGateway, HttpGatewayConfig};
pub use messages::{AddToolReply, ChatMessage, ChatReply, ToolListing};
pub use mock::{Endpoint, MockFailure, MockGateway};
