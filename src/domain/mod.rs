//! Domain types for toolsession
//!
//! - Turn / Invocation: the append-only conversation record
//! - ToolDescriptor / ToolOrigin: entries of the tool registry
//! - UsageSet: tool names used so far, derived from the turns

pub mod tool;
pub mod turn;
pub mod usage;

pub use tool::{ToolDescriptor, ToolOrigin, ToolParameter};
pub use turn::{Invocation, Role, Turn, TurnId};
pub use usage::UsageSet;
