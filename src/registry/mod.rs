//! Tool registry and tool display helpers

mod catalog;
mod icon;

pub use catalog::ToolRegistry;
pub use icon::ToolIcon;
