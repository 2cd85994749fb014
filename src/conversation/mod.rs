//! Conversation history and the chat session that feeds it

mod session;
mod store;

pub use session::{CHAT_FALLBACK_ERROR, ChatSession, ChatStatus};
pub use store::ConversationStore;
