mod controller;
mod history;
mod id_cache;

pub use controller::{ConversationController, SendOutcome, SendPhase};
pub use history::ConversationHistory;
pub use id_cache::ConversationIdCache;
