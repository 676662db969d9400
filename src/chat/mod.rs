mod events;
mod message;
mod sse;

pub use events::TranscriptEvent;
pub use message::{Conversation, Message, MessageRole};
pub use sse::StreamPayload;

pub(crate) use sse::sse_token_stream;
