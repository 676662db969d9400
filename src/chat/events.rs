use super::message::Message;

/// Transcript change notifications for a rendering layer.
///
/// Delivered over a `tokio::sync::broadcast` channel obtained from
/// [`ConversationController::subscribe`](crate::session::ConversationController::subscribe).
/// A renderer re-draws the message identified by `id` on `Delta` and
/// `Finalized`, and re-draws the whole list on the other variants.
#[derive(Debug, Clone)]
pub enum TranscriptEvent {
    /// A new message was appended to the transcript.
    Appended { message: Message },
    /// A token was appended to the streaming message's content.
    Delta { id: String, token: String },
    /// The streaming message completed and is now immutable.
    Finalized { id: String },
    /// A message was removed (failed assistant turn).
    Removed { id: String },
    /// The transcript was replaced wholesale.
    Cleared,
}
