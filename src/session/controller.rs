use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentType;
use crate::api::ChatTransport;
use crate::chat::{Conversation, Message, TranscriptEvent};
use crate::error::ChatError;
use crate::storage::ConversationStore;

use super::history::ConversationHistory;
use super::id_cache::ConversationIdCache;

const EVENT_CAPACITY: usize = 128;

/// Result of a [`ConversationController::send_message`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant turn streamed to completion and was persisted.
    Completed,
    /// The text was empty after trimming; nothing happened.
    Ignored,
}

/// Phase of the current (or most recent) send operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    AwaitingConversationId,
    Sending,
    Streaming,
    Finalized,
    Failed,
}

/// Drives one conversation against the backend.
///
/// Owns the transcript outright: every mutation happens inside a method
/// taking `&mut self`, so sends are serialized by the borrow checker and
/// streamed tokens are applied strictly in arrival order. The transport and
/// store are injected at construction; the id cache handle is shared across
/// controllers so an agent's server conversation is created at most once per
/// process.
pub struct ConversationController {
    agent: AgentType,
    transport: Arc<dyn ChatTransport>,
    history: ConversationHistory,
    id_cache: ConversationIdCache,
    conversation: Conversation,
    phase: SendPhase,
    events: broadcast::Sender<TranscriptEvent>,
    cancel: CancellationToken,
}

impl ConversationController {
    pub fn new(
        agent: AgentType,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn ConversationStore>,
        id_cache: ConversationIdCache,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut controller = Self {
            agent,
            transport,
            history: ConversationHistory::new(store),
            id_cache,
            conversation: Conversation::new(agent),
            phase: SendPhase::Idle,
            events,
            cancel: CancellationToken::new(),
        };
        controller.push_message(Message::assistant(agent.welcome_message()));
        controller
    }

    pub fn agent(&self) -> AgentType {
        self.agent
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.conversation.messages
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    pub fn is_sending(&self) -> bool {
        matches!(
            self.phase,
            SendPhase::AwaitingConversationId | SendPhase::Sending | SendPhase::Streaming
        )
    }

    /// Subscribe to transcript change notifications.
    ///
    /// A lagged or dropped receiver never affects the controller.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.events.subscribe()
    }

    /// Handle for aborting the next in-flight stream.
    ///
    /// Cancelling closes the transport stream, discards the placeholder
    /// message, and makes the send return [`ChatError::Cancelled`]. The
    /// token is replaced once a cancelled send has been observed, so acquire
    /// a fresh handle for each send.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolve the server-side conversation id for this controller's agent.
    ///
    /// Cached after the first success; failures propagate and cache nothing,
    /// so the next call retries the network.
    pub async fn resolve_conversation_id(&self) -> Result<u64, ChatError> {
        if let Some(id) = self.id_cache.get(self.agent) {
            log::debug!("conversation id cache hit for {}: {id}", self.agent.as_str());
            return Ok(id);
        }
        let id = self.transport.create_conversation(self.agent).await?;
        self.id_cache.insert(self.agent, id);
        Ok(id)
    }

    /// Send one user message and stream the assistant's reply into the
    /// transcript.
    ///
    /// The user message and an empty streaming placeholder are appended
    /// before any network round trip. On completion the placeholder is
    /// finalized and the conversation persisted once; on failure or
    /// cancellation the placeholder is removed and the user message kept,
    /// so the user can resend. No automatic retry.
    pub async fn send_message(&mut self, text: &str) -> Result<SendOutcome, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            log::debug!("ignoring whitespace-only message");
            return Ok(SendOutcome::Ignored);
        }
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        self.push_message(Message::user(text));
        let placeholder = Message::streaming_placeholder();
        let placeholder_id = placeholder.id.clone();
        self.push_message(placeholder);

        self.set_phase(SendPhase::AwaitingConversationId);
        let result = match self.resolve_conversation_id().await {
            Ok(conversation_id) => {
                self.set_phase(SendPhase::Sending);
                self.stream_into(conversation_id, text, &placeholder_id).await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                self.finalize(&placeholder_id);
                self.set_phase(SendPhase::Finalized);
                Ok(SendOutcome::Completed)
            }
            Err(err) => {
                self.remove_message(&placeholder_id);
                self.set_phase(SendPhase::Failed);
                Err(err)
            }
        }
    }

    /// Replace the transcript with a fresh welcome message.
    ///
    /// Persisted history is left untouched.
    pub fn clear_conversation(&mut self) {
        self.conversation.messages.clear();
        let _ = self.events.send(TranscriptEvent::Cleared);
        self.push_message(Message::assistant(self.agent.welcome_message()));
        self.phase = SendPhase::Idle;
    }

    async fn stream_into(
        &mut self,
        conversation_id: u64,
        content: &str,
        target_id: &str,
    ) -> Result<(), ChatError> {
        let cancel = self.cancel.clone();

        let mut stream = tokio::select! {
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            opened = self.transport.stream_message(conversation_id, content) => opened?,
        };
        self.set_phase(SendPhase::Streaming);

        loop {
            tokio::select! {
                // Dropping `stream` here closes the transport connection.
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                next = stream.next() => match next {
                    Some(Ok(token)) => self.append_token(target_id, &token),
                    Some(Err(err)) => return Err(err),
                    None => return Ok(()),
                },
            }
        }
    }

    fn append_token(&mut self, target_id: &str, token: &str) {
        let Some(message) = self
            .conversation
            .messages
            .iter_mut()
            .find(|message| message.id == target_id)
        else {
            return;
        };
        message.content.push_str(token);
        let _ = self.events.send(TranscriptEvent::Delta {
            id: target_id.to_string(),
            token: token.to_string(),
        });
    }

    fn finalize(&mut self, target_id: &str) {
        if let Some(message) = self
            .conversation
            .messages
            .iter_mut()
            .find(|message| message.id == target_id)
        {
            message.is_streaming = false;
        }
        self.conversation.touch();
        self.history.upsert(self.conversation.clone());
        let _ = self.events.send(TranscriptEvent::Finalized {
            id: target_id.to_string(),
        });
    }

    fn push_message(&mut self, message: Message) {
        let _ = self.events.send(TranscriptEvent::Appended {
            message: message.clone(),
        });
        self.conversation.messages.push(message);
    }

    fn remove_message(&mut self, target_id: &str) {
        self.conversation
            .messages
            .retain(|message| message.id != target_id);
        let _ = self.events.send(TranscriptEvent::Removed {
            id: target_id.to_string(),
        });
    }

    fn set_phase(&mut self, phase: SendPhase) {
        log::debug!(
            "{} send phase {:?} -> {:?}",
            self.agent.as_str(),
            self.phase,
            phase
        );
        self.phase = phase;
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
