//! Streaming chat core for the WiseInvest agent assistants.
//!
//! The crate is the network-facing heart of a chat client for two remote
//! agents (investment advisor, trading agent) reached over HTTP/SSE:
//!
//! - [`chat`] holds the transcript data model and the SSE frame decoder
//!   that turns arbitrarily-chunked response bytes into content tokens.
//! - [`api`] is the HTTP transport: a [`ChatTransport`] seam and its
//!   [`ApiClient`] implementation over `reqwest`.
//! - [`session`] drives one conversation at a time: the
//!   [`ConversationController`] resolves the server conversation id
//!   (memoized per agent), streams the assistant reply into a placeholder
//!   message token by token, and finalizes or discards it.
//! - [`storage`] persists conversation history best-effort.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use wiseinvest::{
//!     AgentType, ApiClient, ConversationController, ConversationIdCache, InMemoryStore,
//! };
//!
//! # async fn run() -> Result<(), wiseinvest::ChatError> {
//! let transport = Arc::new(ApiClient::builder().base_url("http://localhost:8080").build()?);
//! let mut controller = ConversationController::new(
//!     AgentType::InvestmentAdvisor,
//!     transport,
//!     Arc::new(InMemoryStore::new()),
//!     ConversationIdCache::new(),
//! );
//!
//! controller.send_message("How should I diversify?").await?;
//! for message in controller.messages() {
//!     println!("{:?}: {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod chat;
pub mod error;
pub mod session;
pub mod storage;

pub use agent::AgentType;
pub use api::{ApiClient, ApiClientBuilder, ChatTransport, TokenStream};
pub use chat::{Conversation, Message, MessageRole, TranscriptEvent};
pub use error::ChatError;
pub use session::{
    ConversationController, ConversationHistory, ConversationIdCache, SendOutcome, SendPhase,
};
pub use storage::{ConversationStore, InMemoryStore, JsonFileStore};
