use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::agent::AgentType;
use crate::error::ChatError;

/// A finite, non-restartable stream of assistant content tokens.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// Seam between the conversation controller and the backend.
///
/// Implemented by [`ApiClient`](crate::api::ApiClient) over HTTP/SSE and by
/// mocks in tests. The controller holds it as an injected `Arc<dyn
/// ChatTransport>` rather than reaching for a process-wide client.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Create (or fetch) the server-side conversation for an agent and
    /// return its numeric id.
    async fn create_conversation(&self, agent: AgentType) -> Result<u64, ChatError>;

    /// Send one user message and open the streaming response.
    ///
    /// Errors returned here cover request build and response-status
    /// failures; mid-stream failures arrive as `Err` items on the stream.
    async fn stream_message(
        &self,
        conversation_id: u64,
        content: &str,
    ) -> Result<TokenStream, ChatError>;
}
