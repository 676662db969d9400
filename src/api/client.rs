use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::agent::AgentType;
use crate::chat::sse_token_stream;
use crate::error::ChatError;

use super::transport::{ChatTransport, TokenStream};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_USER_ID: u64 = 1;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
// Streaming replies can take a while; matches the resource timeout the
// mobile client shipped with.
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for the backend client.
#[derive(Debug)]
struct ApiConfig {
    base_url: Url,
    /// Placeholder identity sent on conversation creation; real
    /// authentication is outside this crate.
    user_id: u64,
    stream_timeout: Duration,
}

/// HTTP client for the agent backend.
///
/// Configuration lives behind an `Arc`, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Arc<ApiConfig>,
    client: Client,
}

#[derive(Serialize)]
struct CreateConversationRequest<'a> {
    user_id: u64,
    agent_type: &'a str,
    title: String,
}

#[derive(Deserialize)]
struct CreateConversationResponse {
    id: u64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    conversation_id: u64,
    content: &'a str,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Client against the default local backend.
    pub fn new() -> Result<Self, ChatError> {
        Self::builder().build()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChatError> {
        self.config
            .base_url
            .join(path)
            .map_err(|err| ChatError::Precondition(format!("invalid endpoint {path}: {err}")))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ChatError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn create_conversation(&self, agent: AgentType) -> Result<u64, ChatError> {
        let url = self.endpoint("/api/v1/conversations")?;
        let body = CreateConversationRequest {
            user_id: self.config.user_id,
            agent_type: agent.as_str(),
            title: agent.default_title(),
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = Self::check_status(response).await?;

        let text = response.text().await?;
        let decoded: CreateConversationResponse = serde_json::from_str(&text)?;
        log::debug!(
            "conversation {} ready for agent {}",
            decoded.id,
            agent.as_str()
        );
        Ok(decoded.id)
    }

    async fn stream_message(
        &self,
        conversation_id: u64,
        content: &str,
    ) -> Result<TokenStream, ChatError> {
        let url = self.endpoint("/api/v1/messages/stream")?;
        let body = SendMessageRequest {
            conversation_id,
            content,
        };

        let response = self
            .client
            .post(url)
            .header("Accept", "text/event-stream")
            .timeout(self.config.stream_timeout)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(sse_token_stream(response))
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: String,
    user_id: u64,
    timeout: Duration,
    stream_timeout: Duration,
    client: Option<Client>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID,
            timeout: DEFAULT_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            client: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    /// Timeout for non-streaming requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overall deadline for one streaming exchange.
    pub fn stream_timeout(mut self, stream_timeout: Duration) -> Self {
        self.stream_timeout = stream_timeout;
        self
    }

    /// Use a caller-provided `reqwest::Client` instead of building one.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<ApiClient, ChatError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|err| ChatError::Precondition(format!("invalid base url: {err}")))?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|err| ChatError::Transport(err.to_string()))?,
        };

        Ok(ApiClient {
            config: Arc::new(ApiConfig {
                base_url,
                user_id: self.user_id,
                stream_timeout: self.stream_timeout,
            }),
            client,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use futures::stream::StreamExt;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn create_conversation_decodes_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/conversations")
            .match_body(mockito::Matcher::PartialJson(json!({
                "user_id": 1,
                "agent_type": "trading_agent",
                "title": "Trading Agent Conversation",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 42}"#)
            .create_async()
            .await;

        let client = ApiClient::builder().base_url(server.url()).build().unwrap();
        let id = client
            .create_conversation(AgentType::TradingAgent)
            .await
            .unwrap();

        assert_eq!(id, 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_conversation_maps_non_2xx_to_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/conversations")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::builder().base_url(server.url()).build().unwrap();
        let err = client
            .create_conversation(AgentType::InvestmentAdvisor)
            .await
            .unwrap_err();

        match err {
            ChatError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_conversation_maps_bad_body_to_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/conversations")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = ApiClient::builder().base_url(server.url()).build().unwrap();
        let err = client
            .create_conversation(AgentType::InvestmentAdvisor)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[tokio::test]
    async fn stream_message_yields_tokens_until_done() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/messages/stream")
            .match_body(mockito::Matcher::PartialJson(json!({
                "conversation_id": 7,
                "content": "hi",
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(
                "data: {\"content\": \"Hel\"}\n\
                 data: {\"content\": \"lo\"}\n\
                 data: [DONE]\n",
            )
            .create_async()
            .await;

        let client = ApiClient::builder().base_url(server.url()).build().unwrap();
        let mut stream = client.stream_message(7, "hi").await.unwrap();

        let mut tokens = Vec::new();
        while let Some(item) = stream.next().await {
            tokens.push(item.unwrap());
        }
        assert_eq!(tokens, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn stream_message_rejects_non_2xx_before_streaming() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/messages/stream")
            .with_status(404)
            .create_async()
            .await;

        let client = ApiClient::builder().base_url(server.url()).build().unwrap();
        let err = client.stream_message(7, "hi").await.err().unwrap();

        assert!(matches!(err, ChatError::Server { status: 404, .. }));
    }

    #[test]
    fn builder_rejects_unparseable_base_url() {
        let err = ApiClient::builder()
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, ChatError::Precondition(_)));
    }
}
