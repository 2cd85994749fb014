//! HTTP implementation of the backend gateway
//!
//! Talks JSON to the backend's REST endpoints using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, SessionError};

use super::gateway::BackendGateway;
use super::messages::{
    AddToolReply, AddToolRequest, ChatMessage, ChatReply, ChatRequest, CodeResponse, ErrorBody,
    GenerateToolRequest, GitImportRequest, ToolListResponse, ToolListing, WireChatResponse,
};

/// Default backend base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

/// Default request timeout; tool generation and chat both wait on a model
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the HTTP gateway
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpGatewayConfig {
    /// Create a config pointing at a specific backend
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Backend gateway over HTTP
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Create a gateway; fails if the base URL cannot be parsed
    pub fn new(config: HttpGatewayConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SessionError::validation(format!("Invalid backend URL '{}': {}", config.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(SessionError::validation(format!(
                "Backend URL '{}' cannot be used as a base",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SessionError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL; each segment is percent-encoded on its own
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, segments: &[&str], body: &B) -> Result<T> {
        let url = self.endpoint(segments);
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    /// Turn a response into a value, or into a request error carrying `detail`
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(ErrorBody::detail);
            warn!("Backend returned {}: {:?}", status, detail);
            return Err(SessionError::Request {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SessionError::Transport(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn list_tools(&self) -> Result<Vec<ToolListing>> {
        let listing: ToolListResponse = self.get_json(&["tools"]).await?;
        Ok(listing.tools)
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatReply> {
        let wire: WireChatResponse = self.post_json(&["chat"], &ChatRequest { messages }).await?;
        Ok(wire.into())
    }

    async fn add_tool(&self, code: &str) -> Result<AddToolReply> {
        self.post_json(&["tools", "add"], &AddToolRequest { code }).await
    }

    async fn generate_tool(&self, prompt: &str) -> Result<String> {
        let generated: CodeResponse = self
            .post_json(&["tools", "generate"], &GenerateToolRequest { prompt })
            .await?;
        Ok(generated.code)
    }

    async fn import_from_git(&self, url: &str) -> Result<AddToolReply> {
        self.post_json(&["tools", "from-git"], &GitImportRequest { url }).await
    }

    async fn tool_source(&self, name: &str) -> Result<String> {
        let source: CodeResponse = self.get_json(&["tools", name, "code"]).await?;
        Ok(source.code)
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> HttpGateway {
        HttpGateway::new(HttpGatewayConfig::with_base_url(base)).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = HttpGatewayConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpGateway::new(HttpGatewayConfig::with_base_url("not a url"));
        assert!(matches!(result, Err(SessionError::Validation(_))));

        let result = HttpGateway::new(HttpGatewayConfig::with_base_url("mailto:me@example.com"));
        assert!(matches!(result, Err(SessionError::Validation(_))));
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let gw = gateway("http://localhost:3001/api");
        assert_eq!(gw.endpoint(&["tools", "add"]).as_str(), "http://localhost:3001/api/tools/add");

        let gw = gateway("http://localhost:3001/api/");
        assert_eq!(gw.endpoint(&["chat"]).as_str(), "http://localhost:3001/api/chat");
    }

    #[test]
    fn test_endpoint_encodes_tool_name() {
        let gw = gateway("http://localhost:3001/api");
        let url = gw.endpoint(&["tools", "my tool/x", "code"]);
        assert_eq!(url.as_str(), "http://localhost:3001/api/tools/my%20tool%2Fx/code");
    }
}
