//! OpenAI-compatible chat-completion provider over `reqwest`.
//!
//! Works with any endpoint that follows the chat-completion wire contract
//! (Groq, `OpenAI`, local proxies) via the base URL in [`AgentConfig`].
//! One call is one HTTP round-trip; status codes are mapped onto
//! [`AgentError`] kinds so the client's retry policy can act on them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// Longest provider error body kept in error messages.
const MAX_ERROR_BODY_LEN: usize = 300;

/// `OpenAI`-compatible LLM provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireErrorBody {
    error: WireError,
}

#[derive(Deserialize)]
struct WireError {
    message: String,
}

impl OpenAiProvider {
    /// Creates a new provider from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Maps a non-success response onto an error kind.
    fn classify_failure(status: StatusCode, retry_after: Option<Duration>, body: &str) -> AgentError {
        let message = error_message(body);
        match status {
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited {
                retry_after,
                message,
            },
            StatusCode::UNAUTHORIZED => AgentError::Authentication { message },
            other => AgentError::ApiRequest {
                message,
                status: Some(other.as_u16()),
            },
        }
    }

    /// Extracts the first choice from a success body.
    fn parse_success(body: &str) -> Result<ChatResponse, AgentError> {
        let parsed: WireResponse =
            serde_json::from_str(body).map_err(|e| AgentError::Transport {
                message: format!("malformed response body: {e}"),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyResponse)?;

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: parsed.usage.unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }
}

/// Parses a `Retry-After` header given in whole seconds.
fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Pulls `error.message` out of an error body, or a truncated raw body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<WireErrorBody>(body) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_LEN).collect()
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let body = WireRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Transport {
                message: if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        let retry_after = retry_after_header(response.headers());
        let text = response.text().await.map_err(|e| AgentError::Transport {
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "chat completion returned error status");
            return Err(Self::classify_failure(status, retry_after, &text));
        }

        Self::parse_success(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{system_message, user_message};

    /// Spawns a minimal HTTP server that answers each connection with the
    /// next canned response. Returns the base URL.
    async fn spawn_mock_server(responses: Vec<String>) -> String {
        use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|_| unreachable!());
        let port = listener
            .local_addr()
            .map(|a| a.port())
            .unwrap_or_else(|_| unreachable!());

        tokio::spawn(async move {
            for resp in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let (reader, mut writer) = stream.split();
                let mut reader = BufReader::new(reader);
                let mut content_length = 0usize;
                let mut line = String::new();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        break;
                    }
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap_or(0);
                    }
                    if line == "\r\n" || line == "\n" {
                        break;
                    }
                }
                let mut body = vec![0u8; content_length];
                let _ = reader.read_exact(&mut body).await;
                let _ = writer.write_all(resp.as_bytes()).await;
                let _ = writer.shutdown().await;
            }
        });

        format!("http://127.0.0.1:{port}")
    }

    fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n{extra_headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn provider_for(base_url: &str) -> OpenAiProvider {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .base_url(base_url)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| unreachable!());
        OpenAiProvider::new(&config).unwrap_or_else(|_| unreachable!())
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".to_string(),
            messages: vec![system_message("sys"), user_message("hello")],
            temperature: Some(0.1),
            max_tokens: Some(64),
        }
    }

    #[tokio::test]
    async fn test_success_returns_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"first"},"finish_reason":"stop"},{"message":{"content":"second"}}],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#;
        let url = spawn_mock_server(vec![http_response("200 OK", "", body)]).await;
        let response = provider_for(&url).chat(&request()).await;
        let response = response.unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(response.content, "first");
        assert_eq!(response.usage.total_tokens, 5);
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_rate_limit_with_retry_after() {
        let body = r#"{"error":{"message":"Rate limit reached"}}"#;
        let url = spawn_mock_server(vec![http_response(
            "429 Too Many Requests",
            "Retry-After: 7\r\n",
            body,
        )])
        .await;
        let err = provider_for(&url).chat(&request()).await;
        match err {
            Err(AgentError::RateLimited {
                retry_after,
                message,
            }) => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
                assert_eq!(message, "Rate limit reached");
            }
            other => unreachable!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn test_retry_after_header_whole_seconds_only() {
        let parse = |value: &str| {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::RETRY_AFTER,
                reqwest::header::HeaderValue::from_str(value).unwrap_or_else(|_| unreachable!()),
            );
            retry_after_header(&headers)
        };
        assert_eq!(parse("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse(" 86400 "), Some(Duration::from_secs(86_400)));
        assert_eq!(parse("1e20"), None);
        assert_eq!(parse("-3"), None);
        assert_eq!(parse("Wed, 21 Oct 2026 07:28:00 GMT"), None);
        assert_eq!(retry_after_header(&reqwest::header::HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_error() {
        let body = r#"{"error":{"message":"Invalid API Key"}}"#;
        let url = spawn_mock_server(vec![http_response("401 Unauthorized", "", body)]).await;
        let err = provider_for(&url).chat(&request()).await;
        assert!(matches!(err, Err(AgentError::Authentication { .. })));
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let url = spawn_mock_server(vec![http_response(
            "503 Service Unavailable",
            "",
            "upstream overloaded",
        )])
        .await;
        let err = provider_for(&url).chat(&request()).await;
        match err {
            Err(AgentError::ApiRequest { status, message }) => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "upstream overloaded");
            }
            other => unreachable!("expected ApiRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_response() {
        let url = spawn_mock_server(vec![http_response("200 OK", "", r#"{"choices":[]}"#)]).await;
        let err = provider_for(&url).chat(&request()).await;
        assert!(matches!(err, Err(AgentError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_error() {
        let url = spawn_mock_server(vec![http_response("200 OK", "", "<html>oops</html>")]).await;
        let err = provider_for(&url).chat(&request()).await;
        assert!(matches!(err, Err(AgentError::Transport { .. })));
    }

    #[test]
    fn test_wire_request_shape() {
        let req = request();
        let wire = WireRequest {
            model: &req.model,
            messages: &req.messages,
            temperature: None,
            max_tokens: Some(10),
        };
        let json = serde_json::to_value(&wire).unwrap_or_default();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 10);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = provider_for("http://localhost");
        let debug = format!("{provider:?}");
        assert!(!debug.contains("test-key"));
    }
}
