//! The tool-invocation proxy.
//!
//! `ProxyClient` owns the only process-wide resources: the immutable configuration,
//! the tool catalog, and one pooled `reqwest` client. Each operation makes a single
//! attempt against its provider with a per-request timeout and converts the outcome
//! into either a normalized response or an [`ApiError`].

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use crate::chat::{ChatRequest, ChatResponse};
use crate::config::AppConfig;
use crate::error::{ApiError, UpstreamPayload};
use crate::locale::Locale;
use crate::tools::ToolCatalog;

const USER_AGENT: &str = concat!("office-fun-proxy/", env!("CARGO_PKG_VERSION"));
pub const TOOL_ID_HEADER: &str = "X-Tool-Id";

pub struct ProxyClient {
    http: reqwest::Client,
    config: AppConfig,
    tools: ToolCatalog,
}

/// Message in the provider's chat-completion format. Unlike [`crate::chat::ChatMessage`]
/// it may carry the `system` role added by tool augmentation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize, Debug)]
struct UpstreamChatRequest<'a> {
    model: &'a str,
    messages: Vec<OutboundMessage>,
}

impl ProxyClient {
    /// Builds the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(
        config: AppConfig,
        tools: ToolCatalog,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, config, tools })
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn tools(&self) -> &ToolCatalog {
        &self.tools
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends a prepared request and buffers the whole reply.
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<UpstreamPayload, ApiError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(UpstreamPayload {
            status,
            content_type,
            body,
        })
    }

    /// Forwards a tool's chat request to the AI provider.
    ///
    /// # Errors
    ///
    /// - `BadRequest` before any outbound call when the request is invalid
    /// - `Upstream` when the provider answers non-2xx with a JSON body (passed through verbatim)
    /// - `Timeout` / `Unreachable` for transport failures and unreadable error bodies
    /// - `UnexpectedShape` when a 2xx body has no assistant text
    pub async fn forward_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatResponse, ApiError> {
        request.validate().inspect_err(|e| {
            tracing::warn!(tool_id = %request.tool_id, status = 400, error = %e, "chat request rejected");
        })?;

        let request_id = uuid::Uuid::new_v4();
        let url = self.config.chat_completions_url();
        let locale = request
            .locale
            .as_deref()
            .and_then(Locale::match_tag)
            .unwrap_or_default();
        let payload = UpstreamChatRequest {
            model: &self.config.chat_model,
            messages: self.tools.augment(&request.tool_id, locale, &request.messages),
        };

        let started = Instant::now();
        let mut builder = self
            .http
            .post(&url)
            .timeout(self.config.chat_timeout)
            .header(TOOL_ID_HEADER, request.tool_id.as_str())
            .json(&payload);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let reply = self.send(builder).await.inspect_err(|e| {
            tracing::error!(%request_id, tool_id = %request.tool_id, url = %url, error = %e, "chat request failed");
        })?;

        tracing::info!(
            %request_id,
            tool_id = %request.tool_id,
            url = %url,
            prompt = %truncate_for_log(request.last_user_content().unwrap_or_default(), 80),
            status = reply.status,
            elapsed_ms = started.elapsed().as_millis(),
            "chat request forwarded"
        );

        if !(200..300).contains(&reply.status) {
            return Err(passthrough_json_error(reply));
        }

        let value: Value = serde_json::from_slice(&reply.body)
            .map_err(|e| ApiError::Unreachable(format!("AI provider returned an unreadable body: {e}")))?;
        let assistant_message = extract_assistant_text(&value)
            .ok_or_else(|| ApiError::unexpected_shape("AI provider response did not contain any text"))?;
        let model_used = value.get("model").and_then(Value::as_str).map(str::to_string);

        Ok(ChatResponse {
            assistant_message,
            model_used,
        })
    }
}

/// Structured provider errors pass through untouched; anything else is a connectivity failure.
fn passthrough_json_error(reply: UpstreamPayload) -> ApiError {
    if serde_json::from_slice::<Value>(&reply.body).is_ok() {
        ApiError::Upstream(reply)
    } else {
        ApiError::Unreachable(format!(
            "upstream returned status {} without a readable error body",
            reply.status
        ))
    }
}

/// Reads the assistant text from an OpenAI-style completion or an already-normalized reply.
#[must_use]
pub fn extract_assistant_text(value: &Value) -> Option<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .or_else(|| value.get("assistantMessage").and_then(Value::as_str))
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Shortens user text for log lines without splitting a character.
#[must_use]
pub fn truncate_for_log(
    text: &str,
    max_chars: usize,
) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
