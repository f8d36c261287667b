//! Image generation: style vocabulary, provider error taxonomy, and the forwarding call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Instant;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::proxy::{ProxyClient, truncate_for_log};

pub const IMAGE_PROVIDER: &str = "openai";
const IMAGE_SIZE: &str = "1024x1024";
const IMAGE_QUALITY: &str = "standard";

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ImageGenerateRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerateResponse {
    pub image_url: String,
    pub enhanced_prompt: String,
    pub provider: String,
}

/// Fixed style vocabulary offered by the drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageStyle {
    Simple,
    Cartoon,
    Sketch,
    Doodle,
    Minimalist,
}

impl ImageStyle {
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            ImageStyle::Simple => "simple illustration, clean lines, plain background",
            ImageStyle::Cartoon => "cartoon style, colorful, fun",
            ImageStyle::Sketch => "pencil sketch, hand-drawn, black and white",
            ImageStyle::Doodle => "doodle style, playful, hand-drawn lines",
            ImageStyle::Minimalist => "minimalist style, flat colors, simple shapes",
        }
    }
}

/// Appends the style phrase to the prompt.
///
/// Known styles use their mapped phrase; any other non-blank value is appended verbatim
/// so new styles can be introduced by the front-end alone.
#[must_use]
pub fn enhance_prompt(
    prompt: &str,
    style: Option<&str>,
) -> String {
    let prompt = prompt.trim();
    match style.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => {
            let suffix = ImageStyle::from_str(style).map_or(style, |s| s.suffix());
            format!("{prompt}, {suffix}")
        }
        None => prompt.to_string(),
    }
}

/// Error codes the image provider reports in `error.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ImageErrorCode {
    InvalidApiKey,
    InsufficientQuota,
    ContentPolicyViolation,
    Other,
}

impl ImageErrorCode {
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "invalid_api_key" => ImageErrorCode::InvalidApiKey,
            "insufficient_quota" => ImageErrorCode::InsufficientQuota,
            "content_policy_violation" => ImageErrorCode::ContentPolicyViolation,
            _ => ImageErrorCode::Other,
        }
    }

    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            ImageErrorCode::InvalidApiKey => 401,
            ImageErrorCode::InsufficientQuota => 429,
            ImageErrorCode::ContentPolicyViolation => 400,
            ImageErrorCode::Other => 500,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ImageErrorCode::InvalidApiKey => "INVALID_API_KEY",
            ImageErrorCode::InsufficientQuota => "QUOTA_EXCEEDED",
            ImageErrorCode::ContentPolicyViolation => "CONTENT_POLICY_VIOLATION",
            ImageErrorCode::Other => "IMAGE_GENERATION_FAILED",
        }
    }

    #[must_use]
    pub fn user_message(
        self,
        detail: &str,
    ) -> String {
        match self {
            ImageErrorCode::InvalidApiKey => "The image provider rejected the configured API key".to_string(),
            ImageErrorCode::InsufficientQuota => "The image generation quota has been used up, try again later".to_string(),
            ImageErrorCode::ContentPolicyViolation => {
                "The prompt was refused by the provider's content policy, try rewording it".to_string()
            }
            ImageErrorCode::Other => format!("Image generation failed: {detail}"),
        }
    }
}

#[derive(Serialize, Debug)]
struct UpstreamImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'static str,
    quality: &'static str,
}

fn image_error_from_body(body: &[u8]) -> ApiError {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let code = value
        .pointer("/error/code")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/error/type").and_then(Value::as_str))
        .map_or(ImageErrorCode::Other, ImageErrorCode::from_code);
    let detail = value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("the provider returned an error")
        .to_string();

    ApiError::ImageProvider { code, detail }
}

fn extract_image_url(value: &Value) -> Option<String> {
    if let Some(url) = value.pointer("/data/0/url").and_then(Value::as_str) {
        return Some(url.to_string());
    }
    value
        .pointer("/data/0/b64_json")
        .and_then(Value::as_str)
        .map(|b64| format!("data:image/png;base64,{b64}"))
}

impl ProxyClient {
    /// Generates an image for the styled prompt.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for a blank prompt, `ImageProvider` for provider-reported
    /// failures, and `Timeout`/`Unreachable`/`UnexpectedShape` otherwise.
    pub async fn forward_image_generation(
        &self,
        request: &ImageGenerateRequest,
    ) -> Result<ImageGenerateResponse, ApiError> {
        if request.prompt.trim().is_empty() {
            tracing::warn!(status = 400, "image request rejected: blank prompt");
            return Err(ApiError::bad_request("prompt must not be empty"));
        }
        let Some(api_key) = self.config().api_key.as_deref() else {
            return Err(ApiError::internal_server_error("Image provider API key is not configured"));
        };

        let request_id = uuid::Uuid::new_v4();
        let enhanced_prompt = enhance_prompt(&request.prompt, request.style.as_deref());
        let url = self.config().image_generations_url();
        let payload = UpstreamImageRequest {
            model: &self.config().image_model,
            prompt: &enhanced_prompt,
            n: 1,
            size: IMAGE_SIZE,
            quality: IMAGE_QUALITY,
        };

        let started = Instant::now();
        let builder = self
            .http()
            .post(&url)
            .timeout(self.config().image_timeout)
            .bearer_auth(api_key)
            .json(&payload);
        let reply = self.send(builder).await.inspect_err(|e| {
            tracing::error!(%request_id, url = %url, error = %e, "image request failed");
        })?;

        tracing::info!(
            %request_id,
            url = %url,
            prompt = %truncate_for_log(&enhanced_prompt, 80),
            status = reply.status,
            elapsed_ms = started.elapsed().as_millis(),
            "image request forwarded"
        );

        if !(200..300).contains(&reply.status) {
            return Err(image_error_from_body(&reply.body));
        }

        let value: Value = serde_json::from_slice(&reply.body)
            .map_err(|e| ApiError::unexpected_shape(format!("Image provider returned an unreadable body: {e}")))?;
        let image_url = extract_image_url(&value)
            .ok_or_else(|| ApiError::unexpected_shape("Image provider response did not contain an image"))?;

        Ok(ImageGenerateResponse {
            image_url,
            enhanced_prompt,
            provider: IMAGE_PROVIDER.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::tools::ToolCatalog;
    use serde_json::json;
    use strum::IntoEnumIterator;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> ProxyClient {
        ProxyClient::new(AppConfig::for_tests(base), ToolCatalog::builtin().unwrap()).unwrap()
    }

    #[test]
    fn test_cartoon_suffix() {
        let prompt = enhance_prompt("a cat fixing the printer", Some("cartoon"));
        assert!(prompt.ends_with("cartoon style, colorful, fun"));
        assert!(prompt.starts_with("a cat fixing the printer"));
    }

    #[test]
    fn test_every_style_has_its_own_suffix() {
        for style in ImageStyle::iter() {
            let prompt = enhance_prompt("x", Some(&style.to_string()));
            assert_eq!(prompt, format!("x, {}", style.suffix()));
        }
    }

    #[test]
    fn test_unknown_style_is_appended_verbatim() {
        let prompt = enhance_prompt("a desk plant", Some("vaporwave neon"));
        assert_eq!(prompt, "a desk plant, vaporwave neon");
    }

    #[test]
    fn test_missing_or_blank_style_leaves_prompt() {
        assert_eq!(enhance_prompt("coffee", None), "coffee");
        assert_eq!(enhance_prompt("coffee", Some("  ")), "coffee");
    }

    #[test]
    fn test_error_code_mapping() {
        let cases = [
            ("invalid_api_key", 401),
            ("insufficient_quota", 429),
            ("content_policy_violation", 400),
            ("server_overloaded", 500),
        ];
        for (code, status) in cases {
            assert_eq!(ImageErrorCode::from_code(code).status_code(), status, "code {code}");
        }
    }

    #[test]
    fn test_error_labels_are_distinct() {
        let labels = [
            ImageErrorCode::InvalidApiKey.label(),
            ImageErrorCode::InsufficientQuota.label(),
            ImageErrorCode::ContentPolicyViolation.label(),
            ImageErrorCode::Other.label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[tokio::test]
    async fn test_forward_image_generation_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "prompt": "a rubber duck, cartoon style, colorful, fun",
                "size": "1024x1024",
                "n": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "url": "https://images.example/duck.png" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server.uri())
            .forward_image_generation(&ImageGenerateRequest {
                prompt: "a rubber duck".to_string(),
                style: Some("cartoon".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(response.image_url, "https://images.example/duck.png");
        assert_eq!(response.enhanced_prompt, "a rubber duck, cartoon style, colorful, fun");
        assert_eq!(response.provider, "openai");
    }

    #[tokio::test]
    async fn test_forward_image_generation_maps_quota_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": "insufficient_quota", "message": "You exceeded your current quota" }
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .forward_image_generation(&ImageGenerateRequest {
                prompt: "a stapler".to_string(),
                style: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_error_response().error, "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn test_forward_image_generation_unknown_code_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .forward_image_generation(&ImageGenerateRequest {
                prompt: "a stapler".to_string(),
                style: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_blank_prompt_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let err = client(&server.uri())
            .forward_image_generation(&ImageGenerateRequest {
                prompt: "   ".to_string(),
                style: Some("sketch".to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
    }
}
