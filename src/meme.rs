//! Meme generation: a caption from the chat provider, then an image of that caption.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chat::{ChatMessage, ChatRequest};
use crate::error::ApiError;
use crate::image::ImageGenerateRequest;
use crate::proxy::ProxyClient;

pub const MEME_TOOL_ID: &str = "meme-generator";

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct MemeRequest {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MemeResponse {
    pub caption: String,
    pub image_url: String,
    pub enhanced_prompt: String,
    pub provider: String,
}

/// Strips the quotes models like to wrap captions in.
fn clean_caption(text: &str) -> String {
    text.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '「' | '」'))
        .trim()
        .to_string()
}

impl ProxyClient {
    /// Runs the caption call and then the image call; the first failure ends the chain.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a blank topic, otherwise the error of whichever step failed.
    pub async fn generate_meme(
        &self,
        request: &MemeRequest,
    ) -> Result<MemeResponse, ApiError> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            tracing::warn!(status = 400, "meme request rejected: blank topic");
            return Err(ApiError::bad_request("topic must not be empty"));
        }

        let chat = self
            .forward_chat(&ChatRequest {
                tool_id: MEME_TOOL_ID.to_string(),
                messages: vec![ChatMessage::user(format!("Topic: {topic}"))],
                locale: request.locale.clone(),
            })
            .await?;

        let caption = clean_caption(&chat.assistant_message);
        if caption.is_empty() {
            return Err(ApiError::unexpected_shape("The caption step returned only quotes"));
        }

        let image = self
            .forward_image_generation(&ImageGenerateRequest {
                prompt: format!("A funny office meme illustration with the caption \"{caption}\""),
                style: request.style.clone(),
            })
            .await?;

        Ok(MemeResponse {
            caption,
            image_url: image.image_url,
            enhanced_prompt: image.enhanced_prompt,
            provider: image.provider,
        })
    }
}
