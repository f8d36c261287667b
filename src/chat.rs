use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A tool invocation as posted by a front-end widget.
///
/// `tool_id` is an opaque selector: known ids get a server-side system prompt,
/// unknown ids are forwarded without augmentation.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub tool_id: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl ChatRequest {
    /// Rejects requests that must never reach the provider.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` when the tool id is blank, the message list is
    /// empty, there is no user message, or any user message is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.tool_id.trim().is_empty() {
            return Err(ApiError::bad_request("toolId must not be empty"));
        }
        if self.messages.is_empty() {
            return Err(ApiError::bad_request("messages must contain at least one entry"));
        }
        if !self.messages.iter().any(|m| m.role == ChatRole::User) {
            return Err(ApiError::bad_request("messages must contain a user message"));
        }
        if self
            .messages
            .iter()
            .any(|m| m.role == ChatRole::User && m.content.trim().is_empty())
        {
            return Err(ApiError::bad_request("user message content must not be empty"));
        }
        Ok(())
    }

    /// The most recent user message, used for log previews.
    #[must_use]
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub assistant_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            tool_id: "fortune-teller".to_string(),
            messages,
            locale: None,
        }
    }

    #[test]
    fn test_chat_request_wire_names() {
        let json = r#"{"toolId":"soup-switcher","messages":[{"role":"user","content":"hi"}],"locale":"en"}"#;
        let request: ChatRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.tool_id, "soup-switcher");
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.locale.as_deref(), Some("en"));
    }

    #[test]
    fn test_chat_role_serialization() {
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&ChatRole::Assistant).unwrap(), r#""assistant""#);
        assert!(serde_json::from_str::<ChatRole>(r#""system""#).is_err());
    }

    #[test]
    fn test_chat_response_omits_missing_model() {
        let response = ChatResponse {
            assistant_message: "ok".to_string(),
            model_used: None,
        };
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"assistantMessage":"ok"}"#);
    }

    #[test]
    fn test_validate_accepts_conversation() {
        let req = request(vec![
            ChatMessage::user("first"),
            ChatMessage {
                role: ChatRole::Assistant,
                content: String::new(),
            },
            ChatMessage::user("second"),
        ]);
        assert!(req.validate().is_ok());
        assert_eq!(req.last_user_content(), Some("second"));
    }

    #[test]
    fn test_validate_rejects_conversation_without_user_turn() {
        let err = request(vec![ChatMessage {
            role: ChatRole::Assistant,
            content: "  ".to_string(),
        }])
        .validate()
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_validate_rejects_empty_messages() {
        let err = request(vec![]).validate().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_validate_rejects_whitespace_user_text() {
        let err = request(vec![ChatMessage::user(" \n\t ")]).validate().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_validate_rejects_blank_tool_id() {
        let mut req = request(vec![ChatMessage::user("hello")]);
        req.tool_id = "  ".to_string();
        assert!(req.validate().is_err());
    }
}
