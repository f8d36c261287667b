//! Declarative tool descriptors.
//!
//! Every front-end widget is an instance of the same prompt-form; the backend only needs
//! to know which ones carry a server-side system prompt.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chat::{ChatMessage, ChatRole};
use crate::locale::Locale;
use crate::proxy::OutboundMessage;
use crate::template::TemplateEngine;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub id: String,
    pub title: String,
    /// Template with `{{LOCALE}}` placeholders, prepended as a system message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    const BUILTIN: &'static str = include_str!("../data/tools.json");

    /// Loads the catalog embedded at compile time.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON does not match [`ToolDescriptor`].
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(Self::BUILTIN)
    }

    /// # Errors
    ///
    /// Returns an error if `json` is not a list of tool descriptors.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tools = serde_json::from_str(json)?;
        Ok(Self { tools })
    }

    #[must_use]
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    #[must_use]
    pub fn get(
        &self,
        tool_id: &str,
    ) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.id == tool_id)
    }

    /// Converts the caller's messages to the provider format, prepending the tool's
    /// system prompt when one exists.
    #[must_use]
    pub fn augment(
        &self,
        tool_id: &str,
        locale: Locale,
        messages: &[ChatMessage],
    ) -> Vec<OutboundMessage> {
        let system = self
            .get(tool_id)
            .and_then(|tool| tool.system_prompt.as_deref())
            .map(|template| OutboundMessage {
                role: "system",
                content: TemplateEngine::render_tool_prompt(template, locale),
            });

        system
            .into_iter()
            .chain(messages.iter().map(|m| OutboundMessage {
                role: match m.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                },
                content: m.content.clone(),
            }))
            .collect()
    }
}
