//! # office-fun-proxy
//!
//! The backend behind a suite of office novelty tools: fortune tellers, email
//! polishers, mood analyzers, meme generators and dozens more. Every tool speaks the
//! same small protocol: it posts a `toolId` and a message list, and gets back the
//! assistant's markdown or a normalized error.
//!
//! ## Features
//!
//! - **Tool-invocation proxy**: forwards chat requests to an OpenAI-compatible provider,
//!   passing provider errors through verbatim and classifying transport failures
//! - **Image generation**: style vocabulary, provider error taxonomy (401/429/400/500)
//! - **Weather passthrough**: city-id lookups against the Meizu weather API
//! - **Direct generation**: model-addressed completions and provider health via `genai`
//! - **Locale resolution**: URL segment, cookie, then `Accept-Language`
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use office_fun_proxy::{AppConfig, ChatMessage, ChatRequest, ProxyClient, ToolCatalog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = AppConfig::from_env()?;
//!     let proxy = ProxyClient::new(config, ToolCatalog::builtin()?)?;
//!
//!     let request = ChatRequest {
//!         tool_id: "fortune-teller".to_string(),
//!         messages: vec![ChatMessage::user("What does my Monday look like?")],
//!         locale: Some("en".to_string()),
//!     };
//!
//!     let response = proxy.forward_chat(&request).await?;
//!     println!("{}", response.assistant_message);
//!     Ok(())
//! }
//! ```
//!
//! ## Server Mode
//!
//! The `server` feature (enabled by default) adds the actix-web routes and the binary:
//!
//! ```bash
//! OPENAI_API_KEY=sk-... AI_BASE_URL=https://api.openai.com/v1 cargo run
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod generate;
pub mod image;
pub mod locale;
pub mod meme;
pub mod proxy;
pub mod template;
pub mod tools;
pub mod weather;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, ChatRole};
pub use config::AppConfig;
pub use error::{ApiError, ErrorResponse};
pub use image::{ImageGenerateRequest, ImageGenerateResponse, ImageStyle};
pub use locale::{Locale, resolve_locale};
pub use proxy::ProxyClient;
pub use tools::ToolCatalog;

#[cfg(feature = "server")]
pub mod server;
