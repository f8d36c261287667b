//! Direct model generation and the model catalog.
//!
//! Unlike `/api/chat`, these endpoints address a model by id and go through the
//! `genai` client, which picks the provider adapter from the model name.

use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::resolver::{AuthData, AuthResolver};
use genai::ModelIden;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::proxy::truncate_for_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    Gemini,
    Groq,
    DeepSeek,
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::OpenAI,
        Provider::Anthropic,
        Provider::Gemini,
        Provider::Groq,
        Provider::DeepSeek,
        Provider::Ollama,
    ];

    #[must_use]
    pub const fn adapter_kind(self) -> AdapterKind {
        match self {
            Provider::OpenAI => AdapterKind::OpenAI,
            Provider::Anthropic => AdapterKind::Anthropic,
            Provider::Gemini => AdapterKind::Gemini,
            Provider::Groq => AdapterKind::Groq,
            Provider::DeepSeek => AdapterKind::DeepSeek,
            Provider::Ollama => AdapterKind::Ollama,
        }
    }

    /// Environment variable holding the provider's key; `None` for local providers.
    #[must_use]
    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Gemini => Some("GEMINI_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::DeepSeek => Some("DEEPSEEK_API_KEY"),
            Provider::Ollama => None,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: Provider,
    pub context_window: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    const BUILTIN: &'static str = include_str!("../data/models.json");

    /// # Errors
    ///
    /// Returns an error if the embedded model list is malformed.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        let models = serde_json::from_str(Self::BUILTIN)?;
        Ok(Self { models })
    }

    /// Models whose provider is usable with the current credentials.
    #[must_use]
    pub fn available(
        &self,
        configured: &[Provider],
    ) -> Vec<ModelInfo> {
        self.models
            .iter()
            .filter(|m| configured.contains(&m.provider))
            .cloned()
            .collect()
    }

    /// Distinct providers in catalog order.
    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = Vec::new();
        for model in &self.models {
            if !providers.contains(&model.provider) {
                providers.push(model.provider);
            }
        }
        providers
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub model_id: String,
    pub input_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generated_text: String,
    pub model_used: String,
}

/// Seam between the HTTP layer and the model SDK.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        system_prompt: Option<&str>,
        input: &str,
    ) -> Result<String, ApiError>;

    /// Whether the provider answers a model listing within the health timeout.
    async fn probe(
        &self,
        provider: Provider,
    ) -> bool;
}

pub struct GenAiGenerator {
    client: genai::Client,
    timeout: Duration,
    health_timeout: Duration,
}

impl GenAiGenerator {
    /// Builds a client; an explicit key overrides genai's per-provider environment lookup.
    #[must_use]
    pub fn new(
        key: Option<&str>,
        timeout: Duration,
        health_timeout: Duration,
    ) -> Self {
        let client = match key {
            Some(key) => {
                let key = key.to_string();
                let auth_resolver = AuthResolver::from_resolver_fn(
                    move |model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                        if model_iden.adapter_kind == AdapterKind::OpenAI {
                            Ok(Some(AuthData::from_single(key.clone())))
                        } else {
                            Ok(None)
                        }
                    },
                );
                genai::Client::builder().with_auth_resolver(auth_resolver).build()
            }
            None => genai::Client::default(),
        };

        Self {
            client,
            timeout,
            health_timeout,
        }
    }
}

#[async_trait]
impl TextGenerator for GenAiGenerator {
    async fn generate(
        &self,
        model: &str,
        system_prompt: Option<&str>,
        input: &str,
    ) -> Result<String, ApiError> {
        let mut chat_req = genai::chat::ChatRequest::default();
        if let Some(system) = system_prompt {
            chat_req = chat_req.with_system(system.to_string());
        }
        chat_req = chat_req.append_message(genai::chat::ChatMessage::user(input.to_string()));

        let response = tokio::time::timeout(self.timeout, self.client.exec_chat(model, chat_req, None))
            .await
            .map_err(|_| ApiError::Timeout(format!("Model {model} did not respond in time")))??;

        response
            .first_text()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::unexpected_shape(format!("Model {model} returned no text")))
    }

    async fn probe(
        &self,
        provider: Provider,
    ) -> bool {
        matches!(
            tokio::time::timeout(self.health_timeout, self.client.all_model_names(provider.adapter_kind())).await,
            Ok(Ok(_))
        )
    }
}

/// Runs a single direct generation.
///
/// # Errors
///
/// `BadRequest` for a blank model id or input, otherwise whatever the generator reports.
pub async fn generate(
    generator: &dyn TextGenerator,
    request: &GenerateRequest,
) -> Result<GenerateResponse, ApiError> {
    let model = request.model_id.trim();
    if model.is_empty() {
        return Err(ApiError::bad_request("modelId must not be empty"));
    }
    if request.input_text.trim().is_empty() {
        return Err(ApiError::bad_request("inputText must not be empty"));
    }

    let request_id = uuid::Uuid::new_v4();
    let started = Instant::now();
    let system_prompt = request.system_prompt.as_deref().filter(|s| !s.trim().is_empty());
    let result = generator.generate(model, system_prompt, &request.input_text).await;

    tracing::info!(
        %request_id,
        model = %model,
        prompt = %truncate_for_log(&request.input_text, 80),
        status = result.as_ref().map_or_else(ApiError::status_code, |_| 200),
        elapsed_ms = started.elapsed().as_millis(),
        "generation finished"
    );

    Ok(GenerateResponse {
        generated_text: result?,
        model_used: model.to_string(),
    })
}

/// Probes every catalog provider concurrently.
pub async fn models_health(
    generator: &dyn TextGenerator,
    catalog: &ModelCatalog,
) -> BTreeMap<String, bool> {
    let probes = catalog.providers().into_iter().map(|provider| async move {
        let healthy = generator.probe(provider).await;
        if !healthy {
            tracing::warn!(%provider, "provider health probe failed");
        }
        (provider.to_string(), healthy)
    });

    futures::future::join_all(probes).await.into_iter().collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned generator for handler tests.
    pub(crate) struct FakeGenerator {
        pub reply: Option<String>,
        pub healthy: Vec<Provider>,
        pub calls: AtomicUsize,
    }

    impl FakeGenerator {
        pub(crate) fn answering(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                healthy: vec![Provider::Ollama],
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(
            &self,
            model: &str,
            system_prompt: Option<&str>,
            input: &str,
        ) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(format!("{reply} [{model}|{}|{input}]", system_prompt.unwrap_or("-"))),
                None => Err(ApiError::Generation("model exploded".to_string())),
            }
        }

        async fn probe(
            &self,
            provider: Provider,
        ) -> bool {
            self.healthy.contains(&provider)
        }
    }

    #[test]
    fn test_provider_wire_names() {
        assert_eq!(serde_json::to_string(&Provider::OpenAI).unwrap(), r#""openai""#);
        assert_eq!(serde_json::to_string(&Provider::DeepSeek).unwrap(), r#""deepseek""#);
        assert_eq!(Provider::OpenAI.to_string(), "openai");
    }

    #[test]
    fn test_builtin_catalog_covers_all_providers() {
        let catalog = ModelCatalog::builtin().unwrap();
        assert_eq!(catalog.providers().len(), Provider::ALL.len());
    }

    #[test]
    fn test_available_filters_by_configured_provider() {
        let catalog = ModelCatalog::builtin().unwrap();
        let models = catalog.available(&[Provider::Ollama]);
        assert!(!models.is_empty());
        assert!(models.iter().all(|m| m.provider == Provider::Ollama));
    }

    #[test]
    fn test_model_info_wire_names() {
        let json = serde_json::to_value(ModelInfo {
            id: "gpt-4o-mini".to_string(),
            name: "GPT-4o mini".to_string(),
            provider: Provider::OpenAI,
            context_window: 128_000,
        })
        .unwrap();
        assert_eq!(json["contextWindow"], 128_000);
        assert_eq!(json["provider"], "openai");
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_input_without_calling_model() {
        let generator = FakeGenerator::answering("unused");
        let err = generate(
            &generator,
            &GenerateRequest {
                model_id: "gpt-4o-mini".to_string(),
                input_text: "  ".to_string(),
                system_prompt: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_passes_system_prompt() {
        let generator = FakeGenerator::answering("done");
        let response = generate(
            &generator,
            &GenerateRequest {
                model_id: " llama3.2 ".to_string(),
                input_text: "hello".to_string(),
                system_prompt: Some("be brief".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.generated_text, "done [llama3.2|be brief|hello]");
        assert_eq!(response.model_used, "llama3.2");
    }

    #[tokio::test]
    async fn test_generate_failure_is_500() {
        let generator = FakeGenerator {
            reply: None,
            healthy: vec![],
            calls: AtomicUsize::new(0),
        };
        let err = generate(
            &generator,
            &GenerateRequest {
                model_id: "gpt-4o".to_string(),
                input_text: "hi".to_string(),
                system_prompt: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_models_health_reports_each_provider() {
        let generator = FakeGenerator::answering("unused");
        let health = models_health(&generator, &ModelCatalog::builtin().unwrap()).await;

        assert_eq!(health.len(), Provider::ALL.len());
        assert_eq!(health.get("ollama"), Some(&true));
        assert_eq!(health.get("openai"), Some(&false));
    }
}
