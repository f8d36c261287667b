//! Process configuration, read once at startup and immutable afterwards.

use std::fmt;
use std::time::Duration;

use crate::generate::Provider;

const DEFAULT_BACKEND_URL_LOCAL: &str = "http://localhost:8000/v1";
const DEFAULT_BACKEND_URL_DOCKER: &str = "http://backend:8000/v1";
const DEFAULT_IMAGE_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_WEATHER_URL: &str = "https://aider.meizu.com/app/weather/listWeather";
const DEFAULT_LOCALE_COOKIE: &str = "NEXT_LOCALE";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible chat backend, without a trailing slash.
    pub ai_base_url: String,
    pub image_base_url: String,
    pub weather_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub chat_timeout: Duration,
    pub image_timeout: Duration,
    pub weather_timeout: Duration,
    pub health_timeout: Duration,
    pub locale_cookie: String,
    /// Providers with credentials present in the environment.
    pub configured_providers: Vec<Provider>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, treating blank values as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            get(key).map_or(Ok(default), |value| {
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { key, value })
            })
        };

        let docker = get("DOCKER_ENV").is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
        let ai_base_url = get("AI_BASE_URL").unwrap_or_else(|| {
            if docker {
                get("BACKEND_URL_DOCKER").unwrap_or_else(|| DEFAULT_BACKEND_URL_DOCKER.to_string())
            } else {
                get("BACKEND_URL_LOCAL").unwrap_or_else(|| DEFAULT_BACKEND_URL_LOCAL.to_string())
            }
        });

        let port = number("PORT", 8080)?;
        let port = u16::try_from(port).map_err(|_| ConfigError::InvalidNumber {
            key: "PORT",
            value: port.to_string(),
        })?;

        let configured_providers = Provider::ALL
            .iter()
            .copied()
            .filter(|p| p.api_key_env().is_none_or(|env| get(env).is_some()))
            .collect();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            api_key: get("OPENAI_API_KEY"),
            ai_base_url: ai_base_url.trim_end_matches('/').to_string(),
            image_base_url: get("IMAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            weather_url: get("WEATHER_URL").unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()),
            chat_model: get("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            image_model: get("IMAGE_MODEL").unwrap_or_else(|| "dall-e-3".to_string()),
            chat_timeout: Duration::from_secs(number("CHAT_TIMEOUT_SECS", 15)?),
            image_timeout: Duration::from_secs(number("IMAGE_TIMEOUT_SECS", 20)?),
            weather_timeout: Duration::from_secs(number("WEATHER_TIMEOUT_SECS", 5)?),
            health_timeout: Duration::from_secs(number("HEALTH_TIMEOUT_SECS", 5)?),
            locale_cookie: get("LOCALE_COOKIE").unwrap_or_else(|| DEFAULT_LOCALE_COOKIE.to_string()),
            configured_providers,
        })
    }

    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.ai_base_url)
    }

    #[must_use]
    pub fn image_generations_url(&self) -> String {
        format!("{}/images/generations", self.image_base_url)
    }
}

#[cfg(test)]
impl AppConfig {
    /// Points every provider at one mock server with short timeouts.
    pub(crate) fn for_tests(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_key: Some("test-key".to_string()),
            ai_base_url: base.to_string(),
            image_base_url: base.to_string(),
            weather_url: format!("{base}/weather"),
            chat_model: "test-model".to_string(),
            image_model: "test-image-model".to_string(),
            chat_timeout: Duration::from_millis(500),
            image_timeout: Duration::from_millis(500),
            weather_timeout: Duration::from_millis(500),
            health_timeout: Duration::from_millis(200),
            locale_cookie: DEFAULT_LOCALE_COOKIE.to_string(),
            configured_providers: vec![Provider::OpenAI, Provider::Ollama],
        }
    }
}
