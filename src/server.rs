//! HTTP surface: actix-web handlers, shared state, and the OpenAPI document.

use actix_web::cookie::Cookie;
use actix_web::http::header::ACCEPT_LANGUAGE;
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, route, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::chat::{ChatMessage, ChatRequest, ChatResponse, ChatRole};
use crate::config::AppConfig;
use crate::error::{ApiError, ErrorResponse};
use crate::generate::{self, GenerateRequest, GenerateResponse, ModelCatalog, ModelInfo, Provider, TextGenerator};
use crate::image::{ImageGenerateRequest, ImageGenerateResponse};
use crate::locale::{LOCALE_COOKIE_MAX_AGE_DAYS, Locale, resolve_locale};
use crate::meme::{MemeRequest, MemeResponse};
use crate::proxy::ProxyClient;
use crate::tools::{ToolCatalog, ToolDescriptor};
use crate::weather::{CityInfo, CityList};

/// Everything handlers share. Built once at startup and never mutated.
pub struct AppState {
    pub proxy: ProxyClient,
    pub generator: Arc<dyn TextGenerator>,
    pub models: ModelCatalog,
    pub cities: CityList,
}

impl AppState {
    /// Loads the embedded catalogs and builds the outbound client.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded catalog is malformed or the HTTP client cannot be built.
    pub fn new(
        config: AppConfig,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self {
            proxy: ProxyClient::new(config, ToolCatalog::builtin()?)?,
            generator,
            models: ModelCatalog::builtin()?,
            cities: CityList::builtin()?,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        self.proxy.config()
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct LocaleResponse {
    pub locale: Locale,
}

#[derive(Deserialize, Debug)]
pub struct WeatherQuery {
    #[serde(rename = "cityIds")]
    pub city_ids: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CitySearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[get("/health")]
async fn health() -> impl Responder {
    web::Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Provider unreachable or timed out", body = ErrorResponse)
    )
)]
#[post("/api/chat")]
async fn chat(
    state: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> Result<web::Json<ChatResponse>, ApiError> {
    let response = state.proxy.forward_chat(&req).await?;
    Ok(web::Json(response))
}

#[utoipa::path(
    post,
    path = "/api/image/generate",
    request_body = ImageGenerateRequest,
    responses(
        (status = 200, description = "Generated image", body = ImageGenerateResponse),
        (status = 400, description = "Blank prompt or content policy violation", body = ErrorResponse),
        (status = 401, description = "Provider rejected the API key", body = ErrorResponse),
        (status = 429, description = "Provider quota exhausted", body = ErrorResponse),
        (status = 500, description = "Any other failure", body = ErrorResponse)
    )
)]
#[post("/api/image/generate")]
async fn generate_image(
    state: web::Data<AppState>,
    req: web::Json<ImageGenerateRequest>,
) -> Result<web::Json<ImageGenerateResponse>, ApiError> {
    let response = state.proxy.forward_image_generation(&req).await?;
    Ok(web::Json(response))
}

#[utoipa::path(
    post,
    path = "/api/meme/generate",
    request_body = MemeRequest,
    responses(
        (status = 200, description = "Caption and image", body = MemeResponse),
        (status = 400, description = "Blank topic", body = ErrorResponse)
    )
)]
#[post("/api/meme/generate")]
async fn generate_meme(
    state: web::Data<AppState>,
    req: web::Json<MemeRequest>,
) -> Result<web::Json<MemeResponse>, ApiError> {
    let response = state.proxy.generate_meme(&req).await?;
    Ok(web::Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated text", body = GenerateResponse),
        (status = 400, description = "Blank model or input", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
#[post("/api/v1/generate")]
async fn generate_text(
    state: web::Data<AppState>,
    req: web::Json<GenerateRequest>,
) -> Result<web::Json<GenerateResponse>, ApiError> {
    let response = generate::generate(state.generator.as_ref(), &req).await?;
    Ok(web::Json(response))
}

#[utoipa::path(
    get,
    path = "/api/models/available",
    responses((status = 200, description = "Models usable with the configured credentials", body = Vec<ModelInfo>))
)]
#[get("/api/models/available")]
async fn available_models(state: web::Data<AppState>) -> impl Responder {
    web::Json(state.models.available(&state.config().configured_providers))
}

#[utoipa::path(
    get,
    path = "/api/models/health",
    responses((status = 200, description = "Map of provider name to reachability"))
)]
#[get("/api/models/health")]
async fn models_health(state: web::Data<AppState>) -> impl Responder {
    web::Json(generate::models_health(state.generator.as_ref(), &state.models).await)
}

#[utoipa::path(
    get,
    path = "/api/weather/meizu",
    params(("cityIds" = String, Query, description = "Comma-separated provider city ids")),
    responses(
        (status = 200, description = "Provider payload, unchanged"),
        (status = 400, description = "Missing cityIds", body = ErrorResponse),
        (status = 500, description = "Provider unreachable or timed out", body = ErrorResponse)
    )
)]
#[route("/api/weather/meizu", method = "GET", method = "POST")]
async fn weather(
    state: web::Data<AppState>,
    query: web::Query<WeatherQuery>,
) -> Result<HttpResponse, ApiError> {
    let city_ids = query.city_ids.as_deref().unwrap_or_default();
    let payload = state.proxy.forward_weather_lookup(city_ids).await?;
    Ok(payload.to_http_response())
}

#[utoipa::path(
    get,
    path = "/api/weather/cities",
    params(("q" = Option<String>, Query, description = "Substring of the city name")),
    responses((status = 200, description = "Matching cities", body = Vec<CityInfo>))
)]
#[get("/api/weather/cities")]
async fn weather_cities(
    state: web::Data<AppState>,
    query: web::Query<CitySearchQuery>,
) -> impl Responder {
    web::Json(state.cities.search(query.q.as_deref().unwrap_or_default()))
}

#[utoipa::path(
    get,
    path = "/api/tools",
    responses((status = 200, description = "Tool catalog", body = Vec<ToolDescriptor>))
)]
#[get("/api/tools")]
async fn list_tools(state: web::Data<AppState>) -> impl Responder {
    web::Json(state.proxy.tools().list().to_vec())
}

#[utoipa::path(
    get,
    path = "/api/locale",
    params(("locale" = Option<String>, Query, description = "Locale from the URL segment")),
    responses((status = 200, description = "Resolved locale, persisted in the locale cookie", body = LocaleResponse))
)]
#[get("/api/locale")]
async fn locale(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    query: web::Query<LocaleQuery>,
) -> impl Responder {
    let cookie_name = state.config().locale_cookie.as_str();
    let cookie = http_req.cookie(cookie_name);
    let accept_language = http_req
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    let resolved = resolve_locale(
        query.locale.as_deref(),
        cookie.as_ref().map(|c| c.value()),
        accept_language,
    );

    let persisted = Cookie::build(cookie_name.to_string(), resolved.to_string())
        .path("/")
        .max_age(actix_web::cookie::time::Duration::days(LOCALE_COOKIE_MAX_AGE_DAYS))
        .finish();

    HttpResponse::Ok()
        .cookie(persisted)
        .json(LocaleResponse { locale: resolved })
}

/// Malformed JSON bodies get the same error shape as every other validation failure.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ApiError::bad_request(err.to_string()).into())
}

/// Query strings that fail to deserialize get the same shape too.
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| ApiError::bad_request(err.to_string()).into())
}

/// Registers every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(chat)
        .service(generate_image)
        .service(generate_meme)
        .service(generate_text)
        .service(available_models)
        .service(models_health)
        .service(weather)
        .service(weather_cities)
        .service(list_tools)
        .service(locale);
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        chat,
        generate_image,
        generate_meme,
        generate_text,
        available_models,
        models_health,
        weather,
        weather_cities,
        list_tools,
        locale
    ),
    components(schemas(
        HealthResponse,
        LocaleResponse,
        Locale,
        ChatRequest,
        ChatResponse,
        ChatMessage,
        ChatRole,
        ImageGenerateRequest,
        ImageGenerateResponse,
        MemeRequest,
        MemeResponse,
        GenerateRequest,
        GenerateResponse,
        ModelInfo,
        Provider,
        CityInfo,
        ToolDescriptor,
        ErrorResponse
    ))
)]
pub struct ApiDoc;
