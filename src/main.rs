use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use office_fun_proxy::config::AppConfig;
use office_fun_proxy::generate::GenAiGenerator;
use office_fun_proxy::server::{self, ApiDoc, AppState};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // A missing .env file is normal in containers
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    let generator = Arc::new(GenAiGenerator::new(
        config.api_key.as_deref(),
        config.chat_timeout,
        config.health_timeout,
    ));

    let (host, port) = (config.host.clone(), config.port);
    tracing::info!(
        ai_base_url = %config.ai_base_url,
        weather_url = %config.weather_url,
        chat_model = %config.chat_model,
        providers = ?config.configured_providers,
        "configuration loaded"
    );
    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; image generation will be rejected");
    }

    let state = web::Data::new(AppState::new(config, generator).map_err(std::io::Error::other)?);

    tracing::info!("Starting server at http://{host}:{port}/swagger-ui/");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(server::json_config())
            .app_data(server::query_config())
            .configure(server::configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
