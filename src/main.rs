use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use coolshot_chat::server::{ApiDoc, configure};
use coolshot_chat::{AppConfig, ChatProcessor, build_backend};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    if config.hf_token.is_none() {
        tracing::warn!("HF_TOKEN is not set; Hugging Face requests will fail until it is configured");
    }

    let backend = build_backend(&config).map_err(std::io::Error::other)?;
    let processor = web::Data::new(ChatProcessor::from_config(backend, &config));

    tracing::info!(
        "Model family: {}, max output tokens: {}, temperature: {}",
        config.model_family,
        config.generation.max_output_tokens,
        config.generation.temperature
    );
    tracing::info!("Starting server at http://{}:{}/swagger-ui/", config.host, config.port);

    // OpenAPI documentation will be available at /api-doc/openapi.json
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(processor.clone())
            .configure(configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
