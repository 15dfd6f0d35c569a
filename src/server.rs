//! HTTP endpoints
//!
//! - `GET /` liveness
//! - `POST /chat` routed chat with normalized replies
//! - `POST /generate` raw text generation, failing with HTTP 500 `{detail}`

use crate::chat::{ChatRequest, ChatResponse};
use crate::error::{ApiError, DetailResponse, ErrorResponse};
use crate::processor::ChatProcessor;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

pub const STATUS_MESSAGE: &str = "Cool Shot Systems Backend Online";

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct LegacyGenerateRequest {
    #[serde(alias = "message")]
    pub text: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct LegacyGenerateResponse {
    pub generated_text: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = StatusResponse)
    )
)]
#[get("/")]
async fn status() -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        status: STATUS_MESSAGE.to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply to the message; backend failures are returned as apologies", body = ChatResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse)
    )
)]
#[post("/chat")]
async fn chat(
    processor: web::Data<ChatProcessor>,
    req: web::Json<ChatRequest>,
) -> web::Json<ChatResponse> {
    let request = req.into_inner();
    let span = tracing::info_span!("chat", request_id = %Uuid::new_v4());

    let response = processor.process(&request).instrument(span).await;
    web::Json(response)
}

#[utoipa::path(
    post,
    path = "/generate",
    request_body = LegacyGenerateRequest,
    responses(
        (status = 200, description = "Raw generated text", body = LegacyGenerateResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 500, description = "Backend failure", body = DetailResponse)
    )
)]
#[post("/generate")]
async fn generate(
    processor: web::Data<ChatProcessor>,
    req: web::Json<LegacyGenerateRequest>,
) -> Result<web::Json<LegacyGenerateResponse>, ApiError> {
    let request = req.into_inner();
    let span = tracing::info_span!("generate", request_id = %Uuid::new_v4());

    let generated_text = processor.generate_raw(&request.text).instrument(span).await?;
    Ok(web::Json(LegacyGenerateResponse { generated_text }))
}

#[derive(OpenApi)]
#[openapi(
    paths(status, chat, generate),
    components(schemas(
        StatusResponse,
        ChatRequest,
        ChatResponse,
        LegacyGenerateRequest,
        LegacyGenerateResponse,
        ErrorResponse,
        DetailResponse
    ))
)]
pub struct ApiDoc;

/// JSON extractor config turning body errors into `ErrorResponse` payloads.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!("Rejected request body: {}", err);
        ApiError::bad_request(err.to_string()).into()
    })
}

/// Registers the service routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(status).service(chat).service(generate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedBackend;
    use crate::error::BackendFailure;
    use crate::normalizer::TEXT_FALLBACK_REPLY;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn data(backend: ScriptedBackend) -> web::Data<ChatProcessor> {
        web::Data::new(ChatProcessor::new(Arc::new(backend)))
    }

    #[actix_web::test]
    async fn test_status_endpoint() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": STATUS_MESSAGE}));
    }

    #[actix_web::test]
    async fn test_chat_image_request() {
        let app = test::init_service(
            App::new()
                .app_data(data(ScriptedBackend::replying("unused")))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"message": "draw a cat in a hat"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"reply": "IMAGE_READY:draw a cat in a hat", "isImageMetadata": true}));
    }

    #[actix_web::test]
    async fn test_chat_accepts_text_alias() {
        let app = test::init_service(
            App::new()
                .app_data(data(ScriptedBackend::replying("<|im_start|>assistant\nParis<|im_end|>")))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"text": "What is the capital of France?"}))
            .to_request();
        let body: ChatResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, ChatResponse::text("Paris"));
    }

    #[actix_web::test]
    async fn test_chat_backend_failure_is_still_ok() {
        let app = test::init_service(
            App::new()
                .app_data(data(ScriptedBackend::failing(BackendFailure::unavailable("offline"))))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"message": "hello"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ChatResponse = test::read_body_json(resp).await;
        assert_eq!(body.reply, TEXT_FALLBACK_REPLY);
        assert!(!body.is_image_metadata);
    }

    #[actix_web::test]
    async fn test_chat_rejects_malformed_body() {
        let app = test::init_service(
            App::new()
                .app_data(data(ScriptedBackend::replying("x")))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"prompt": "hello"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "BAD_REQUEST");
        assert_eq!(body.status_code, 400);
    }

    #[actix_web::test]
    async fn test_generate_returns_raw_text() {
        let app = test::init_service(
            App::new()
                .app_data(data(ScriptedBackend::replying("Once upon a time")))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/generate")
            .set_json(json!({"text": "Tell me a story"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"generated_text": "Once upon a time"}));
    }

    #[actix_web::test]
    async fn test_generate_failure_is_500_with_detail() {
        let app = test::init_service(
            App::new()
                .app_data(data(ScriptedBackend::failing(BackendFailure::error("model crashed"))))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/generate")
            .set_json(json!({"text": "hi"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"detail": "model crashed"}));
    }

    #[::core::prelude::v1::test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/chat", "/generate"] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
