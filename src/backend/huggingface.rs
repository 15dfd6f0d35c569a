//! Hugging Face Inference API backend
//!
//! Text goes through the `text-generation` task with a prompt rendered in the
//! model family's chat template, so the raw output may still carry control markers.
//! Images go through the `text-to-image` task; only the size of the returned image
//! is recorded.
//!
//! A missing token is not an error at construction time. Every call fails with
//! [`BackendFailure::Unavailable`] instead.

use super::{GenerationBackend, GenerationOptions, ImageHandle};
use crate::chat::ConversationTurn;
use crate::config::AppConfig;
use crate::error::BackendFailure;
use crate::template::{ModelFamily, TemplateEngine};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;

pub struct HuggingFaceBackend {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    text_model: String,
    image_model: String,
    family: ModelFamily,
}

impl HuggingFaceBackend {
    /// Creates a new `HuggingFaceBackend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
        family: ModelFamily,
        timeout: Duration,
    ) -> Result<Self, BackendFailure> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendFailure::error(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            text_model: text_model.into(),
            image_model: image_model.into(),
            family,
        })
    }

    /// Creates the backend from application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, BackendFailure> {
        Self::new(
            config.hf_api_base.clone(),
            config.hf_token.clone(),
            config.text_model.clone(),
            config.image_model.clone(),
            config.model_family,
            config.request_timeout,
        )
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn model_url(
        &self,
        model: &str,
    ) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), model)
    }

    async fn post_inputs(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<reqwest::Response, BackendFailure> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| BackendFailure::unavailable("HF_TOKEN is not configured"))?;

        let response = self
            .http
            .post(self.model_url(model))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(failure_from_status(status, &body))
    }
}

/// Map a non-success inference response to a failure.
fn failure_from_status(
    status: StatusCode,
    body: &str,
) -> BackendFailure {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {body}")
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendFailure::unavailable(format!("Authentication failed: {message}"))
        }
        _ => BackendFailure::error(message),
    }
}

/// Extract the generated text from a `text-generation` response.
///
/// The API answers with `[{"generated_text": ...}]`; some deployments drop the array.
fn parse_generated_text(body: &Value) -> Result<String, BackendFailure> {
    let entry = match body {
        Value::Array(items) => items.first(),
        other => Some(other),
    };

    entry
        .and_then(|e| e.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BackendFailure::error("No generated_text in model response"))
}

#[async_trait]
impl GenerationBackend for HuggingFaceBackend {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn generate_text(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let prompt = TemplateEngine::render_conversation(turns, self.family);
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": options.max_output_tokens,
                "temperature": options.temperature,
                "return_full_text": false,
            },
        });

        let response = self.post_inputs(&self.text_model, &body).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| BackendFailure::error(format!("Invalid model response: {e}")))?;

        parse_generated_text(&value)
    }

    async fn request_image(
        &self,
        prompt: &str,
    ) -> Result<ImageHandle, BackendFailure> {
        let body = json!({ "inputs": prompt });
        let response = self.post_inputs(&self.image_model, &body).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(ct) = content_type.as_deref() {
            if !ct.starts_with("image/") {
                return Err(BackendFailure::error(format!("Expected an image but received '{ct}'")));
            }
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(BackendFailure::error("Image response was empty"));
        }

        tracing::info!("Generated image with {} ({} bytes)", self.image_model, bytes.len());
        Ok(ImageHandle {
            content_type,
            byte_len: bytes.len(),
        })
    }
}
