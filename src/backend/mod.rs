//! Generation backends
//!
//! The chat core only needs two capabilities from a model provider: turn a
//! conversation into text, and confirm that an image was generated for a prompt.
//! [`GenerationBackend`] is that seam; the concrete providers live in submodules.

pub mod huggingface;
pub mod llm;

use crate::chat::ConversationTurn;
use crate::config::{AppConfig, BackendKind};
use crate::error::{BackendFailure, ConfigError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use huggingface::HuggingFaceBackend;
pub use llm::GenAiBackend;

/// Sampling options for text generation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 256,
            temperature: 0.7,
        }
    }
}

/// Confirmation that an image was generated. Pixel data is not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub content_type: Option<String>,
    pub byte_len: usize,
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn generate_text(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure>;

    async fn request_image(
        &self,
        prompt: &str,
    ) -> Result<ImageHandle, BackendFailure>;
}

/// Builds the backend selected by the configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client for the backend cannot be built.
pub fn build_backend(config: &AppConfig) -> Result<Arc<dyn GenerationBackend>, ConfigError> {
    let images = HuggingFaceBackend::from_config(config).map_err(|e| ConfigError::Backend(e.to_string()))?;

    let backend: Arc<dyn GenerationBackend> = match config.backend {
        BackendKind::HuggingFace => Arc::new(images),
        BackendKind::GenAi => Arc::new(GenAiBackend::new(
            &config.text_model,
            config.genai_key.as_deref(),
            images,
        )),
    };

    tracing::info!("Using {} backend with text model '{}'", backend.name(), config.text_model);
    Ok(backend)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Backend double returning canned outcomes and recording what it was asked.
    pub struct ScriptedBackend {
        text: Result<String, BackendFailure>,
        image: Result<ImageHandle, BackendFailure>,
        pub seen_turns: Mutex<Vec<Vec<ConversationTurn>>>,
        pub seen_prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub fn new(
            text: Result<String, BackendFailure>,
            image: Result<ImageHandle, BackendFailure>,
        ) -> Self {
            Self {
                text,
                image,
                seen_turns: Mutex::new(Vec::new()),
                seen_prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(text: &str) -> Self {
            Self::new(
                Ok(text.to_string()),
                Ok(ImageHandle {
                    content_type: Some("image/png".to_string()),
                    byte_len: 1024,
                }),
            )
        }

        pub fn failing(failure: BackendFailure) -> Self {
            Self::new(Err(failure.clone()), Err(failure))
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_text(
            &self,
            turns: &[ConversationTurn],
            _options: &GenerationOptions,
        ) -> Result<String, BackendFailure> {
            self.seen_turns.lock().unwrap().push(turns.to_vec());
            self.text.clone()
        }

        async fn request_image(
            &self,
            prompt: &str,
        ) -> Result<ImageHandle, BackendFailure> {
            self.seen_prompts.lock().unwrap().push(prompt.to_string());
            self.image.clone()
        }
    }
}
