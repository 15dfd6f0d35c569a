//! Chat request processor
//!
//! Runs one chat call end to end: classify the message, make a single backend
//! call, and shape the outcome into a [`ChatResponse`]. Nothing is kept between
//! calls; the processor only holds read-only configuration and the backend.

use crate::backend::{GenerationBackend, GenerationOptions};
use crate::chat::{ChatRequest, ChatResponse, ConversationTurn, GenerationResult};
use crate::config::AppConfig;
use crate::error::BackendFailure;
use crate::intent::{Intent, IntentRouter};
use crate::normalizer::ReplyNormalizer;
use crate::template::TemplateEngine;
use std::sync::Arc;

pub struct ChatProcessor {
    backend: Arc<dyn GenerationBackend>,
    router: IntentRouter,
    normalizer: ReplyNormalizer,
    system_prompt: String,
    options: GenerationOptions,
}

impl ChatProcessor {
    #[must_use]
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            router: IntentRouter::default(),
            normalizer: ReplyNormalizer::default(),
            system_prompt: TemplateEngine::render_system_prompt(crate::config::DEFAULT_ASSISTANT_NAME),
            options: GenerationOptions::default(),
        }
    }

    /// Builds a processor whose prompt, sampling and marker set follow `config`.
    #[must_use]
    pub fn from_config(
        backend: Arc<dyn GenerationBackend>,
        config: &AppConfig,
    ) -> Self {
        Self::new(backend)
            .with_normalizer(ReplyNormalizer::for_family(config.model_family))
            .with_system_prompt(config.system_prompt.clone())
            .with_options(config.generation)
    }

    #[must_use]
    pub fn with_router(
        mut self,
        router: IntentRouter,
    ) -> Self {
        self.router = router;
        self
    }

    #[must_use]
    pub fn with_normalizer(
        mut self,
        normalizer: ReplyNormalizer,
    ) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_system_prompt(
        mut self,
        system_prompt: impl Into<String>,
    ) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    #[must_use]
    pub const fn with_options(
        mut self,
        options: GenerationOptions,
    ) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The fixed system turn followed by the user's message.
    fn conversation(
        &self,
        message: &str,
    ) -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::system(self.system_prompt.clone()),
            ConversationTurn::user(message),
        ]
    }

    /// Process a chat request and return the reply for the client. Backend failures
    /// become conversational replies.
    pub async fn process(
        &self,
        request: &ChatRequest,
    ) -> ChatResponse {
        let message = request.trimmed();
        let intent = self.router.classify(message);
        tracing::info!("Classified message as {} ({} chars)", intent, message.len());

        let result = match intent {
            Intent::ImageRequest => self
                .backend
                .request_image(message)
                .await
                .map(|handle| {
                    tracing::debug!("Image ready: {:?}", handle);
                    GenerationResult::ImageResult {
                        prompt_echoed: message.to_string(),
                    }
                }),
            Intent::TextRequest => self
                .backend
                .generate_text(&self.conversation(message), &self.options)
                .await
                .map(|text| GenerationResult::TextResult { text }),
        };

        if let Err(failure) = &result {
            tracing::warn!("{} backend failed for {}: {}", self.backend.name(), intent, failure);
        }

        self.normalizer.normalize(intent, result, &request.message)
    }

    /// Raw text generation for a single user turn, without routing or normalization.
    ///
    /// # Errors
    ///
    /// Returns the backend failure unchanged.
    pub async fn generate_raw(
        &self,
        text: &str,
    ) -> Result<String, BackendFailure> {
        let turns = [ConversationTurn::user(text.trim())];
        self.backend.generate_text(&turns, &self.options).await.inspect_err(|failure| {
            tracing::warn!("{} backend failed for raw generation: {}", self.backend.name(), failure);
        })
    }
}
