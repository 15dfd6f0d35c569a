//! Chat-completion backend built on the `genai` crate.
//!
//! Any provider genai can resolve from the model name works here, including a
//! locally hosted Ollama model. Image requests go to the Hugging Face backend.

use super::{GenerationBackend, GenerationOptions, HuggingFaceBackend, ImageHandle};
use crate::chat::{ChatRole, ConversationTurn};
use crate::error::BackendFailure;
use async_trait::async_trait;
use genai::ModelIden;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::resolver::{AuthData, AuthResolver};

/// Create a genai client, using `key` for every provider when given.
#[must_use]
pub fn create_genai_client(key: Option<&str>) -> genai::Client {
    match key {
        Some(key) => {
            let key = key.to_string();
            let auth_resolver = AuthResolver::from_resolver_fn(
                move |_model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                    Ok(Some(AuthData::from_single(key.clone())))
                },
            );
            genai::Client::builder().with_auth_resolver(auth_resolver).build()
        }
        None => genai::Client::default(),
    }
}

/// Convert our conversation into a genai chat request
fn to_genai_request(turns: &[ConversationTurn]) -> ChatRequest {
    turns.iter().fold(ChatRequest::default(), |chat_req, turn| {
        let message = match turn.role {
            ChatRole::User => ChatMessage::user(turn.content.clone()),
            ChatRole::Assistant => ChatMessage::assistant(turn.content.clone()),
            ChatRole::System => ChatMessage::system(turn.content.clone()),
        };
        chat_req.append_message(message)
    })
}

pub struct GenAiBackend {
    client: genai::Client,
    model: String,
    images: HuggingFaceBackend,
}

impl GenAiBackend {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        key: Option<&str>,
        images: HuggingFaceBackend,
    ) -> Self {
        Self {
            client: create_genai_client(key),
            model: model.into(),
            images,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationBackend for GenAiBackend {
    fn name(&self) -> &str {
        "genai"
    }

    async fn generate_text(
        &self,
        turns: &[ConversationTurn],
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let chat_req = to_genai_request(turns);
        let chat_options = ChatOptions::default()
            .with_max_tokens(options.max_output_tokens)
            .with_temperature(options.temperature);

        let response = self.client.exec_chat(self.model.as_str(), chat_req, Some(&chat_options)).await?;

        response
            .content_text_into_string()
            .ok_or_else(|| BackendFailure::error("No response from AI model"))
    }

    async fn request_image(
        &self,
        prompt: &str,
    ) -> Result<ImageHandle, BackendFailure> {
        self.images.request_image(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_genai_request_keeps_order() {
        let turns = vec![ConversationTurn::system("Be brief."), ConversationTurn::user("Hi")];
        let chat_req = to_genai_request(&turns);
        assert_eq!(chat_req.messages.len(), 2);
    }

    #[test]
    fn test_backend_keeps_model() {
        let images = HuggingFaceBackend::new(
            "https://example.invalid",
            None,
            "text-model",
            "image-model",
            crate::template::ModelFamily::ChatMl,
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        let backend = GenAiBackend::new("llama3.2", Some("key"), images);
        assert_eq!(backend.model(), "llama3.2");
        assert_eq!(backend.name(), "genai");
    }
}
