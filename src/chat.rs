use serde::{Deserialize, Serialize};
#[cfg(feature = "server")]
use utoipa::ToSchema;

/// Prefix marking a reply that stands for an image the client must fetch separately.
pub const IMAGE_SENTINEL: &str = "IMAGE_READY:";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub enum ChatRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

impl ChatRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Inbound chat message.
///
/// Older clients post `{"text": ...}`; the field is accepted as an alias of `message`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ChatRequest {
    #[serde(alias = "text")]
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message with surrounding whitespace removed, as seen by routing and generation.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.message.trim()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    pub is_image_metadata: bool,
}

impl ChatResponse {
    /// Plain conversational reply.
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            is_image_metadata: false,
        }
    }

    /// Sentinel reply telling the client an image is ready for `prompt`.
    #[must_use]
    pub fn image_ready(prompt: &str) -> Self {
        Self {
            reply: format!("{IMAGE_SENTINEL}{prompt}"),
            is_image_metadata: true,
        }
    }
}

/// What a backend produced for one call, before it is shaped for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    TextResult { text: String },
    ImageResult { prompt_echoed: String },
}
