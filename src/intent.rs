//! Keyword-based intent routing
//!
//! Decides whether a chat message asks for an image or for a text answer by looking
//! for fixed trigger phrases anywhere in the message.
//!
//! Matching is plain substring search, so "I will draw my own conclusions" routes to
//! image generation. That false positive is accepted; changing the matching rules is
//! a product decision, not a fix.

use strum::{Display, EnumString};

/// Trigger phrases that mark a message as an image request, in match order.
pub const DEFAULT_IMAGE_TRIGGERS: &[&str] = &[
    "draw",
    "generate image",
    "generate a picture",
    "create an image",
    "make a picture",
    "show me a picture",
    "show me an image",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    TextRequest,
    ImageRequest,
}

#[derive(Debug, Clone)]
pub struct IntentRouter {
    triggers: Vec<String>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::with_triggers(DEFAULT_IMAGE_TRIGGERS.iter().copied())
    }
}

impl IntentRouter {
    /// Builds a router over a custom trigger table. Phrases are matched case-insensitively.
    pub fn with_triggers<I, S>(triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            triggers: triggers
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// Classifies a message. Total and side-effect free; empty input is a text request.
    #[must_use]
    pub fn classify(
        &self,
        message: &str,
    ) -> Intent {
        let message = message.trim().to_lowercase();
        if message.is_empty() {
            return Intent::TextRequest;
        }

        match self.triggers.iter().find(|t| message.contains(t.as_str())) {
            Some(trigger) => {
                tracing::debug!("Message matched image trigger '{}'", trigger);
                Intent::ImageRequest
            }
            None => Intent::TextRequest,
        }
    }
}
