//! Reply Normalizer Module
//!
//! Turns whatever the generation backend produced into the stable [`ChatResponse`]
//! shape returned to clients:
//!
//! - **Images**: a sentinel reply `IMAGE_READY:<original message>` the client resolves itself
//! - **Text**: the generated text with chat-template control markers removed
//! - **Failures**: a readable apology, never an error
//!
//! Control markers differ between model families, so the set to strip is a
//! [`ControlMarkers`] value chosen from the active [`ModelFamily`].

use crate::chat::{ChatResponse, GenerationResult, IMAGE_SENTINEL};
use crate::error::BackendFailure;
use crate::intent::Intent;
use crate::template::ModelFamily;
use regex::Regex;

/// Reply used when a text request cannot be served.
pub const TEXT_FALLBACK_REPLY: &str =
    "Sorry, I can't reach my language model right now. Please try again in a moment.";

/// Prefix of the reply used when image generation fails; the failure detail follows it.
pub const IMAGE_FAILURE_PREFIX: &str = "I tried to generate that image, but the API reported an error: ";

const ROLE_LABEL: &str = r"[ \t]*(?i:(?:system|user|assistant|model)\b)?";

/// Template control tokens to remove from raw model output.
#[derive(Debug, Clone)]
pub struct ControlMarkers {
    /// Markers that open a turn, with the role label that may follow them.
    turn_openers: Option<Regex>,
    /// Markers removed verbatim.
    tokens: Option<Regex>,
}

impl ControlMarkers {
    /// Builds a marker set from turn-opening markers and standalone tokens.
    ///
    /// `labelled_openers` is set for templates whose opener is followed by a role
    /// word (`<|im_start|>assistant`). Openers that name the role themselves
    /// (`<|assistant|>`) leave the following text alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined pattern exceeds the regex size limits.
    pub fn new<S: AsRef<str>>(
        turn_openers: &[S],
        tokens: &[S],
        labelled_openers: bool,
    ) -> Result<Self, regex::Error> {
        let label = if labelled_openers { ROLE_LABEL } else { "" };
        let turn_openers = Self::alternation(turn_openers)
            .map(|alt| Regex::new(&format!("(?:{alt}){label}")))
            .transpose()?;
        let tokens = Self::alternation(tokens).map(|alt| Regex::new(&alt)).transpose()?;

        Ok(Self { turn_openers, tokens })
    }

    /// The built-in marker set of a model family.
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn for_family(family: ModelFamily) -> Self {
        let (openers, tokens, labelled): (&[&str], &[&str], bool) = match family {
            ModelFamily::ChatMl => (&["<|im_start|>"], &["<|im_end|>", "<|endoftext|>"], true),
            ModelFamily::Llama3 => (
                &["<|start_header_id|>"],
                &["<|end_header_id|>", "<|eot_id|>", "<|begin_of_text|>", "<|end_of_text|>"],
                true,
            ),
            ModelFamily::Gemma => (&["<start_of_turn>"], &["<end_of_turn>", "<bos>", "<eos>"], true),
            ModelFamily::Zephyr => (&["<|system|>", "<|user|>", "<|assistant|>"], &["</s>", "<s>"], false),
            ModelFamily::Plain => (&[], &[], false),
        };

        // Built from escaped literals, well under the size limit
        Self::new(openers, tokens, labelled).expect("built-in control markers compile")
    }

    fn alternation<S: AsRef<str>>(markers: &[S]) -> Option<String> {
        let escaped: Vec<String> = markers
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect();

        if escaped.is_empty() {
            None
        } else {
            Some(escaped.join("|"))
        }
    }

    /// Removes every marker (and the role label after a turn opener), then trims.
    ///
    /// Removal repeats until nothing changes, since deleting one marker can join
    /// its neighbours into another.
    #[must_use]
    pub fn strip(
        &self,
        raw: &str,
    ) -> String {
        let mut text = raw.to_string();

        loop {
            let mut next = text.clone();
            if let Some(openers) = &self.turn_openers {
                next = openers.replace_all(&next, "").into_owned();
            }
            if let Some(tokens) = &self.tokens {
                next = tokens.replace_all(&next, "").into_owned();
            }

            if next == text {
                break;
            }
            text = next;
        }

        text.trim().to_string()
    }
}

impl Default for ControlMarkers {
    fn default() -> Self {
        Self::for_family(ModelFamily::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplyNormalizer {
    markers: ControlMarkers,
}

impl ReplyNormalizer {
    #[must_use]
    pub const fn new(markers: ControlMarkers) -> Self {
        Self { markers }
    }

    #[must_use]
    pub fn for_family(family: ModelFamily) -> Self {
        Self::new(ControlMarkers::for_family(family))
    }

    /// Shapes one backend outcome into the client response. Never fails.
    #[must_use]
    pub fn normalize(
        &self,
        intent: Intent,
        result: Result<GenerationResult, BackendFailure>,
        original_message: &str,
    ) -> ChatResponse {
        match (intent, result) {
            (Intent::ImageRequest, Ok(_)) => ChatResponse::image_ready(original_message),
            (Intent::ImageRequest, Err(failure)) => {
                ChatResponse::text(format!("{IMAGE_FAILURE_PREFIX}{}", failure.detail()))
            }
            (Intent::TextRequest, Ok(GenerationResult::TextResult { text })) => {
                let stripped = self.markers.strip(&text);
                // A text reply must never read as image metadata
                let mut reply = stripped.as_str();
                while let Some(rest) = reply.strip_prefix(IMAGE_SENTINEL) {
                    reply = rest.trim_start();
                }
                ChatResponse::text(reply)
            }
            (Intent::TextRequest, Ok(GenerationResult::ImageResult { .. })) => {
                tracing::warn!("Backend returned an image result for a text request");
                ChatResponse::text(TEXT_FALLBACK_REPLY)
            }
            (Intent::TextRequest, Err(_)) => ChatResponse::text(TEXT_FALLBACK_REPLY),
        }
    }
}
