//! Process configuration
//!
//! Everything is read from environment variables (the server loads `.env` first).
//! Parsing goes through a lookup function so callers other than `main` can supply
//! their own source.

use crate::backend::GenerationOptions;
use crate::error::ConfigError;
use crate::template::{ModelFamily, TemplateEngine};
use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumString};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TEXT_MODEL: &str = "llama3.2";
pub const DEFAULT_HF_TEXT_MODEL: &str = "HuggingFaceTB/SmolLM2-1.7B-Instruct";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const DEFAULT_HF_API_BASE: &str = "https://router.huggingface.co/hf-inference";
pub const DEFAULT_ASSISTANT_NAME: &str = "Cool Shot";

/// Which provider serves text generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum BackendKind {
    #[default]
    #[strum(to_string = "genai")]
    GenAi,
    #[strum(to_string = "huggingface", serialize = "hf")]
    HuggingFace,
}

impl BackendKind {
    /// Text model used when `DEFAULT_MODEL` is unset.
    #[must_use]
    pub const fn default_text_model(self) -> &'static str {
        match self {
            Self::GenAi => DEFAULT_TEXT_MODEL,
            Self::HuggingFace => DEFAULT_HF_TEXT_MODEL,
        }
    }

    /// Template family of the default text model, used when `MODEL_FAMILY` is unset.
    #[must_use]
    pub const fn default_model_family(self) -> ModelFamily {
        match self {
            Self::GenAi => ModelFamily::Llama3,
            Self::HuggingFace => ModelFamily::ChatMl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    pub text_model: String,
    pub image_model: String,
    pub genai_key: Option<String>,
    pub hf_token: Option<String>,
    pub hf_api_base: String,
    pub model_family: ModelFamily,
    pub generation: GenerationOptions,
    pub request_timeout: Duration,
    pub system_prompt: String,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a variable if set.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let generation = GenerationOptions {
            max_output_tokens: parse_or(&get, "MAX_OUTPUT_TOKENS", GenerationOptions::default().max_output_tokens)?,
            temperature: parse_or(&get, "TEMPERATURE", GenerationOptions::default().temperature)?,
        };
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "TEMPERATURE".to_string(),
                value: generation.temperature.to_string(),
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }

        let system_prompt = get("SYSTEM_PROMPT").unwrap_or_else(|| {
            let name = get("ASSISTANT_NAME").unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string());
            TemplateEngine::render_system_prompt(&name)
        });

        let backend: BackendKind = parse_or(&get, "BACKEND", BackendKind::default())?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            backend,
            text_model: get("DEFAULT_MODEL").unwrap_or_else(|| backend.default_text_model().to_string()),
            image_model: get("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            genai_key: get("DEFAULT_KEY"),
            hf_token: get("HF_TOKEN"),
            hf_api_base: get("HF_API_BASE").unwrap_or_else(|| DEFAULT_HF_API_BASE.to_string()),
            model_family: parse_or(&get, "MODEL_FAMILY", backend.default_model_family())?,
            generation,
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 120)?),
            system_prompt,
        })
    }
}

fn parse_or<T, G>(
    get: &G,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.backend, BackendKind::GenAi);
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.model_family, ModelFamily::Llama3);
        assert_eq!(config.generation, GenerationOptions::default());
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(config.hf_token.is_none());
        assert!(config.system_prompt.contains(DEFAULT_ASSISTANT_NAME));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("BACKEND", "HuggingFace"),
            ("MODEL_FAMILY", "llama3"),
            ("MAX_OUTPUT_TOKENS", "64"),
            ("TEMPERATURE", "0.2"),
            ("HF_TOKEN", "hf_secret"),
            ("ASSISTANT_NAME", "Shot Bot"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.backend, BackendKind::HuggingFace);
        assert_eq!(config.model_family, ModelFamily::Llama3);
        assert_eq!(config.generation.max_output_tokens, 64);
        assert_eq!(config.hf_token.as_deref(), Some("hf_secret"));
        assert!(config.system_prompt.contains("Shot Bot"));
    }

    #[test]
    fn test_huggingface_defaults_to_hub_model() {
        let config = config(&[("BACKEND", "huggingface")]).unwrap();
        assert_eq!(config.text_model, DEFAULT_HF_TEXT_MODEL);
        assert_eq!(config.model_family, ModelFamily::ChatMl);
    }

    #[test]
    fn test_explicit_model_and_family_win_over_backend_defaults() {
        let config = config(&[
            ("BACKEND", "huggingface"),
            ("DEFAULT_MODEL", "google/gemma-2-2b-it"),
            ("MODEL_FAMILY", "gemma"),
        ])
        .unwrap();
        assert_eq!(config.text_model, "google/gemma-2-2b-it");
        assert_eq!(config.model_family, ModelFamily::Gemma);
    }

    #[test]
    fn test_hf_alias_for_backend() {
        assert_eq!(config(&[("BACKEND", "hf")]).unwrap().backend, BackendKind::HuggingFace);
    }

    #[test]
    fn test_system_prompt_override_wins() {
        let config = config(&[("SYSTEM_PROMPT", "You are terse."), ("ASSISTANT_NAME", "Ignored")]).unwrap();
        assert_eq!(config.system_prompt, "You are terse.");
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config(&[("PORT", "  "), ("HF_TOKEN", "")]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.hf_token.is_none());
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));

        assert!(config(&[("BACKEND", "openai-direct")]).is_err());
        assert!(config(&[("MODEL_FAMILY", "mistral")]).is_err());
        assert!(config(&[("TEMPERATURE", "3.5")]).is_err());
    }
}
