//! Prompt templates.
//!
//! The system prompt is a `{{VAR}}` template filled from configuration. Raw
//! text-generation endpoints get the conversation rendered in the chat template
//! of the model family.

use crate::chat::{ChatRole, ConversationTurn};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Chat template conventions of a model family.
///
/// The family decides how a conversation is rendered into a single prompt for raw
/// text-generation endpoints, and which control markers are stripped from the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModelFamily {
    #[default]
    ChatMl,
    Llama3,
    Gemma,
    Zephyr,
    Plain,
}

pub struct TemplateEngine;

impl TemplateEngine {
    // Templates embedded at compile time
    const SYSTEM_PROMPT: &'static str = include_str!("../templates/system_prompt.txt");

    #[must_use]
    pub fn render(
        template: &str,
        variables: &HashMap<&str, &str>,
    ) -> String {
        let mut result = template.to_string();

        for (key, value) in variables {
            let placeholder = format!("{{{{{key}}}}}");
            result = result.replace(&placeholder, value);
        }

        result
    }

    /// Render the system prompt template for the given assistant name.
    #[must_use]
    pub fn render_system_prompt(assistant_name: &str) -> String {
        let mut variables = HashMap::new();
        variables.insert("ASSISTANT_NAME", assistant_name);

        Self::render(Self::SYSTEM_PROMPT, &variables).trim().to_string()
    }

    /// Render a conversation into one prompt string, ending with an open assistant turn.
    #[must_use]
    pub fn render_conversation(
        turns: &[ConversationTurn],
        family: ModelFamily,
    ) -> String {
        let mut prompt = String::new();

        match family {
            ModelFamily::ChatMl => {
                for turn in turns {
                    prompt.push_str(&format!("<|im_start|>{}\n{}<|im_end|>\n", turn.role.as_str(), turn.content));
                }
                prompt.push_str("<|im_start|>assistant\n");
            }
            ModelFamily::Llama3 => {
                prompt.push_str("<|begin_of_text|>");
                for turn in turns {
                    prompt.push_str(&format!(
                        "<|start_header_id|>{}<|end_header_id|>\n\n{}<|eot_id|>",
                        turn.role.as_str(),
                        turn.content
                    ));
                }
                prompt.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");
            }
            ModelFamily::Gemma => {
                // No system role: system text is folded into the first user turn.
                let mut pending_system = String::new();
                for turn in turns {
                    match turn.role {
                        ChatRole::System => {
                            pending_system.push_str(&turn.content);
                            pending_system.push_str("\n\n");
                        }
                        ChatRole::User => {
                            let content = format!("{}{}", std::mem::take(&mut pending_system), turn.content);
                            prompt.push_str(&format!("<start_of_turn>user\n{content}<end_of_turn>\n"));
                        }
                        ChatRole::Assistant => {
                            prompt.push_str(&format!("<start_of_turn>model\n{}<end_of_turn>\n", turn.content));
                        }
                    }
                }
                prompt.push_str("<start_of_turn>model\n");
            }
            ModelFamily::Zephyr => {
                for turn in turns {
                    prompt.push_str(&format!("<|{}|>\n{}</s>\n", turn.role.as_str(), turn.content));
                }
                prompt.push_str("<|assistant|>\n");
            }
            ModelFamily::Plain => {
                for turn in turns {
                    let label = match turn.role {
                        ChatRole::System => "System",
                        ChatRole::User => "User",
                        ChatRole::Assistant => "Assistant",
                    };
                    prompt.push_str(&format!("{label}: {}\n", turn.content));
                }
                prompt.push_str("Assistant:");
            }
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns() -> Vec<ConversationTurn> {
        vec![ConversationTurn::system("Be brief."), ConversationTurn::user("Hi")]
    }

    #[test]
    fn test_render_replaces_placeholders() {
        let mut variables = HashMap::new();
        variables.insert("NAME", "World");
        assert_eq!(TemplateEngine::render("Hello {{NAME}}!", &variables), "Hello World!");
    }

    #[test]
    fn test_system_prompt_mentions_assistant_name() {
        let prompt = TemplateEngine::render_system_prompt("Cool Shot");
        assert!(prompt.contains("Cool Shot"));
        assert!(!prompt.contains("{{ASSISTANT_NAME}}"));
    }

    #[test]
    fn test_render_chatml() {
        let prompt = TemplateEngine::render_conversation(&turns(), ModelFamily::ChatMl);
        assert_eq!(
            prompt,
            "<|im_start|>system\nBe brief.<|im_end|>\n<|im_start|>user\nHi<|im_end|>\n<|im_start|>assistant\n"
        );
    }

    #[test]
    fn test_render_llama3() {
        let prompt = TemplateEngine::render_conversation(&turns(), ModelFamily::Llama3);
        assert!(prompt.starts_with("<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\nBe brief.<|eot_id|>"));
        assert!(prompt.ends_with("<|start_header_id|>assistant<|end_header_id|>\n\n"));
    }

    #[test]
    fn test_render_gemma_folds_system_into_user() {
        let prompt = TemplateEngine::render_conversation(&turns(), ModelFamily::Gemma);
        assert_eq!(
            prompt,
            "<start_of_turn>user\nBe brief.\n\nHi<end_of_turn>\n<start_of_turn>model\n"
        );
    }

    #[test]
    fn test_render_zephyr() {
        let prompt = TemplateEngine::render_conversation(&turns(), ModelFamily::Zephyr);
        assert_eq!(prompt, "<|system|>\nBe brief.</s>\n<|user|>\nHi</s>\n<|assistant|>\n");
    }

    #[test]
    fn test_render_plain() {
        let prompt = TemplateEngine::render_conversation(&turns(), ModelFamily::Plain);
        assert_eq!(prompt, "System: Be brief.\nUser: Hi\nAssistant:");
    }

    #[test]
    fn test_model_family_parsing() {
        assert_eq!("chatml".parse::<ModelFamily>().unwrap(), ModelFamily::ChatMl);
        assert_eq!("Llama3".parse::<ModelFamily>().unwrap(), ModelFamily::Llama3);
        assert_eq!(ModelFamily::Zephyr.to_string(), "zephyr");
        assert!("mistral".parse::<ModelFamily>().is_err());
    }
}
