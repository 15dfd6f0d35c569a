//! # coolshot-chat
//!
//! A chat backend that decides whether a message asks for an image or a text
//! answer, forwards it to a generation model, and returns a stable JSON reply.
//!
//! ## Features
//!
//! - **Intent Routing**: Keyword-based detection of image requests
//! - **Pluggable Backends**: Any provider supported by the genai crate (including local
//!   Ollama models) or the Hugging Face Inference API
//! - **Reply Normalization**: Chat-template control markers are stripped per model family,
//!   image requests answer with an `IMAGE_READY:` sentinel, failures become apologies
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! coolshot-chat = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,no_run
//! use coolshot_chat::{AppConfig, ChatProcessor, ChatRequest, build_backend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = AppConfig::from_env()?;
//!     let backend = build_backend(&config)?;
//!     let processor = ChatProcessor::from_config(backend, &config);
//!
//!     let response = processor.process(&ChatRequest::new("What is the capital of France?")).await;
//!     println!("{}", response.reply);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Using the pieces directly
//!
//! ```rust
//! use coolshot_chat::{GenerationResult, Intent, IntentRouter, ModelFamily, ReplyNormalizer};
//!
//! let router = IntentRouter::default();
//! assert_eq!(router.classify("draw a cat in a hat"), Intent::ImageRequest);
//!
//! let normalizer = ReplyNormalizer::for_family(ModelFamily::ChatMl);
//! let raw = GenerationResult::TextResult {
//!     text: "<|im_start|>assistant\nParis<|im_end|>".to_string(),
//! };
//! let response = normalizer.normalize(Intent::TextRequest, Ok(raw), "What is the capital of France?");
//! assert_eq!(response.reply, "Paris");
//! ```
//!
//! ## Server Mode
//!
//! The `server` feature (enabled by default) provides the HTTP endpoints and the
//! `coolshot-chat` binary:
//!
//! ```bash
//! cargo run
//! ```

// Core modules - always available
pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
pub mod intent;
pub mod normalizer;
pub mod processor;
pub mod template;

// Re-export commonly used types for easier access
pub use backend::{GenerationBackend, GenerationOptions, ImageHandle, build_backend};
pub use chat::{ChatRequest, ChatResponse, ChatRole, ConversationTurn, GenerationResult, IMAGE_SENTINEL};
pub use config::{AppConfig, BackendKind};
pub use error::{BackendFailure, ConfigError, ErrorResponse};
pub use intent::{Intent, IntentRouter};
pub use normalizer::{ControlMarkers, ReplyNormalizer};
pub use processor::ChatProcessor;
pub use template::ModelFamily;

// Server-specific modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod server;
