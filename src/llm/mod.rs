//! LLM module - Model Port and its backends
//!
//! Provides the reasoning-model abstraction with an OpenAI-compatible backend
//! and a scripted backend for deterministic runs.

pub mod openai;
pub mod scripted;
pub mod traits;

pub use openai::OpenAiCompatible;
pub use scripted::{RecordedRequest, ScriptedModel};
pub use traits::{ModelPort, ModelResponse};
