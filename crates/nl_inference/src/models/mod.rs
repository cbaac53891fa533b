use std::sync::Arc;
use nl_core::{ChatModel, Error, InferenceModel, Result};

use crate::Config;

pub mod dummy;
pub mod huggingface;
pub mod openai;

pub use dummy::DummyModel;
pub use huggingface::HuggingFaceModel;
pub use openai::OpenAiChatModel;

/// Builds the specialised-model gateway. Called once at startup so a bad
/// configuration fails the process instead of the first request.
pub fn create_model(kind: &str, config: &Config) -> Result<Arc<dyn InferenceModel>> {
    match kind.to_lowercase().as_str() {
        "huggingface" | "hf" => Ok(Arc::new(HuggingFaceModel::new(config)?)),
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::InvalidInput(format!(
            "Unknown inference backend: {}. Available backends: huggingface, dummy",
            other
        ))),
    }
}

/// Builds the LLM chat backend.
pub fn create_chat_model(kind: &str, config: &Config) -> Result<Arc<dyn ChatModel>> {
    match kind.to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiChatModel::new(config)?)),
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::InvalidInput(format!(
            "Unknown LLM backend: {}. Available backends: openai, dummy",
            other
        ))),
    }
}
