use std::time::Duration;

pub mod models;
pub mod orchestrator;

/// Hugging Face model ids for every specialised backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIds {
    pub summarizer: String,
    pub sentiment: String,
    pub fact_opinion: String,
    pub bias: String,
    pub question_answering: String,
    pub deepfake: String,
    pub manipulation: String,
}

impl Default for ModelIds {
    fn default() -> Self {
        Self {
            summarizer: "facebook/bart-large-cnn".to_string(),
            sentiment: "nlptown/bert-base-multilingual-uncased-sentiment".to_string(),
            fact_opinion: "typeform/distilbert-base-uncased-mnli".to_string(),
            bias: "nlptown/bert-base-multilingual-uncased-sentiment".to_string(),
            question_answering: "google/flan-t5-large".to_string(),
            deepfake: "dima806/deepfake_vs_real_image_detection".to_string(),
            manipulation: "umm-maybe/AI-image-detector".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub hf_api_token: Option<String>,
    pub hf_base_url: String,
    pub models: ModelIds,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hf_api_token", &self.hf_api_token.as_deref().map(|_| "<redacted>"))
            .field("hf_base_url", &self.hf_base_url)
            .field("models", &self.models)
            .field("llm_api_key", &self.llm_api_key.as_deref().map(|_| "<redacted>"))
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hf_api_token: None,
            hf_base_url: "https://api-inference.huggingface.co/models".to_string(),
            models: ModelIds::default(),
            llm_api_key: None,
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub mod prelude {
    pub use super::orchestrator::{Capability, FallbackPolicy, Orchestrator, PipelineOptions, PipelineSettings};
    pub use super::models::{create_chat_model, create_model};
    pub use super::{Config, ModelIds};
    pub use nl_core::{Error, Result};
}

pub use models::{create_chat_model, create_model};
pub use orchestrator::{Capability, FallbackPolicy, Orchestrator, PipelineOptions, PipelineSettings};
