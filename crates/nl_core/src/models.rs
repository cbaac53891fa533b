use async_trait::async_trait;
use std::fmt;

use crate::types::{Backend, ChatMessage, Classification};
use crate::Result;

/// Generation parameters forwarded to the summarizer backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryParams {
    pub max_length: usize,
    pub min_length: usize,
    pub num_beams: usize,
    pub early_stopping: bool,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            max_length: 200,
            min_length: 50,
            num_beams: 4,
            early_stopping: true,
        }
    }
}

/// Specialised pre-trained models (summarizer, classifiers, QA, vision).
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Abstractive summary of `text`.
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String>;

    /// Highest scoring label of a text classifier.
    async fn classify(&self, backend: Backend, text: &str) -> Result<Classification>;

    /// Text-to-text generation, used for question answering.
    async fn generate(&self, backend: Backend, prompt: &str, max_length: usize) -> Result<String>;

    /// Highest scoring label of an image classifier.
    async fn classify_image(&self, backend: Backend, image: &[u8]) -> Result<Classification>;
}

/// Remote large-language-model chat backend.
#[async_trait]
pub trait ChatModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}
