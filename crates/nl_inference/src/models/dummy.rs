use std::fmt;
use nl_core::{Backend, ChatMessage, ChatModel, Classification, InferenceModel, Result, SummaryParams};

/// Offline stand-in for every backend. Answers are derived from the input so
/// the whole pipeline can run without network access.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String> {
        // Roughly one word per four tokens of budget.
        Ok(first_words(text, (params.max_length / 4).max(1)))
    }

    async fn classify(&self, backend: Backend, _text: &str) -> Result<Classification> {
        let label = match backend {
            Backend::FactOpinion => "neutral",
            _ => "3 stars",
        };
        Ok(Classification {
            label: label.to_string(),
            score: 0.5,
        })
    }

    async fn generate(&self, _backend: Backend, prompt: &str, max_length: usize) -> Result<String> {
        let question = prompt
            .rsplit_once("answer this question:")
            .map(|(_, q)| q.trim())
            .unwrap_or(prompt);
        Ok(first_words(question, max_length))
    }

    async fn classify_image(&self, _backend: Backend, _image: &[u8]) -> Result<Classification> {
        Ok(Classification {
            label: "Real".to_string(),
            score: 0.5,
        })
    }
}

#[async_trait::async_trait]
impl ChatModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        Ok(first_words(last, 20))
    }
}
