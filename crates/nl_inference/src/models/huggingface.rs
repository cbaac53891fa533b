use async_trait::async_trait;
use nl_core::{Backend, Classification, Error, InferenceModel, Result, SummaryParams};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use crate::{Config, ModelIds};

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[derive(Deserialize)]
struct GeneratedOutput {
    generated_text: String,
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Text classifiers answer either a flat list or one list per input.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifierOutput {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassifierOutput {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ClassifierOutput::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            ClassifierOutput::Flat(scores) => scores,
        }
    }
}

fn top_label(backend: Backend, scores: Vec<LabelScore>) -> Result<Classification> {
    scores
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|s| Classification {
            label: s.label,
            score: s.score,
        })
        .ok_or_else(|| Error::backend(backend, "empty classification response"))
}

/// Hosted Hugging Face inference endpoints.
pub struct HuggingFaceModel {
    client: Arc<Client>,
    api_token: String,
    base_url: String,
    models: ModelIds,
}

impl fmt::Debug for HuggingFaceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceModel")
            .field("client", &"<reqwest::Client>")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .finish()
    }
}

impl HuggingFaceModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_token = config
            .hf_api_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("Hugging Face API token is required".to_string()))?;
        url::Url::parse(&config.hf_base_url)
            .map_err(|e| Error::InvalidInput(format!("Invalid Hugging Face base URL: {}", e)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client: Arc::new(client),
            api_token,
            base_url: config.hf_base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
        })
    }

    fn model_id(&self, backend: Backend) -> Result<&str> {
        let id = match backend {
            Backend::Summarizer => &self.models.summarizer,
            Backend::Sentiment => &self.models.sentiment,
            Backend::FactOpinion => &self.models.fact_opinion,
            Backend::Bias => &self.models.bias,
            Backend::QuestionAnswering => &self.models.question_answering,
            Backend::Deepfake => &self.models.deepfake,
            Backend::Manipulation => &self.models.manipulation,
            Backend::Llm => {
                return Err(Error::backend(backend, "not served by Hugging Face inference"))
            }
        };
        Ok(id.as_str())
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        backend: Backend,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await
            .map_err(|e| Error::backend(backend, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(backend, format!("status {}: {}", status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::backend(backend, format!("malformed response: {}", e)))
    }

    async fn post_text<T: for<'de> Deserialize<'de>>(
        &self,
        backend: Backend,
        inputs: &str,
        parameters: Option<serde_json::Value>,
    ) -> Result<T> {
        let model = self.model_id(backend)?;
        tracing::debug!("Calling {} ({}) with {} chars", backend, model, inputs.len());
        let body = InferenceRequest {
            inputs,
            parameters,
            options: InferenceOptions { wait_for_model: true },
        };
        let request = self.client.post(format!("{}/{}", self.base_url, model)).json(&body);
        self.post(backend, request).await
    }
}

#[async_trait]
impl InferenceModel for HuggingFaceModel {
    fn name(&self) -> &str {
        "HuggingFace"
    }

    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String> {
        let parameters = json!({
            "max_length": params.max_length,
            "min_length": params.min_length,
            "num_beams": params.num_beams,
            "early_stopping": params.early_stopping,
        });
        let output: Vec<SummaryOutput> = self
            .post_text(Backend::Summarizer, text, Some(parameters))
            .await?;
        output
            .into_iter()
            .next()
            .map(|o| o.summary_text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::backend(Backend::Summarizer, "empty summary"))
    }

    async fn classify(&self, backend: Backend, text: &str) -> Result<Classification> {
        let output: ClassifierOutput = self.post_text(backend, text, None).await?;
        top_label(backend, output.into_scores())
    }

    async fn generate(&self, backend: Backend, prompt: &str, max_length: usize) -> Result<String> {
        let parameters = json!({ "max_length": max_length, "num_return_sequences": 1 });
        let output: Vec<GeneratedOutput> = self.post_text(backend, prompt, Some(parameters)).await?;
        output
            .into_iter()
            .next()
            .map(|o| o.generated_text.trim().to_string())
            .ok_or_else(|| Error::backend(backend, "no generated text"))
    }

    async fn classify_image(&self, backend: Backend, image: &[u8]) -> Result<Classification> {
        if image.is_empty() {
            return Err(Error::backend(backend, "image is empty"));
        }
        let model = self.model_id(backend)?;
        let request = self
            .client
            .post(format!("{}/{}", self.base_url, model))
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec());
        let scores: Vec<LabelScore> = self.post(backend, request).await?;
        top_label(backend, scores)
    }
}
