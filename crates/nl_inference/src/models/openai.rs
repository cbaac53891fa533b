use async_trait::async_trait;
use nl_core::{Backend, ChatMessage, ChatModel, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::Config;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .llm_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("OpenAI API key is required".to_string()))?;
        url::Url::parse(&config.llm_base_url)
            .map_err(|e| Error::InvalidInput(format!("Invalid LLM base URL: {}", e)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            model: config.llm_model.clone(),
        })
    }
}

impl fmt::Debug for OpenAiChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChatModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::backend(Backend::Llm, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(Backend::Llm, format!("status {}: {}", status, body)));
        }

        let response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::backend(Backend::Llm, format!("malformed response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::backend(Backend::Llm, "response has no content"))
    }
}
