use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::text;

/// Named inference services reachable through the model gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Summarizer,
    Sentiment,
    FactOpinion,
    Bias,
    QuestionAnswering,
    Deepfake,
    Manipulation,
    Llm,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Summarizer => "summarizer",
            Backend::Sentiment => "sentiment",
            Backend::FactOpinion => "fact_opinion",
            Backend::Bias => "bias",
            Backend::QuestionAnswering => "question_answering",
            Backend::Deepfake => "deepfake",
            Backend::Manipulation => "manipulation",
            Backend::Llm => "llm",
        }
    }

    /// Maximum number of input tokens the backend accepts, if it imposes one.
    pub fn max_input_tokens(&self) -> Option<usize> {
        match self {
            Backend::Summarizer => Some(1024),
            Backend::Sentiment | Backend::FactOpinion | Backend::Bias => Some(512),
            Backend::QuestionAnswering
            | Backend::Deepfake
            | Backend::Manipulation
            | Backend::Llm => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a fetcher hands back before any normalisation happens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedArticle {
    pub url: String,
    pub title: String,
    pub text: String,
    pub image_urls: Vec<String>,
    pub top_image: Option<String>,
}

/// A downloaded article together with its cleaned text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleContent {
    pub url: String,
    pub title: String,
    pub raw_text: String,
    pub cleaned_text: String,
    pub image_urls: Vec<String>,
    pub top_image: Option<String>,
}

impl From<FetchedArticle> for ArticleContent {
    fn from(fetched: FetchedArticle) -> Self {
        let cleaned_text = text::clean(&fetched.text);
        Self {
            url: fetched.url,
            title: fetched.title,
            raw_text: fetched.text,
            cleaned_text,
            image_urls: fetched.image_urls,
            top_image: fetched.top_image,
        }
    }
}

impl ArticleContent {
    /// The image the vision pipeline inspects: the declared lead image, else the first one found.
    pub fn lead_image(&self) -> Option<&str> {
        self.top_image
            .as_deref()
            .or_else(|| self.image_urls.first().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub token_count: usize,
    pub text: String,
}

/// Top label of a classifier backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    Keep,
    Escalate,
}

impl FallbackDecision {
    pub fn should_escalate(self) -> bool {
        matches!(self, FallbackDecision::Escalate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsLink {
    pub title: String,
    pub url: String,
}

// Response payloads. Field names are part of the HTTP contract.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub average_sentiment_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasReport {
    pub fact_opinion_label: String,
    pub fact_opinion_confidence: f64,
    pub distilbert_bias_label: String,
    pub distilbert_bias_confidence: f64,
    pub gpt_bias_analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaList {
    pub questions_and_answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: String,
    pub confidence: f64,
}

impl From<Classification> for Verdict {
    fn from(c: Classification) -> Self {
        Self {
            label: c.label,
            confidence: text::round2(c.score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageVerdict {
    pub image_url: String,
    pub deepfake_detection: Verdict,
    pub manipulation_detection: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedNews {
    pub main_topic: String,
    pub topic_articles: Vec<NewsLink>,
    pub latest_articles: Vec<NewsLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Summary(Summary),
    SentimentScore(SentimentScore),
    BiasReport(BiasReport),
    Answer(Answer),
    QaList(QaList),
    ImageVerdict(ImageVerdict),
    RelatedNews(RelatedNews),
}

// Account documents.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Article as submitted by a client; the id is generated when missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSavedArticle {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewSavedArticle {
    pub fn into_saved(self) -> SavedArticle {
        SavedArticle {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title: self.title,
            content: self.content,
            url: self.url,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub auth0_id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub auth0_id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
    pub created_at: DateTime<Utc>,
    pub saved_articles: Vec<SavedArticle>,
}

impl User {
    pub fn from_profile(profile: UserProfile) -> Self {
        Self {
            auth0_id: profile.auth0_id,
            name: profile.name,
            email: profile.email,
            picture: profile.picture,
            created_at: Utc::now(),
            saved_articles: Vec::new(),
        }
    }

    pub fn matches_identity(&self, auth0_id: &str) -> bool {
        self.auth0_id.to_lowercase() == auth0_id.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_content_cleans_on_construction() {
        let article = ArticleContent::from(FetchedArticle {
            url: "https://news.example/a".to_string(),
            title: "A title".to_string(),
            text: "Hello,   world!\n\nIt's  here.".to_string(),
            image_urls: vec!["https://news.example/1.jpg".to_string()],
            top_image: None,
        });
        assert_eq!(article.cleaned_text, "Hello world Its here");
        assert_eq!(article.raw_text, "Hello,   world!\n\nIt's  here.");
        assert_eq!(article.lead_image(), Some("https://news.example/1.jpg"));
    }

    #[test]
    fn test_lead_image_prefers_top_image() {
        let article = ArticleContent::from(FetchedArticle {
            image_urls: vec!["https://news.example/1.jpg".to_string()],
            top_image: Some("https://news.example/og.jpg".to_string()),
            ..Default::default()
        });
        assert_eq!(article.lead_image(), Some("https://news.example/og.jpg"));
    }

    #[test]
    fn test_new_saved_article_generates_id() {
        let saved = NewSavedArticle {
            id: None,
            title: "t".to_string(),
            content: "c".to_string(),
            url: None,
        }
        .into_saved();
        assert!(!saved.id.is_empty());

        let saved = NewSavedArticle {
            id: Some("42".to_string()),
            title: "t".to_string(),
            content: "c".to_string(),
            url: None,
        }
        .into_saved();
        assert_eq!(saved.id, "42");
    }

    #[test]
    fn test_user_identity_is_case_insensitive() {
        let user = User::from_profile(UserProfile {
            auth0_id: "auth0|AbC".to_string(),
            name: "n".to_string(),
            email: "e".to_string(),
            picture: "p".to_string(),
        });
        assert!(user.matches_identity("AUTH0|abc"));
        assert!(!user.matches_identity("auth0|abd"));
    }

    #[test]
    fn test_user_wire_format_is_camel_case() {
        let user = User::from_profile(UserProfile {
            auth0_id: "id".to_string(),
            name: "n".to_string(),
            email: "e".to_string(),
            picture: "p".to_string(),
        });
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["auth0Id"], "id");
        assert!(json["savedArticles"].as_array().unwrap().is_empty());
    }
}
