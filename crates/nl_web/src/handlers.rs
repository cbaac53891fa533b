use axum::{
    extract::{FromRequest, Path, State},
    Json,
};
use nl_core::{
    Answer, BiasReport, Error, ImageVerdict, NewSavedArticle, QaList, RelatedNews, SavedArticle,
    SentimentScore, Summary, User, UserProfile,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// `Json` whose rejections use the `{"detail"}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidJson<T>(pub T);

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub url: String,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchNewsRequest {
    pub url: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveArticleRequest {
    pub auth0_id: String,
    pub article: NewSavedArticle,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedArticlesResponse {
    pub saved_articles: Vec<SavedArticle>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<UrlRequest>,
) -> ApiResult<Summary> {
    Ok(Json(state.orchestrator.summarize(&req.url).await?))
}

pub async fn sentiment(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<UrlRequest>,
) -> ApiResult<SentimentScore> {
    Ok(Json(state.orchestrator.sentiment(&req.url).await?))
}

pub async fn bias(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<UrlRequest>,
) -> ApiResult<BiasReport> {
    Ok(Json(state.orchestrator.bias(&req.url).await?))
}

pub async fn question(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<QuestionRequest>,
) -> ApiResult<Answer> {
    Ok(Json(
        state.orchestrator.answer_question(&req.url, &req.question).await?,
    ))
}

pub async fn common_questions(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<UrlRequest>,
) -> ApiResult<QaList> {
    Ok(Json(state.orchestrator.common_questions(&req.url).await?))
}

pub async fn gpt_answer(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<QuestionRequest>,
) -> ApiResult<Answer> {
    Ok(Json(
        state.orchestrator.gpt_answer(&req.url, &req.question).await?,
    ))
}

pub async fn detect_image(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<UrlRequest>,
) -> ApiResult<ImageVerdict> {
    Ok(Json(state.orchestrator.detect_image(&req.url).await?))
}

pub async fn fetch_news(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<FetchNewsRequest>,
) -> ApiResult<RelatedNews> {
    Ok(Json(
        state
            .orchestrator
            .related_news(&req.url, req.region.as_deref())
            .await?,
    ))
}

fn require_identity(auth0_id: &str) -> Result<&str, Error> {
    let auth0_id = auth0_id.trim();
    if auth0_id.is_empty() {
        return Err(Error::InvalidInput("auth0Id must not be empty".to_string()));
    }
    Ok(auth0_id)
}

pub async fn save_article(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<SaveArticleRequest>,
) -> ApiResult<MessageResponse> {
    let store = state.store()?;
    let auth0_id = require_identity(&req.auth0_id)?;
    let article = req.article.into_saved();
    let article_id = article.id.clone();

    store.append_saved_article(auth0_id, article).await?;
    info!("💾 Saved article {} for {}", article_id, auth0_id);

    Ok(Json(MessageResponse {
        message: "Article saved successfully".to_string(),
    }))
}

pub async fn list_saved_articles(
    State(state): State<Arc<AppState>>,
    Path(auth0_id): Path<String>,
) -> ApiResult<SavedArticlesResponse> {
    let store = state.store()?;
    let saved_articles = store
        .list_saved_articles(require_identity(&auth0_id)?)
        .await?;
    Ok(Json(SavedArticlesResponse { saved_articles }))
}

pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    ValidJson(profile): ValidJson<UserProfile>,
) -> ApiResult<UserResponse> {
    let store = state.store()?;
    let auth0_id = require_identity(&profile.auth0_id)?.to_string();
    let user = store
        .upsert_user(UserProfile { auth0_id, ..profile })
        .await?;
    Ok(Json(UserResponse { user }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        store: state
            .store
            .as_ref()
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| "unavailable".to_string()),
    })
}
