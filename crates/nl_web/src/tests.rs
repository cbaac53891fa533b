use super::*;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use nl_core::{
    ArticleFetcher, Error, FetchedArticle, NewsLink, NewsLookup, Result, UserProfile, UserStore,
};
use nl_inference::models::DummyModel;
use nl_inference::{Orchestrator, PipelineSettings};
use nl_storage::InMemoryStorage;
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubFetcher;

#[async_trait]
impl ArticleFetcher for StubFetcher {
    async fn fetch_article(&self, url: &str) -> Result<FetchedArticle> {
        if url.contains("broken") {
            return Err(Error::Fetch("404 Not Found".to_string()));
        }
        Ok(FetchedArticle {
            url: url.to_string(),
            title: "Story".to_string(),
            text: "Markets rallied today, led by tech stocks.".to_string(),
            image_urls: vec!["https://news.example.com/lead.jpg".to_string()],
            top_image: None,
        })
    }

    async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(vec![1, 2, 3])
    }
}

struct DownNews;

#[async_trait]
impl NewsLookup for DownNews {
    async fn search_by_topic(&self, _topic: &str, _limit: usize) -> Result<Vec<NewsLink>> {
        Ok(Vec::new())
    }

    async fn latest_by_region(&self, _region: &str, _limit: usize) -> Result<Vec<NewsLink>> {
        Err(Error::Fetch("news service unreachable".to_string()))
    }
}

fn orchestrator() -> Arc<Orchestrator> {
    let dummy = Arc::new(DummyModel::new());
    Arc::new(Orchestrator::new(
        Arc::new(StubFetcher),
        dummy.clone(),
        dummy,
        Arc::new(DownNews),
        PipelineSettings::default(),
    ))
}

fn app_with(store: Option<Arc<dyn UserStore>>) -> Router {
    let origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect();
    create_app(AppState::new(orchestrator(), store), &origins)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(&body.to_string())).await
}

async fn seeded_store() -> Arc<InMemoryStorage> {
    let store = Arc::new(InMemoryStorage::new());
    store
        .upsert_user(UserProfile {
            auth0_id: "auth0|Reader1".to_string(),
            name: "Reader".to_string(),
            email: "reader@example.com".to_string(),
            picture: "https://example.com/r.png".to_string(),
        })
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_summarize() {
    let app = app_with(None);
    let (status, body) = post(&app, "/summarize", json!({"url": "https://news.example.com/a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Story");
    assert_eq!(body["summary"], "Markets rallied today led by tech stocks");
}

#[tokio::test]
async fn test_sentiment_and_bias_shapes() {
    let app = app_with(None);
    let (status, body) = post(&app, "/sentiment", json!({"url": "https://news.example.com/a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_sentiment_score"], 3.0);

    let (status, body) = post(&app, "/bias", json!({"url": "https://news.example.com/a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fact_opinion_label"], "neutral");
    assert_eq!(body["distilbert_bias_label"], "3 stars (Neutral)");
    assert!(body["gpt_bias_analysis"].is_string());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app_with(None);
    let (status, body) = send(&app, "POST", "/summarize", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid request body"));

    let (status, _) = post(&app, "/question", json!({"url": "https://news.example.com/a"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_question_answers_and_rejects_blank() {
    let app = app_with(None);
    let (status, body) = post(
        &app,
        "/question",
        json!({"url": "https://news.example.com/a", "question": "Who led the rally?"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "Who led the rally?");
    assert_eq!(body["answer"], "Who led the rally?");

    let (status, body) = post(
        &app,
        "/gpt-answer",
        json!({"url": "https://news.example.com/a", "question": "  "}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn test_fetch_failure_is_server_error() {
    let app = app_with(None);
    let (status, body) = post(&app, "/detect-image", json!({"url": "https://news.example.com/broken"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        "Could not extract article from URL. Error: 404 Not Found"
    );
}

#[tokio::test]
async fn test_detect_image() {
    let app = app_with(None);
    let (status, body) = post(&app, "/detect-image", json!({"url": "https://news.example.com/a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image_url"], "https://news.example.com/lead.jpg");
    assert_eq!(body["deepfake_detection"]["label"], "Real");
    assert_eq!(body["manipulation_detection"]["confidence"], 0.5);
}

#[tokio::test]
async fn test_fetch_news_survives_lookup_failure() {
    let app = app_with(None);
    let (status, body) = post(
        &app,
        "/fetch-news",
        json!({"url": "https://news.example.com/a", "region": "gb"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["main_topic"].as_str().unwrap().is_empty());
    assert_eq!(body["topic_articles"], json!([]));
    assert_eq!(body["latest_articles"], json!([]));
}

#[tokio::test]
async fn test_save_for_unknown_user_is_not_found() {
    let store = seeded_store().await;
    let shared: Arc<dyn UserStore> = store.clone();
    let app = app_with(Some(shared));

    let (status, body) = post(
        &app,
        "/articles/save",
        json!({"auth0Id": "auth0|stranger", "article": {"title": "T", "content": "C"}}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("auth0|stranger"));

    let user = store.find_user_by_identity("auth0|reader1").await.unwrap();
    assert!(user.saved_articles.is_empty());
}

#[tokio::test]
async fn test_save_and_list_articles() {
    let store: Arc<dyn UserStore> = seeded_store().await;
    let app = app_with(Some(store));

    let (status, body) = post(
        &app,
        "/articles/save",
        json!({
            "auth0Id": "AUTH0|READER1",
            "article": {"id": "x-1", "title": "Budget", "content": "Summary text"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Article saved successfully");

    let (status, body) = send(&app, "GET", "/articles/auth0%7Creader1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved_articles"][0]["id"], "x-1");
    assert_eq!(body["saved_articles"][0]["title"], "Budget");
}

#[tokio::test]
async fn test_account_endpoints_without_store() {
    let app = app_with(None);
    let (status, body) = post(
        &app,
        "/articles/save",
        json!({"auth0Id": "auth0|1", "article": {"title": "T", "content": "C"}}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["detail"],
        "Document store unavailable: Database not connected"
    );

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "unavailable");
}

#[tokio::test]
async fn test_register_user() {
    let store: Arc<dyn UserStore> = Arc::new(InMemoryStorage::new());
    let app = app_with(Some(store));
    let (status, body) = post(
        &app,
        "/users",
        json!({
            "auth0Id": "auth0|new",
            "name": "New Reader",
            "email": "new@example.com",
            "picture": "https://example.com/n.png"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["auth0Id"], "auth0|new");
    assert_eq!(body["user"]["savedArticles"], json!([]));
}

#[tokio::test]
async fn test_registered_identity_is_trimmed() {
    let store: Arc<dyn UserStore> = Arc::new(InMemoryStorage::new());
    let app = app_with(Some(store));
    let (status, body) = post(
        &app,
        "/users",
        json!({
            "auth0Id": "  auth0|padded ",
            "name": "Padded Reader",
            "email": "padded@example.com",
            "picture": "https://example.com/p.png"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["auth0Id"], "auth0|padded");

    let (status, _) = post(
        &app,
        "/articles/save",
        json!({"auth0Id": "auth0|padded", "article": {"id": "p-1", "title": "T", "content": "C"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/articles/auth0%7Cpadded", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved_articles"][0]["id"], "p-1");
}
