use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost", "http://localhost:3000"];

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn create_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/summarize", post(handlers::summarize))
        .route("/sentiment", post(handlers::sentiment))
        .route("/bias", post(handlers::bias))
        .route("/question", post(handlers::question))
        .route("/common-questions", post(handlers::common_questions))
        .route("/gpt-answer", post(handlers::gpt_answer))
        .route("/detect-image", post(handlers::detect_image))
        .route("/fetch-news", post(handlers::fetch_news))
        .route("/articles/save", post(handlers::save_article))
        .route("/articles/:auth0_id", get(handlers::list_saved_articles))
        .route("/users", post(handlers::upsert_user))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, ApiError, AppState, DEFAULT_ALLOWED_ORIGINS};
    pub use nl_core::{Error, Result};
}

#[cfg(test)]
mod tests;
