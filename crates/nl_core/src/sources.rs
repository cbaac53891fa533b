use async_trait::async_trait;

use crate::types::{FetchedArticle, NewsLink};
use crate::Result;

/// Downloads articles and the images they embed.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch_article(&self, url: &str) -> Result<FetchedArticle>;

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

/// Third-party news search.
///
/// Implementations return an empty list when the upstream service answers
/// with a non-success status.
#[async_trait]
pub trait NewsLookup: Send + Sync {
    async fn search_by_topic(&self, topic: &str, limit: usize) -> Result<Vec<NewsLink>>;

    async fn latest_by_region(&self, region: &str, limit: usize) -> Result<Vec<NewsLink>>;
}
