use async_trait::async_trait;
use nl_core::{Error, NewsLink, NewsLookup, Result};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default, rename = "totalResults")]
    total_results: u32,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// NewsAPI.org client: `/everything` for topic search, `/top-headlines` for
/// the latest articles of a region.
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::InvalidInput("News API key is required".to_string()));
        }
        url::Url::parse(base_url)
            .map_err(|e| Error::InvalidInput(format!("Invalid News API base URL: {}", e)))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn query(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<NewsLink>> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .header("X-Api-Key", &self.api_key)
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("⚠️ News API /{} returned status {}: {}", endpoint, status, body);
            return Ok(Vec::new());
        }

        let data: NewsApiResponse = response.json().await?;
        if data.status != "ok" {
            warn!("⚠️ News API /{} answered with status {:?}", endpoint, data.status);
            return Ok(Vec::new());
        }
        debug!("News API /{}: {} total results", endpoint, data.total_results);

        Ok(data
            .articles
            .into_iter()
            .filter_map(|a| match (a.title, a.url) {
                (Some(title), Some(url)) if !title.trim().is_empty() && title != "[Removed]" => {
                    Some(NewsLink {
                        title: title.trim().to_string(),
                        url,
                    })
                }
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl NewsLookup for NewsApiClient {
    async fn search_by_topic(&self, topic: &str, limit: usize) -> Result<Vec<NewsLink>> {
        let page_size = limit.to_string();
        let mut links = self
            .query(
                "everything",
                &[
                    ("q", topic),
                    ("sortBy", "publishedAt"),
                    ("language", "en"),
                    ("pageSize", &page_size),
                ],
            )
            .await?;
        links.truncate(limit);
        Ok(links)
    }

    async fn latest_by_region(&self, region: &str, limit: usize) -> Result<Vec<NewsLink>> {
        let page_size = limit.to_string();
        let country = region.to_lowercase();
        let mut links = self
            .query("top-headlines", &[("country", &country), ("pageSize", &page_size)])
            .await?;
        links.truncate(limit);
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> NewsApiClient {
        NewsApiClient::with_base_url("news-key", &server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let err = NewsApiClient::new(" ", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_search_by_topic() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/everything")
            .match_header("x-api-key", "news-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Budget vote".into()),
                Matcher::UrlEncoded("pageSize".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"status":"ok","totalResults":3,"articles":[
                    {"title":"Budget passes","url":"https://a.example.com/1"},
                    {"title":"[Removed]","url":"https://removed.com"},
                    {"title":"Vote tally","url":"https://b.example.com/2"},
                    {"title":"Third","url":"https://c.example.com/3"}
                ]}"#,
            )
            .create_async()
            .await;

        let links = client_for(&server).search_by_topic("Budget vote", 2).await.unwrap();
        assert_eq!(
            links,
            vec![
                NewsLink {
                    title: "Budget passes".to_string(),
                    url: "https://a.example.com/1".to_string()
                },
                NewsLink {
                    title: "Vote tally".to_string(),
                    url: "https://b.example.com/2".to_string()
                },
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_failure_yields_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::UrlEncoded("country".into(), "us".into()))
            .with_status(401)
            .with_body(r#"{"status":"error","code":"apiKeyInvalid"}"#)
            .create_async()
            .await;

        let links = client_for(&server).latest_by_region("US", 5).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_in_body_yields_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"error","articles":[{"title":"x","url":"y"}]}"#)
            .create_async()
            .await;

        let links = client_for(&server).latest_by_region("gb", 5).await.unwrap();
        assert!(links.is_empty());
    }
}
