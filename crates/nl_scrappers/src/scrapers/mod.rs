use async_trait::async_trait;
use nl_core::{ArticleFetcher, Error, FetchedArticle, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub mod jsonld;

/// Generic article extraction for any news site: OpenGraph and JSON-LD
/// metadata first, then the page markup.
#[derive(Debug, Clone)]
pub struct HtmlFetcher {
    client: Client,
}

impl HtmlFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("newslyzer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!("{} returned status {}", url, response.status())));
        }
        Ok(response)
    }
}

#[async_trait]
impl ArticleFetcher for HtmlFetcher {
    async fn fetch_article(&self, url: &str) -> Result<FetchedArticle> {
        let base = Url::parse(url).map_err(|e| Error::Fetch(format!("invalid URL: {}", e)))?;
        let html = self
            .get(url)
            .await?
            .text()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let article = parse_article(&base, &html);
        if article.text.trim().is_empty() {
            return Err(Error::Fetch(format!("no article text found at {}", url)));
        }
        debug!(
            "Extracted {:?}: {} chars, {} images",
            article.title,
            article.text.len(),
            article.image_urls.len()
        );
        Ok(article)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        if bytes.is_empty() {
            return Err(Error::Fetch(format!("image at {} is empty", url)));
        }
        Ok(bytes.to_vec())
    }
}

/// Extracts title, body text and images from an article page.
pub fn parse_article(base: &Url, html: &str) -> FetchedArticle {
    let document = Html::parse_document(html);
    let ld = jsonld::extract_article(&document);

    let title = meta_content(&document, "meta[property='og:title']")
        .or(ld.headline)
        .or_else(|| first_text(&document, "h1"))
        .or_else(|| first_text(&document, "title"))
        .unwrap_or_default();

    let text = match ld.body {
        Some(body) => body,
        None => {
            let paragraphs = texts(&document, "article p");
            if paragraphs.is_empty() {
                texts(&document, "p").join("\n")
            } else {
                paragraphs.join("\n")
            }
        }
    };

    let top_image = meta_content(&document, "meta[property='og:image']")
        .or(ld.image)
        .and_then(|src| resolve(base, &src));

    let mut image_urls: Vec<String> = Vec::new();
    if let Ok(selector) = Selector::parse("img[src]") {
        for src in document.select(&selector).filter_map(|el| el.value().attr("src")) {
            if let Some(resolved) = resolve(base, src) {
                if !image_urls.contains(&resolved) {
                    image_urls.push(resolved);
                }
            }
        }
    }

    FetchedArticle {
        url: base.to_string(),
        title,
        text,
        image_urls,
        top_image,
    }
}

fn resolve(base: &Url, src: &str) -> Option<String> {
    let resolved = base.join(src.trim()).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    texts(document, selector).into_iter().next()
}

fn texts(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
