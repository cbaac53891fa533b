use scraper::{Html, Selector};
use serde_json::Value;

/// Article fields published as JSON-LD metadata.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JsonLdArticle {
    pub headline: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
}

/// Merges every `NewsArticle`-like JSON-LD block in the document. The first
/// value found for each field wins.
pub fn extract_article(document: &Html) -> JsonLdArticle {
    let mut article = JsonLdArticle::default();

    if let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&script_selector) {
            let Ok(json) = serde_json::from_str::<Value>(script.text().collect::<String>().trim())
            else {
                continue;
            };
            for node in nodes(&json) {
                if article.headline.is_none() {
                    article.headline = string_field(node, "headline");
                }
                if article.body.is_none() {
                    article.body = string_field(node, "articleBody");
                }
                if article.image.is_none() {
                    article.image = image_field(node);
                }
            }
        }
    }

    article
}

/// Top-level objects, arrays of objects and `@graph` members.
fn nodes(json: &Value) -> Vec<&Value> {
    match json {
        Value::Array(items) => items.iter().flat_map(nodes).collect(),
        Value::Object(obj) => match obj.get("@graph") {
            Some(graph) => nodes(graph),
            None => vec![json],
        },
        _ => Vec::new(),
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn image_field(node: &Value) -> Option<String> {
    match node.get("image")? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(arr) => arr.iter().find_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            other => string_field(other, "url"),
        }),
        obj @ Value::Object(_) => string_field(obj, "url"),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_graph() {
        let html = r#"
            <script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
                {"@type":"WebSite","name":"Daily"},
                {"@type":"NewsArticle","headline":" Rates rise ","articleBody":"Body text.",
                 "image":[{"url":"https://cdn.example.com/a.jpg"}]}
            ]}
            </script>
        "#;
        let article = extract_article(&Html::parse_document(html));
        assert_eq!(article.headline.as_deref(), Some("Rates rise"));
        assert_eq!(article.body.as_deref(), Some("Body text."));
        assert_eq!(article.image.as_deref(), Some("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_invalid_json_is_ignored() {
        let html = r#"<script type="application/ld+json">{not json</script>"#;
        assert_eq!(extract_article(&Html::parse_document(html)), JsonLdArticle::default());
    }
}
