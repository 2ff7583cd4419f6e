use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::relay::RelayClient;
use crate::utils::decode_html_entities;

const MICROLINK_API: &str = "https://api.microlink.io/?url=";

const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>([^<]*)</title>").unwrap());

static META_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)name=["']description["'][^>]*content=["']([^"']+)["']"#).unwrap()
});

/// Display metadata for a URL. A sibling concern of resolution: it shares
/// the relay chain and nothing else.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MediaMetadata {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub author: String,
    pub publisher: String,
}

#[derive(Debug, Deserialize)]
struct MicrolinkResponse {
    status: String,
    data: Option<MicrolinkData>,
}

#[derive(Debug, Deserialize)]
struct MicrolinkData {
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
    publisher: Option<String>,
    image: Option<MicrolinkImage>,
    logo: Option<MicrolinkImage>,
}

#[derive(Debug, Deserialize)]
struct MicrolinkImage {
    url: Option<String>,
}

/// Fetch title/description/thumbnail for display. Best effort: the
/// metadata API first, then an og-tag scrape through the relay chain,
/// then empty metadata. Never fails.
pub async fn fetch_metadata(
    http: &reqwest::Client,
    relay: &RelayClient,
    url: &str,
) -> MediaMetadata {
    if let Some(meta) = microlink(http, url).await {
        return meta;
    }
    debug!("metadata API failed, scraping og tags");
    if let Some(meta) = og_scrape(relay, url).await {
        return meta;
    }
    MediaMetadata::default()
}

async fn microlink(http: &reqwest::Client, url: &str) -> Option<MediaMetadata> {
    let api = format!(
        "{MICROLINK_API}{}&meta=true&screenshot=false&video=false",
        urlencoding::encode(url)
    );
    let res = http
        .get(api.as_str())
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .ok()?;
    if !res.status().is_success() {
        return None;
    }
    let body: MicrolinkResponse = res.json().await.ok()?;
    if body.status != "success" {
        return None;
    }
    let data = body.data?;
    let thumbnail = data
        .image
        .and_then(|i| i.url)
        .or_else(|| data.logo.and_then(|l| l.url));
    Some(MediaMetadata {
        title: data.title.unwrap_or_default(),
        description: data.description.unwrap_or_default(),
        thumbnail,
        author: data.author.unwrap_or_default(),
        publisher: data.publisher.unwrap_or_default(),
    })
}

async fn og_scrape(relay: &RelayClient, url: &str) -> Option<MediaMetadata> {
    let html = relay.fetch_text(url).await?;
    Some(metadata_from_html(&html))
}

pub(crate) fn metadata_from_html(html: &str) -> MediaMetadata {
    let title = og_content(html, "og:title")
        .or_else(|| {
            TITLE_TAG
                .captures(html)
                .map(|c| c[1].trim().to_string())
        })
        .unwrap_or_default();
    let description = og_content(html, "og:description")
        .or_else(|| {
            META_DESCRIPTION
                .captures(html)
                .map(|c| decode_html_entities(&c[1]))
        })
        .unwrap_or_default();
    MediaMetadata {
        title,
        description,
        thumbnail: og_content(html, "og:image"),
        author: String::new(),
        publisher: String::new(),
    }
}

fn og_content(html: &str, property: &str) -> Option<String> {
    let escaped = regex::escape(property);
    for pattern in [
        format!(r#"(?i)property=["']{escaped}["'][^>]*content=["']([^"']+)["']"#),
        format!(r#"(?i)content=["']([^"']+)["'][^>]*property=["']{escaped}["']"#),
    ] {
        if let Ok(re) = Regex::new(&pattern)
            && let Some(captures) = re.captures(html)
        {
            return Some(decode_html_entities(&captures[1]));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_tags_win_over_plain_tags() {
        let html = r#"
            <title>plain title</title>
            <meta property="og:title" content="og title">
            <meta property="og:description" content="a &amp; b">
            <meta property="og:image" content="https://cdn.example/t.jpg">
        "#;
        let meta = metadata_from_html(html);
        assert_eq!(meta.title, "og title");
        assert_eq!(meta.description, "a & b");
        assert_eq!(meta.thumbnail.as_deref(), Some("https://cdn.example/t.jpg"));
    }

    #[test]
    fn falls_back_to_title_and_description_tags() {
        let html = r#"
            <title> plain title </title>
            <meta name="description" content="described">
        "#;
        let meta = metadata_from_html(html);
        assert_eq!(meta.title, "plain title");
        assert_eq!(meta.description, "described");
        assert_eq!(meta.thumbnail, None);
    }

    #[test]
    fn empty_html_yields_empty_metadata() {
        assert_eq!(metadata_from_html("<html></html>"), MediaMetadata::default());
    }

    #[test]
    fn microlink_response_shape() {
        let body: MicrolinkResponse = serde_json::from_str(
            r#"{
                "status": "success",
                "data": {
                    "title": "t",
                    "description": "d",
                    "author": null,
                    "publisher": "p",
                    "image": {"url": "https://cdn.example/i.jpg"},
                    "logo": {"url": "https://cdn.example/l.png"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(body.status, "success");
        let data = body.data.unwrap();
        assert_eq!(data.image.unwrap().url.as_deref(), Some("https://cdn.example/i.jpg"));
    }
}
