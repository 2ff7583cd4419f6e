use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::core::{Extractor, Platform, Resolution, ResolutionRequest};
use crate::router::Resolver;

pub mod types;

pub use types::{Post, PostResponse, RedditVideo};

static LINKED_MEDIA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(mp4|webm|gifv)(\?.*)?$").unwrap());

const DIRECT_TIMEOUT: Duration = Duration::from_secs(8);

/// Reddit extractor backed by the public post `.json` API.
///
/// The API permits anonymous cross-origin reads, so a direct fetch is tried
/// before falling back to the relay chain. The v.redd.it CDN does not, so
/// whatever URL comes out gets relay-wrapped.
#[derive(Debug, Clone)]
pub struct RedditExtractor;

#[async_trait::async_trait]
impl Extractor for RedditExtractor {
    fn matches(&self, url: &str) -> bool {
        url.contains("reddit.com/")
    }

    async fn extract(&self, req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
        extract_post(req, rv).await
    }

    fn platform(&self) -> Platform {
        Platform::Reddit
    }
}

pub async fn extract_post(req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
    req.progress("Reddit JSON API…", "");
    let json_url = post_json_url(&req.url)?;

    let data = match direct_fetch(rv, &json_url).await {
        Some(data) => data,
        None => rv.relay().fetch_json::<PostResponse>(&json_url).await?,
    };
    let post = data.post()?;

    let raw = bundled_rendition(post).or_else(|| linked_media(post))?;
    req.progress("Relay for playback…", "");
    let wrapped = rv.relay().media_url(&raw).await;
    Some(Resolution::Direct {
        url: wrapped,
        needs_relay: true,
    })
}

/// Normalize the post URL and point it at the JSON representation
fn post_json_url(url: &str) -> Option<String> {
    let base = url.split('?').next().unwrap_or(url).trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    Some(format!("{base}.json"))
}

async fn direct_fetch(rv: &Resolver, url: &str) -> Option<PostResponse> {
    let res = rv
        .http()
        .get(url)
        .header(ACCEPT, "application/json")
        .timeout(DIRECT_TIMEOUT)
        .send()
        .await
        .ok()?;
    if !res.status().is_success() {
        debug!(status = res.status().as_u16(), "direct reddit fetch rejected");
        return None;
    }
    res.json().await.ok()
}

/// The bundled fallback rendition of a hosted video
fn bundled_rendition(post: &Post) -> Option<String> {
    let fallback = post.video()?.fallback_url.as_ref()?;
    Some(fallback.replace("?source=fallback", ""))
}

/// A directly linked media file, with gifv rewritten to its mp4 twin
fn linked_media(post: &Post) -> Option<String> {
    let linked = post.linked_url()?;
    if LINKED_MEDIA.is_match(linked) {
        return Some(linked.replace(".gifv", ".mp4"));
    }
    // imgur sometimes buries the gifv marker before a query string
    if linked.contains("imgur.com") && linked.contains(".gifv") {
        return Some(linked.replace(".gifv", ".mp4"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(json: &str) -> Post {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn json_url_normalization() {
        assert_eq!(
            post_json_url("https://www.reddit.com/r/videos/comments/abc/title/?share=1").as_deref(),
            Some("https://www.reddit.com/r/videos/comments/abc/title.json")
        );
        assert_eq!(
            post_json_url("https://www.reddit.com/r/videos/comments/abc/title").as_deref(),
            Some("https://www.reddit.com/r/videos/comments/abc/title.json")
        );
    }

    #[test]
    fn bundled_rendition_strips_the_fallback_marker() {
        let p = post(
            r#"{"media": {"reddit_video": {"fallback_url": "https://v.redd.it/x/DASH_720.mp4?source=fallback"}}}"#,
        );
        assert_eq!(
            bundled_rendition(&p).as_deref(),
            Some("https://v.redd.it/x/DASH_720.mp4")
        );
    }

    #[test]
    fn linked_gifv_becomes_mp4() {
        let p = post(r#"{"url_overridden_by_dest": "https://i.imgur.com/abc.gifv"}"#);
        assert_eq!(linked_media(&p).as_deref(), Some("https://i.imgur.com/abc.mp4"));

        let p = post(r#"{"url": "https://example.com/clip.webm?x=1"}"#);
        assert_eq!(linked_media(&p).as_deref(), Some("https://example.com/clip.webm?x=1"));

        let p = post(r#"{"url": "https://example.com/article"}"#);
        assert_eq!(linked_media(&p), None);
    }

    #[test]
    fn bundled_rendition_wins_over_linked_media() {
        let p = post(
            r#"{
                "media": {"reddit_video": {"fallback_url": "https://v.redd.it/x/DASH_480.mp4"}},
                "url": "https://i.imgur.com/abc.gifv"
            }"#,
        );
        assert_eq!(
            bundled_rendition(&p).or_else(|| linked_media(&p)).as_deref(),
            Some("https://v.redd.it/x/DASH_480.mp4")
        );
    }
}
