use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::core::{Extractor, Platform, Resolution, ResolutionRequest};
use crate::router::Resolver;
use crate::utils::decode_html_entities;

static POST_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"instagram\.com/(reels?|p|tv|stories|share)/").unwrap());

static SOURCE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<source[^>]+src=["']([^"']+)["']"#).unwrap());

static OG_SECURE_A: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)property=["']og:video:secure_url["'][^>]*content=["']([^"']+)["']"#).unwrap()
});
static OG_SECURE_B: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)content=["']([^"']+)["'][^>]*property=["']og:video:secure_url["']"#).unwrap()
});
static OG_VIDEO_A: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)property=["']og:video["'][^>]*content=["']([^"']+)["']"#).unwrap()
});
static OG_VIDEO_B: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)content=["']([^"']+)["'][^>]*property=["']og:video["']"#).unwrap()
});

/// Instagram extractor scraping a read-friendly mirror front-end.
///
/// The mirror serves the post as plain HTML with the video in a `<source>`
/// tag or og meta tags; the post page itself is useless without login.
#[derive(Debug, Clone)]
pub struct InstagramExtractor;

#[async_trait::async_trait]
impl Extractor for InstagramExtractor {
    fn matches(&self, url: &str) -> bool {
        POST_PATH.is_match(url)
    }

    async fn extract(&self, req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
        extract_post(req, rv).await
    }

    fn platform(&self) -> Platform {
        Platform::Instagram
    }
}

pub async fn extract_post(req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
    let mirror = mirror_url(&req.url, &rv.config().instagram_mirror)?;
    req.progress("Instagram mirror…", "");

    let html = rv.relay().fetch_text(&mirror).await?;
    let Some(raw) = source_from_html(&html) else {
        debug!("no video URL in mirror HTML");
        return None;
    };

    req.progress("Relay for playback…", "");
    let wrapped = rv.relay().media_url(&raw).await;
    Some(Resolution::Direct {
        url: wrapped,
        needs_relay: true,
    })
}

/// Substitute the mirror host into the original post path
fn mirror_url(url: &str, mirror_host: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    Some(format!("https://{}{}", mirror_host, parsed.path()))
}

/// Pull the playable URL out of the mirror HTML. Order encodes
/// reliability: the inline `<source>` tag, then og:video:secure_url,
/// then og:video.
pub(crate) fn source_from_html(html: &str) -> Option<String> {
    for re in [
        &*SOURCE_TAG,
        &*OG_SECURE_A,
        &*OG_SECURE_B,
        &*OG_VIDEO_A,
        &*OG_VIDEO_B,
    ] {
        if let Some(captures) = re.captures(html) {
            return Some(decode_html_entities(&captures[1]));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_post_paths_only() {
        assert!(InstagramExtractor.matches("https://www.instagram.com/p/Cxyz/"));
        assert!(InstagramExtractor.matches("https://www.instagram.com/reel/Cxyz/"));
        assert!(InstagramExtractor.matches("https://www.instagram.com/reels/Cxyz/"));
        assert!(InstagramExtractor.matches("https://www.instagram.com/stories/user/123/"));
        assert!(!InstagramExtractor.matches("https://www.instagram.com/some_user/"));
    }

    #[test]
    fn mirror_url_substitutes_the_host() {
        assert_eq!(
            mirror_url("https://www.instagram.com/reel/Cxyz123/", "www.vxinstagram.com").as_deref(),
            Some("https://www.vxinstagram.com/reel/Cxyz123/")
        );
        assert_eq!(mirror_url("not a url", "www.vxinstagram.com"), None);
    }

    #[test]
    fn source_tag_wins_over_og_tags() {
        let html = r#"
            <meta property="og:video" content="https://cdn.example/og.mp4">
            <video><source src="https://cdn.example/tag.mp4" type="video/mp4"></video>
        "#;
        assert_eq!(
            source_from_html(html).as_deref(),
            Some("https://cdn.example/tag.mp4")
        );
    }

    #[test]
    fn og_secure_url_wins_over_og_video() {
        let html = r#"
            <meta property="og:video" content="https://cdn.example/plain.mp4">
            <meta property="og:video:secure_url" content="https://cdn.example/secure.mp4">
        "#;
        assert_eq!(
            source_from_html(html).as_deref(),
            Some("https://cdn.example/secure.mp4")
        );
    }

    #[test]
    fn reversed_attribute_order_still_matches() {
        let html = r#"<meta content="https://cdn.example/rev.mp4" property="og:video">"#;
        assert_eq!(
            source_from_html(html).as_deref(),
            Some("https://cdn.example/rev.mp4")
        );
    }

    #[test]
    fn html_entities_are_decoded() {
        let html = r#"<source src="https://cdn.example/v.mp4?a=1&amp;b=2">"#;
        assert_eq!(
            source_from_html(html).as_deref(),
            Some("https://cdn.example/v.mp4?a=1&b=2")
        );
    }

    #[test]
    fn empty_html_yields_none() {
        assert_eq!(source_from_html("<html><body>nothing here</body></html>"), None);
    }
}
