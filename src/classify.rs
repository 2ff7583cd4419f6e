use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::Platform;

/// Ordered classification table; first match wins.
///
/// List order is significant and encodes specificity: narrower patterns must
/// stay ahead of broader ones for the same platform. The Instagram profile
/// rule would shadow post/reel/tv URLs if it ever moved above them.
static PLATFORM_RULES: LazyLock<Vec<(Platform, Vec<Regex>)>> = LazyLock::new(|| {
    let table: &[(Platform, &[&str])] = &[
        (
            Platform::Youtube,
            &[
                r"youtube\.com/watch",
                r"youtube\.com/shorts",
                r"youtu\.be/",
            ],
        ),
        (
            Platform::Instagram,
            &[
                r"instagram\.com/p/",
                r"instagram\.com/reel/",
                r"instagram\.com/tv/",
            ],
        ),
        (Platform::InstagramProfile, &[r"instagram\.com/[^/]+/?$"]),
        (Platform::Facebook, &[r"facebook\.com/", r"fb\.watch/"]),
        (Platform::Twitter, &[r"twitter\.com/", r"x\.com/"]),
        (Platform::Tiktok, &[r"tiktok\.com/"]),
        (Platform::Vimeo, &[r"vimeo\.com/"]),
        (Platform::Reddit, &[r"reddit\.com/"]),
        (Platform::Twitch, &[r"twitch\.tv/"]),
        (Platform::Pinterest, &[r"pinterest\.(com|it)/"]),
        (Platform::Linkedin, &[r"linkedin\.com/"]),
        (Platform::Spotify, &[r"spotify\.com/"]),
    ];
    table
        .iter()
        .map(|(platform, patterns)| {
            (
                *platform,
                patterns
                    .iter()
                    .map(|p| Regex::new(p).unwrap())
                    .collect(),
            )
        })
        .collect()
});

static IMAGE_EXTENSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|bmp|svg|avif)(\?.*)?$").unwrap()
});

static VIDEO_EXTENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(mp4|webm|mov|avi|mkv|ogg)(\?.*)?$").unwrap());

/// Extensions a playback element can consume without any extraction
static DIRECT_MEDIA_EXTENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(mp4|webm|mov|ogg|m3u8|ts)(\?.*)?$").unwrap());

static YOUTUBE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|youtu\.be/|shorts/|embed/)([a-zA-Z0-9_-]{11})").unwrap());

static VIMEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vimeo\.com/(?:video/)?(\d+)").unwrap());

static INSTAGRAM_SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"instagram\.com/(?:p|reel|tv)/([A-Za-z0-9_-]+)").unwrap());

static TIKTOK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tiktok\.com/@[^/]+/video/(\d+)").unwrap());

static SPOTIFY_RESOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"spotify\.com/(track|album|playlist|episode)/([a-zA-Z0-9]+)").unwrap()
});

/// A classified URL with the presentation metadata card rendering needs
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MediaReference {
    pub url: String,
    pub platform: Platform,
    pub display_color: &'static str,
    pub display_icon: &'static str,
}

impl MediaReference {
    fn new(url: &str, platform: Platform) -> Self {
        Self {
            url: url.to_string(),
            platform,
            display_color: platform.display_color(),
            display_icon: platform.display_icon(),
        }
    }
}

/// Map a raw URL to its platform. Total and pure: unknown URLs fall back to
/// extension sniffing and finally to the generic `Web` classification.
pub fn classify(url: &str) -> MediaReference {
    for (platform, patterns) in PLATFORM_RULES.iter() {
        if patterns.iter().any(|p| p.is_match(url)) {
            return MediaReference::new(url, *platform);
        }
    }
    if IMAGE_EXTENSIONS.is_match(url) {
        return MediaReference::new(url, Platform::Image);
    }
    if VIDEO_EXTENSIONS.is_match(url) {
        return MediaReference::new(url, Platform::Video);
    }
    MediaReference::new(url, Platform::Web)
}

/// True when the URL points at a media file a player can load directly
pub fn is_direct_media_url(url: &str) -> bool {
    DIRECT_MEDIA_EXTENSIONS.is_match(url)
}

pub fn youtube_id(url: &str) -> Option<String> {
    YOUTUBE_ID
        .captures(url)
        .map(|c| c[1].to_string())
}

pub fn vimeo_id(url: &str) -> Option<String> {
    VIMEO_ID.captures(url).map(|c| c[1].to_string())
}

pub fn instagram_shortcode(url: &str) -> Option<String> {
    INSTAGRAM_SHORTCODE.captures(url).map(|c| c[1].to_string())
}

pub fn tiktok_id(url: &str) -> Option<String> {
    TIKTOK_ID.captures(url).map(|c| c[1].to_string())
}

/// Build the iframe embed URL the playback surface uses for `EmbedOnly`
/// results (and for platforms the user prefers embedded).
pub fn embed_url(url: &str, platform: Platform) -> Option<String> {
    match platform {
        Platform::Youtube => youtube_id(url)
            .map(|id| format!("https://www.youtube.com/embed/{id}?rel=0&modestbranding=1")),
        Platform::Vimeo => {
            vimeo_id(url).map(|id| format!("https://player.vimeo.com/video/{id}?dnt=1"))
        }
        Platform::Instagram => {
            instagram_shortcode(url).map(|id| format!("https://www.instagram.com/p/{id}/embed/"))
        }
        Platform::Facebook => Some(format!(
            "https://www.facebook.com/plugins/post.php?href={}&show_text=true&width=500",
            urlencoding::encode(url)
        )),
        Platform::Tiktok => tiktok_id(url).map(|id| format!("https://www.tiktok.com/embed/v2/{id}")),
        Platform::Spotify => SPOTIFY_RESOURCE
            .captures(url)
            .map(|c| format!("https://open.spotify.com/embed/{}/{}", &c[1], &c[2])),
        // Twitter embeds go through oEmbed script injection on the caller side
        _ => None,
    }
}

/// Best-effort thumbnail without a metadata fetch
pub fn thumbnail_url(url: &str, platform: Platform) -> Option<String> {
    match platform {
        Platform::Youtube => {
            youtube_id(url).map(|id| format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"))
        }
        Platform::Image => Some(url.to_string()),
        _ => None,
    }
}
