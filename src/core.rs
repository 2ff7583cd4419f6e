use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
pub use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::router::Resolver;

/// Known source platforms
#[derive(EnumIter, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Youtube,
    Instagram,
    InstagramProfile,
    Facebook,
    Twitter,
    Tiktok,
    Vimeo,
    Reddit,
    Twitch,
    Pinterest,
    Linkedin,
    Spotify,
    Image,
    Video,
    Web,
}

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::Instagram | Platform::InstagramProfile => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "X / Twitter",
            Platform::Tiktok => "TikTok",
            Platform::Vimeo => "Vimeo",
            Platform::Reddit => "Reddit",
            Platform::Twitch => "Twitch",
            Platform::Pinterest => "Pinterest",
            Platform::Linkedin => "LinkedIn",
            Platform::Spotify => "Spotify",
            Platform::Image => "Image",
            Platform::Video => "Video",
            Platform::Web => "Web",
        }
    }

    /// Accent color used by card rendering
    pub fn display_color(&self) -> &'static str {
        match self {
            Platform::Youtube => "#FF0000",
            Platform::Instagram => "#E1306C",
            Platform::InstagramProfile => "#833AB4",
            Platform::Facebook => "#1877F2",
            Platform::Twitter => "#1DA1F2",
            Platform::Tiktok => "#000000",
            Platform::Vimeo => "#1AB7EA",
            Platform::Reddit => "#FF4500",
            Platform::Twitch => "#9146FF",
            Platform::Pinterest => "#E60023",
            Platform::Linkedin => "#0077B5",
            Platform::Spotify => "#1DB954",
            Platform::Image => "#6C63FF",
            Platform::Video => "#FF6B6B",
            Platform::Web => "#64FFDA",
        }
    }

    pub fn display_icon(&self) -> &'static str {
        match self {
            Platform::Youtube => "fab fa-youtube",
            Platform::Instagram | Platform::InstagramProfile => "fab fa-instagram",
            Platform::Facebook => "fab fa-facebook",
            Platform::Twitter => "fab fa-twitter",
            Platform::Tiktok => "fab fa-tiktok",
            Platform::Vimeo => "fab fa-vimeo",
            Platform::Reddit => "fab fa-reddit",
            Platform::Twitch => "fab fa-twitch",
            Platform::Pinterest => "fab fa-pinterest",
            Platform::Linkedin => "fab fa-linkedin",
            Platform::Spotify => "fab fa-spotify",
            Platform::Image => "fas fa-image",
            Platform::Video => "fas fa-video",
            Platform::Web => "fas fa-globe",
        }
    }

    /// Platforms with no obtainable direct stream; the caller renders an
    /// iframe embed instead of attempting extraction.
    pub fn is_embed_only(&self) -> bool {
        matches!(self, Platform::Spotify | Platform::Twitch)
    }
}

/// Requested quality tier
#[derive(EnumIter, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Default)]
pub enum Quality {
    Q360,
    Q480,
    #[default]
    Q720,
    Q1080,
}

impl Quality {
    pub fn height(&self) -> u32 {
        match self {
            Quality::Q360 => 360,
            Quality::Q480 => 480,
            Quality::Q720 => 720,
            Quality::Q1080 => 1080,
        }
    }

    pub fn from_height(height: u32) -> Option<Self> {
        match height {
            360 => Some(Quality::Q360),
            480 => Some(Quality::Q480),
            720 => Some(Quality::Q720),
            1080 => Some(Quality::Q1080),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        format!("{}p", self.height())
    }
}

/// One candidate media item offered by a picker response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickerItem {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Outcome of a resolution attempt. Exactly one variant describes each
/// request; strategy exhaustion surfaces as `Failure`, never as an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// A playable media URL. `needs_relay` is set when the URL has already
    /// been wrapped with a relay endpoint to survive cross-origin playback.
    Direct { url: String, needs_relay: bool },
    /// Multiple candidate streams; the caller must let the user choose.
    Picker { items: Vec<PickerItem> },
    /// No direct stream obtainable; fall back to an iframe embed.
    EmbedOnly,
    /// All strategies exhausted.
    Failure,
}

impl Resolution {
    pub fn is_failure(&self) -> bool {
        matches!(self, Resolution::Failure)
    }
}

/// Progress callback: `(message, detail)`, human-readable, UI display only.
pub type ProgressFn = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// One resolution attempt: URL, classified platform, desired quality and an
/// optional progress callback.
#[derive(Clone)]
pub struct ResolutionRequest {
    pub url: String,
    pub platform: Platform,
    pub quality: Quality,
    pub on_progress: Option<ProgressFn>,
}

impl ResolutionRequest {
    pub fn new(url: impl Into<String>, platform: Platform, quality: Quality) -> Self {
        Self {
            url: url.into(),
            platform,
            quality,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn progress(&self, message: &str, detail: &str) {
        if let Some(cb) = &self.on_progress {
            cb(message, detail);
        }
    }
}

impl fmt::Debug for ResolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionRequest")
            .field("url", &self.url)
            .field("platform", &self.platform)
            .field("quality", &self.quality)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Trait implemented by each extraction strategy.
///
/// `None` means "this strategy did not produce a result, try the next one";
/// strategies recover their own errors and never propagate them.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Check if the URL looks like something this strategy can handle
    fn matches(&self, url: &str) -> bool;

    /// Attempt to resolve the request into a playable result
    async fn extract(&self, req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution>;

    /// Platform this strategy is specific to (`Web` for universal strategies)
    fn platform(&self) -> Platform;
}
