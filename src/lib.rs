//! Resolve an arbitrary media page URL into a playable stream or an
//! embeddable preview.
//!
//! The pipeline classifies the URL, then walks an ordered chain of
//! extraction strategies (public API instances, relay-wrapped scrapes,
//! delegated resolvers, finally a hosted yt-dlp) and returns the first
//! usable result. Expected failures never surface as errors: the public
//! contract is "returns a [`Resolution`], does not throw".

pub mod classify;
pub mod cobalt;
pub mod config;
pub mod core;
pub mod error;
pub mod instagram;
pub mod metadata;
pub mod reddit;
pub mod relay;
pub mod router;
pub mod utils;
pub mod vimeo;
pub mod youtube;

#[cfg(feature = "ytdlp")]
pub mod ytdlp;

pub use crate::classify::{MediaReference, classify, embed_url, thumbnail_url};
pub use crate::config::{Config, RelayConfig, YtDlpConfig};
pub use crate::core::{
    Extractor, PickerItem, Platform, ProgressFn, Quality, Resolution, ResolutionRequest,
};
pub use crate::error::{ResolveError, Result};
pub use crate::metadata::{MediaMetadata, fetch_metadata};
pub use crate::relay::RelayClient;
pub use crate::router::Resolver;

/// Resolve a URL with the default configuration (platform auto-detected)
pub async fn resolve(url: &str, quality: Quality) -> Resolution {
    Resolver::new(Config::default()).resolve(url, quality).await
}
