use tracing::{debug, warn};

use crate::classify::vimeo_id;
use crate::core::{Extractor, Platform, Resolution, ResolutionRequest};
use crate::router::Resolver;
use crate::utils::nearest_by_height;

pub mod types;

pub use types::{PlayerConfig, PlayerFiles, ProgressiveFile};

/// Vimeo extractor backed by the public player config endpoint
#[derive(Debug, Clone)]
pub struct VimeoExtractor;

#[async_trait::async_trait]
impl Extractor for VimeoExtractor {
    fn matches(&self, url: &str) -> bool {
        vimeo_id(url).is_some()
    }

    async fn extract(&self, req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
        extract_clip(req, rv).await
    }

    fn platform(&self) -> Platform {
        Platform::Vimeo
    }
}

pub async fn extract_clip(req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
    let id = vimeo_id(&req.url)?;
    req.progress("Vimeo config API…", "");

    let config_url = format!("https://player.vimeo.com/video/{id}/config");
    let config = rv.relay().fetch_json::<PlayerConfig>(&config_url).await?;
    let files = config.request?.files?;

    if let Some(url) = select_progressive(&files, req.quality.height()) {
        req.progress("Relay for playback…", "");
        let wrapped = rv.relay().media_url(&url).await;
        return Some(Resolution::Direct {
            url: wrapped,
            needs_relay: true,
        });
    }

    // no progressive rendition: fall back to the adaptive manifest
    if let Some(hls) = &files.hls
        && let Some(manifest) = hls.cdns.values().find_map(|cdn| cdn.url.clone())
    {
        debug!(clip = %id, "falling back to HLS manifest");
        let wrapped = rv.relay().media_url(&manifest).await;
        return Some(Resolution::Direct {
            url: wrapped,
            needs_relay: true,
        });
    }

    warn!("no playable rendition for Vimeo clip {id}");
    None
}

fn select_progressive(files: &PlayerFiles, target: u32) -> Option<String> {
    let candidates: Vec<&ProgressiveFile> = files
        .progressive
        .iter()
        .filter(|f| f.url.is_some())
        .collect();
    nearest_by_height(&candidates, target, |f| f.height())
        .copied()
        .and_then(|f| f.url.clone())
}
