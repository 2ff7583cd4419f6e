use tracing::{debug, warn};

use crate::classify::youtube_id;
use crate::core::{Extractor, Platform, Resolution, ResolutionRequest};
use crate::router::Resolver;
use crate::utils::nearest_by_height;

pub mod types;

pub use types::{FormatStream, VideoResponse};

/// YouTube extractor backed by public Invidious instances.
///
/// Instances come and go; each one is tried in order and any failure moves
/// on to the next. The googlevideo CDN allows cross-origin reads, so the
/// chosen stream URL usually needs no relay wrapping.
#[derive(Debug, Clone)]
pub struct YoutubeExtractor;

#[async_trait::async_trait]
impl Extractor for YoutubeExtractor {
    fn matches(&self, url: &str) -> bool {
        youtube_id(url).is_some()
    }

    async fn extract(&self, req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
        extract_video(req, rv).await
    }

    fn platform(&self) -> Platform {
        Platform::Youtube
    }
}

/// CDN hosts that permit direct cross-origin playback
fn cors_open_cdn(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.domain().map(|d| d.ends_with("googlevideo.com")))
        .unwrap_or(false)
}

pub async fn extract_video(req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
    let id = youtube_id(&req.url)?;
    let target = req.quality.height();

    for instance in &rv.config().invidious_instances {
        let host = instance.trim_start_matches("https://");
        req.progress(&format!("YouTube via {host}…"), "");

        let api_url = format!("{instance}/api/v1/videos/{id}");
        let Some(video) = rv.relay().fetch_json::<VideoResponse>(&api_url).await else {
            debug!(instance = host, "no usable response");
            continue;
        };

        if let Some(format) = select_format(&video, target)
            && let Some(stream_url) = format.url.clone()
        {
            debug!(instance = host, height = format.height(), "stream found");
            if cors_open_cdn(&stream_url) {
                return Some(Resolution::Direct {
                    url: stream_url,
                    needs_relay: false,
                });
            }
            req.progress("Relay for playback…", "");
            let wrapped = rv.relay().media_url(&stream_url).await;
            return Some(Resolution::Direct {
                url: wrapped,
                needs_relay: true,
            });
        }
        debug!(instance = host, "no playable format in response");
    }

    warn!("every Invidious instance failed for video {id}");
    None
}

/// Prefer combined audio+video renditions at the nearest quality; split
/// adaptive streams are the last resort.
fn select_format(video: &VideoResponse, target: u32) -> Option<&FormatStream> {
    let combined: Vec<&FormatStream> = video
        .format_streams
        .iter()
        .filter(|f| f.url.is_some() && f.is_video())
        .collect();
    if let Some(best) = nearest_by_height(&combined, target, |f| f.height()).copied() {
        return Some(best);
    }
    video
        .format_streams
        .iter()
        .find(|f| f.url.is_some())
        .or_else(|| {
            video
                .adaptive_formats
                .iter()
                .find(|f| f.url.is_some() && f.is_video())
        })
}
