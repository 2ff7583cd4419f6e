use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::core::{Extractor, Platform, Resolution, ResolutionRequest};
use crate::router::Resolver;

pub mod types;

pub use types::{CobaltRequest, CobaltResponse, CobaltStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(9);

/// Delegated resolver speaking the cobalt API.
///
/// Covers the platforms without a workable direct strategy (TikTok,
/// Twitter/X, Facebook) and serves as the second stage for others. Public
/// instances are unreliable, so each one is tried in order.
#[derive(Debug, Clone)]
pub struct CobaltExtractor;

#[async_trait::async_trait]
impl Extractor for CobaltExtractor {
    fn matches(&self, url: &str) -> bool {
        ["tiktok.", "twitter.", "x.com", "facebook.", "fb.watch"]
            .iter()
            .any(|needle| url.contains(needle))
    }

    async fn extract(&self, req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
        delegate(req, rv).await
    }

    fn platform(&self) -> Platform {
        Platform::Web
    }
}

pub async fn delegate(req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
    let body = CobaltRequest::new(&req.url, req.quality);

    for instance in &rv.config().cobalt_instances {
        let short = instance
            .trim_start_matches("https://")
            .split('.')
            .next()
            .unwrap_or_default();
        req.progress(&format!("Cobalt ({short})…"), "");

        let res = match rv
            .http()
            .post(instance.as_str())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => res,
            Ok(res) => {
                debug!(instance = %instance, status = res.status().as_u16(), "instance rejected");
                continue;
            }
            Err(e) => {
                debug!(instance = %instance, "instance failed: {e}");
                continue;
            }
        };

        let data: CobaltResponse = match res.json().await {
            Ok(data) => data,
            Err(e) => {
                debug!(instance = %instance, "unparseable response: {e}");
                continue;
            }
        };

        match data.status {
            CobaltStatus::Error | CobaltStatus::Unknown => continue,
            CobaltStatus::Stream | CobaltStatus::Redirect | CobaltStatus::Tunnel => {
                let Some(url) = data.url else { continue };
                req.progress("Relay for playback…", "");
                let wrapped = rv.relay().media_url(&url).await;
                return Some(Resolution::Direct {
                    url: wrapped,
                    needs_relay: true,
                });
            }
            CobaltStatus::Picker => {
                if data.picker.is_empty() {
                    continue;
                }
                return Some(Resolution::Picker {
                    items: data.picker.into_iter().map(Into::into).collect(),
                });
            }
        }
    }

    warn!("every cobalt instance failed for {}", req.url);
    None
}
