use tracing::debug;

use crate::classify::{classify, is_direct_media_url};
use crate::cobalt::CobaltExtractor;
use crate::config::Config;
use crate::core::{Extractor, Platform, Quality, Resolution, ResolutionRequest};
use crate::instagram::InstagramExtractor;
use crate::reddit::RedditExtractor;
use crate::relay::RelayClient;
use crate::vimeo::VimeoExtractor;
use crate::youtube::YoutubeExtractor;
#[cfg(feature = "ytdlp")]
use crate::ytdlp::YtDlpExtractor;

/// Stateless resolution router.
///
/// One execution per request: direct-file shortcut, embed-only shortlist,
/// the platform's strategy chain, then `Failure`. The router sequences;
/// parsing belongs to the strategies.
pub struct Resolver {
    config: Config,
    relay: RelayClient,
    http: reqwest::Client,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        let relay = RelayClient::new(config.relay.clone());
        Self {
            config,
            relay,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    /// Shared client for endpoints that permit direct cross-origin reads
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Classify and resolve in one go
    pub async fn resolve(&self, url: &str, quality: Quality) -> Resolution {
        let reference = classify(url);
        self.resolve_request(ResolutionRequest::new(url, reference.platform, quality))
            .await
    }

    /// Run one request through the strategy ladder
    pub async fn resolve_request(&self, req: ResolutionRequest) -> Resolution {
        // direct media files need no extraction at all
        if is_direct_media_url(&req.url) {
            req.progress("Direct file…", "");
            return Resolution::Direct {
                url: req.url.clone(),
                needs_relay: false,
            };
        }

        if req.platform.is_embed_only() {
            return Resolution::EmbedOnly;
        }

        for strategy in strategy_chain(req.platform) {
            if let Some(resolution) = strategy.extract(&req, self).await {
                return resolution;
            }
            debug!(platform = ?req.platform, "strategy exhausted, trying the next one");
        }
        Resolution::Failure
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Ordered strategy chain per platform; the first non-null result wins.
/// Sequencing lives here and nowhere else.
fn strategy_chain(platform: Platform) -> Vec<&'static dyn Extractor> {
    #[allow(unused_mut)]
    let mut chain: Vec<&'static dyn Extractor> = match platform {
        Platform::Youtube => vec![&YoutubeExtractor],
        Platform::Vimeo => vec![&VimeoExtractor],
        Platform::Reddit => vec![&RedditExtractor, &CobaltExtractor],
        Platform::Instagram | Platform::InstagramProfile => {
            vec![&InstagramExtractor, &CobaltExtractor]
        }
        Platform::Tiktok | Platform::Twitter | Platform::Facebook => vec![&CobaltExtractor],
        _ => Vec::new(),
    };
    #[cfg(feature = "ytdlp")]
    {
        let wants_universal = matches!(
            platform,
            Platform::Youtube
                | Platform::Vimeo
                | Platform::Tiktok
                | Platform::Twitter
                | Platform::Facebook
        ) || chain.is_empty();
        if wants_universal {
            chain.push(&YtDlpExtractor);
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn direct_media_files_skip_extraction() {
        let resolver = Resolver::default();
        let result = resolver
            .resolve("https://example.com/clip.mp4", Quality::Q720)
            .await;
        assert_eq!(
            result,
            Resolution::Direct {
                url: "https://example.com/clip.mp4".to_string(),
                needs_relay: false,
            }
        );
    }

    #[tokio::test]
    async fn embed_only_platforms_short_circuit() {
        let resolver = Resolver::default();
        let result = resolver
            .resolve(
                "https://open.spotify.com/track/3n3Ppam7vgaVa1iaRUc9Lp",
                Quality::Q720,
            )
            .await;
        assert_eq!(result, Resolution::EmbedOnly);

        let result = resolver
            .resolve("https://www.twitch.tv/somechannel", Quality::Q720)
            .await;
        assert_eq!(result, Resolution::EmbedOnly);
    }

    #[test]
    fn chains_lead_with_the_platform_strategy() {
        let chain = strategy_chain(Platform::Youtube);
        assert!(!chain.is_empty());
        assert_eq!(chain[0].platform(), Platform::Youtube);

        let chain = strategy_chain(Platform::Reddit);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].platform(), Platform::Reddit);
    }

    #[cfg(feature = "ytdlp")]
    #[test]
    fn unknown_platforms_get_the_universal_fallback_only() {
        let chain = strategy_chain(Platform::Web);
        assert_eq!(chain.len(), 1);
        assert!(chain[0].matches("https://anything.example/whatever"));
    }
}
