use std::time::Duration;

use crate::relay::{RelayEndpoint, default_fetch_relays, default_media_relays};

/// Relay chain configuration.
///
/// The pipeline only ever reads this; whatever settings surface the embedding
/// application exposes is its own concern.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Include relays flagged as secondary fallbacks in the chain.
    /// User-facing toggle, preserved as an explicit input.
    pub enable_secondary_relay: bool,
    /// Optional API key appended to the primary relay endpoint
    pub api_key: Option<String>,
    /// Ordered relay list for page/API retrieval
    pub fetch_relays: Vec<RelayEndpoint>,
    /// Ordered relay list for wrapping playable media URLs
    pub media_relays: Vec<RelayEndpoint>,
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enable_secondary_relay: true,
            api_key: None,
            fetch_relays: default_fetch_relays(),
            media_relays: default_media_relays(),
            fetch_timeout: Duration::from_secs(9),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Hosted yt-dlp runtime configuration
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Allow the universal fallback at all
    pub enabled: bool,
    /// Interpreter command override; auto-discovered when unset
    pub python: Option<String>,
    /// Install yt-dlp through pip when the module is missing
    pub auto_install: bool,
    pub bootstrap_timeout: Duration,
    pub extract_timeout: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            python: None,
            auto_install: true,
            bootstrap_timeout: Duration::from_secs(120),
            extract_timeout: Duration::from_secs(90),
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub relay: RelayConfig,
    /// Public Invidious instances, tried in order
    pub invidious_instances: Vec<String>,
    /// Public cobalt instances, tried in order
    pub cobalt_instances: Vec<String>,
    /// Read-friendly Instagram mirror host
    pub instagram_mirror: String,
    pub ytdlp: YtDlpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            invidious_instances: vec![
                "https://inv.nadeko.net".to_string(),
                "https://invidious.privacydev.net".to_string(),
                "https://yt.artemislena.eu".to_string(),
                "https://invidious.flokinet.to".to_string(),
                "https://iv.melmac.space".to_string(),
                "https://invidious.nerdvpn.de".to_string(),
            ],
            cobalt_instances: vec![
                "https://api.cobalt.tools".to_string(),
                "https://cobalt.api.timelessnesses.me".to_string(),
                "https://cobalt.catto.zip".to_string(),
                "https://co.wuk.sh".to_string(),
            ],
            instagram_mirror: "www.vxinstagram.com".to_string(),
            ytdlp: YtDlpConfig::default(),
        }
    }
}
