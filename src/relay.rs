use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::error::{ResolveError, Result};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Responses shorter than this are treated as relay error pages
const MIN_PAYLOAD_LEN: usize = 50;

/// How an endpoint expects the target URL to be attached
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelayStyle {
    /// `base` + percent-encoded target (`...?url=<encoded>`)
    Query,
    /// `base` + raw target appended to the path
    Path,
}

/// One relay in the chain: a name for logging plus a URL builder
#[derive(Debug, Clone, Serialize)]
pub struct RelayEndpoint {
    pub name: String,
    pub base: String,
    pub style: RelayStyle,
    /// Belongs to the optional fallback tier gated by configuration
    pub secondary: bool,
}

impl RelayEndpoint {
    pub fn new(name: impl Into<String>, base: impl Into<String>, style: RelayStyle) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            style,
            secondary: false,
        }
    }

    pub fn secondary(mut self) -> Self {
        self.secondary = true;
        self
    }

    /// Build the relayed URL for a target
    pub fn wrap(&self, target: &str) -> String {
        match self.style {
            RelayStyle::Query => format!("{}{}", self.base, urlencoding::encode(target)),
            RelayStyle::Path => format!("{}{}", self.base, target),
        }
    }
}

/// Relays for reading HTML/JSON pages (they return the body)
pub fn default_fetch_relays() -> Vec<RelayEndpoint> {
    vec![
        RelayEndpoint::new(
            "allorigins",
            "https://api.allorigins.win/get?url=",
            RelayStyle::Query,
        ),
        RelayEndpoint::new("corsproxy", "https://corsproxy.io/?url=", RelayStyle::Query),
        RelayEndpoint::new(
            "codetabs",
            "https://api.codetabs.com/v1/proxy?quest=",
            RelayStyle::Query,
        ),
        RelayEndpoint::new(
            "thingproxy",
            "https://thingproxy.freeboard.io/fetch/",
            RelayStyle::Path,
        )
        .secondary(),
    ]
}

/// Relays for wrapping media URLs as a playback `src` (they follow
/// redirects and add permissive response headers)
pub fn default_media_relays() -> Vec<RelayEndpoint> {
    vec![
        RelayEndpoint::new("corsproxy", "https://corsproxy.io/?url=", RelayStyle::Query),
        RelayEndpoint::new(
            "allorigins-raw",
            "https://api.allorigins.win/raw?url=",
            RelayStyle::Query,
        ),
        RelayEndpoint::new(
            "thingproxy",
            "https://thingproxy.freeboard.io/fetch/",
            RelayStyle::Path,
        )
        .secondary(),
    ]
}

/// Client for the relay chain.
///
/// Every extractor depends on this for cross-origin reads; centralizing the
/// retry and envelope handling keeps the extractors small and lets the chain
/// be reconfigured without touching them.
pub struct RelayClient {
    config: RelayConfig,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, http }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Ordered fetch endpoints, rebuilt from configuration on every call
    pub fn fetch_endpoints(&self) -> Vec<RelayEndpoint> {
        Self::active(
            &self.config.fetch_relays,
            self.config.enable_secondary_relay,
        )
    }

    /// Ordered media endpoints, rebuilt from configuration on every call
    pub fn media_endpoints(&self) -> Vec<RelayEndpoint> {
        Self::active(
            &self.config.media_relays,
            self.config.enable_secondary_relay,
        )
    }

    fn active(list: &[RelayEndpoint], include_secondary: bool) -> Vec<RelayEndpoint> {
        list.iter()
            .filter(|ep| include_secondary || !ep.secondary)
            .cloned()
            .collect()
    }

    fn wrapped(&self, ep: &RelayEndpoint, target: &str, is_primary: bool) -> String {
        let mut url = ep.wrap(target);
        if is_primary
            && matches!(ep.style, RelayStyle::Query)
            && let Some(key) = self.config.api_key.as_deref()
        {
            url.push_str("&key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    /// Fetch a page through the relay chain and return its text body.
    /// Exhausting every endpoint yields `None`, never an error: callers
    /// treat that as "try the next strategy".
    pub async fn fetch_text(&self, target: &str) -> Option<String> {
        for (idx, ep) in self.fetch_endpoints().iter().enumerate() {
            match self.attempt(ep, target, idx == 0).await {
                Ok(body) => return Some(String::from_utf8_lossy(&body).into_owned()),
                Err(e) => debug!(relay = %ep.name, "relay fetch failed: {e}"),
            }
        }
        warn!("every relay endpoint failed for {target}");
        None
    }

    /// Fetch a page through the relay chain and parse it as JSON.
    /// A payload that is not the expected JSON counts as a failed endpoint.
    pub async fn fetch_json<T: DeserializeOwned>(&self, target: &str) -> Option<T> {
        for (idx, ep) in self.fetch_endpoints().iter().enumerate() {
            match self.attempt(ep, target, idx == 0).await {
                Ok(body) => match serde_json::from_slice(&body) {
                    Ok(value) => return Some(value),
                    Err(e) => debug!(relay = %ep.name, "relay payload was not valid JSON: {e}"),
                },
                Err(e) => debug!(relay = %ep.name, "relay fetch failed: {e}"),
            }
        }
        warn!("every relay endpoint failed for {target}");
        None
    }

    async fn attempt(&self, ep: &RelayEndpoint, target: &str, is_primary: bool) -> Result<Vec<u8>> {
        let wrapped = self.wrapped(ep, target, is_primary);
        let res = self
            .http
            .get(wrapped.as_str())
            .timeout(self.config.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolveError::RequestTimeout(wrapped.clone())
                } else {
                    ResolveError::Network(e)
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(ResolveError::Http {
                status: status.as_u16(),
                url: wrapped,
            });
        }

        let body = res.bytes().await.map_err(ResolveError::Network)?;
        match unwrap_envelope(&body) {
            Some(inner) => Ok(inner),
            None if body.len() >= MIN_PAYLOAD_LEN => Ok(body.to_vec()),
            None => Err(ResolveError::Parse(format!(
                "suspiciously short relay response ({} bytes)",
                body.len()
            ))),
        }
    }

    /// Wrap a raw media URL with a relay usable directly as a playback src.
    ///
    /// HEAD-probes each candidate. A transport-level probe failure still
    /// returns that relay's URL: some relays reject HEAD but serve the real
    /// GET fine. Only a definitive rejection moves to the next candidate;
    /// when every candidate rejects, the primary relay is returned anyway.
    pub async fn media_url(&self, raw: &str) -> String {
        let endpoints = self.media_endpoints();
        for (idx, ep) in endpoints.iter().enumerate() {
            let wrapped = self.wrapped(ep, raw, idx == 0);
            match self
                .http
                .head(wrapped.as_str())
                .timeout(self.config.probe_timeout)
                .send()
                .await
            {
                Ok(res) => {
                    let status = res.status().as_u16();
                    if res.status().is_success() || matches!(status, 206 | 301 | 302) {
                        return wrapped;
                    }
                    debug!(relay = %ep.name, status, "media probe rejected");
                }
                Err(e) => {
                    debug!(relay = %ep.name, "media probe errored ({e}); keeping relay");
                    return wrapped;
                }
            }
        }
        match endpoints.first() {
            Some(ep) => self.wrapped(ep, raw, true),
            None => raw.to_string(),
        }
    }
}

/// Unwrap the `{"contents": "..."}` envelope some relays answer with.
/// `data:` URI contents are base64-decoded so binary payloads survive the
/// text envelope byte for byte. Returns `None` when the body is no envelope.
pub(crate) fn unwrap_envelope(body: &[u8]) -> Option<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let contents = value.get("contents")?.as_str()?;
    Some(decode_contents(contents))
}

fn decode_contents(contents: &str) -> Vec<u8> {
    if let Some(rest) = contents.strip_prefix("data:")
        && let Some((_, payload)) = rest.split_once(";base64,")
        && let Ok(bytes) = BASE64.decode(payload)
    {
        return bytes;
    }
    contents.as_bytes().to_vec()
}
