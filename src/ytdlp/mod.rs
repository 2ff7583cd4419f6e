use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::{Extractor, Platform, Resolution, ResolutionRequest};
use crate::error::{ResolveError, Result};
use crate::router::Resolver;

mod driver;
pub mod runtime;

pub use runtime::{Runtime, RuntimeHandle, prewarm, shared_handle};

const URL_ENV: &str = "STREAMVAULT_URL";
const QUALITY_ENV: &str = "STREAMVAULT_QUALITY";
const RELAYS_ENV: &str = "STREAMVAULT_RELAYS";
const TIMEOUT_ENV: &str = "STREAMVAULT_TIMEOUT";

/// Socket timeout handed to the hosted tool, in seconds
const TOOL_SOCKET_TIMEOUT: &str = "30";

/// What the driver prints on its single stdout line
#[derive(Debug, Clone, Deserialize)]
pub struct DriverOutput {
    pub url: Option<String>,
    pub ext: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub quality: Option<String>,
    pub error: Option<String>,
}

/// Universal fallback: yt-dlp hosted in a sandboxed interpreter.
///
/// Last resort for anything the platform strategies don't cover, and the
/// second attempt when one of them fails. The whole component sits behind
/// this narrow interface; nothing else models the hosted tool's internals.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor;

#[async_trait::async_trait]
impl Extractor for YtDlpExtractor {
    fn matches(&self, _url: &str) -> bool {
        true
    }

    async fn extract(&self, req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
        extract_universal(req, rv).await
    }

    fn platform(&self) -> Platform {
        Platform::Web
    }
}

pub async fn extract_universal(req: &ResolutionRequest, rv: &Resolver) -> Option<Resolution> {
    let config = &rv.config().ytdlp;
    if !config.enabled {
        debug!("universal fallback disabled by configuration");
        return None;
    }

    req.progress("Loading yt-dlp runtime…", "first run may take a while");
    let handle = match runtime::shared_handle(config).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!("runtime bootstrap failed: {e}");
            return None;
        }
    };

    req.progress("Running yt-dlp…", &truncate(&req.url, 50));
    let output = match run_driver(handle, req, rv).await {
        Ok(output) => output,
        Err(e) => {
            warn!("yt-dlp run failed: {e}");
            return None;
        }
    };

    if let Some(error) = output.error {
        debug!("yt-dlp reported: {error}");
        return None;
    }
    let raw = output.url?;
    debug!(
        quality = output.quality.as_deref().unwrap_or("?"),
        "yt-dlp extracted a stream"
    );

    req.progress("Relay for playback…", "");
    let wrapped = rv.relay().media_url(&raw).await;
    Some(Resolution::Direct {
        url: wrapped,
        needs_relay: true,
    })
}

async fn run_driver(
    handle: &RuntimeHandle,
    req: &ResolutionRequest,
    rv: &Resolver,
) -> Result<DriverOutput> {
    // the driver gets the raw media relays: envelope-style endpoints are
    // text transports and would mangle binary bodies
    let relays = serde_json::to_string(&rv.relay().media_endpoints())?;

    let run = Command::new(&handle.python)
        .arg(&handle.driver)
        .env(URL_ENV, &req.url)
        .env(QUALITY_ENV, req.quality.height().to_string())
        .env(RELAYS_ENV, relays)
        .env(TIMEOUT_ENV, TOOL_SOCKET_TIMEOUT)
        .kill_on_drop(true)
        .output();
    let output = timeout(rv.config().ytdlp.extract_timeout, run)
        .await
        .map_err(|_| ResolveError::RequestTimeout(req.url.clone()))??;

    if !output.status.success() {
        return Err(ResolveError::ToolFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    parse_driver_output(&output.stdout)
}

/// The driver prints exactly one JSON line; anything before it on stdout
/// is noise from the hosted tool
pub(crate) fn parse_driver_output(stdout: &[u8]) -> Result<DriverOutput> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| ResolveError::ToolFailed("driver produced no output".to_string()))?;
    Ok(serde_json::from_str(line.trim())?)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max).collect();
    format!("{head}…")
}
