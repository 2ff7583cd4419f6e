use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::YtDlpConfig;
use crate::error::{ResolveError, Result};

use super::driver::DRIVER_SOURCE;

/// Interpreter candidates probed when no override is configured
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

const PYTHON_ENV_OVERRIDE: &str = "STREAMVAULT_PYTHON";

/// Idle delay before a pre-warm bootstrap kicks off
const PREWARM_DELAY: Duration = Duration::from_secs(5);

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const IMPORT_CHECK_TIMEOUT: Duration = Duration::from_secs(20);

/// A bootstrapped runtime: interpreter command plus materialized driver
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    pub python: String,
    pub driver: PathBuf,
}

/// Lazily-initialized shared runtime.
///
/// Concurrent first callers share one in-flight bootstrap; the cell's
/// waiter queue hands every one of them the same handle. A failed
/// bootstrap leaves the cell empty so a later request may retry.
pub struct Runtime {
    cell: OnceCell<RuntimeHandle>,
}

impl Runtime {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    pub async fn handle(&self, config: &YtDlpConfig) -> Result<&RuntimeHandle> {
        self.cell.get_or_try_init(|| bootstrap(config)).await
    }

    /// Same memoization with a caller-supplied bootstrap; the concurrency
    /// tests drive this without touching a real interpreter.
    pub async fn handle_with<F, Fut>(&self, init: F) -> Result<&RuntimeHandle>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RuntimeHandle>>,
    {
        self.cell.get_or_try_init(init).await
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

static RUNTIME: Runtime = Runtime::new();

/// Process-wide runtime accessor
pub async fn shared_handle(config: &YtDlpConfig) -> Result<&'static RuntimeHandle> {
    RUNTIME.handle(config).await
}

/// Schedule a bootstrap after an idle delay so the first real request
/// doesn't pay the install cost
pub fn prewarm(config: YtDlpConfig) {
    tokio::spawn(async move {
        tokio::time::sleep(PREWARM_DELAY).await;
        if let Err(e) = shared_handle(&config).await {
            debug!("pre-warm bootstrap failed: {e}");
        }
    });
}

async fn bootstrap(config: &YtDlpConfig) -> Result<RuntimeHandle> {
    let python = find_python(config).await?;
    ensure_tool(&python, config).await?;
    let driver = write_driver()?;
    info!(python = %python, "yt-dlp runtime ready");
    Ok(RuntimeHandle { python, driver })
}

async fn find_python(config: &YtDlpConfig) -> Result<String> {
    if let Some(cmd) = &config.python {
        return Ok(cmd.clone());
    }
    if let Ok(cmd) = std::env::var(PYTHON_ENV_OVERRIDE)
        && !cmd.is_empty()
    {
        return Ok(cmd);
    }
    for candidate in PYTHON_CANDIDATES {
        if run_ok(candidate, &["--version"], PROBE_TIMEOUT).await {
            return Ok(candidate.to_string());
        }
    }
    Err(ResolveError::Bootstrap(
        "no usable interpreter found".to_string(),
    ))
}

async fn ensure_tool(python: &str, config: &YtDlpConfig) -> Result<()> {
    if run_ok(python, &["-c", "import yt_dlp"], IMPORT_CHECK_TIMEOUT).await {
        return Ok(());
    }
    if !config.auto_install {
        return Err(ResolveError::Bootstrap(
            "yt_dlp module is missing and auto-install is off".to_string(),
        ));
    }
    info!("installing yt-dlp via pip");
    if run_ok(
        python,
        &["-m", "pip", "install", "--user", "--quiet", "yt-dlp"],
        config.bootstrap_timeout,
    )
    .await
        && run_ok(python, &["-c", "import yt_dlp"], IMPORT_CHECK_TIMEOUT).await
    {
        return Ok(());
    }
    Err(ResolveError::Bootstrap(
        "failed to install yt_dlp".to_string(),
    ))
}

async fn run_ok(cmd: &str, args: &[&str], limit: Duration) -> bool {
    let run = Command::new(cmd).args(args).kill_on_drop(true).output();
    matches!(timeout(limit, run).await, Ok(Ok(out)) if out.status.success())
}

fn write_driver() -> Result<PathBuf> {
    let path = std::env::temp_dir().join("streamvault-ytdlp-driver.py");
    std::fs::write(&path, DRIVER_SOURCE)?;
    Ok(path)
}
