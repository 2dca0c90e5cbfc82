//! Browser management using `chromiumoxide`.
//!
//! * Finding a usable browser executable (Brave → Chrome → Chromium, cross-platform).
//! * `BrowserSession`: either a visible browser we launch on a persistent
//!   profile, or an already-running browser we attach to over its DevTools
//!   endpoint.
//! * `wait_until_stable` network-idle heuristic for the freshly opened page.

use crate::core::config;
use crate::core::error::SweepError;
use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

// ── Browser executable discovery ─────────────────────────────────────────────

/// Executable names looked up on PATH, in preference order.
pub const PATH_CANDIDATES: &[&str] = &[
    "brave-browser",
    "brave",
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Well-known install locations for this platform.
pub fn well_known_paths() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &[
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ]
    }

    #[cfg(target_os = "linux")]
    {
        &[
            "/usr/bin/brave-browser",
            "/usr/bin/brave",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/local/bin/chromium",
            "/snap/bin/chromium",
        ]
    }

    #[cfg(target_os = "windows")]
    {
        &[
            r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        &[]
    }
}

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH lookup via `which`
/// 3. OS-specific well-known install paths
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = config::chrome_executable_override() {
        return Some(p);
    }

    for exe in PATH_CANDIDATES {
        if let Ok(full) = which::which(exe) {
            return Some(full.to_string_lossy().to_string());
        }
    }

    well_known_paths()
        .iter()
        .find(|c| Path::new(c).exists())
        .map(|c| c.to_string())
}

// ── Visible browser config ───────────────────────────────────────────────────

/// Build a `BrowserConfig` for a visible window on a persistent profile, so
/// the user's existing login is reused between runs.
pub fn build_visible_config(
    exe: &str,
    profile_dir: &Path,
    width: u32,
    height: u32,
) -> Result<BrowserConfig> {
    BrowserConfig::builder()
        .chrome_executable(exe)
        .with_head()
        .user_data_dir(profile_dir)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-sync")
        .arg("--disable-translate")
        .arg("--disable-crash-reporter")
        .arg("--disable-blink-features=AutomationControlled")
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

// ── Session ──────────────────────────────────────────────────────────────────

/// How the session got its browser. Decides what `close` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOrigin {
    Launched { profile_dir: PathBuf },
    Attached { endpoint: String },
}

pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    origin: SessionOrigin,
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("CDP handler error: {}", e);
            }
        }
    })
}

impl BrowserSession {
    /// Launch a visible browser on `profile_dir` (created if missing).
    pub async fn launch(profile_dir: &Path) -> Result<Self> {
        let exe = find_chrome_executable().ok_or(SweepError::BrowserUnavailable)?;
        std::fs::create_dir_all(profile_dir).map_err(|e| {
            SweepError::BrowserLaunch(format!(
                "profile dir {} not usable: {}",
                profile_dir.display(),
                e
            ))
        })?;

        info!(
            "launching browser {} (profile {})",
            exe,
            profile_dir.display()
        );
        let config = build_visible_config(&exe, profile_dir, 1280, 900)?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| SweepError::BrowserLaunch(format!("{} ({})", e, exe)))?;

        Ok(Self {
            browser,
            handler: spawn_handler(handler),
            origin: SessionOrigin::Launched {
                profile_dir: profile_dir.to_path_buf(),
            },
        })
    }

    /// Attach to a running browser's DevTools endpoint
    /// (`http://127.0.0.1:9222` or a `ws://` debugger URL).
    pub async fn connect(endpoint: &str) -> Result<Self> {
        info!("attaching to browser at {}", endpoint);
        let (browser, handler) = Browser::connect(endpoint)
            .await
            .map_err(|e| SweepError::BrowserLaunch(format!("connect {}: {}", endpoint, e)))?;

        Ok(Self {
            browser,
            handler: spawn_handler(handler),
            origin: SessionOrigin::Attached {
                endpoint: endpoint.to_string(),
            },
        })
    }

    pub fn origin(&self) -> &SessionOrigin {
        &self.origin
    }

    /// Open `url` in a new tab.
    pub async fn open_page(&self, url: &str) -> Result<Page> {
        self.browser
            .new_page(url)
            .await
            .map_err(|e| anyhow!("Failed to open {}: {}", url, e))
    }

    /// Close a launched browser; leave an attached one running.
    pub async fn close(mut self) {
        match &self.origin {
            SessionOrigin::Launched { .. } => {
                if let Err(e) = self.browser.close().await {
                    warn!("Browser close error (non-fatal): {}", e);
                }
                let _ = self.browser.wait().await;
                info!("browser closed");
            }
            SessionOrigin::Attached { endpoint } => {
                info!("detaching from {}; browser left running", endpoint);
            }
        }
        self.handler.abort();
    }
}

// ── Smart wait / networkidle ─────────────────────────────────────────────────

/// Wait until the page network goes idle (no new resource entries for `quiet`)
/// or until `timeout` has elapsed.
///
/// Polls `performance.getEntriesByType("resource").length` and
/// `document.readyState` every 250 ms.
pub async fn wait_until_stable(page: &Page, quiet: Duration, timeout: Duration) -> Result<()> {
    let poll = Duration::from_millis(250);
    let start = Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = Instant::now();

    loop {
        if start.elapsed() >= timeout {
            info!("wait_until_stable: timeout after {}ms", timeout.as_millis());
            break;
        }

        let count: u64 = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_u64())
            .unwrap_or(0);

        let ready_complete: bool = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_str().map(|s| s == "complete"))
            .unwrap_or(false);

        if !ready_complete || count != last_count {
            last_count = count;
            stable_since = Instant::now();
        } else if stable_since.elapsed() >= quiet {
            info!(
                "wait_until_stable: idle after {}ms ({} resources)",
                start.elapsed().as_millis(),
                count
            );
            break;
        }

        tokio::time::sleep(poll).await;
    }
    Ok(())
}
