use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// SweepConfig: file-based config loader (playlist-sweep.json) with env-var fallback
// ---------------------------------------------------------------------------

/// Convergence loader timings (mirrors the `loader` key in playlist-sweep.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct LoaderConfig {
    /// Pause after each jump to the bottom before polling starts. Default: 250 ms.
    pub settle_ms: Option<u64>,
    /// Poll interval while waiting for growth. Default: 50 ms.
    pub poll_ms: Option<u64>,
    /// How long one round waits for any growth signal. Default: 1200 ms.
    pub growth_wait_ms: Option<u64>,
    /// Consecutive rounds without growth before giving up. Clamped to 2..=3. Default: 3.
    pub no_growth_rounds: Option<u32>,
    /// Hard cap on the whole loading phase. Default: 120 s.
    pub max_runtime_secs: Option<u64>,
}

impl LoaderConfig {
    /// Settle delay: JSON field → `PLAYLIST_SWEEP_SETTLE_MS` → 250 ms.
    pub fn resolve_settle(&self) -> Duration {
        Duration::from_millis(resolve_u64(self.settle_ms, "PLAYLIST_SWEEP_SETTLE_MS", 250, 10_000))
    }

    /// Poll interval: JSON field → `PLAYLIST_SWEEP_POLL_MS` → 50 ms. Never below 10 ms.
    pub fn resolve_poll(&self) -> Duration {
        Duration::from_millis(resolve_u64(self.poll_ms, "PLAYLIST_SWEEP_POLL_MS", 50, 5_000).max(10))
    }

    /// Growth wait: JSON field → `PLAYLIST_SWEEP_GROWTH_WAIT_MS` → 1200 ms.
    /// Never shorter than one poll interval.
    pub fn resolve_growth_wait(&self) -> Duration {
        let ms = resolve_u64(
            self.growth_wait_ms,
            "PLAYLIST_SWEEP_GROWTH_WAIT_MS",
            1200,
            MAX_STEP_WAIT_MS,
        );
        Duration::from_millis(ms).max(self.resolve_poll())
    }

    /// No-growth threshold: JSON field → `PLAYLIST_SWEEP_NO_GROWTH_ROUNDS` → 3, clamped to 2..=3.
    pub fn resolve_no_growth_rounds(&self) -> u32 {
        let n = self.no_growth_rounds.unwrap_or_else(|| {
            std::env::var("PLAYLIST_SWEEP_NO_GROWTH_ROUNDS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(3)
        });
        n.clamp(2, 3)
    }

    /// Wall-clock cap: JSON field → `PLAYLIST_SWEEP_MAX_RUNTIME_SECS` → 120 s.
    pub fn resolve_max_runtime(&self) -> Duration {
        Duration::from_secs(resolve_u64(
            self.max_runtime_secs,
            "PLAYLIST_SWEEP_MAX_RUNTIME_SECS",
            120,
            3_600,
        ))
    }
}

/// Bulk action executor settings (mirrors the `executor` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ExecutorConfig {
    /// How long to wait for a freshly opened menu to show the remove entry. Default: 3000 ms.
    pub menu_wait_ms: Option<u64>,
    /// Base pause between items (random jitter is added). Default: 350 ms.
    pub item_pause_ms: Option<u64>,
    /// Pause per item in dry-run, only to keep progress readable. Default: 20 ms.
    pub dry_run_pause_ms: Option<u64>,
    /// Lowercase fragments identifying the remove entry in the item menu.
    /// Default: `["remove from"]`. Set this for non-English interfaces.
    pub remove_labels: Option<Vec<String>>,
}

impl ExecutorConfig {
    pub fn resolve_menu_wait(&self) -> Duration {
        Duration::from_millis(resolve_u64(
            self.menu_wait_ms,
            "PLAYLIST_SWEEP_MENU_WAIT_MS",
            3000,
            MAX_STEP_WAIT_MS,
        ))
    }

    pub fn resolve_item_pause(&self) -> Duration {
        Duration::from_millis(resolve_u64(
            self.item_pause_ms,
            "PLAYLIST_SWEEP_ITEM_PAUSE_MS",
            350,
            MAX_STEP_WAIT_MS,
        ))
    }

    pub fn resolve_dry_run_pause(&self) -> Duration {
        Duration::from_millis(resolve_u64(
            self.dry_run_pause_ms,
            "PLAYLIST_SWEEP_DRY_RUN_PAUSE_MS",
            20,
            5_000,
        ))
    }

    /// Remove-entry labels, lowercased, empties dropped. Falls back to `["remove from"]`.
    pub fn resolve_remove_labels(&self) -> Vec<String> {
        let labels: Vec<String> = self
            .remove_labels
            .iter()
            .flatten()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            vec!["remove from".to_string()]
        } else {
            labels
        }
    }
}

/// Page-level settings (mirrors the `page` key).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct PageConfig {
    /// Origin used to absolutize relative item links. Default: `https://www.youtube.com`.
    pub host: Option<String>,
}

impl PageConfig {
    /// Host: JSON field → `PLAYLIST_SWEEP_HOST` → `https://www.youtube.com`.
    pub fn resolve_host(&self) -> String {
        if let Some(h) = &self.host {
            if !h.trim().is_empty() {
                return h.trim().trim_end_matches('/').to_string();
            }
        }
        std::env::var(ENV_HOST)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }
}

/// Top-level config loaded from `playlist-sweep.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct SweepConfig {
    pub loader: LoaderConfig,
    pub executor: ExecutorConfig,
    pub page: PageConfig,
}

/// Where a config was found, or why it was not used. Reported by `--setup`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File(std::path::PathBuf),
    Invalid {
        path: std::path::PathBuf,
        error: String,
    },
    Defaults,
}

/// Upper bound for any single wait or pause, in milliseconds.
pub const MAX_STEP_WAIT_MS: u64 = 60_000;

/// JSON field → env var → default, capped at `max`.
fn resolve_u64(field: Option<u64>, env: &str, default: u64, max: u64) -> u64 {
    field
        .or_else(|| {
            std::env::var(env)
                .ok()
                .and_then(|v| v.trim().parse().ok())
        })
        .unwrap_or(default)
        .min(max)
}

fn config_candidates() -> Vec<std::path::PathBuf> {
    let mut v = vec![
        std::path::PathBuf::from(CONFIG_FILE_NAME),
        std::path::PathBuf::from("..").join(CONFIG_FILE_NAME),
    ];
    if let Ok(env_path) = std::env::var(ENV_CONFIG) {
        v.insert(0, std::path::PathBuf::from(env_path));
    }
    v
}

/// Load `playlist-sweep.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `PLAYLIST_SWEEP_CONFIG` env var path
/// 2. `./playlist-sweep.json`
/// 3. `../playlist-sweep.json`
///
/// Missing file → `SweepConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `SweepConfig::default()`.
pub fn load_sweep_config() -> (SweepConfig, ConfigSource) {
    for path in config_candidates() {
        let Ok(contents) = std::fs::read_to_string(&path) else {
            continue;
        };
        return match parse_sweep_config(&contents) {
            Ok(cfg) => {
                tracing::info!("{} loaded from {}", CONFIG_FILE_NAME, path.display());
                (cfg, ConfigSource::File(path))
            }
            Err(e) => {
                tracing::warn!(
                    "{} parse error at {}: {}; using defaults",
                    CONFIG_FILE_NAME,
                    path.display(),
                    e
                );
                (
                    SweepConfig::default(),
                    ConfigSource::Invalid {
                        path,
                        error: e.to_string(),
                    },
                )
            }
        };
    }

    (SweepConfig::default(), ConfigSource::Defaults)
}

pub fn parse_sweep_config(contents: &str) -> Result<SweepConfig, serde_json::Error> {
    serde_json::from_str::<SweepConfig>(contents)
}

// ---------------------------------------------------------------------------

pub const CONFIG_FILE_NAME: &str = "playlist-sweep.json";
pub const DEFAULT_HOST: &str = "https://www.youtube.com";
pub const ENV_CONFIG: &str = "PLAYLIST_SWEEP_CONFIG";
pub const ENV_HOST: &str = "PLAYLIST_SWEEP_HOST";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_PROFILE_DIR: &str = "PLAYLIST_SWEEP_PROFILE_DIR";

/// Optional override for the Chromium-family browser executable.
///
/// Only returns a value when `CHROME_EXECUTABLE` is set to an existing path;
/// otherwise discovery happens in `scraping::browser_manager`.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    if Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

/// Persistent browser profile used when we launch the browser ourselves, so an
/// existing login survives between runs.
///
/// `PLAYLIST_SWEEP_PROFILE_DIR` wins; default is `~/.playlist-sweep/profile`.
pub fn default_profile_dir() -> Option<std::path::PathBuf> {
    if let Ok(v) = std::env::var(ENV_PROFILE_DIR) {
        let v = v.trim();
        if !v.is_empty() {
            return Some(std::path::PathBuf::from(v));
        }
    }
    let home = dirs::home_dir()?;
    Some(home.join(".playlist-sweep").join("profile"))
}
