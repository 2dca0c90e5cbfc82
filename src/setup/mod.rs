use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::core::config::{self, ConfigSource};
use crate::scraping::browser_manager;

#[derive(Clone, Debug)]
pub struct SetupOptions {
    /// DevTools endpoint given with `--connect`, if any.
    pub connect: Option<String>,
    /// Profile directory the browser would be launched with.
    pub profile_dir: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            connect: None,
            profile_dir: config::default_profile_dir(),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skip,
}

impl CheckStatus {
    pub fn is_fail(self) -> bool {
        matches!(self, CheckStatus::Fail)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionRequired {
    pub title: String,
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetupCheck {
    pub id: String,
    pub title: String,
    pub status: CheckStatus,
    pub details: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRequired>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SetupReport {
    pub checks: Vec<SetupCheck>,
}

impl SetupReport {
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status.is_fail())
    }

    pub fn summarize_for_logs(&self) -> String {
        let mut pass = 0;
        let mut warn_count = 0;
        let mut fail = 0;
        let mut skip = 0;
        for c in &self.checks {
            match c.status {
                CheckStatus::Pass => pass += 1,
                CheckStatus::Warn => warn_count += 1,
                CheckStatus::Fail => fail += 1,
                CheckStatus::Skip => skip += 1,
            }
        }
        format!(
            "setup: {} pass, {} warn, {} fail, {} skip",
            pass, warn_count, fail, skip
        )
    }

    pub fn print_action_required_blocks(&self) {
        for check in &self.checks {
            if check.actions.is_empty() {
                continue;
            }

            warn!(
                "\n=== ACTION REQUIRED: {} ===\n{}\n",
                check.title, check.details
            );
            for action in &check.actions {
                eprintln!("- {}", action.title);
                for step in &action.steps {
                    eprintln!("  • {}", step);
                }
                if let Some(url) = &action.open_url {
                    eprintln!("  • Open: {}", url);
                }
                eprintln!();
            }
        }
    }
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "playlist-sweep pre-flight checklist")?;
        writeln!(f, "{}", "=".repeat(35))?;
        for c in &self.checks {
            writeln!(
                f,
                "[{:<4}] {}\n  {}",
                match c.status {
                    CheckStatus::Pass => "OK",
                    CheckStatus::Warn => "WARN",
                    CheckStatus::Fail => "FAIL",
                    CheckStatus::Skip => "SKIP",
                },
                c.title,
                c.details.replace('\n', "\n  ")
            )?;
            for action in &c.actions {
                writeln!(f, "  Action: {}", action.title)?;
                for step in &action.steps {
                    writeln!(f, "    - {}", step)?;
                }
                if let Some(url) = &action.open_url {
                    writeln!(f, "    - Open: {}", url)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub async fn check_all(options: SetupOptions) -> SetupReport {
    let mut report = SetupReport::default();

    match options.connect.as_deref() {
        // Attaching never launches anything, so the local install does not matter.
        Some(endpoint) => {
            report
                .checks
                .push(check_devtools_endpoint(endpoint, options.connect_timeout).await);
        }
        None => {
            report.checks.push(check_browser_installed());
            report
                .checks
                .push(check_profile_dir(options.profile_dir.as_deref()));
        }
    }
    let (_, source) = config::load_sweep_config();
    report.checks.push(check_config(&source));

    report
}

fn check_browser_installed() -> SetupCheck {
    let mut found: Vec<PathBuf> = Vec::new();
    if let Some(p) = config::chrome_executable_override() {
        found.push(PathBuf::from(p));
    }
    for c in browser_manager::PATH_CANDIDATES {
        if let Ok(path) = which::which(c) {
            found.push(path);
        }
    }
    for p in browser_manager::well_known_paths() {
        let p = Path::new(p);
        if p.exists() && !found.iter().any(|f| f == p) {
            found.push(p.to_path_buf());
        }
    }

    if !found.is_empty() {
        return SetupCheck {
            id: "browser_installed".to_string(),
            title: "Browser (Brave/Chrome/Chromium)".to_string(),
            status: CheckStatus::Pass,
            details: format!(
                "Found browser executable(s):\n{}",
                found
                    .iter()
                    .take(5)
                    .map(|p| format!("- {}", p.display()))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            actions: vec![],
        };
    }

    SetupCheck {
        id: "browser_installed".to_string(),
        title: "Browser (Brave/Chrome/Chromium)".to_string(),
        status: CheckStatus::Fail,
        details: "No Brave/Chrome/Chromium executable found on PATH (or common install locations)."
            .to_string(),
        actions: vec![ActionRequired {
            title: "Install a Chromium-family browser, or attach to a running one".to_string(),
            steps: vec![
                "Ubuntu/Debian: `sudo apt-get install -y chromium`".to_string(),
                "Fedora: `sudo dnf install -y chromium`".to_string(),
                "macOS/Windows: install Google Chrome or Brave".to_string(),
                format!(
                    "Installed somewhere unusual? Set {}=/path/to/browser",
                    config::ENV_CHROME_EXECUTABLE
                ),
                "Or start your browser with --remote-debugging-port=9222 and pass --connect http://127.0.0.1:9222"
                    .to_string(),
            ],
            open_url: Some("https://www.google.com/chrome/".to_string()),
        }],
    }
}

fn check_profile_dir(dir: Option<&Path>) -> SetupCheck {
    let title = "Browser profile directory".to_string();
    let Some(dir) = dir else {
        return SetupCheck {
            id: "profile_dir".to_string(),
            title,
            status: CheckStatus::Fail,
            details: "Unable to resolve home directory.".to_string(),
            actions: vec![ActionRequired {
                title: "Choose a profile directory".to_string(),
                steps: vec![
                    "Ensure the HOME environment variable is set.".to_string(),
                    format!("Or set {} / pass --profile", config::ENV_PROFILE_DIR),
                ],
                open_url: None,
            }],
        };
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        return SetupCheck {
            id: "profile_dir".to_string(),
            title,
            status: CheckStatus::Fail,
            details: format!("Failed to create {}: {}", dir.display(), e),
            actions: vec![ActionRequired {
                title: "Fix permissions".to_string(),
                steps: vec![format!("Create the directory manually: {}", dir.display())],
                open_url: None,
            }],
        };
    }

    // Writability test: create/delete a small file.
    let probe = dir.join(".write_test");
    if let Err(e) = std::fs::write(&probe, b"ok") {
        return SetupCheck {
            id: "profile_dir".to_string(),
            title,
            status: CheckStatus::Fail,
            details: format!("Directory not writable: {} ({})", dir.display(), e),
            actions: vec![ActionRequired {
                title: "Fix directory permissions".to_string(),
                steps: vec![format!("Ensure writable: {}", dir.display())],
                open_url: None,
            }],
        };
    }
    let _ = std::fs::remove_file(&probe);

    SetupCheck {
        id: "profile_dir".to_string(),
        title,
        status: CheckStatus::Pass,
        details: format!(
            "Writable: {}\nSign in once in the launched window; the login is kept here.",
            dir.display()
        ),
        actions: vec![],
    }
}

/// `host:port` of a DevTools endpoint (`http://`, `ws://` or bare `host:port`).
pub fn endpoint_socket(endpoint: &str) -> Option<(String, u16)> {
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default()?;
    Some((host, port))
}

async fn check_devtools_endpoint(endpoint: &str, timeout: Duration) -> SetupCheck {
    let title = "DevTools endpoint (--connect)".to_string();
    let Some((host, port)) = endpoint_socket(endpoint) else {
        return SetupCheck {
            id: "devtools_endpoint".to_string(),
            title,
            status: CheckStatus::Fail,
            details: format!("Not a usable endpoint: {}", endpoint),
            actions: vec![],
        };
    };

    let connect = tokio::net::TcpStream::connect((host.as_str(), port));
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(_)) => SetupCheck {
            id: "devtools_endpoint".to_string(),
            title,
            status: CheckStatus::Pass,
            details: format!("{}:{} accepts connections.", host, port),
            actions: vec![],
        },
        Ok(Err(e)) => devtools_unreachable(title, &host, port, e.to_string()),
        Err(_) => devtools_unreachable(title, &host, port, "timed out".to_string()),
    }
}

fn devtools_unreachable(title: String, host: &str, port: u16, error: String) -> SetupCheck {
    SetupCheck {
        id: "devtools_endpoint".to_string(),
        title,
        status: CheckStatus::Fail,
        details: format!("Cannot reach {}:{} ({}).", host, port, error),
        actions: vec![ActionRequired {
            title: "Start the browser with remote debugging".to_string(),
            steps: vec![format!(
                "e.g. `google-chrome --remote-debugging-port={}`",
                port
            )],
            open_url: None,
        }],
    }
}

fn check_config(source: &ConfigSource) -> SetupCheck {
    let title = format!("Config file ({})", config::CONFIG_FILE_NAME);
    match source {
        ConfigSource::File(path) => SetupCheck {
            id: "config".to_string(),
            title,
            status: CheckStatus::Pass,
            details: format!("Loaded {}", path.display()),
            actions: vec![],
        },
        ConfigSource::Invalid { path, error } => SetupCheck {
            id: "config".to_string(),
            title,
            status: CheckStatus::Warn,
            details: format!(
                "{} could not be parsed ({}); built-in defaults are used.",
                path.display(),
                error
            ),
            actions: vec![ActionRequired {
                title: "Fix or remove the config file".to_string(),
                steps: vec![format!("Check the JSON syntax of {}", path.display())],
                open_url: None,
            }],
        },
        ConfigSource::Defaults => SetupCheck {
            id: "config".to_string(),
            title,
            status: CheckStatus::Skip,
            details: "No config file found; built-in defaults and environment variables apply."
                .to_string(),
            actions: vec![],
        },
    }
}
