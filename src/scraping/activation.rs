//! Decides whether a page is a playlist view and waits for its list to exist.

use crate::core::error::SweepError;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

/// `true` for `http(s)://<host>/playlist?list=<non-empty>`.
///
/// `host` is an origin such as `https://www.youtube.com`; the bare domain and
/// its `www.`/`m.` variants are all accepted.
pub fn is_collection_view(url: &str, host: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    if parsed.path().trim_end_matches('/') != "/playlist" {
        return false;
    }
    if !host_matches(&parsed, host) {
        return false;
    }
    parsed
        .query_pairs()
        .any(|(k, v)| k == "list" && !v.trim().is_empty())
}

fn bare_domain(domain: &str) -> &str {
    domain
        .strip_prefix("www.")
        .or_else(|| domain.strip_prefix("m."))
        .unwrap_or(domain)
}

fn host_matches(url: &Url, host: &str) -> bool {
    let expected = Url::parse(host)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| host.to_string());
    match url.host_str() {
        Some(actual) => bare_domain(actual).eq_ignore_ascii_case(bare_domain(&expected)),
        None => false,
    }
}

/// Poll `probe` until the list container exists, or fail with
/// [`SweepError::ContainerMissing`] after `timeout`.
pub async fn wait_for_container<F, Fut>(mut probe: F, timeout: Duration, poll: Duration) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    loop {
        match probe().await {
            Ok(true) => {
                info!(
                    "playlist container ready after {}ms",
                    start.elapsed().as_millis()
                );
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => debug!("container probe failed: {}", e),
        }
        if start.elapsed() >= timeout {
            return Err(SweepError::ContainerMissing.into());
        }
        tokio::time::sleep(poll).await;
    }
}
