//! The seams between the sweep logic and the page it drives.
//!
//! The live implementation is `scraping::page_view::PlaylistPage` (CDP);
//! `scraping::offline::OfflineSnapshot` serves saved HTML; tests use a
//! simulated playlist.

use crate::core::types::{ItemHandle, RawItem};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Read side of the rendered, lazily-growing list.
#[async_trait]
pub trait CollectionView: Send + Sync {
    async fn item_count(&self) -> Result<usize>;

    /// Total scrollable height of the document.
    async fn content_extent(&self) -> Result<u64>;

    async fn scroll_offset(&self) -> Result<f64>;

    async fn scroll_to(&self, offset: f64) -> Result<()>;

    /// Jump to the current maximum scroll extent.
    async fn scroll_to_end(&self) -> Result<()>;

    /// Whether the "loading more" placeholder is still in the list.
    async fn loading_indicator_present(&self) -> Result<bool>;

    /// Register the structural-change and last-item-visibility watchers.
    async fn observe(&self) -> Result<Box<dyn Observation>>;

    /// Read every rendered item. Handles are assigned here.
    async fn snapshot_items(&self) -> Result<Vec<RawItem>>;
}

/// Watchers registered by [`CollectionView::observe`].
#[async_trait]
pub trait Observation: Send + Sync {
    /// `true` if the list container changed since the last call.
    async fn take_structure_changed(&self) -> Result<bool>;

    /// `true` if the current last item intersects the viewport.
    async fn last_item_visible(&self) -> Result<bool>;

    async fn disconnect(&self) -> Result<()>;
}

/// Owns an [`Observation`] and guarantees it is disconnected.
///
/// Call [`ObserverGuard::release`] on the normal path. Any path that skips it
/// (early return, panic) disconnects from `Drop` on the current runtime.
pub struct ObserverGuard {
    inner: Option<Box<dyn Observation>>,
}

impl ObserverGuard {
    pub fn new(observation: Box<dyn Observation>) -> Self {
        Self {
            inner: Some(observation),
        }
    }

    /// A guard with nothing to watch, used when registration failed.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn take_structure_changed(&self) -> bool {
        let Some(obs) = self.inner.as_ref() else {
            return false;
        };
        obs.take_structure_changed().await.unwrap_or_else(|e| {
            warn!("structure observer read failed: {}", e);
            false
        })
    }

    pub async fn last_item_visible(&self) -> bool {
        let Some(obs) = self.inner.as_ref() else {
            return false;
        };
        obs.last_item_visible().await.unwrap_or_else(|e| {
            warn!("visibility observer read failed: {}", e);
            false
        })
    }

    pub async fn release(mut self) {
        if let Some(obs) = self.inner.take() {
            if let Err(e) = obs.disconnect().await {
                warn!("observer disconnect failed (non-fatal): {}", e);
            }
        }
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        let Some(obs) = self.inner.take() else {
            return;
        };
        // Drop cannot await; hand the disconnect to the runtime if there is one.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("observer dropped outside a runtime; watchers left connected");
            return;
        };
        handle.spawn(async move {
            let _ = obs.disconnect().await;
        });
    }
}

/// Result of one best-effort interactive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed { reason: String },
}

impl StepOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        StepOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }
}

/// A menu entry found by [`ItemActions::locate_control`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuControl {
    /// Visible text of the entry, as found.
    pub label: String,
}

/// Per-item interactive primitives. All of them may miss without it being
/// an error; `Err` means something unexpected broke.
#[async_trait]
pub trait ItemActions: Send + Sync {
    async fn scroll_into_view(&self, handle: ItemHandle) -> Result<StepOutcome>;

    async fn open_menu(&self, handle: ItemHandle) -> Result<StepOutcome>;

    /// Wait up to `wait` for an open menu entry whose text contains one of
    /// `labels` (lowercase).
    async fn locate_control(&self, labels: &[String], wait: Duration)
        -> Result<Option<MenuControl>>;

    async fn activate(&self, control: &MenuControl) -> Result<StepOutcome>;

    async fn dismiss_menu(&self) -> Result<()>;
}

/// One executor step, for on-screen progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-indexed
    pub position: usize,
    pub total: usize,
    pub title: String,
    pub dry_run: bool,
}

pub const PROGRESS_TITLE_CHARS: usize = 40;

impl Progress {
    pub fn short_title(&self) -> String {
        truncate_title(&self.title, PROGRESS_TITLE_CHARS)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "Checked" } else { "Processed" };
        write!(
            f,
            "{} {}/{}: {}",
            verb,
            self.position,
            self.total,
            self.short_title()
        )
    }
}

pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let mut out: String = title.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Status display and injected controls.
#[async_trait]
pub trait StatusDisplay: Send + Sync {
    async fn show_status(&self, text: &str);

    async fn show_progress(&self, progress: &Progress) {
        self.show_status(&progress.to_string()).await;
    }

    /// Remove anything injected into the page for this run.
    async fn remove_controls(&self);
}

/// Everything a full run needs from its host.
pub trait SweepHost: CollectionView + ItemActions + StatusDisplay {}

impl<T> SweepHost for T where T: CollectionView + ItemActions + StatusDisplay {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_text() {
        let p = Progress {
            position: 3,
            total: 12,
            title: "A".repeat(50),
            dry_run: false,
        };
        let text = p.to_string();
        assert!(text.starts_with("Processed 3/12: "));
        assert!(text.ends_with('…'));
        assert_eq!(p.short_title().chars().count(), PROGRESS_TITLE_CHARS + 1);
    }

    #[test]
    fn test_short_title_untouched() {
        assert_eq!(truncate_title("Short one", 40), "Short one");
    }
}
