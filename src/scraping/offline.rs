//! Host backed by a saved playlist page, for audits without a browser.
//!
//! The list is already complete, so the loader converges on its first round.
//! Nothing can be removed from a file; interactive steps always miss.

use super::extract::snapshot_from_html;
use crate::core::host::{
    CollectionView, ItemActions, MenuControl, Observation, StatusDisplay, StepOutcome,
};
use crate::core::types::{ItemHandle, RawItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const OFFLINE: &str = "offline snapshot";

#[derive(Debug, Clone, Default)]
pub struct OfflineSnapshot {
    items: Vec<RawItem>,
}

impl OfflineSnapshot {
    pub fn from_html(html: &str) -> Self {
        Self {
            items: snapshot_from_html(html),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("reading saved page {}", path.display()))?;
        let snapshot = Self::from_html(&html);
        info!(
            "offline snapshot {}: {} items",
            path.display(),
            snapshot.items.len()
        );
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl CollectionView for OfflineSnapshot {
    async fn item_count(&self) -> Result<usize> {
        Ok(self.items.len())
    }

    async fn content_extent(&self) -> Result<u64> {
        Ok(self.items.len() as u64)
    }

    async fn scroll_offset(&self) -> Result<f64> {
        Ok(0.0)
    }

    async fn scroll_to(&self, _offset: f64) -> Result<()> {
        Ok(())
    }

    async fn scroll_to_end(&self) -> Result<()> {
        Ok(())
    }

    async fn loading_indicator_present(&self) -> Result<bool> {
        Ok(false)
    }

    async fn observe(&self) -> Result<Box<dyn Observation>> {
        Ok(Box::new(SettledObservation))
    }

    async fn snapshot_items(&self) -> Result<Vec<RawItem>> {
        Ok(self.items.clone())
    }
}

/// Nothing changes and the end of the list is always in view.
struct SettledObservation;

#[async_trait]
impl Observation for SettledObservation {
    async fn take_structure_changed(&self) -> Result<bool> {
        Ok(false)
    }

    async fn last_item_visible(&self) -> Result<bool> {
        Ok(true)
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ItemActions for OfflineSnapshot {
    async fn scroll_into_view(&self, _handle: ItemHandle) -> Result<StepOutcome> {
        Ok(StepOutcome::failed(OFFLINE))
    }

    async fn open_menu(&self, _handle: ItemHandle) -> Result<StepOutcome> {
        Ok(StepOutcome::failed(OFFLINE))
    }

    async fn locate_control(
        &self,
        _labels: &[String],
        _wait: Duration,
    ) -> Result<Option<MenuControl>> {
        Ok(None)
    }

    async fn activate(&self, _control: &MenuControl) -> Result<StepOutcome> {
        Ok(StepOutcome::failed(OFFLINE))
    }

    async fn dismiss_menu(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl StatusDisplay for OfflineSnapshot {
    async fn show_status(&self, text: &str) {
        info!("status: {}", text);
    }

    async fn remove_controls(&self) {}
}
