//! Live playlist page driven over CDP.

use super::scripts;
use crate::core::cancel::CancelToken;
use crate::core::host::{
    CollectionView, ItemActions, MenuControl, Observation, StatusDisplay, StepOutcome,
};
use crate::core::types::{ItemHandle, RawItem};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const CONTROL_POLL: Duration = Duration::from_millis(100);
const STOP_BUTTON_POLL: Duration = Duration::from_millis(250);

async fn eval<T: DeserializeOwned>(page: &Page, script: impl Into<String>) -> Result<T> {
    let script = script.into();
    page.evaluate(script)
        .await
        .map_err(|e| anyhow!("evaluate failed: {}", e))?
        .into_value::<T>()
        .map_err(|e| anyhow!("unexpected script result: {}", e))
}

async fn run(page: &Page, script: impl Into<String>) -> Result<()> {
    let script = script.into();
    page.evaluate(script)
        .await
        .map_err(|e| anyhow!("evaluate failed: {}", e))?;
    Ok(())
}

/// A playlist tab. Cheap to clone; clones drive the same tab.
#[derive(Clone, Debug)]
pub struct PlaylistPage {
    page: Page,
}

impl PlaylistPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn current_url(&self) -> Result<Option<String>> {
        self.page
            .url()
            .await
            .map_err(|e| anyhow!("reading page url failed: {}", e))
    }

    pub async fn container_present(&self) -> Result<bool> {
        eval(&self.page, scripts::container_present()).await
    }

    /// Poll the overlay's Stop button and forward it to `cancel`.
    ///
    /// Abort the returned task once the run is over.
    pub fn bridge_cancel_button(&self, cancel: CancelToken) -> JoinHandle<()> {
        let page = self.page.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(STOP_BUTTON_POLL).await;
                let pressed: bool = eval(&page, scripts::CANCEL_REQUESTED)
                    .await
                    .unwrap_or(false);
                if pressed && !cancel.is_cancelled() {
                    info!("stop button pressed in page");
                    cancel.request();
                }
            }
        })
    }
}

#[async_trait]
impl CollectionView for PlaylistPage {
    async fn item_count(&self) -> Result<usize> {
        eval(&self.page, scripts::item_count()).await
    }

    async fn content_extent(&self) -> Result<u64> {
        let h: f64 = eval(&self.page, scripts::CONTENT_EXTENT).await?;
        Ok(h.max(0.0) as u64)
    }

    async fn scroll_offset(&self) -> Result<f64> {
        eval(&self.page, scripts::SCROLL_OFFSET).await
    }

    async fn scroll_to(&self, offset: f64) -> Result<()> {
        run(&self.page, scripts::scroll_to(offset)).await
    }

    async fn scroll_to_end(&self) -> Result<()> {
        run(&self.page, scripts::SCROLL_TO_END).await
    }

    async fn loading_indicator_present(&self) -> Result<bool> {
        eval(&self.page, scripts::loading_indicator_present()).await
    }

    async fn observe(&self) -> Result<Box<dyn Observation>> {
        let installed: bool = eval(&self.page, scripts::install_observers()).await?;
        if !installed {
            return Err(anyhow!("list container not found"));
        }
        debug!("page observers installed");
        Ok(Box::new(PageObservation {
            page: self.page.clone(),
        }))
    }

    async fn snapshot_items(&self) -> Result<Vec<RawItem>> {
        eval(&self.page, scripts::snapshot_items()).await
    }
}

/// Watchers living on `window.__playlistSweep` in the page.
struct PageObservation {
    page: Page,
}

#[async_trait]
impl Observation for PageObservation {
    async fn take_structure_changed(&self) -> Result<bool> {
        eval(&self.page, scripts::TAKE_STRUCTURE_CHANGED).await
    }

    async fn last_item_visible(&self) -> Result<bool> {
        eval(&self.page, scripts::LAST_ITEM_VISIBLE).await
    }

    async fn disconnect(&self) -> Result<()> {
        run(&self.page, scripts::DISCONNECT_OBSERVERS).await?;
        debug!("page observers disconnected");
        Ok(())
    }
}

#[async_trait]
impl ItemActions for PlaylistPage {
    async fn scroll_into_view(&self, handle: ItemHandle) -> Result<StepOutcome> {
        let found: bool = eval(&self.page, scripts::scroll_into_view(handle)).await?;
        Ok(if found {
            StepOutcome::Succeeded
        } else {
            StepOutcome::failed(format!("item {} no longer rendered", handle))
        })
    }

    async fn open_menu(&self, handle: ItemHandle) -> Result<StepOutcome> {
        let status: String = eval(&self.page, scripts::open_menu(handle)).await?;
        Ok(match status.as_str() {
            "ok" => StepOutcome::Succeeded,
            "no-item" => StepOutcome::failed(format!("item {} no longer rendered", handle)),
            _ => StepOutcome::failed("no menu button on item"),
        })
    }

    async fn locate_control(
        &self,
        labels: &[String],
        wait: Duration,
    ) -> Result<Option<MenuControl>> {
        let script = scripts::locate_control(labels);
        // Unrepresentable deadline: poll once and give up.
        let deadline = Instant::now().checked_add(wait);
        loop {
            let label: String = eval(&self.page, script.clone()).await?;
            if !label.is_empty() {
                return Ok(Some(MenuControl { label }));
            }
            if deadline.map_or(true, |d| Instant::now() >= d) {
                return Ok(None);
            }
            tokio::time::sleep(CONTROL_POLL).await;
        }
    }

    async fn activate(&self, control: &MenuControl) -> Result<StepOutcome> {
        let clicked: bool = eval(&self.page, scripts::activate_control()).await?;
        Ok(if clicked {
            StepOutcome::Succeeded
        } else {
            StepOutcome::failed(format!("\"{}\" vanished before click", control.label))
        })
    }

    async fn dismiss_menu(&self) -> Result<()> {
        run(&self.page, scripts::DISMISS_MENU).await
    }
}

#[async_trait]
impl StatusDisplay for PlaylistPage {
    async fn show_status(&self, text: &str) {
        info!("status: {}", text);
        if let Err(e) = run(&self.page, scripts::show_status(text)).await {
            warn!("status overlay update failed: {}", e);
        }
    }

    async fn remove_controls(&self) {
        if let Err(e) = run(&self.page, scripts::remove_controls()).await {
            warn!("removing injected controls failed (non-fatal): {}", e);
        }
    }
}
