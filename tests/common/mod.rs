#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use playlist_sweep::core::host::{
    CollectionView, ItemActions, MenuControl, Observation, StatusDisplay, StepOutcome,
};
use playlist_sweep::{CancelToken, ItemHandle, MatchCandidate, RawItem};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Call counters, shared with the observation handed to the loader.
#[derive(Debug, Default)]
pub struct Calls {
    pub observe: AtomicUsize,
    pub disconnect: AtomicUsize,
    pub scroll_to_end: AtomicUsize,
    pub scroll_into_view: AtomicUsize,
    pub open_menu: AtomicUsize,
    pub locate_control: AtomicUsize,
    pub activate: AtomicUsize,
    pub dismiss: AtomicUsize,
    pub remove_controls: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn interactive(&self) -> usize {
        Self::get(&self.scroll_into_view)
            + Self::get(&self.open_menu)
            + Self::get(&self.locate_control)
            + Self::get(&self.activate)
            + Self::get(&self.dismiss)
    }
}

#[derive(Debug, Default)]
struct State {
    rendered: usize,
    offset: f64,
    scroll_log: Vec<f64>,
    structure_changed: bool,
    open_menu: Option<ItemHandle>,
    removed: HashSet<usize>,
    statuses: Vec<String>,
}

/// A lazily-growing playlist that reveals `batch` more items on every jump
/// to the bottom, until `catalog` is exhausted (or forever when `endless`).
pub struct SimulatedPlaylist {
    catalog: Vec<RawItem>,
    batch: usize,
    pub endless: bool,
    /// Keep the "loading more" placeholder even after the catalog is exhausted.
    pub sticky_placeholder: bool,
    pub observe_fails: bool,
    pub snapshot_fails: bool,
    pub menu_missing: HashSet<usize>,
    pub control_missing: HashSet<usize>,
    /// `open_menu` returns `Err` for these items.
    pub fault_on_open: HashSet<usize>,
    /// `activate` reports a failed click for these items.
    pub activate_fails: HashSet<usize>,
    /// Every `dismiss_menu` call returns `Err`.
    pub dismiss_fails: bool,
    /// Request cancellation once this many activations have succeeded.
    pub cancel_after_activations: Option<(usize, CancelToken)>,
    /// Request cancellation on this jump to the bottom (1-indexed).
    pub cancel_on_scroll: Option<(usize, CancelToken)>,
    pub calls: Arc<Calls>,
    state: Arc<Mutex<State>>,
}

impl SimulatedPlaylist {
    pub fn new(catalog: Vec<RawItem>, initial: usize, batch: usize) -> Self {
        let state = State {
            rendered: initial.min(catalog.len()),
            offset: 120.0,
            ..Default::default()
        };
        Self {
            catalog,
            batch,
            endless: false,
            sticky_placeholder: false,
            observe_fails: false,
            snapshot_fails: false,
            menu_missing: HashSet::new(),
            control_missing: HashSet::new(),
            fault_on_open: HashSet::new(),
            activate_fails: HashSet::new(),
            dismiss_fails: false,
            cancel_after_activations: None,
            cancel_on_scroll: None,
            calls: Arc::new(Calls::default()),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// `n` plain items titled "Video 0".."Video n-1".
    pub fn plain(n: usize) -> Self {
        let catalog = (0..n).map(|i| item(&format!("Video {}", i))).collect();
        Self::new(catalog, n, 0)
    }

    pub fn rendered(&self) -> usize {
        self.state.lock().unwrap().rendered
    }

    pub fn scroll_log(&self) -> Vec<f64> {
        self.state.lock().unwrap().scroll_log.clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.state.lock().unwrap().statuses.clone()
    }

    pub fn removed(&self) -> Vec<usize> {
        let mut v: Vec<usize> = self.state.lock().unwrap().removed.iter().copied().collect();
        v.sort_unstable();
        v
    }

    fn exhausted(&self, rendered: usize) -> bool {
        !self.endless && rendered >= self.catalog.len()
    }
}

/// `/watch?v=<alphanumerics of title>`
pub fn watch_href(title: &str) -> String {
    let id: String = title.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("/watch?v={}", id)
}

pub fn item(title: &str) -> RawItem {
    RawItem {
        title: Some(title.to_string()),
        title_href: Some(watch_href(title)),
        ..Default::default()
    }
}

pub fn watched_item(title: &str, channel: &str, resume: Option<&str>, age: &str) -> RawItem {
    RawItem {
        title: Some(title.to_string()),
        title_href: Some(watch_href(title)),
        channel: Some(channel.to_string()),
        watched_marker: resume.is_none(),
        resume_width: resume.map(str::to_string),
        metadata: vec!["1K views".to_string(), age.to_string()],
        ..Default::default()
    }
}

pub fn candidates(n: usize) -> Vec<MatchCandidate> {
    (0..n)
        .map(|i| MatchCandidate {
            handle: ItemHandle(i),
            title: format!("Video {}", i),
            match_reasons: vec!["watched (100%)".to_string()],
            resource_url: Some(format!("https://www.youtube.com/watch?v=Video{}", i)),
        })
        .collect()
}

#[async_trait]
impl CollectionView for SimulatedPlaylist {
    async fn item_count(&self) -> Result<usize> {
        Ok(self.rendered())
    }

    async fn content_extent(&self) -> Result<u64> {
        Ok(self.rendered() as u64 * 100 + 600)
    }

    async fn scroll_offset(&self) -> Result<f64> {
        Ok(self.state.lock().unwrap().offset)
    }

    async fn scroll_to(&self, offset: f64) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.offset = offset;
        st.scroll_log.push(offset);
        Ok(())
    }

    async fn scroll_to_end(&self) -> Result<()> {
        let n = self.calls.scroll_to_end.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, token)) = &self.cancel_on_scroll {
            if n == *at {
                token.request();
            }
        }

        let mut st = self.state.lock().unwrap();
        let before = st.rendered;
        st.rendered = if self.endless {
            before + self.batch.max(1)
        } else {
            (before + self.batch).min(self.catalog.len())
        };
        if st.rendered > before {
            st.structure_changed = true;
        }
        st.offset = st.rendered as f64 * 100.0;
        Ok(())
    }

    async fn loading_indicator_present(&self) -> Result<bool> {
        Ok(self.sticky_placeholder || !self.exhausted(self.rendered()))
    }

    async fn observe(&self) -> Result<Box<dyn Observation>> {
        self.calls.observe.fetch_add(1, Ordering::SeqCst);
        if self.observe_fails {
            return Err(anyhow!("observer registration rejected"));
        }
        Ok(Box::new(SimObservation {
            state: Arc::clone(&self.state),
            calls: Arc::clone(&self.calls),
            catalog_len: self.catalog.len(),
            endless: self.endless,
        }))
    }

    async fn snapshot_items(&self) -> Result<Vec<RawItem>> {
        if self.snapshot_fails {
            return Err(anyhow!("page crashed"));
        }
        let rendered = self.rendered();
        Ok(self
            .catalog
            .iter()
            .take(rendered)
            .enumerate()
            .map(|(i, raw)| RawItem {
                handle: ItemHandle(i),
                ..raw.clone()
            })
            .collect())
    }
}

struct SimObservation {
    state: Arc<Mutex<State>>,
    calls: Arc<Calls>,
    catalog_len: usize,
    endless: bool,
}

#[async_trait]
impl Observation for SimObservation {
    async fn take_structure_changed(&self) -> Result<bool> {
        let mut st = self.state.lock().unwrap();
        Ok(std::mem::take(&mut st.structure_changed))
    }

    async fn last_item_visible(&self) -> Result<bool> {
        let st = self.state.lock().unwrap();
        Ok(!self.endless && st.rendered >= self.catalog_len)
    }

    async fn disconnect(&self) -> Result<()> {
        self.calls.disconnect.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ItemActions for SimulatedPlaylist {
    async fn scroll_into_view(&self, handle: ItemHandle) -> Result<StepOutcome> {
        self.calls.scroll_into_view.fetch_add(1, Ordering::SeqCst);
        if handle.0 >= self.rendered() {
            return Ok(StepOutcome::failed("not rendered"));
        }
        Ok(StepOutcome::Succeeded)
    }

    async fn open_menu(&self, handle: ItemHandle) -> Result<StepOutcome> {
        self.calls.open_menu.fetch_add(1, Ordering::SeqCst);
        if self.fault_on_open.contains(&handle.0) {
            return Err(anyhow!("renderer detached"));
        }
        let mut st = self.state.lock().unwrap();
        if self.menu_missing.contains(&handle.0) || st.removed.contains(&handle.0) {
            return Ok(StepOutcome::failed("no menu button on item"));
        }
        st.open_menu = Some(handle);
        Ok(StepOutcome::Succeeded)
    }

    async fn locate_control(
        &self,
        labels: &[String],
        wait: Duration,
    ) -> Result<Option<MenuControl>> {
        self.calls.locate_control.fetch_add(1, Ordering::SeqCst);
        let open = self.state.lock().unwrap().open_menu;
        match open {
            Some(h) if !self.control_missing.contains(&h.0) => {
                let label = "Remove from Watch later".to_string();
                let lower = label.to_lowercase();
                if labels.iter().any(|l| lower.contains(l.as_str())) {
                    return Ok(Some(MenuControl { label }));
                }
                tokio::time::sleep(wait).await;
                Ok(None)
            }
            _ => {
                tokio::time::sleep(wait).await;
                Ok(None)
            }
        }
    }

    async fn activate(&self, _control: &MenuControl) -> Result<StepOutcome> {
        let n = self.calls.activate.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut st = self.state.lock().unwrap();
            let Some(handle) = st.open_menu else {
                return Ok(StepOutcome::failed("menu closed"));
            };
            if self.activate_fails.contains(&handle.0) {
                return Ok(StepOutcome::failed("click intercepted"));
            }
            st.open_menu = None;
            st.removed.insert(handle.0);
        }
        if let Some((after, token)) = &self.cancel_after_activations {
            if n == *after {
                token.request();
            }
        }
        Ok(StepOutcome::Succeeded)
    }

    async fn dismiss_menu(&self) -> Result<()> {
        self.calls.dismiss.fetch_add(1, Ordering::SeqCst);
        if self.dismiss_fails {
            return Err(anyhow!("escape dispatch failed"));
        }
        self.state.lock().unwrap().open_menu = None;
        Ok(())
    }
}

#[async_trait]
impl StatusDisplay for SimulatedPlaylist {
    async fn show_status(&self, text: &str) {
        self.state.lock().unwrap().statuses.push(text.to_string());
    }

    async fn remove_controls(&self) {
        self.calls.remove_controls.fetch_add(1, Ordering::SeqCst);
    }
}
