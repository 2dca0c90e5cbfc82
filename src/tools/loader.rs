//! Convergence loader: keep the lazily-rendered list growing until it stops.
//!
//! The page never says "that was the last item", so each round jumps to the
//! bottom and waits for any growth signal (item count, document height, or a
//! structural mutation). A round without growth counts toward the no-growth
//! threshold; the end-of-list heuristics (placeholder gone and last item
//! visible) can stop earlier. A wall-clock cap bounds everything.

use crate::core::cancel::CancelToken;
use crate::core::config::LoaderConfig;
use crate::core::host::{CollectionView, ObserverGuard};
use anyhow::Result;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Placeholder gone and last item visible.
    Converged,
    /// Too many consecutive rounds without growth.
    NoGrowth,
    WallClockCap,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Converged => "end of list reached",
            StopReason::NoGrowth => "no further growth",
            StopReason::WallClockCap => "time limit reached",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Highest item count observed.
    pub item_count: usize,
    pub rounds: u32,
    pub stop: StopReason,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrowthSignal {
    Items,
    Extent,
    Mutation,
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ConvergenceLoader {
    settle: Duration,
    poll: Duration,
    growth_wait: Duration,
    no_growth_rounds: u32,
    max_runtime: Duration,
}

impl ConvergenceLoader {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            settle: config.resolve_settle(),
            poll: config.resolve_poll(),
            growth_wait: config.resolve_growth_wait(),
            no_growth_rounds: config.resolve_no_growth_rounds(),
            max_runtime: config.resolve_max_runtime(),
        }
    }

    /// Load until converged, stalled, capped or cancelled.
    ///
    /// Observers are disconnected and the original scroll offset restored on
    /// every exit path.
    pub async fn run<V>(&self, view: &V, cancel: &CancelToken) -> Result<LoadReport>
    where
        V: CollectionView + ?Sized,
    {
        let start = Instant::now();
        let original_offset = match view.scroll_offset().await {
            Ok(offset) => Some(offset),
            Err(e) => {
                warn!("loader: could not read scroll offset: {}", e);
                None
            }
        };

        let observers = match view.observe().await {
            Ok(obs) => ObserverGuard::new(obs),
            Err(e) => {
                warn!("loader: observers unavailable, relying on polling only: {}", e);
                ObserverGuard::empty()
            }
        };

        let outcome = self.poll_rounds(view, &observers, cancel, start).await;

        observers.release().await;
        if let Some(offset) = original_offset {
            if let Err(e) = view.scroll_to(offset).await {
                warn!("loader: could not restore scroll offset (non-fatal): {}", e);
            }
        }

        let report = outcome?;
        info!(
            "loader: {} items after {} rounds in {}ms ({})",
            report.item_count,
            report.rounds,
            report.elapsed.as_millis(),
            report.stop
        );
        Ok(report)
    }

    async fn poll_rounds<V>(
        &self,
        view: &V,
        observers: &ObserverGuard,
        cancel: &CancelToken,
        start: Instant,
    ) -> Result<LoadReport>
    where
        V: CollectionView + ?Sized,
    {
        let mut count = view.item_count().await?;
        let mut extent = view.content_extent().await.unwrap_or(0);
        let mut rounds = 0u32;
        let mut idle_rounds = 0u32;

        let finish = |stop: StopReason, count: usize, rounds: u32| LoadReport {
            item_count: count,
            rounds,
            stop,
            elapsed: start.elapsed(),
        };

        loop {
            if cancel.is_cancelled() {
                return Ok(finish(StopReason::Cancelled, count, rounds));
            }
            if start.elapsed() >= self.max_runtime {
                warn!(
                    "loader: wall-clock cap of {}s hit with {} items",
                    self.max_runtime.as_secs(),
                    count
                );
                return Ok(finish(StopReason::WallClockCap, count, rounds));
            }
            rounds += 1;

            if let Err(e) = view.scroll_to_end().await {
                warn!("loader: scroll to end failed: {}", e);
            }
            if cancel.sleep(self.settle).await {
                return Ok(finish(StopReason::Cancelled, count, rounds));
            }

            let signal = self
                .wait_for_growth(view, observers, cancel, count, extent)
                .await;
            if signal == GrowthSignal::Cancelled {
                return Ok(finish(StopReason::Cancelled, count, rounds));
            }

            let new_count = view.item_count().await.unwrap_or(count);
            let new_extent = view.content_extent().await.unwrap_or(extent);
            let grew = new_count > count || new_extent > extent;
            if new_count < count {
                // Counts only go up within a run; a dip is a re-render in progress.
                debug!("loader: item count dipped {} -> {}, ignoring", count, new_count);
            }
            count = count.max(new_count);
            extent = extent.max(new_extent);

            debug!(
                "loader: round {} signal={:?} items={} extent={}",
                rounds, signal, count, extent
            );

            if grew {
                idle_rounds = 0;
                continue;
            }

            idle_rounds += 1;
            let placeholder = view.loading_indicator_present().await.unwrap_or(true);
            let last_visible = observers.last_item_visible().await;
            if !placeholder && last_visible {
                return Ok(finish(StopReason::Converged, count, rounds));
            }
            if idle_rounds >= self.no_growth_rounds {
                return Ok(finish(StopReason::NoGrowth, count, rounds));
            }
        }
    }

    /// Poll until any growth signal fires or the growth window closes.
    async fn wait_for_growth<V>(
        &self,
        view: &V,
        observers: &ObserverGuard,
        cancel: &CancelToken,
        count: usize,
        extent: u64,
    ) -> GrowthSignal
    where
        V: CollectionView + ?Sized,
    {
        // Unrepresentable deadline: poll once and give up.
        let deadline = Instant::now().checked_add(self.growth_wait);
        loop {
            if view.item_count().await.map(|n| n > count).unwrap_or(false) {
                return GrowthSignal::Items;
            }
            if view.content_extent().await.map(|h| h > extent).unwrap_or(false) {
                return GrowthSignal::Extent;
            }
            if observers.take_structure_changed().await {
                return GrowthSignal::Mutation;
            }
            if deadline.map_or(true, |d| Instant::now() >= d) {
                return GrowthSignal::Timeout;
            }
            if cancel.sleep(self.poll).await {
                return GrowthSignal::Cancelled;
            }
        }
    }
}
