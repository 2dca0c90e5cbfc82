use crate::core::cancel::CancelToken;
use crate::core::config::ExecutorConfig;
use crate::core::host::{ItemActions, MenuControl, Progress, StatusDisplay, StepOutcome};
use crate::core::types::{FailedItem, MatchCandidate, ProcessedItem};
use anyhow::Result;
use rand::distr::{Distribution, Uniform};
use std::time::Duration;
use tracing::{info, warn};

/// Where a single candidate ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemState {
    Done,
    Failed(String),
    /// Cancelled mid-sequence; counted as unprocessed.
    Interrupted,
}

/// Running tally for one run. Becomes part of the final `RunResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionLedger {
    pub total_matched: usize,
    pub succeeded: Vec<ProcessedItem>,
    pub failed: Vec<FailedItem>,
    pub cancelled: bool,
}

impl ExecutionLedger {
    pub fn new(total_matched: usize) -> Self {
        Self {
            total_matched,
            ..Default::default()
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn unprocessed(&self) -> usize {
        self.total_matched.saturating_sub(self.processed())
    }

    fn record_success(&mut self, candidate: MatchCandidate) {
        self.succeeded.push(ProcessedItem {
            title: candidate.title,
            reasons: candidate.match_reasons,
            resource_url: candidate.resource_url,
        });
    }

    fn record_failure(&mut self, candidate: MatchCandidate, reason: String) {
        self.failed.push(FailedItem {
            title: candidate.title,
            reason,
            match_reasons: candidate.match_reasons,
            resource_url: candidate.resource_url,
        });
    }
}

/// Processes candidates one at a time. Interactive steps never overlap.
#[derive(Debug, Clone)]
pub struct BulkActionExecutor {
    menu_wait: Duration,
    item_pause: Duration,
    dry_run_pause: Duration,
    remove_labels: Vec<String>,
}

impl BulkActionExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            menu_wait: config.resolve_menu_wait(),
            item_pause: config.resolve_item_pause(),
            dry_run_pause: config.resolve_dry_run_pause(),
            remove_labels: config.resolve_remove_labels(),
        }
    }

    pub async fn execute<H>(
        &self,
        host: &H,
        candidates: Vec<MatchCandidate>,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> ExecutionLedger
    where
        H: ItemActions + StatusDisplay + ?Sized,
    {
        let total = candidates.len();
        let mut ledger = ExecutionLedger::new(total);
        info!(
            "executor: {} candidates ({})",
            total,
            if dry_run { "dry run" } else { "removing" }
        );

        for (idx, candidate) in candidates.into_iter().enumerate() {
            if cancel.is_cancelled() {
                ledger.cancelled = true;
                break;
            }

            let progress = Progress {
                position: idx + 1,
                total,
                title: candidate.title.clone(),
                dry_run,
            };

            if dry_run {
                if cancel.sleep(self.dry_run_pause).await {
                    ledger.cancelled = true;
                    break;
                }
                ledger.record_success(candidate);
                host.show_progress(&progress).await;
                continue;
            }

            let state = match self.remove_one(host, &candidate, cancel).await {
                Ok(state) => state,
                Err(e) => {
                    // Leave the page as clean as possible for the next item.
                    dismiss_quietly(host).await;
                    ItemState::Failed(format!("unexpected error: {}", e))
                }
            };

            match state {
                ItemState::Done => {
                    info!("executor: removed {}/{} \"{}\"", idx + 1, total, progress.short_title());
                    ledger.record_success(candidate);
                }
                ItemState::Failed(reason) => {
                    warn!(
                        "executor: failed {}/{} \"{}\": {}",
                        idx + 1,
                        total,
                        progress.short_title(),
                        reason
                    );
                    ledger.record_failure(candidate, reason);
                }
                ItemState::Interrupted => {
                    ledger.cancelled = true;
                    break;
                }
            }
            host.show_progress(&progress).await;

            if idx + 1 < total && cancel.sleep(self.paced()).await {
                ledger.cancelled = true;
                break;
            }
        }

        if ledger.cancelled {
            info!(
                "executor: cancelled after {} of {} candidates",
                ledger.processed(),
                total
            );
        }
        ledger
    }

    /// Scroll → open menu → locate remove entry → activate.
    async fn remove_one<H>(
        &self,
        host: &H,
        candidate: &MatchCandidate,
        cancel: &CancelToken,
    ) -> Result<ItemState>
    where
        H: ItemActions + ?Sized,
    {
        if let StepOutcome::Failed { reason } = host.scroll_into_view(candidate.handle).await? {
            // The menu may still be reachable off-screen; keep going.
            warn!("executor: scroll into view missed {}: {}", candidate.handle, reason);
        }
        if cancel.sleep(Duration::from_millis(120)).await {
            return Ok(ItemState::Interrupted);
        }

        if let StepOutcome::Failed { reason } = host.open_menu(candidate.handle).await? {
            return Ok(ItemState::Failed(format!("menu button not found ({})", reason)));
        }

        let control: Option<MenuControl> = host
            .locate_control(&self.remove_labels, self.menu_wait)
            .await?;
        if cancel.is_cancelled() {
            dismiss_quietly(host).await;
            return Ok(ItemState::Interrupted);
        }
        let Some(control) = control else {
            dismiss_quietly(host).await;
            return Ok(ItemState::Failed("remove option not found in menu".to_string()));
        };

        match host.activate(&control).await? {
            StepOutcome::Succeeded => Ok(ItemState::Done),
            StepOutcome::Failed { reason } => {
                dismiss_quietly(host).await;
                Ok(ItemState::Failed(format!(
                    "could not activate \"{}\" ({})",
                    control.label, reason
                )))
            }
        }
    }

    /// Base pause plus up to 50% random jitter.
    fn paced(&self) -> Duration {
        let base = u64::try_from(self.item_pause.as_millis()).unwrap_or(u64::MAX);
        if base == 0 {
            return Duration::ZERO;
        }
        let jitter = {
            let mut rng = rand::rng();
            match Uniform::new_inclusive(0u64, base / 2) {
                Ok(dist) => dist.sample(&mut rng),
                Err(_) => 0,
            }
        };
        Duration::from_millis(base.saturating_add(jitter))
    }
}

/// Close a menu left open. A failed dismiss is logged, never reported as the
/// item's failure.
async fn dismiss_quietly<H>(host: &H)
where
    H: ItemActions + ?Sized,
{
    if let Err(e) = host.dismiss_menu().await {
        warn!("executor: could not dismiss menu: {}", e);
    }
}
