//! One full run: load → extract → filter → execute → report.

use crate::core::cancel::CancelToken;
use crate::core::config::SweepConfig;
use crate::core::error::SweepError;
use crate::core::host::SweepHost;
use crate::core::types::{RunResult, SweepRequest};
use crate::filters::select_candidates;
use crate::scraping::extract::extract_items;
use crate::tools::executor::{BulkActionExecutor, ExecutionLedger};
use crate::tools::loader::{ConvergenceLoader, StopReason};
use crate::tools::report::build_summary;
use anyhow::Result;
use tracing::{error, info};
use url::Url;

/// Run a sweep against `host`.
///
/// Injected controls are removed and the cancellation flag is cleared exactly
/// once on every exit path, including when an unexpected fault is returned.
pub async fn run_sweep<H>(
    host: &H,
    request: &SweepRequest,
    config: &SweepConfig,
    cancel: &CancelToken,
) -> Result<RunResult>
where
    H: SweepHost + ?Sized,
{
    let outcome = sweep_inner(host, request, config, cancel).await;

    host.remove_controls().await;
    cancel.reset();

    if let Err(e) = &outcome {
        error!("sweep aborted: {:#}", e);
    }
    outcome
}

async fn sweep_inner<H>(
    host: &H,
    request: &SweepRequest,
    config: &SweepConfig,
    cancel: &CancelToken,
) -> Result<RunResult>
where
    H: SweepHost + ?Sized,
{
    let base = config.page.resolve_host();
    let base_url =
        Url::parse(&base).map_err(|e| SweepError::Automation(format!("bad host {}: {}", base, e)))?;

    host.show_status("Loading playlist…").await;
    let report = ConvergenceLoader::new(&config.loader)
        .run(host, cancel)
        .await?;

    let candidates = if report.stop == StopReason::Cancelled || cancel.is_cancelled() {
        info!("sweep: cancelled while loading");
        Vec::new()
    } else {
        host.show_status(&format!("Scanning {} items…", report.item_count))
            .await;
        let raw = host.snapshot_items().await?;
        let records = extract_items(&raw, &base_url);
        info!(
            "sweep: {} rendered items, {} with a title",
            raw.len(),
            records.len()
        );
        select_candidates(&records, &request.filter, request.logic)
    };

    let ledger = if cancel.is_cancelled() {
        let mut ledger = ExecutionLedger::new(candidates.len());
        ledger.cancelled = true;
        ledger
    } else {
        info!(
            "sweep: {} candidates (logic {})",
            candidates.len(),
            request.logic.as_str()
        );
        BulkActionExecutor::new(&config.executor)
            .execute(host, candidates, request.dry_run, cancel)
            .await
    };

    let summary_text = build_summary(&request.filter, request.logic, &ledger, request.dry_run);
    host.show_status(&format!(
        "Done: {} of {} processed",
        ledger.processed(),
        ledger.total_matched
    ))
    .await;

    Ok(RunResult {
        total_matched: ledger.total_matched,
        unprocessed: ledger.unprocessed(),
        dry_run: request.dry_run,
        cancelled: ledger.cancelled,
        succeeded: ledger.succeeded,
        failed: ledger.failed,
        summary_text,
    })
}
