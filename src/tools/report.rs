//! Human-readable audit summary for a finished run.

use crate::core::types::{EngagementFilter, FilterSpec, MatchLogic};
use crate::tools::executor::ExecutionLedger;
use std::fmt::Write;

pub const CANCELLED_NOTICE: &str = "Cleanup was cancelled before any items were processed.";
pub const NOTHING_MATCHED_NOTICE: &str = "No items matched the selected filters. Nothing was removed.";

fn quoted_list(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per active filter, in the same order the engine evaluates them.
pub fn criteria_lines(spec: &FilterSpec) -> Vec<String> {
    let mut lines = Vec::new();
    match spec.engagement {
        Some(EngagementFilter::Any) => lines.push("watched (any progress)".to_string()),
        Some(EngagementFilter::PercentThreshold { threshold }) => {
            lines.push(format!("watched at least {}%", threshold))
        }
        None => {}
    }
    if spec.unavailable_only {
        lines.push("unavailable (deleted or private)".to_string());
    }
    if spec.title_terms.is_active() {
        lines.push(format!(
            "title contains any of: {}",
            quoted_list(spec.title_terms.terms())
        ));
    }
    if spec.channel_terms.is_active() {
        lines.push(format!(
            "channel contains any of: {}",
            quoted_list(spec.channel_terms.terms())
        ));
    }
    if let Some(age) = spec.age {
        lines.push(format!(
            "older than {} {} ({} days)",
            age.value,
            age.unit.as_str(),
            age.threshold_days
        ));
    }
    lines
}

/// Build the summary text.
///
/// When nothing was processed this is a single sentence saying whether the
/// run was cancelled or simply matched nothing.
pub fn build_summary(
    spec: &FilterSpec,
    logic: MatchLogic,
    ledger: &ExecutionLedger,
    dry_run: bool,
) -> String {
    if ledger.processed() == 0 {
        return if ledger.cancelled {
            CANCELLED_NOTICE.to_string()
        } else {
            NOTHING_MATCHED_NOTICE.to_string()
        };
    }

    let mut out = String::new();
    let mode = match logic {
        MatchLogic::And => "all of",
        MatchLogic::Or => "any of",
    };
    let _ = writeln!(out, "Playlist cleanup report{}", if dry_run { " (dry run)" } else { "" });
    let _ = writeln!(out, "Criteria ({}: match {}):", logic.as_str(), mode);
    for line in criteria_lines(spec) {
        let _ = writeln!(out, "  - {}", line);
    }
    let _ = writeln!(out);

    let done_label = if dry_run { "Would remove" } else { "Removed" };
    let _ = writeln!(out, "Matched: {}", ledger.total_matched);
    let _ = writeln!(out, "{}: {}", done_label, ledger.succeeded.len());
    let _ = writeln!(out, "Failed: {}", ledger.failed.len());
    if ledger.cancelled {
        let _ = writeln!(
            out,
            "Cancelled: {} matched items were not processed",
            ledger.unprocessed()
        );
    }

    if !ledger.succeeded.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "== {} ==", done_label);
        for item in &ledger.succeeded {
            let _ = writeln!(out, "* {}", item.title);
            let _ = writeln!(out, "  reasons: {}", item.reasons.join("; "));
            if let Some(url) = &item.resource_url {
                let _ = writeln!(out, "  {}", url);
            }
        }
    }

    if !ledger.failed.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "== Failed ==");
        for item in &ledger.failed {
            let _ = writeln!(out, "* {}", item.title);
            let _ = writeln!(out, "  failure: {}", item.reason);
            if let Some(url) = &item.resource_url {
                let _ = writeln!(out, "  {}", url);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgeFilter, AgeUnit, FailedItem, ProcessedItem};
    use crate::filters::parse_terms;

    fn spec() -> FilterSpec {
        FilterSpec {
            title_terms: parse_terms(Some(r#"review, "let's play""#)),
            engagement: Some(EngagementFilter::PercentThreshold { threshold: 90 }),
            age: Some(AgeFilter::new(3, AgeUnit::Months)),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_processed_notices() {
        let mut ledger = ExecutionLedger::new(0);
        assert_eq!(
            build_summary(&spec(), MatchLogic::And, &ledger, false),
            NOTHING_MATCHED_NOTICE
        );

        ledger.total_matched = 4;
        ledger.cancelled = true;
        assert_eq!(
            build_summary(&spec(), MatchLogic::And, &ledger, false),
            CANCELLED_NOTICE
        );
    }

    #[test]
    fn test_full_report_layout() {
        let mut ledger = ExecutionLedger::new(3);
        ledger.succeeded.push(ProcessedItem {
            title: "Let's Play ep 1".to_string(),
            reasons: vec!["a".to_string(), "b".to_string()],
            resource_url: Some("https://www.youtube.com/watch?v=1".to_string()),
        });
        ledger.failed.push(FailedItem {
            title: "Review".to_string(),
            reason: "remove option not found in menu".to_string(),
            match_reasons: vec!["a".to_string()],
            resource_url: None,
        });

        let text = build_summary(&spec(), MatchLogic::Or, &ledger, true);
        assert!(text.starts_with("Playlist cleanup report (dry run)\n"));
        assert!(text.contains("Criteria (OR: match any of):"));
        assert!(text.contains("  - watched at least 90%\n"));
        assert!(text.contains("  - title contains any of: \"let's play\", \"review\"\n"));
        assert!(text.contains("  - older than 3 months (90 days)\n"));
        assert!(!text.contains("channel contains"));
        assert!(text.contains("Matched: 3\nWould remove: 1\nFailed: 1\n"));
        assert!(text.contains("* Let's Play ep 1\n  reasons: a; b\n  https://www.youtube.com/watch?v=1\n"));
        assert!(text.contains("== Failed ==\n* Review\n  failure: remove option not found in menu\n"));

        let removed = text.find("== Would remove ==").unwrap();
        let failed = text.find("== Failed ==").unwrap();
        assert!(removed < failed);
    }

    #[test]
    fn test_cancelled_with_partial_work() {
        let mut ledger = ExecutionLedger::new(5);
        ledger.cancelled = true;
        ledger.succeeded.push(ProcessedItem {
            title: "One".to_string(),
            reasons: vec!["x".to_string()],
            resource_url: None,
        });
        let text = build_summary(&spec(), MatchLogic::And, &ledger, false);
        assert!(text.contains("Removed: 1\n"));
        assert!(text.contains("Cancelled: 4 matched items were not processed"));
    }
}
