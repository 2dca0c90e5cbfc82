//! Hands the finished report to the user: a text file when anything was
//! processed, an inline message otherwise.

use crate::core::types::RunResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Written(PathBuf),
    Inline(String),
}

pub fn default_report_name(now: DateTime<Local>) -> String {
    format!("playlist-cleanup-{}.txt", now.format("%Y%m%d-%H%M%S"))
}

/// Write `result.summary_text` to `target` (or a timestamped file in the
/// current directory). Nothing is written when no item was processed.
pub fn deliver(result: &RunResult, target: Option<&Path>) -> Result<Delivery> {
    if result.processed() == 0 {
        return Ok(Delivery::Inline(result.summary_text.clone()));
    }

    let path = match target {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(default_report_name(Local::now())),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&path, &result.summary_text)
        .with_context(|| format!("writing report to {}", path.display()))?;
    info!("report written to {}", path.display());
    Ok(Delivery::Written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ProcessedItem;
    use chrono::TimeZone;

    fn result(processed: bool) -> RunResult {
        RunResult {
            total_matched: usize::from(processed),
            succeeded: if processed {
                vec![ProcessedItem {
                    title: "Clip".to_string(),
                    reasons: vec!["watched (100%)".to_string()],
                    resource_url: None,
                }]
            } else {
                Vec::new()
            },
            failed: Vec::new(),
            unprocessed: 0,
            dry_run: true,
            cancelled: false,
            summary_text: "summary body".to_string(),
        }
    }

    #[test]
    fn test_default_name_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            default_report_name(now),
            "playlist-cleanup-20240309-070501.txt"
        );
    }

    #[test]
    fn test_nothing_processed_is_inline() {
        let out = deliver(&result(false), None).unwrap();
        assert_eq!(out, Delivery::Inline("summary body".to_string()));
    }

    #[test]
    fn test_writes_to_target() {
        let dir = std::env::temp_dir().join(format!("playlist-sweep-export-{}", std::process::id()));
        let path = dir.join("nested").join("report.txt");
        let out = deliver(&result(true), Some(&path)).unwrap();
        assert_eq!(out, Delivery::Written(path.clone()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "summary body");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
