use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to one rendered item in the host page.
///
/// This is an index into the snapshot taken after loading, never a live node.
/// The host re-resolves it only when an interactive action is performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(pub usize);

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Field values read from one rendered item, before any interpretation.
///
/// Produced by the host (live page or saved HTML). Every field except the
/// handle may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub handle: ItemHandle,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_href: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// "Fully watched" overlay present on the thumbnail.
    #[serde(default)]
    pub watched_marker: bool,
    /// Inline width of the resume progress bar, e.g. `"45%"`.
    #[serde(default)]
    pub resume_width: Option<String>,
    /// Small metadata text fragments (view counts, "3 weeks ago", ...).
    #[serde(default)]
    pub metadata: Vec<String>,
}

/// Structured view of one playlist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
    pub handle: ItemHandle,
    pub title: String,
    /// Channel name. Empty for unavailable items.
    pub secondary_label: String,
    pub is_engaged: bool,
    /// 0..=100
    pub engagement_percent: u8,
    pub age_text: Option<String>,
    pub resource_url: Option<String>,
}

/// Ordered list of lowercase match terms. Empty means the filter is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermSpec(Vec<String>);

impl TermSpec {
    pub fn new(terms: Vec<String>) -> Self {
        TermSpec(terms)
    }

    pub fn is_active(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl AgeUnit {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "days" | "d" => Some(AgeUnit::Days),
            "week" | "weeks" | "w" => Some(AgeUnit::Weeks),
            "month" | "months" | "m" => Some(AgeUnit::Months),
            "year" | "years" | "y" => Some(AgeUnit::Years),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeUnit::Days => "days",
            AgeUnit::Weeks => "weeks",
            AgeUnit::Months => "months",
            AgeUnit::Years => "years",
        }
    }
}

/// "Older than N units", normalized to days at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeFilter {
    pub value: u32,
    pub unit: AgeUnit,
    pub threshold_days: u32,
}

impl AgeFilter {
    pub fn new(value: u32, unit: AgeUnit) -> Self {
        Self {
            value,
            unit,
            threshold_days: crate::filters::age::threshold_days(value, unit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EngagementFilter {
    /// Any watch progress at all.
    Any,
    /// Watched at least `threshold` percent (1..=100).
    PercentThreshold { threshold: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLogic {
    #[default]
    And,
    Or,
}

impl MatchLogic {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "and" | "all" => Some(MatchLogic::And),
            "or" | "any" => Some(MatchLogic::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLogic::And => "AND",
            MatchLogic::Or => "OR",
        }
    }
}

/// User criteria for one run. Built once by the caller, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub title_terms: TermSpec,
    #[serde(default)]
    pub channel_terms: TermSpec,
    #[serde(default)]
    pub engagement: Option<EngagementFilter>,
    #[serde(default)]
    pub unavailable_only: bool,
    #[serde(default)]
    pub age: Option<AgeFilter>,
}

impl FilterSpec {
    /// Number of sub-filters the user switched on.
    pub fn active_count(&self) -> usize {
        [
            self.title_terms.is_active(),
            self.channel_terms.is_active(),
            self.engagement.is_some(),
            self.unavailable_only,
            self.age.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }
}

/// An item selected by the filter engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    pub handle: ItemHandle,
    pub title: String,
    pub match_reasons: Vec<String>,
    pub resource_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedItem {
    pub title: String,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub title: String,
    /// Why the removal did not go through.
    pub reason: String,
    /// Why the item was selected in the first place.
    pub match_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
}

/// Final, immutable outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub total_matched: usize,
    pub succeeded: Vec<ProcessedItem>,
    pub failed: Vec<FailedItem>,
    /// Matched but never reached because the run was cancelled.
    pub unprocessed: usize,
    pub dry_run: bool,
    pub cancelled: bool,
    pub summary_text: String,
}

impl RunResult {
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Per-run options coming from the caller alongside the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRequest {
    pub filter: FilterSpec,
    #[serde(default)]
    pub logic: MatchLogic,
    #[serde(default)]
    pub dry_run: bool,
}
