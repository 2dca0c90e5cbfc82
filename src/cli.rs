//! Command-line surface.

use crate::core::types::{
    AgeFilter, AgeUnit, EngagementFilter, FilterSpec, MatchLogic, SweepRequest,
};
use crate::filters::parse_terms;
use anyhow::{bail, Result};
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "playlist-sweep")]
#[command(version)]
#[command(about = "Bulk cleanup for lazily-loaded video playlists", long_about = None)]
pub struct Cli {
    /// Playlist page to open, e.g. https://www.youtube.com/playlist?list=WL
    #[arg(long, required_unless_present_any = ["setup", "from_html"])]
    pub url: Option<String>,

    /// Attach to a running browser's DevTools endpoint instead of launching one
    #[arg(long, value_name = "ENDPOINT")]
    pub connect: Option<String>,

    /// Browser profile directory used when launching (default ~/.playlist-sweep/profile)
    #[arg(long, value_name = "DIR", env = "PLAYLIST_SWEEP_PROFILE_DIR")]
    pub profile: Option<PathBuf>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Only report what would be removed
    #[arg(long)]
    pub dry_run: bool,

    /// Where to write the report (default playlist-cleanup-<timestamp>.txt)
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Also print the run result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Audit a saved playlist page instead of a live one (always a dry run)
    #[arg(long, value_name = "FILE", conflicts_with_all = ["url", "connect"])]
    pub from_html: Option<PathBuf>,

    /// Run the pre-flight checklist and exit
    #[arg(long)]
    pub setup: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    Days,
    Weeks,
    #[default]
    Months,
    Years,
}

impl From<UnitArg> for AgeUnit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Days => AgeUnit::Days,
            UnitArg::Weeks => AgeUnit::Weeks,
            UnitArg::Months => AgeUnit::Months,
            UnitArg::Years => AgeUnit::Years,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogicArg {
    #[default]
    And,
    Or,
}

impl From<LogicArg> for MatchLogic {
    fn from(l: LogicArg) -> Self {
        match l {
            LogicArg::And => MatchLogic::And,
            LogicArg::Or => MatchLogic::Or,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Title contains any of these terms (comma-separated, "quoted phrases" kept whole)
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Channel contains any of these terms
    #[arg(long, value_name = "TEXT")]
    pub channel: Option<String>,

    /// Any watch progress at all
    #[arg(long, conflicts_with = "watched_min")]
    pub watched: bool,

    /// Watched at least this percent (1-100)
    #[arg(long, value_name = "PCT")]
    pub watched_min: Option<u32>,

    /// Deleted or private entries
    #[arg(long)]
    pub unavailable: bool,

    /// Older than N units (see --unit)
    #[arg(long, value_name = "N")]
    pub older_than: Option<u32>,

    #[arg(long, value_enum, default_value_t = UnitArg::Months)]
    pub unit: UnitArg,

    /// Combine filters with AND (all must match) or OR (any may match)
    #[arg(long, value_enum, default_value_t = LogicArg::And)]
    pub logic: LogicArg,
}

impl FilterArgs {
    /// Validate ranges and build the immutable filter for one run.
    pub fn to_filter_spec(&self) -> Result<FilterSpec> {
        let engagement = match (self.watched, self.watched_min) {
            (_, Some(pct)) if !(1..=100).contains(&pct) => {
                bail!("--watched-min must be between 1 and 100 (got {})", pct)
            }
            (_, Some(pct)) => Some(EngagementFilter::PercentThreshold { threshold: pct }),
            (true, None) => Some(EngagementFilter::Any),
            (false, None) => None,
        };

        let age = match self.older_than {
            Some(0) => bail!("--older-than must be greater than 0"),
            Some(n) => Some(AgeFilter::new(n, self.unit.into())),
            None => None,
        };

        let spec = FilterSpec {
            title_terms: parse_terms(self.title.as_deref()),
            channel_terms: parse_terms(self.channel.as_deref()),
            engagement,
            unavailable_only: self.unavailable,
            age,
        };
        if spec.active_count() == 0 {
            bail!("no filter selected (use --title, --channel, --watched, --watched-min, --unavailable or --older-than)");
        }
        Ok(spec)
    }
}

impl Cli {
    pub fn to_request(&self) -> Result<SweepRequest> {
        Ok(SweepRequest {
            filter: self.filters.to_filter_spec()?,
            logic: self.filters.logic.into(),
            dry_run: self.dry_run || self.from_html.is_some(),
        })
    }
}
