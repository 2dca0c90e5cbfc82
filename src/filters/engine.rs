use super::{age, terms};
use crate::core::types::{
    EngagementFilter, FilterSpec, ItemRecord, MatchCandidate, MatchLogic,
};

/// Titles the host shows for items that no longer exist.
pub const UNAVAILABLE_TITLES: [&str; 2] = ["[Deleted video]", "[Private video]"];

pub fn is_unavailable_title(title: &str) -> bool {
    UNAVAILABLE_TITLES.contains(&title)
}

/// Every active sub-filter is evaluated, even under OR, so the reason list is
/// always complete.
fn match_reasons(item: &ItemRecord, spec: &FilterSpec) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(engagement) = spec.engagement {
        if let Some(reason) = engagement_reason(item, engagement) {
            reasons.push(reason);
        }
    }

    if spec.unavailable_only && is_unavailable_title(&item.title) {
        reasons.push(format!("unavailable ({})", item.title));
    }

    if spec.title_terms.is_active() {
        if let Some(term) = terms::first_match(&spec.title_terms, &item.title) {
            reasons.push(format!("title contains \"{}\"", term));
        }
    }

    if spec.channel_terms.is_active() {
        if let Some(term) = terms::first_match(&spec.channel_terms, &item.secondary_label) {
            reasons.push(format!("channel contains \"{}\"", term));
        }
    }

    if let Some(filter) = spec.age.as_ref() {
        let item_age = item.age_text.as_deref().and_then(age::age_in_days);
        if let Some(days) = item_age {
            if age::is_older_than(days, filter) {
                reasons.push(format!(
                    "older than {} {} ({})",
                    filter.value,
                    filter.unit.as_str(),
                    item.age_text.as_deref().unwrap_or_default().trim()
                ));
            }
        }
    }

    reasons
}

fn engagement_reason(item: &ItemRecord, filter: EngagementFilter) -> Option<String> {
    match filter {
        EngagementFilter::Any => item
            .is_engaged
            .then(|| format!("watched ({}%)", item.engagement_percent)),
        EngagementFilter::PercentThreshold { threshold } => {
            // Out-of-range thresholds should have been rejected upstream; they never match.
            if !(1..=100).contains(&threshold) {
                return None;
            }
            (u32::from(item.engagement_percent) >= threshold).then(|| {
                format!(
                    "watched {}% (at least {}%)",
                    item.engagement_percent, threshold
                )
            })
        }
    }
}

/// Whether `hits` satisfied sub-filters out of `active` pass under `logic`.
pub fn combine(logic: MatchLogic, hits: usize, active: usize) -> bool {
    match logic {
        MatchLogic::Or => hits > 0,
        // An empty filter set selects nothing under AND.
        MatchLogic::And => active > 0 && hits == active,
    }
}

/// Select candidates from `items`, preserving source order.
pub fn select_candidates(
    items: &[ItemRecord],
    spec: &FilterSpec,
    logic: MatchLogic,
) -> Vec<MatchCandidate> {
    let active = spec.active_count();
    items
        .iter()
        .filter_map(|item| {
            let reasons = match_reasons(item, spec);
            combine(logic, reasons.len(), active).then(|| MatchCandidate {
                handle: item.handle,
                title: item.title.clone(),
                match_reasons: reasons,
                resource_url: item.resource_url.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgeFilter, AgeUnit, ItemHandle};
    use crate::filters::terms::parse_terms;

    fn item(i: usize, title: &str, channel: &str, percent: u8, age: Option<&str>) -> ItemRecord {
        ItemRecord {
            handle: ItemHandle(i),
            title: title.to_string(),
            secondary_label: channel.to_string(),
            is_engaged: percent > 0,
            engagement_percent: percent,
            age_text: age.map(str::to_string),
            resource_url: Some(format!("https://www.youtube.com/watch?v=v{}", i)),
        }
    }

    #[test]
    fn test_and_requires_every_active_filter() {
        let items = vec![item(0, "Game review", "Other Channel", 0, None)];
        let spec = FilterSpec {
            title_terms: parse_terms(Some("review")),
            channel_terms: parse_terms(Some("gamespot")),
            ..Default::default()
        };

        assert!(select_candidates(&items, &spec, MatchLogic::And).is_empty());

        let or = select_candidates(&items, &spec, MatchLogic::Or);
        assert_eq!(or.len(), 1);
        assert_eq!(or[0].match_reasons, vec!["title contains \"review\""]);
    }

    #[test]
    fn test_percent_threshold_is_inclusive() {
        let items = vec![item(0, "Clip", "Chan", 45, None)];
        let at = |threshold| FilterSpec {
            engagement: Some(EngagementFilter::PercentThreshold { threshold }),
            ..Default::default()
        };
        assert!(select_candidates(&items, &at(50), MatchLogic::And).is_empty());
        assert_eq!(select_candidates(&items, &at(45), MatchLogic::And).len(), 1);
    }

    #[test]
    fn test_invalid_threshold_never_matches() {
        let items = vec![item(0, "Clip", "Chan", 100, None)];
        for threshold in [0, 101] {
            let spec = FilterSpec {
                engagement: Some(EngagementFilter::PercentThreshold { threshold }),
                ..Default::default()
            };
            assert!(select_candidates(&items, &spec, MatchLogic::Or).is_empty());
        }
    }

    #[test]
    fn test_any_engagement() {
        let items = vec![
            item(0, "Seen", "Chan", 12, None),
            item(1, "Unseen", "Chan", 0, None),
        ];
        let spec = FilterSpec {
            engagement: Some(EngagementFilter::Any),
            ..Default::default()
        };
        let out = select_candidates(&items, &spec, MatchLogic::And);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Seen");
    }

    #[test]
    fn test_empty_spec_selects_nothing_under_and() {
        let items = vec![item(0, "Anything", "Chan", 100, Some("9 years ago"))];
        let spec = FilterSpec::default();
        assert!(select_candidates(&items, &spec, MatchLogic::And).is_empty());
        assert!(select_candidates(&items, &spec, MatchLogic::Or).is_empty());
    }

    #[test]
    fn test_unavailable_sentinels() {
        let items = vec![
            item(0, "[Deleted video]", "", 0, None),
            item(1, "[Private video]", "", 0, None),
            item(2, "Deleted video review", "Chan", 0, None),
        ];
        let spec = FilterSpec {
            unavailable_only: true,
            ..Default::default()
        };
        let out = select_candidates(&items, &spec, MatchLogic::And);
        let handles: Vec<_> = out.iter().map(|c| c.handle).collect();
        assert_eq!(handles, vec![ItemHandle(0), ItemHandle(1)]);
    }

    #[test]
    fn test_age_needs_parseable_text() {
        let items = vec![
            item(0, "Old", "Chan", 0, Some("2 years ago")),
            item(1, "Unknown", "Chan", 0, Some("Premieres soon")),
            item(2, "Missing", "Chan", 0, None),
            item(3, "Exactly", "Chan", 0, Some("1 year ago")),
        ];
        let spec = FilterSpec {
            age: Some(AgeFilter::new(1, AgeUnit::Years)),
            ..Default::default()
        };
        let out = select_candidates(&items, &spec, MatchLogic::Or);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].match_reasons, vec!["older than 1 years (2 years ago)"]);
    }

    #[test]
    fn test_or_keeps_every_reason_in_fixed_order() {
        let items = vec![item(0, "Podcast ep 4", "Pod Network", 100, Some("3 months ago"))];
        let spec = FilterSpec {
            title_terms: parse_terms(Some("podcast")),
            channel_terms: parse_terms(Some("network")),
            engagement: Some(EngagementFilter::Any),
            age: Some(AgeFilter::new(2, AgeUnit::Weeks)),
            unavailable_only: false,
        };
        let out = select_candidates(&items, &spec, MatchLogic::Or);
        assert_eq!(
            out[0].match_reasons,
            vec![
                "watched (100%)",
                "title contains \"podcast\"",
                "channel contains \"network\"",
                "older than 2 weeks (3 months ago)",
            ]
        );
    }

    #[test]
    fn test_selection_is_repeatable() {
        let items: Vec<_> = (0..20)
            .map(|i| item(i, &format!("Video {i}"), "Chan", (i * 5) as u8, Some("3 weeks ago")))
            .collect();
        let spec = FilterSpec {
            engagement: Some(EngagementFilter::PercentThreshold { threshold: 40 }),
            age: Some(AgeFilter::new(2, AgeUnit::Weeks)),
            ..Default::default()
        };
        let first = select_candidates(&items, &spec, MatchLogic::And);
        let second = select_candidates(&items, &spec, MatchLogic::And);
        assert_eq!(first, second);
        assert_eq!(first.first().map(|c| c.handle), Some(ItemHandle(8)));
    }
}
