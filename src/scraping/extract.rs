use super::selectors;
use crate::core::types::{ItemHandle, ItemRecord, RawItem};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

static WIDTH_PERCENT: OnceLock<Regex> = OnceLock::new();

fn width_percent() -> &'static Regex {
    WIDTH_PERCENT.get_or_init(|| {
        // A `width:` declaration anywhere in a style string, or a bare "45", "45.7%".
        Regex::new(
            r"(?i)(?:^|[;\s])width\s*:\s*(?P<decl>\d+)|^\s*(?P<bare>\d+)(?:\.\d+)?\s*%?\s*$",
        )
        .expect("valid width regex")
    })
}

/// Integer percent from a progress-bar width. Unparseable → 0; clamped to 100.
pub fn parse_width_percent(raw: &str) -> u8 {
    width_percent()
        .captures(raw)
        .and_then(|c| c.name("decl").or_else(|| c.name("bare")))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|p| p.min(100) as u8)
        .unwrap_or(0)
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn absolutize(href: &str, host: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") {
        return None;
    }
    host.join(href)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|u| u.to_string())
}

/// Turn one raw item into a record. `None` only when no title can be found;
/// every other field falls back to a default.
pub fn extract_item(raw: &RawItem, host: &Url) -> Option<ItemRecord> {
    let title = raw
        .title
        .as_deref()
        .map(collapse_ws)
        .filter(|t| !t.is_empty())?;

    // The resume bar wins over the fully-watched overlay when both are present.
    let (is_engaged, engagement_percent) = match (raw.resume_width.as_deref(), raw.watched_marker)
    {
        (Some(width), _) => (true, parse_width_percent(width)),
        (None, true) => (true, 100),
        (None, false) => (false, 0),
    };

    let secondary_label = raw.channel.as_deref().map(collapse_ws).unwrap_or_default();

    let age_text = raw
        .metadata
        .iter()
        .map(|m| collapse_ws(m))
        .find(|m| m.split_whitespace().any(|w| w.eq_ignore_ascii_case("ago")));

    let resource_url = raw.title_href.as_deref().and_then(|h| absolutize(h, host));

    Some(ItemRecord {
        handle: raw.handle,
        title,
        secondary_label,
        is_engaged,
        engagement_percent,
        age_text,
        resource_url,
    })
}

/// Extract every item that has a title, preserving order.
pub fn extract_items(raw_items: &[RawItem], host: &Url) -> Vec<ItemRecord> {
    raw_items
        .iter()
        .filter_map(|raw| extract_item(raw, host))
        .collect()
}

struct ItemSelectors {
    item: Selector,
    title: Selector,
    channel: Selector,
    watched: Selector,
    resume: Selector,
    metadata: Selector,
}

fn item_selectors() -> &'static ItemSelectors {
    static SELECTORS: OnceLock<ItemSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| ItemSelectors {
        item: Selector::parse(selectors::ITEM).expect("valid item selector"),
        title: Selector::parse(selectors::TITLE).expect("valid title selector"),
        channel: Selector::parse(selectors::CHANNEL).expect("valid channel selector"),
        watched: Selector::parse(selectors::WATCHED_MARKER).expect("valid watched selector"),
        resume: Selector::parse(selectors::RESUME_BAR).expect("valid resume selector"),
        metadata: Selector::parse(selectors::METADATA_TEXT).expect("valid metadata selector"),
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

/// Read raw items from saved page HTML, in document order. Handles are the
/// item's position.
pub fn snapshot_from_html(html: &str) -> Vec<RawItem> {
    let doc = Html::parse_document(html);
    let sel = item_selectors();

    doc.select(&sel.item)
        .enumerate()
        .map(|(i, node)| {
            let title_el = node.select(&sel.title).next();
            let title = title_el
                .map(|t| {
                    t.value()
                        .attr("title")
                        .map(collapse_ws)
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| element_text(t))
                })
                .filter(|t| !t.is_empty());
            let title_href = title_el.and_then(|t| t.value().attr("href")).map(str::to_string);
            let channel = node
                .select(&sel.channel)
                .next()
                .map(element_text)
                .filter(|c| !c.is_empty());
            let watched_marker = node.select(&sel.watched).next().is_some();
            let resume_width = node
                .select(&sel.resume)
                .next()
                .map(|bar| bar.value().attr("style").unwrap_or_default().to_string());
            let metadata = node
                .select(&sel.metadata)
                .map(element_text)
                .filter(|m| !m.is_empty())
                .collect();

            RawItem {
                handle: ItemHandle(i),
                title,
                title_href,
                channel,
                watched_marker,
                resume_width,
                metadata,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> Url {
        Url::parse("https://www.youtube.com").unwrap()
    }

    fn raw(title: Option<&str>) -> RawItem {
        RawItem {
            handle: ItemHandle(4),
            title: title.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_width_parsing() {
        assert_eq!(parse_width_percent("45%"), 45);
        assert_eq!(parse_width_percent("45.7%"), 45);
        assert_eq!(parse_width_percent("width: 12%;"), 12);
        assert_eq!(parse_width_percent("height: 4px; width: 45%;"), 45);
        assert_eq!(parse_width_percent("max-width: 80px"), 0);
        assert_eq!(parse_width_percent("250%"), 100);
        assert_eq!(parse_width_percent("auto"), 0);
        assert_eq!(parse_width_percent(""), 0);
    }

    #[test]
    fn test_missing_title_rejects_item() {
        assert!(extract_item(&raw(None), &host()).is_none());
        assert!(extract_item(&raw(Some("   \n ")), &host()).is_none());
    }

    #[test]
    fn test_defaults_for_bare_item() {
        let record = extract_item(&raw(Some("[Deleted video]")), &host()).unwrap();
        assert_eq!(record.handle, ItemHandle(4));
        assert_eq!(record.secondary_label, "");
        assert!(!record.is_engaged);
        assert_eq!(record.engagement_percent, 0);
        assert_eq!(record.age_text, None);
        assert_eq!(record.resource_url, None);
    }

    #[test]
    fn test_resume_bar_beats_watched_overlay() {
        let mut item = raw(Some("Clip"));
        item.watched_marker = true;
        item.resume_width = Some("37%".to_string());
        let record = extract_item(&item, &host()).unwrap();
        assert!(record.is_engaged);
        assert_eq!(record.engagement_percent, 37);

        item.resume_width = None;
        assert_eq!(extract_item(&item, &host()).unwrap().engagement_percent, 100);
    }

    #[test]
    fn test_unparseable_resume_is_engaged_at_zero() {
        let mut item = raw(Some("Clip"));
        item.resume_width = Some("calc(var(--x))".to_string());
        let record = extract_item(&item, &host()).unwrap();
        assert!(record.is_engaged);
        assert_eq!(record.engagement_percent, 0);
    }

    #[test]
    fn test_age_and_link() {
        let mut item = raw(Some("Clip"));
        item.metadata = vec!["1.2M views".into(), "2 years  ago".into(), "5 days ago".into()];
        item.title_href = Some("/watch?v=abc123&list=WL&index=5".into());
        let record = extract_item(&item, &host()).unwrap();
        assert_eq!(record.age_text.as_deref(), Some("2 years ago"));
        assert_eq!(
            record.resource_url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc123&list=WL&index=5")
        );
    }

    #[test]
    fn test_agony_is_not_ago() {
        let mut item = raw(Some("Clip"));
        item.metadata = vec!["Agony compilation".into()];
        assert_eq!(extract_item(&item, &host()).unwrap().age_text, None);
    }

    #[test]
    fn test_snapshot_from_html() {
        let html = r#"<html><body>
          <ytd-playlist-video-list-renderer><div id="contents">
            <ytd-playlist-video-renderer>
              <a id="video-title" href="/watch?v=one" title="First  video">First video</a>
              <ytd-channel-name><a href="/@chan">Some Channel</a></ytd-channel-name>
              <ytd-thumbnail-overlay-resume-playback-renderer>
                <div id="progress" style="width: 64%;"></div>
              </ytd-thumbnail-overlay-resume-playback-renderer>
              <div id="video-info"><span>10K views</span><span>3 weeks ago</span></div>
            </ytd-playlist-video-renderer>
            <ytd-playlist-video-renderer>
              <a id="video-title" href="/watch?v=two">[Private video]</a>
            </ytd-playlist-video-renderer>
            <ytd-playlist-video-renderer><div>broken</div></ytd-playlist-video-renderer>
          </div></ytd-playlist-video-list-renderer>
        </body></html>"#;

        let raw = snapshot_from_html(html);
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0].resume_width.as_deref(), Some("width: 64%;"));

        let records = extract_items(&raw, &host());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "First video");
        assert_eq!(records[0].secondary_label, "Some Channel");
        assert_eq!(records[0].engagement_percent, 64);
        assert_eq!(records[0].age_text.as_deref(), Some("3 weeks ago"));
        assert_eq!(records[1].title, "[Private video]");
        assert_eq!(records[1].handle, ItemHandle(1));
        assert_eq!(records[1].secondary_label, "");
    }
}
