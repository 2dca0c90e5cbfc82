use crate::core::types::TermSpec;
use regex::Regex;
use std::sync::OnceLock;

static QUOTED: OnceLock<Regex> = OnceLock::new();

fn quoted() -> &'static Regex {
    QUOTED.get_or_init(|| Regex::new(r#""([^"]*?)""#).expect("valid quoted-phrase regex"))
}

/// Parse a free-text filter into lowercase match terms.
///
/// `"..."` phrases are kept whole and come first, in order of appearance.
/// Whatever is left is split on commas. Empty pieces are dropped; duplicates
/// are kept.
pub fn parse_terms(input: Option<&str>) -> TermSpec {
    let Some(input) = input else {
        return TermSpec::default();
    };

    let mut terms: Vec<String> = quoted()
        .captures_iter(input)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let rest = quoted().replace_all(input, "");
    terms.extend(
        rest.split(',')
            .map(|piece| piece.trim().to_lowercase())
            .filter(|piece| !piece.is_empty()),
    );

    TermSpec::new(terms)
}

/// First term that occurs in `haystack`, case-insensitively.
pub fn first_match<'a>(terms: &'a TermSpec, haystack: &str) -> Option<&'a str> {
    let haystack = haystack.to_lowercase();
    terms
        .terms()
        .iter()
        .find(|term| haystack.contains(term.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases_come_first() {
        let spec = parse_terms(Some(r#"review, "let's play""#));
        assert_eq!(spec.terms(), ["let's play", "review"]);
    }

    #[test]
    fn test_missing_input_is_inactive() {
        assert!(!parse_terms(None).is_active());
        assert!(!parse_terms(Some("  , ,")).is_active());
        assert!(!parse_terms(Some(r#""""#)).is_active());
    }

    #[test]
    fn test_commas_inside_quotes_survive() {
        let spec = parse_terms(Some(r#"ASMR,"one, two" ,Live"#));
        assert_eq!(spec.terms(), ["one, two", "asmr", "live"]);
    }

    #[test]
    fn test_duplicates_kept() {
        let spec = parse_terms(Some("news, NEWS"));
        assert_eq!(spec.terms(), ["news", "news"]);
    }

    #[test]
    fn test_first_match_is_case_insensitive() {
        let spec = parse_terms(Some("podcast, Review"));
        assert_eq!(first_match(&spec, "Honest REVIEW of a thing"), Some("review"));
        assert_eq!(first_match(&spec, "Cooking show"), None);
    }
}
