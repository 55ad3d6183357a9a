//! `Accept`-style header negotiation
//!
//! Minimal q-value negotiation for `Accept`, `Accept-Encoding` and
//! `Accept-Language`. Ranking follows the usual order: quality, then
//! specificity of the matching range, then position in the header, then
//! position in the server's candidate list. `q=0` excludes a value.

use std::cmp::Ordering;

/// One entry of an `Accept`-style header
#[derive(Debug, Clone, PartialEq)]
struct Preference {
    value: String,
    q: f32,
    index: usize,
}

/// A server candidate matched against the client's preferences
#[derive(Debug, Clone, Copy)]
struct Ranked {
    q: f32,
    specificity: u8,
    order: usize,
    candidate: usize,
}

fn parse(header: &str) -> Vec<Preference> {
    header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';').map(str::trim);
            let value = parts.next().filter(|v| !v.is_empty())?;
            let q = parts
                .filter_map(|param| param.split_once('='))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("q"))
                .map_or(1.0, |(_, v)| v.trim().parse::<f32>().unwrap_or(0.0))
                .clamp(0.0, 1.0);
            Some((value.to_string(), q))
        })
        .enumerate()
        .map(|(index, (value, q))| Preference { value, q, index })
        .collect()
}

fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    b.q.total_cmp(&a.q)
        .then(b.specificity.cmp(&a.specificity))
        .then(a.order.cmp(&b.order))
        .then(a.candidate.cmp(&b.candidate))
}

/// Specificity of `range` matching `media_type`, `None` if it does not match
fn media_range_specificity(range: &str, media_type: &str) -> Option<u8> {
    let (range_type, range_sub) = range.split_once('/')?;
    let (ty, sub) = media_type.split_once('/')?;
    match (range_type, range_sub) {
        ("*", "*") => Some(0),
        (t, "*") if t.eq_ignore_ascii_case(ty) => Some(1),
        (t, s) if t.eq_ignore_ascii_case(ty) && s.eq_ignore_ascii_case(sub) => Some(2),
        _ => None,
    }
}

fn token_specificity(range: &str, token: &str) -> Option<u8> {
    if range == "*" {
        Some(0)
    } else if range.eq_ignore_ascii_case(token) {
        Some(1)
    } else {
        None
    }
}

/// Pick the best candidate, matching each one against its most specific range
fn best<'a, S, F>(prefs: &[Preference], candidates: &'a [S], specificity: F) -> Option<&'a S>
where
    S: AsRef<str>,
    F: Fn(&str, &str) -> Option<u8>,
{
    candidates
        .iter()
        .enumerate()
        .filter_map(|(candidate, value)| {
            prefs
                .iter()
                .filter_map(|p| {
                    specificity(&p.value, value.as_ref()).map(|specificity| Ranked {
                        q: p.q,
                        specificity,
                        order: p.index,
                        candidate,
                    })
                })
                .min_by(|a, b| {
                    b.specificity
                        .cmp(&a.specificity)
                        .then(a.order.cmp(&b.order))
                })
        })
        .filter(|ranked| ranked.q > 0.0)
        .min_by(compare)
        .map(|ranked| &candidates[ranked.candidate])
}

fn header_or<'a>(header: Option<&'a str>, default: &'a str) -> &'a str {
    header.map(str::trim).filter(|h| !h.is_empty()).unwrap_or(default)
}

/// Best media type among `available` for an `Accept` header.
/// A missing header accepts anything.
pub fn media_type<'a, S: AsRef<str>>(accept: Option<&str>, available: &'a [S]) -> Option<&'a S> {
    let prefs = parse(header_or(accept, "*/*"));
    best(&prefs, available, media_range_specificity)
}

/// Client's acceptable media ranges, most preferred first
pub fn preferred_media_types(accept: Option<&str>) -> Vec<String> {
    let mut prefs: Vec<_> = parse(header_or(accept, "*/*"))
        .into_iter()
        .filter(|p| p.q > 0.0)
        .collect();
    let specificity = |value: &str| match value.split_once('/') {
        Some(("*", "*")) => 0,
        Some((_, "*")) => 1,
        _ => 2,
    };
    prefs.sort_by(|a, b| {
        b.q.total_cmp(&a.q)
            .then(specificity(&b.value).cmp(&specificity(&a.value)))
            .then(a.index.cmp(&b.index))
    });
    prefs.into_iter().map(|p| p.value).collect()
}

/// Best content coding among `available`; a missing header selects none
pub fn encoding<'a, S: AsRef<str>>(
    accept_encoding: Option<&str>,
    available: &'a [S],
) -> Option<&'a S> {
    let prefs = parse(accept_encoding?);
    best(&prefs, available, token_specificity)
}

/// Client's most preferred language tag
pub fn language(accept_language: Option<&str>) -> Option<String> {
    let mut prefs: Vec<_> = parse(accept_language?)
        .into_iter()
        .filter(|p| p.q > 0.0 && p.value != "*")
        .collect();
    prefs.sort_by(|a, b| b.q.total_cmp(&a.q).then(a.index.cmp(&b.index)));
    prefs.into_iter().next().map(|p| p.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: [&str; 2] = ["application/json", "text/html"];

    #[test]
    fn test_missing_accept_picks_first() {
        assert_eq!(media_type(None, &TYPES), Some(&"application/json"));
        assert_eq!(media_type(Some("  "), &TYPES), Some(&"application/json"));
    }

    #[test]
    fn test_exact_and_quality() {
        assert_eq!(media_type(Some("text/html"), &TYPES), Some(&"text/html"));
        assert_eq!(
            media_type(Some("application/json;q=0.5, text/html"), &TYPES),
            Some(&"text/html")
        );
        assert_eq!(media_type(Some("text/*"), &TYPES), Some(&"text/html"));
    }

    #[test]
    fn test_specific_range_overrides_wildcard() {
        // json explicitly refused even though */* is acceptable
        assert_eq!(
            media_type(Some("*/*, application/json;q=0"), &TYPES),
            Some(&"text/html")
        );
    }

    #[test]
    fn test_nothing_acceptable() {
        assert_eq!(media_type(Some("image/png"), &TYPES), None);
        assert_eq!(
            preferred_media_types(Some("image/png;q=0.4, text/csv")),
            vec!["text/csv".to_string(), "image/png".to_string()]
        );
    }

    #[test]
    fn test_encoding() {
        let available = ["gzip", "deflate"];
        assert_eq!(encoding(None, &available), None);
        assert_eq!(encoding(Some("gzip"), &available), Some(&"gzip"));
        assert_eq!(encoding(Some("deflate, gzip;q=0.8"), &available), Some(&"deflate"));
        assert_eq!(encoding(Some("*"), &available), Some(&"gzip"));
        assert_eq!(encoding(Some("br, identity"), &available), None);
        assert_eq!(encoding(Some("gzip;q=0"), &available), None);
    }

    #[test]
    fn test_language() {
        assert_eq!(language(None), None);
        assert_eq!(language(Some("fr;q=0.5, en-US")), Some("en-US".to_string()));
        assert_eq!(language(Some("*")), None);
    }
}
