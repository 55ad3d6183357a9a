//! Conditional GET support: weak validators over the final body bytes

use flate2::Crc;

/// `W/` followed by the lowercase hex CRC-32 of `body`.
///
/// Computed over the bytes as written, so a compressed body gets a different
/// tag than its identity form.
pub fn weak_etag(body: &[u8]) -> String {
    let mut crc = Crc::new();
    crc.update(body);
    format!("W/{:x}", crc.sum())
}

/// True when `If-None-Match` carries exactly `etag`.
/// Lists and `*` never match.
pub fn is_fresh(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match == Some(etag)
}
