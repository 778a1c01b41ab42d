//! URL canonicalization and content-hash utilities (spec §4.3, C3).

use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters stripped during canonicalization (spec §4.3).
const TRACKING_PREFIXES: &[&str] = &["utm_", "spm"];
const TRACKING_EXACT: &[&str] = &["from", "ref"];

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PREFIXES.iter().any(|p| key.starts_with(p)) || TRACKING_EXACT.contains(&key)
}

/// Canonicalize a URL: lowercase scheme/host, keep path case-sensitive,
/// strip tracking query parameters, sort the remainder, drop a trailing
/// slash (except on root), and preserve the fragment (spec §4.3 — the
/// snapshot strategy depends on the fragment surviving canonicalization).
pub fn canonicalize(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    let _ = url.set_scheme(&url.scheme().to_ascii_lowercase());
    if let Some(host) = url.host_str() {
        let lower = host.to_ascii_lowercase();
        let _ = url.set_host(Some(&lower));
    }

    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

/// `url_hash(url) = SHA-256(canonicalize(url))` as lowercase hex (spec §4.3).
pub fn url_hash(raw: &str) -> String {
    let canonical = canonicalize(raw);
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Fold any run of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// `content_hash(text) = SHA-256(whitespace_collapsed(text))` (spec §4.3).
/// Returns `None` for empty content, per the CrawledItem invariant in §3.
pub fn content_hash(text: &str) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        None
    } else {
        Some(hex::encode(Sha256::digest(collapsed.as_bytes())))
    }
}

/// Append `#snapshot-<contentHash12>` to a URL before hashing, so
/// successive versions of the same page produce distinct dedup keys
/// (spec §3, §4.5 scenario S2).
pub fn snapshot_url(original_url: &str, content_hash_hex: &str) -> String {
    let short = &content_hash_hex[..content_hash_hex.len().min(12)];
    format!("{original_url}#snapshot-{short}")
}
