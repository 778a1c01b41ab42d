//! Heuristic "opportunity" field extraction shared by the policy and
//! tech-frontier processors (spec §4.11: "heuristically detect
//! opportunities... regex match on amounts... deadline patterns...
//! extract structured fields").

use regex::Regex;
use std::sync::OnceLock;

fn funding_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(万元|元|%|¥|RMB)").unwrap())
}

fn deadline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:申报截止|截止日期|截止时间)[：: ]*\s*(\d{4}-\d{2}-\d{2})").unwrap())
}

fn contact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:联系电话|咨询电话|联系人)[：: ]*\s*([\w\-]{6,20})").unwrap())
}

/// `Some("500万元")` for input containing `"500 万元"` — the matched number
/// and unit, whitespace collapsed.
pub fn extract_funding_amount(text: &str) -> Option<String> {
    funding_re().captures(text).map(|c| format!("{}{}", &c[1], &c[2]))
}

pub fn extract_deadline_date(text: &str) -> Option<String> {
    deadline_re().captures(text).map(|c| c[1].to_string())
}

pub fn extract_contact(text: &str) -> Option<String> {
    contact_re().captures(text).map(|c| c[1].to_string())
}

/// Whether `text` carries any fundable-opportunity signal at all.
pub fn looks_like_opportunity(text: &str) -> bool {
    extract_funding_amount(text).is_some() || extract_deadline_date(text).is_some()
}
