//! Three-strategy date derivation for list items (spec §4.4 step 3).

use chrono::NaiveDate;
use regex::Regex;

/// Try, in order: (a) selector text parsed by `date_format`, optionally
/// pre-extracted by `date_regex`; (b) a `/tYYYYMMDD` or `YYYY-MM-DD` path
/// segment in the URL; (c) a `/YYYYMM/` directory segment in the URL.
pub fn derive_date(
    selector_text: Option<&str>,
    date_format: Option<&str>,
    date_regex: Option<&str>,
    url: &str,
) -> Option<NaiveDate> {
    if let Some(date) = from_selector_text(selector_text, date_format, date_regex) {
        return Some(date);
    }
    if let Some(date) = from_url_path_pattern(url) {
        return Some(date);
    }
    from_url_directory_pattern(url)
}

fn from_selector_text(text: Option<&str>, format: Option<&str>, regex: Option<&str>) -> Option<NaiveDate> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    let format = format?;

    let candidate = if let Some(pattern) = regex {
        let re = Regex::new(pattern).ok()?;
        re.find(text)?.as_str().to_string()
    } else {
        text.to_string()
    };

    NaiveDate::parse_from_str(&candidate, format).ok()
}

/// Matches a `/tYYYYMMDD` segment (e.g. `/t20260215_001.html`) or a bare
/// `YYYY-MM-DD` segment anywhere in the URL path.
fn from_url_path_pattern(url: &str) -> Option<NaiveDate> {
    let t_pattern = Regex::new(r"/t(\d{8})").unwrap();
    if let Some(caps) = t_pattern.captures(url) {
        if let Some(date) = NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok() {
            return Some(date);
        }
    }

    let dash_pattern = Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap();
    if let Some(caps) = dash_pattern.captures(url) {
        if let Some(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok() {
            return Some(date);
        }
    }

    None
}

/// Matches a `/YYYYMM/` directory segment, defaulting to the first of the
/// month since no day component is present.
fn from_url_directory_pattern(url: &str) -> Option<NaiveDate> {
    let pattern = Regex::new(r"/(\d{6})/").unwrap();
    let caps = pattern.captures(url)?;
    let ym = &caps[1];
    let with_day = format!("{ym}01");
    NaiveDate::parse_from_str(&with_day, "%Y%m%d").ok()
}
