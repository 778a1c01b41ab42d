//! List-page extraction (spec §4.4): one entry per `list_item` match.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use beacon_types::error::{MonitorError, MonitorResult};
use beacon_types::source::ListSelectors;

use crate::date::derive_date;

#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub title: String,
    pub absolute_url: String,
    pub published_at: Option<chrono::NaiveDate>,
}

pub fn extract_list(
    html: &str,
    selectors: &ListSelectors,
    base_url: &str,
    keyword_filter: &[String],
) -> MonitorResult<Vec<ListEntry>> {
    let document = Html::parse_document(html);
    Ok(matching_entries(&document, selectors, base_url, keyword_filter)?
        .into_iter()
        .map(|(entry, _)| entry)
        .collect())
}

/// Like [`extract_list`] but also returns each entry's own `list_item`
/// element's outer HTML, so a caller (the `faculty` strategy) can run a
/// detail pass over one card's own fragment instead of the whole page.
pub fn extract_list_with_fragments(
    html: &str,
    selectors: &ListSelectors,
    base_url: &str,
    keyword_filter: &[String],
) -> MonitorResult<Vec<(ListEntry, String)>> {
    let document = Html::parse_document(html);
    Ok(matching_entries(&document, selectors, base_url, keyword_filter)?
        .into_iter()
        .map(|(entry, element)| (entry, element.html()))
        .collect())
}

fn matching_entries<'a>(
    document: &'a Html,
    selectors: &ListSelectors,
    base_url: &str,
    keyword_filter: &[String],
) -> MonitorResult<Vec<(ListEntry, ElementRef<'a>)>> {
    let item_selector = parse_selector(&selectors.list_item)?;
    let title_selector = parse_selector(&selectors.title).ok();
    let link_selector = parse_selector(&selectors.link).ok();
    let date_selector = if selectors.date.is_empty() {
        None
    } else {
        parse_selector(&selectors.date).ok()
    };
    let link_attr = selectors.link_attr.as_str();

    let mut seen_titles = HashSet::new();
    let mut entries = Vec::new();

    for element in document.select(&item_selector) {
        let title = if selectors.title == "_self" {
            element.text().collect::<String>().trim().to_string()
        } else {
            title_selector
                .as_ref()
                .and_then(|sel| element.select(sel).next())
                .map(|e| e.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        };

        if title.is_empty() {
            continue;
        }

        if !keyword_filter.is_empty() {
            let lower = title.to_lowercase();
            let matches = keyword_filter.iter().any(|kw| lower.contains(&kw.to_lowercase()));
            if !matches {
                continue;
            }
        }

        if !seen_titles.insert(title.clone()) {
            continue;
        }

        let link_value = link_selector
            .as_ref()
            .and_then(|sel| element.select(sel).next())
            .and_then(|e| e.value().attr(link_attr))
            .unwrap_or_default();

        if link_value.is_empty() {
            continue;
        }

        let absolute_url = resolve_link(base_url, link_value)?;

        let date_text = date_selector
            .as_ref()
            .and_then(|sel| element.select(sel).next())
            .map(|e| e.text().collect::<String>());

        let published_at = derive_date(
            date_text.as_deref(),
            selectors.date_format.as_deref(),
            selectors.date_regex.as_deref(),
            &absolute_url,
        );

        entries.push((
            ListEntry {
                title,
                absolute_url,
                published_at,
            },
            element,
        ));
    }

    Ok(entries)
}

pub fn resolve_link(base_url: &str, link: &str) -> MonitorResult<String> {
    let base = url::Url::parse(base_url).map_err(|e| MonitorError::decode(base_url, e.to_string()))?;
    base.join(link)
        .map(|u| u.to_string())
        .map_err(|e| MonitorError::decode(link, e.to_string()))
}

fn parse_selector(raw: &str) -> MonitorResult<Selector> {
    Selector::parse(raw).map_err(|e| MonitorError::configuration_field(format!("invalid selector: {e:?}"), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> ListSelectors {
        ListSelectors {
            list_item: "ul.list li".to_string(),
            title: "a".to_string(),
            link: "a".to_string(),
            link_attr: "href".to_string(),
            date: String::new(),
            date_format: None,
            date_regex: None,
        }
    }

    #[test]
    fn extracts_title_link_and_url_derived_date() {
        let html = r#"
            <ul class="list">
              <li><a href="/news/t20260215_001.html">First Item</a></li>
              <li><a href="/news/t20260220_002.html">Second Item</a></li>
            </ul>
        "#;
        let entries = extract_list(html, &selectors(), "https://site.example/", &[]).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "First Item");
        assert_eq!(entries[0].absolute_url, "https://site.example/news/t20260215_001.html");
        assert_eq!(
            entries[0].published_at,
            chrono::NaiveDate::from_ymd_opt(2026, 2, 15)
        );
    }

    #[test]
    fn applies_keyword_filter_case_insensitively() {
        let html = r#"
            <ul class="list">
              <li><a href="/a">Policy Update</a></li>
              <li><a href="/b">Sports Recap</a></li>
            </ul>
        "#;
        let entries = extract_list(html, &selectors(), "https://site.example/", &["policy".to_string()]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Policy Update");
    }

    #[test]
    fn deduplicates_by_title_within_the_page() {
        let html = r#"
            <ul class="list">
              <li><a href="/a">Same Title</a></li>
              <li><a href="/b">Same Title</a></li>
            </ul>
        "#;
        let entries = extract_list(html, &selectors(), "https://site.example/", &[]).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn self_title_uses_the_list_item_element_text() {
        let mut sel = selectors();
        sel.title = "_self".to_string();
        let html = r#"<ul class="list"><li>Raw Text Title<a href="/x"></a></li></ul>"#;
        let entries = extract_list(html, &sel, "https://site.example/", &[]).unwrap();
        assert_eq!(entries[0].title, "Raw Text Title");
    }

    #[test]
    fn fragments_are_per_card_not_the_whole_page() {
        let html = r#"
            <ul class="list">
              <li><a href="/a">Alice Smith</a></li>
              <li><a href="/b">Bob Jones</a></li>
            </ul>
        "#;
        let entries = extract_list_with_fragments(html, &selectors(), "https://site.example/", &[]).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].1.contains("Alice Smith"));
        assert!(!entries[0].1.contains("Bob Jones"));
        assert!(entries[1].1.contains("Bob Jones"));
        assert!(!entries[1].1.contains("Alice Smith"));
    }
}
