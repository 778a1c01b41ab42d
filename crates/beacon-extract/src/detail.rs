//! Detail-page extraction (spec §4.4 steps 1-8).

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use beacon_types::error::{MonitorError, MonitorResult};
use beacon_types::source::DetailSelectors;

use crate::list::resolve_link;
use crate::sanitize::sanitize_html;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DetailExtraction {
    pub content_html: Option<String>,
    pub content: String,
    pub content_hash: Option<String>,
    pub author: Option<String>,
    pub images: Vec<ImageRef>,
    pub pdf_url: Option<String>,
    pub heading_sections: HashMap<String, String>,
    pub label_prefix_sections: HashMap<String, String>,
}

const HEADING_CANDIDATE_SELECTOR: &str = "h2, h3, h4, p, div";
const STRUCTURAL_HEADING_TAGS: &[&str] = &["h2", "h3", "h4"];

pub fn extract_detail(
    raw_html: &str,
    selectors: &DetailSelectors,
    base_url: &str,
) -> MonitorResult<DetailExtraction> {
    let Some(content_selector_str) = selectors.content.as_deref() else {
        return Ok(DetailExtraction::default());
    };

    let document = Html::parse_document(raw_html);
    let content_selector = Selector::parse(content_selector_str)
        .map_err(|e| MonitorError::configuration_field(format!("invalid selector: {e:?}"), content_selector_str))?;

    let Some(content_element) = document.select(&content_selector).next() else {
        return Ok(DetailExtraction::default());
    };

    let raw_fragment = content_element.html();
    let sanitized = sanitize_html(&raw_fragment);
    let sanitized_doc = Html::parse_fragment(&sanitized);

    let plain_text = beacon_types::urlutil::collapse_whitespace(&extract_plain_text(&sanitized_doc));
    let content_hash = beacon_types::urlutil::content_hash(&plain_text);

    let author = selectors
        .author
        .as_deref()
        .and_then(|sel| Selector::parse(sel).ok())
        .and_then(|sel| document.select(&sel).next())
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty());

    let images = collect_images(&sanitized_doc, base_url);
    let pdf_url = detect_pdf_url(&sanitized_doc, base_url);
    let heading_sections = extract_heading_sections(&sanitized_doc, &selectors.heading_sections);
    let label_prefix_sections = extract_label_prefix_sections(&sanitized_doc, &selectors.label_prefix_sections);

    Ok(DetailExtraction {
        content_html: Some(sanitized),
        content: plain_text,
        content_hash,
        author,
        images,
        pdf_url,
        heading_sections,
        label_prefix_sections,
    })
}

fn extract_plain_text(doc: &Html) -> String {
    doc.root_element().text().collect::<Vec<_>>().join(" ")
}

fn collect_images(doc: &Html, base_url: &str) -> Vec<ImageRef> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|img| {
            let src = img.value().attr("src")?;
            let absolute = resolve_link(base_url, src).ok()?;
            Some(ImageRef {
                src: absolute,
                alt: img.value().attr("alt").map(|s| s.to_string()),
            })
        })
        .collect()
}

fn detect_pdf_url(doc: &Html, base_url: &str) -> Option<String> {
    let selector = Selector::parse("a").ok()?;
    doc.select(&selector).find_map(|a| {
        let href = a.value().attr("href")?;
        if href.to_lowercase().ends_with(".pdf") {
            resolve_link(base_url, href).ok()
        } else {
            None
        }
    })
}

fn extract_heading_sections(doc: &Html, configured: &HashMap<String, String>) -> HashMap<String, String> {
    if configured.is_empty() {
        return HashMap::new();
    }

    let Ok(selector) = Selector::parse(HEADING_CANDIDATE_SELECTOR) else {
        return HashMap::new();
    };
    let candidates: Vec<ElementRef> = doc.select(&selector).collect();

    let mut results = HashMap::new();
    for (field_name, heading_text) in configured {
        let needle = heading_text.trim();
        let Some(start) = candidates.iter().position(|el| {
            if !STRUCTURAL_HEADING_TAGS.contains(&el.value().name()) {
                return false;
            }
            let text = el.text().collect::<String>();
            let text = text.trim();
            text == needle || text.contains(needle)
        }) else {
            continue;
        };

        let mut collected = Vec::new();
        for el in candidates.iter().skip(start + 1) {
            let tag = el.value().name();
            if STRUCTURAL_HEADING_TAGS.contains(&tag) {
                break;
            }
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                collected.push(text);
            }
        }

        if !collected.is_empty() {
            results.insert(field_name.clone(), collected.join(" "));
        }
    }
    results
}

fn extract_label_prefix_sections(doc: &Html, configured: &HashMap<String, String>) -> HashMap<String, String> {
    if configured.is_empty() {
        return HashMap::new();
    }

    let Ok(selector) = Selector::parse("p, li") else {
        return HashMap::new();
    };

    let mut results = HashMap::new();
    for el in doc.select(&selector) {
        let text = el.text().collect::<String>();
        let text = text.trim();
        let Some((label, value)) = split_label_prefix(text) else {
            continue;
        };
        for (field_name, configured_label) in configured {
            if label == configured_label.trim() {
                results.insert(field_name.clone(), value.to_string());
            }
        }
    }
    results
}

/// Splits `"Label: Value"` or `"Label：Value"` (full-width colon) into
/// `(label, value)`.
fn split_label_prefix(text: &str) -> Option<(&str, &str)> {
    let idx = text.find(':').or_else(|| text.find('\u{FF1A}'))?;
    let (label, rest) = text.split_at(idx);
    let value = rest.trim_start_matches([':', '\u{FF1A}']).trim();
    let label = label.trim();
    if label.is_empty() || value.is_empty() {
        None
    } else {
        Some((label, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(content: &str) -> DetailSelectors {
        DetailSelectors {
            content: Some(content.to_string()),
            author: Some(".author".to_string()),
            images: None,
            pdf_url: None,
            heading_sections: HashMap::new(),
            label_prefix_sections: HashMap::new(),
        }
    }

    #[test]
    fn absent_content_selector_yields_empty_non_fatal_result() {
        let mut sel = selectors(".content");
        sel.content = None;
        let out = extract_detail("<html></html>", &sel, "https://x/").unwrap();
        assert_eq!(out.content, "");
        assert!(out.content_html.is_none());
    }

    #[test]
    fn sanitizes_strips_script_and_keeps_text() {
        let html = r#"<div class="content"><p>Hello</p><script>evil()</script></div>"#;
        let out = extract_detail(html, &selectors(".content"), "https://x/").unwrap();
        assert!(out.content.contains("Hello"));
        assert!(!out.content_html.unwrap().contains("script"));
        assert!(out.content_hash.is_some());
    }

    #[test]
    fn collects_images_with_resolved_absolute_src() {
        let html = r#"<div class="content"><img src="/img/a.png" alt="A"></div>"#;
        let out = extract_detail(html, &selectors(".content"), "https://x.example/").unwrap();
        assert_eq!(out.images.len(), 1);
        assert_eq!(out.images[0].src, "https://x.example/img/a.png");
        assert_eq!(out.images[0].alt.as_deref(), Some("A"));
    }

    #[test]
    fn detects_first_pdf_link() {
        let html = r#"<div class="content"><a href="/docs/report.pdf">dl</a><a href="/page">x</a></div>"#;
        let out = extract_detail(html, &selectors(".content"), "https://x.example/").unwrap();
        assert_eq!(out.pdf_url.as_deref(), Some("https://x.example/docs/report.pdf"));
    }

    #[test]
    fn extracts_label_prefix_sections_with_fullwidth_colon() {
        let html = r#"<div class="content"><p>Deadline：2026-03-01</p><p>Contact: Jane Doe</p></div>"#;
        let mut sel = selectors(".content");
        sel.label_prefix_sections
            .insert("deadline_date".to_string(), "Deadline".to_string());
        sel.label_prefix_sections
            .insert("contact".to_string(), "Contact".to_string());
        let out = extract_detail(html, &sel, "https://x/").unwrap();
        assert_eq!(out.label_prefix_sections.get("deadline_date").unwrap(), "2026-03-01");
        assert_eq!(out.label_prefix_sections.get("contact").unwrap(), "Jane Doe");
    }

    #[test]
    fn extracts_heading_section_text_up_to_next_heading() {
        let html = r#"<div class="content">
            <h2>Background</h2>
            <p>First paragraph.</p>
            <p>Second paragraph.</p>
            <h2>Next Section</h2>
            <p>Unrelated.</p>
        </div>"#;
        let mut sel = selectors(".content");
        sel.heading_sections
            .insert("background".to_string(), "Background".to_string());
        let out = extract_detail(html, &sel, "https://x/").unwrap();
        let section = out.heading_sections.get("background").unwrap();
        assert!(section.contains("First paragraph."));
        assert!(section.contains("Second paragraph."));
        assert!(!section.contains("Unrelated"));
    }
}
