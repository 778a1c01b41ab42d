//! HTML sanitization to the tag/attribute whitelist in spec §4.4 step 2.

use ammonia::Builder;
use std::collections::HashSet;

fn allowed_tags() -> HashSet<&'static str> {
    [
        "p", "div", "span", "h1", "h2", "h3", "h4", "h5", "h6", "a", "img", "table", "tr", "td",
        "ul", "ol", "li", "br", "strong", "em", "pre", "code",
    ]
    .into_iter()
    .collect()
}

/// Strip any tag or attribute not on the whitelist; `href`/`src`/`alt`/`title`
/// are the only attributes kept, on whichever tags allow them.
pub fn sanitize_html(raw_html: &str) -> String {
    Builder::default()
        .tags(allowed_tags())
        .generic_attributes(["title".into()].into_iter().collect())
        .add_tag_attributes("a", &["href", "title"])
        .add_tag_attributes("img", &["src", "alt", "title"])
        .link_rel(None)
        .clean(raw_html)
        .to_string()
}
