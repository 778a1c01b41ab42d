//! Selector-based list/detail extraction engine (spec §4.4, C4).

pub mod date;
pub mod detail;
pub mod list;
pub mod sanitize;

pub use date::derive_date;
pub use detail::{extract_detail, DetailExtraction, ImageRef};
pub use list::{extract_list, extract_list_with_fragments, resolve_link, ListEntry};
pub use sanitize::sanitize_html;
