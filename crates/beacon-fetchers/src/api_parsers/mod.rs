//! Bespoke API parsers (spec §4.5, §4.6): one module per `parser_kind`
//! name. The registry in `crate::registry` looks these up lazily by name.

pub mod arxiv;
pub mod github_trending;
pub mod hacker_news;
pub mod twitter;

pub use arxiv::ArxivParser;
pub use github_trending::GithubTrendingParser;
pub use hacker_news::HackerNewsParser;
pub use twitter::TwitterParser;
