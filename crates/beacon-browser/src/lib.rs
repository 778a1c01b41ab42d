//! Headless-browser provider abstraction (spec §4.2, C2).

pub mod local_pool;
pub mod provider;

pub use local_pool::{BrowserPoolConfig, LocalBrowserPool};
pub use provider::{BrowserContext, HeadlessBrowserProvider, RenderRequest, RenderedPage, WaitCondition};
