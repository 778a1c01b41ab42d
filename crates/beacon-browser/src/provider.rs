//! The "Headless-Browser Provider" abstraction: a trait any renderer can
//! implement, so the crawler never depends on `spider_chrome` directly.

use async_trait::async_trait;
use std::time::Duration;

use beacon_types::error::MonitorResult;

/// What the caller waits for before reading back rendered HTML.
#[derive(Debug, Clone)]
pub enum WaitCondition {
    /// Wait for the given duration after navigation completes.
    Delay(Duration),
    /// Wait until a CSS selector appears in the DOM, or the timeout elapses.
    Selector { css: String, timeout: Duration },
    /// Wait for the browser's own navigation-complete signal only.
    NavigationOnly,
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    pub wait: WaitCondition,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub final_url: String,
}

/// An opaque handle to a checked-out browser context. Dropping it returns
/// the slot to the pool.
#[async_trait]
pub trait BrowserContext: Send {
    async fn render(&mut self, request: RenderRequest) -> MonitorResult<RenderedPage>;
}

/// Provider of browser contexts, pooled or otherwise.
#[async_trait]
pub trait HeadlessBrowserProvider: Send + Sync {
    async fn acquire(&self) -> MonitorResult<Box<dyn BrowserContext>>;
}
