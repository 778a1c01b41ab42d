//! `LocalBrowserPool`: a `spider_chrome`-backed `HeadlessBrowserProvider`
//! that pools browser contexts behind a semaphore, in the shape of
//! `riptide-pool::pool::InstancePool`/`riptide-headless::pool::PooledBrowser`
//! — acquire suspends on exhaustion, release happens in the guard's `Drop`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use spider_chrome::{Browser, BrowserConfig};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use beacon_types::error::{MonitorError, MonitorResult};

use crate::provider::{BrowserContext, HeadlessBrowserProvider, RenderRequest, RenderedPage, WaitCondition};

/// Sized by `RuntimeConfig::playwright_max_contexts` (spec §4.2, §5).
#[derive(Debug, Clone)]
pub struct BrowserPoolConfig {
    pub max_contexts: usize,
    pub launch_timeout: Duration,
}

impl Default for BrowserPoolConfig {
    fn default() -> Self {
        Self {
            max_contexts: 3,
            launch_timeout: Duration::from_secs(20),
        }
    }
}

pub struct LocalBrowserPool {
    config: BrowserPoolConfig,
    semaphore: Arc<Semaphore>,
}

impl LocalBrowserPool {
    pub fn new(config: BrowserPoolConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_contexts));
        Self { config, semaphore }
    }

    async fn launch(&self) -> MonitorResult<Browser> {
        let browser_config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .build()
            .map_err(|e| MonitorError::render("", format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = tokio::time::timeout(self.config.launch_timeout, Browser::launch(browser_config))
            .await
            .map_err(|_| MonitorError::render("", "browser launch timed out"))?
            .map_err(|e| MonitorError::render("", format!("failed to launch browser: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!(error = %e, "browser event error");
                }
            }
            debug!("browser event handler ended");
        });

        Ok(browser)
    }
}

#[async_trait]
impl HeadlessBrowserProvider for LocalBrowserPool {
    async fn acquire(&self) -> MonitorResult<Box<dyn BrowserContext>> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| MonitorError::render("", "browser pool semaphore closed"))?;

        let browser = self.launch().await?;
        Ok(Box::new(PooledContext {
            browser,
            _permit: permit,
        }))
    }
}

struct PooledContext {
    browser: Browser,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[async_trait]
impl BrowserContext for PooledContext {
    async fn render(&mut self, request: RenderRequest) -> MonitorResult<RenderedPage> {
        let page = tokio::time::timeout(request.timeout, self.browser.new_page(&request.url))
            .await
            .map_err(|_| MonitorError::render(&request.url, "page navigation timed out"))?
            .map_err(|e| MonitorError::render(&request.url, format!("failed to open page: {e}")))?;

        match request.wait {
            WaitCondition::NavigationOnly => {
                let _ = page.wait_for_navigation().await;
            }
            WaitCondition::Delay(d) => {
                let _ = page.wait_for_navigation().await;
                tokio::time::sleep(d).await;
            }
            WaitCondition::Selector { css, timeout } => {
                let _ = page.wait_for_navigation().await;
                let deadline = tokio::time::Instant::now() + timeout;
                loop {
                    if page.find_element(&css).await.is_ok() {
                        break;
                    }
                    if tokio::time::Instant::now() >= deadline {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
            }
        }

        let html = page
            .content()
            .await
            .map_err(|e| MonitorError::render(&request.url, format!("failed to read content: {e}")))?;

        let final_url = page.url().await.ok().flatten().unwrap_or_else(|| request.url.clone());

        Ok(RenderedPage { html, final_url })
    }
}
