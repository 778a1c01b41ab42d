//! Per-domain concurrency cap and minimum inter-request pacing (spec §4.1, §5).

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

struct DomainState {
    semaphore: Arc<Semaphore>,
    last_request_at: Mutex<Option<Instant>>,
}

/// Guards per-host concurrency (`MAX_CONCURRENT_PER_DOMAIN`) and enforces
/// a minimum delay between requests to the same host.
pub struct DomainGate {
    capacity: usize,
    default_delay: Duration,
    domains: DashMap<String, Arc<DomainState>>,
}

/// RAII guard: holds the domain's semaphore permit until dropped.
pub struct DomainPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl DomainGate {
    pub fn new(capacity: usize, default_delay: Duration) -> Self {
        Self {
            capacity,
            default_delay,
            domains: DashMap::new(),
        }
    }

    fn state_for(&self, host: &str) -> Arc<DomainState> {
        self.domains
            .entry(host.to_string())
            .or_insert_with(|| {
                Arc::new(DomainState {
                    semaphore: Arc::new(Semaphore::new(self.capacity)),
                    last_request_at: Mutex::new(None),
                })
            })
            .clone()
    }

    /// Acquire the per-host slot and wait out any remaining minimum delay.
    /// Returns a guard that releases the slot on drop.
    pub async fn acquire(&self, host: &str, delay_override: Option<Duration>) -> DomainPermit {
        let state = self.state_for(host);
        let permit = state
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("domain semaphore is never closed");

        let delay = delay_override.unwrap_or(self.default_delay);
        if !delay.is_zero() {
            let mut last = state.last_request_at.lock().await;
            if let Some(prev) = *last {
                let elapsed = prev.elapsed();
                if elapsed < delay {
                    tokio::time::sleep(delay - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        DomainPermit { _permit: permit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn enforces_minimum_delay_between_requests() {
        let gate = DomainGate::new(2, Duration::from_millis(50));
        let start = Instant::now();
        {
            let _p1 = gate.acquire("example.com", None).await;
        }
        {
            let _p2 = gate.acquire("example.com", None).await;
        }
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn different_hosts_do_not_share_pacing() {
        let gate = DomainGate::new(1, Duration::from_millis(200));
        let start = Instant::now();
        let _a = gate.acquire("a.com", None).await;
        let _b = gate.acquire("b.com", None).await;
        assert!(start.elapsed() < Duration::from_millis(150));
    }
}
