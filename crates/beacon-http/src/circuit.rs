//! Per-host circuit breaker: Closed/Open/HalfOpen state machine.
//!
//! Mirrors the guarded-call shape used around `riptide-fetch`'s
//! `ReliableHttpClient` (circuit_breaker.call(|| async { ... })), but keyed
//! per host rather than one breaker per client.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use beacon_types::error::{MonitorError, MonitorResult};

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_cooldown_ms: u64,
    pub half_open_max_in_flight: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_cooldown_ms: 30_000,
            half_open_max_in_flight: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct HostBreaker {
    state: std::sync::Mutex<State>,
    consecutive_failures: AtomicU32,
    opened_at: std::sync::Mutex<Option<Instant>>,
    half_open_in_flight: AtomicU32,
    config: CircuitBreakerConfig,
}

impl HostBreaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: std::sync::Mutex::new(State::Closed),
            consecutive_failures: AtomicU32::new(0),
            opened_at: std::sync::Mutex::new(None),
            half_open_in_flight: AtomicU32::new(0),
            config,
        }
    }

    fn admit(&self) -> Result<bool, MonitorError> {
        let mut state = self.state.lock().unwrap();
        match *state {
            State::Closed => Ok(false),
            State::HalfOpen => {
                if self.half_open_in_flight.load(Ordering::SeqCst) >= self.config.half_open_max_in_flight {
                    Err(MonitorError::transient_fetch("", None, "circuit half-open: at capacity"))
                } else {
                    self.half_open_in_flight.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                }
            }
            State::Open => {
                let opened_at = *self.opened_at.lock().unwrap();
                let elapsed = opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= Duration::from_millis(self.config.open_cooldown_ms) {
                    *state = State::HalfOpen;
                    self.half_open_in_flight.store(1, Ordering::SeqCst);
                    Ok(true)
                } else {
                    Err(MonitorError::transient_fetch("", None, "circuit open"))
                }
            }
        }
    }

    fn on_success(&self, was_half_open: bool) {
        if was_half_open {
            self.half_open_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        self.consecutive_failures.store(0, Ordering::SeqCst);
        *self.state.lock().unwrap() = State::Closed;
    }

    fn on_failure(&self, was_half_open: bool) {
        if was_half_open {
            self.half_open_in_flight.fetch_sub(1, Ordering::SeqCst);
            self.trip();
            return;
        }
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.config.failure_threshold {
            self.trip();
        }
    }

    fn trip(&self) {
        *self.state.lock().unwrap() = State::Open;
        *self.opened_at.lock().unwrap() = Some(Instant::now());
    }
}

/// Tracks one circuit breaker per host, so a hostile or down site can't
/// waste retries for crawls against unrelated hosts.
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<HostBreaker>>,
    trip_count: AtomicU64,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
            trip_count: AtomicU64::new(0),
        }
    }

    fn breaker_for(&self, host: &str) -> Arc<HostBreaker> {
        self.breakers
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(HostBreaker::new(self.config)))
            .clone()
    }

    /// Run `f` guarded by the named host's breaker. Rejects immediately
    /// while the breaker is open and outside its cooldown window.
    pub async fn guarded_call<F, Fut, T>(&self, host: &str, f: F) -> MonitorResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = MonitorResult<T>>,
    {
        let breaker = self.breaker_for(host);
        let was_half_open = breaker.admit()?;

        match f().await {
            Ok(value) => {
                breaker.on_success(was_half_open);
                Ok(value)
            }
            Err(err) => {
                breaker.on_failure(was_half_open);
                if was_half_open || breaker.consecutive_failures.load(Ordering::SeqCst) == self.config.failure_threshold {
                    self.trip_count.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(host, "circuit breaker tripped");
                }
                Err(err)
            }
        }
    }
}
