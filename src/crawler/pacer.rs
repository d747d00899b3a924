//! Per-host politeness pacing
//!
//! This module handles:
//! - Limiting concurrent connections to a single host via semaphores
//! - Enforcing the crawl delay between consecutive requests to a host
//! - Aborting any wait as soon as the crawl is cancelled

use crate::state::HostState;
use crate::url::host_key;
use crate::{HarvestError, Result, UrlError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Connection limit and request bookkeeping for one host
struct HostSlot {
    connections: Arc<Semaphore>,
    state: HostState,
}

struct PacerInner {
    delay: Duration,
    hosts: HashMap<String, HostSlot>,
}

/// Enforces the per-host politeness contract
///
/// At most `max_connections` requests to a host are in flight at once, and
/// paced requests to a host start at least `delay` apart. The slot is
/// reserved under the lock, so the contract holds even when several tasks
/// acquire concurrently.
pub struct Pacer {
    max_connections: usize,
    inner: Mutex<PacerInner>,
}

impl Pacer {
    /// Creates a pacer
    ///
    /// # Arguments
    ///
    /// * `delay` - Minimum interval between paced requests to one host
    /// * `max_connections` - Concurrent requests allowed per host (at least 1)
    pub fn new(delay: Duration, max_connections: usize) -> Self {
        Self {
            max_connections: max_connections.max(1),
            inner: Mutex::new(PacerInner {
                delay,
                hosts: HashMap::new(),
            }),
        }
    }

    /// Replaces the crawl delay, e.g. once robots.txt has been read
    pub async fn set_delay(&self, delay: Duration) {
        self.inner.lock().await.delay = delay;
    }

    /// Returns the current crawl delay
    pub async fn delay(&self) -> Duration {
        self.inner.lock().await.delay
    }

    /// Returns the number of requests started against the URL's host
    pub async fn request_count(&self, url: &Url) -> u64 {
        let Some(key) = host_key(url) else {
            return 0;
        };
        self.inner
            .lock()
            .await
            .hosts
            .get(&key)
            .map(|slot| slot.state.request_count)
            .unwrap_or(0)
    }

    /// Waits until a request to `url` may start and reserves its slot
    ///
    /// The returned permit holds one of the host's connections and must be
    /// kept alive for the duration of the request. When `pace` is false only
    /// the connection limit applies.
    ///
    /// # Returns
    ///
    /// * `Ok(permit)` - The request may start now
    /// * `Err(HarvestError::Cancelled)` - The token fired while waiting
    pub async fn acquire(
        &self,
        url: &Url,
        pace: bool,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit> {
        let key = host_key(url).ok_or(UrlError::MissingDomain)?;

        let connections = {
            let mut inner = self.inner.lock().await;
            let max_connections = self.max_connections;
            inner
                .hosts
                .entry(key.clone())
                .or_insert_with(|| HostSlot {
                    connections: Arc::new(Semaphore::new(max_connections)),
                    state: HostState::new(),
                })
                .connections
                .clone()
        };

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HarvestError::Cancelled),
            permit = connections.acquire_owned() => {
                permit.map_err(|_| HarvestError::Cancelled)?
            }
        };

        loop {
            let wait = {
                let mut inner = self.inner.lock().await;
                let delay = if pace { inner.delay } else { Duration::ZERO };
                let now = Instant::now();
                match inner.hosts.get_mut(&key) {
                    Some(slot) => match slot.state.time_until_next_request(delay, now) {
                        Some(wait) => wait,
                        None => {
                            slot.state.record_request(now);
                            return Ok(permit);
                        }
                    },
                    None => return Ok(permit),
                }
            };

            tracing::debug!(host = %key, wait_ms = %wait.as_millis(), "Pacing request");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HarvestError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
