use std::time::{Duration, Instant};

/// Tracks the politeness state of a single host during a crawl
///
/// The pacer keeps one of these per host key and consults it under its lock
/// before reserving the next request slot.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests made to this host in the current crawl
    pub request_count: u64,

    /// Instant the most recent request to this host was allowed to start
    pub last_request_time: Option<Instant>,
}

impl HostState {
    /// Creates a new HostState with no recorded requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a request may start at `now` under `delay`
    pub fn can_request(&self, delay: Duration, now: Instant) -> bool {
        self.time_until_next_request(delay, now).is_none()
    }

    /// Records that a request to this host starts at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can start
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }
}
