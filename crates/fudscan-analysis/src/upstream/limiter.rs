//! Per-Upstream Rate Limiter
//!
//! Sliding-window limiter: at most `max_requests` acquisitions per `window`.
//! `acquire` sleeps until a slot frees; ordering across waiters is whatever
//! the mutex gives us.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`
    ///
    /// `max_requests` is clamped to a minimum of 1.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            hits: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until a request slot is available, then claim it
    pub async fn acquire(&self) {
        loop {
            let deadline = {
                let mut hits = self.hits.lock().await;
                let now = Instant::now();

                while hits
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    hits.pop_front();
                }

                if hits.len() < self.max_requests {
                    hits.push_back(now);
                    return;
                }

                match hits.front() {
                    Some(oldest) => *oldest + self.window,
                    None => now,
                }
            };

            tracing::trace!("Rate limit reached, sleeping until window frees");
            tokio::time::sleep_until(deadline).await;
        }
    }

    /// Slots currently in use (for health/debug output)
    pub async fn in_flight(&self) -> usize {
        let mut hits = self.hits.lock().await;
        let now = Instant::now();
        while hits
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            hits.pop_front();
        }
        hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_limit_is_immediate() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_excess_request_waits_for_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await; // must wait out the window
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_frees_slots() {
        let limiter = RateLimiter::new(1, Duration::from_millis(100));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(limiter.in_flight().await, 0);
    }

    #[test]
    fn test_zero_max_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.max_requests, 1);
    }
}
