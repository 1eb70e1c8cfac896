//! Sliding-window admission control for external calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::clock::{Clock, TokioClock};
use crate::constants::{RATE_WINDOW_EPSILON_MS, RATE_WINDOW_SECS};

/// Admits at most `max_per_window` calls in any trailing window.
///
/// The window lock is held across the wait, so admissions are strictly
/// serialized and concurrent callers cannot over-admit.
pub struct RateLimiter<C: Clock = TokioClock> {
    max_per_window: usize,
    window: Duration,
    epsilon: Duration,
    admitted: Mutex<VecDeque<Instant>>,
    clock: Arc<C>,
}

impl<C: Clock> std::fmt::Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_per_window", &self.max_per_window)
            .field("window", &self.window)
            .finish()
    }
}

impl RateLimiter<TokioClock> {
    /// Limiter over a 60 s window on the tokio clock.
    pub fn per_minute(max_per_minute: usize) -> Self {
        Self::with_clock(max_per_minute, Arc::new(TokioClock))
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(max_per_minute: usize, clock: Arc<C>) -> Self {
        Self {
            max_per_window: max_per_minute.max(1),
            window: Duration::from_secs(RATE_WINDOW_SECS),
            epsilon: Duration::from_millis(RATE_WINDOW_EPSILON_MS),
            admitted: Mutex::new(VecDeque::new()),
            clock,
        }
    }

    #[inline]
    pub fn max_per_window(&self) -> usize {
        self.max_per_window
    }

    #[inline]
    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Waits until a call may be issued, then records it. Returns the time spent waiting.
    pub async fn admit(&self) -> Duration {
        let mut admitted = self.admitted.lock().await;
        let started = self.clock.now();

        loop {
            let now = self.clock.now();
            while admitted
                .front()
                .is_some_and(|&t| now.saturating_duration_since(t) >= self.window)
            {
                admitted.pop_front();
            }

            if admitted.len() < self.max_per_window {
                admitted.push_back(now);
                let waited = now.saturating_duration_since(started);
                if !waited.is_zero() {
                    debug!(waited_ms = waited.as_millis() as u64, "Rate limiter admitted after wait");
                }
                return waited;
            }

            let Some(&oldest) = admitted.front() else {
                continue;
            };
            let wait = self
                .window
                .saturating_sub(now.saturating_duration_since(oldest))
                + self.epsilon;
            info!(
                wait_secs = wait.as_secs_f64(),
                in_window = admitted.len(),
                limit = self.max_per_window,
                "Rate limit reached, waiting"
            );
            self.clock.sleep(wait).await;
        }
    }

    /// Admissions currently inside the trailing window.
    pub async fn in_window(&self) -> usize {
        let admitted = self.admitted.lock().await;
        let now = self.clock.now();
        admitted
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < self.window)
            .count()
    }
}
