//! Outbound call admission: rate window, concurrency cap and batching.
//!
//! Every external call passes through [`Dispatcher::call`], which takes a gate
//! permit and then a rate-limiter slot. Permits are held only for the call, so
//! a stalled call ties up one slot but never the limiter.

pub mod batch;
pub mod clock;
mod error;
pub mod gate;
pub mod rate_limiter;


use std::future::Future;
use std::sync::Arc;

use tracing::trace;

pub use batch::{BatchScheduler, Progress, ProgressCallback};
pub use clock::{Clock, ManualClock, TokioClock};
pub use error::{DispatchError, DispatchResult};
pub use gate::{ConcurrencyGate, GatePermit};
pub use rate_limiter::RateLimiter;

use crate::config::TierConfig;

/// Gate plus limiter for one run.
#[derive(Debug)]
pub struct Dispatcher<C: Clock = TokioClock> {
    gate: ConcurrencyGate,
    limiter: RateLimiter<C>,
}

impl Dispatcher<TokioClock> {
    pub fn new(tier: &TierConfig) -> Self {
        Self::with_clock(tier, Arc::new(TokioClock))
    }
}

impl<C: Clock> Dispatcher<C> {
    pub fn with_clock(tier: &TierConfig, clock: Arc<C>) -> Self {
        Self {
            gate: ConcurrencyGate::new(tier.max_concurrent),
            limiter: RateLimiter::with_clock(tier.requests_per_minute, clock),
        }
    }

    /// Runs `call` once a gate permit and a rate slot are both held.
    pub async fn call<F, T>(&self, call: F) -> DispatchResult<T>
    where
        F: Future<Output = T>,
    {
        let _permit = self.gate.acquire().await?;
        let waited = self.limiter.admit().await;
        trace!(
            in_flight = self.gate.in_flight(),
            waited_ms = waited.as_millis() as u64,
            "Dispatching external call"
        );
        Ok(call.await)
    }

    #[inline]
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    #[inline]
    pub fn limiter(&self) -> &RateLimiter<C> {
        &self.limiter
    }
}
