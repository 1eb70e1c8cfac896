use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::TierConfig;

/// Progress report emitted after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    /// `processed / total * 100`, rounded to one decimal; `100.0` for empty input.
    pub percent: f64,
}

impl Progress {
    pub fn new(processed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            ((processed as f64 / total as f64) * 1000.0).round() / 10.0
        };
        Self {
            processed,
            total,
            percent,
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Observer invoked with a [`Progress`] after each batch.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Splits a run into fixed-size index ranges processed one after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchScheduler {
    batch_size: usize,
    pause: Duration,
}

impl From<&TierConfig> for BatchScheduler {
    fn from(tier: &TierConfig) -> Self {
        Self::new(tier.batch_size, tier.batch_pause)
    }
}

impl BatchScheduler {
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
        }
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[inline]
    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Number of batches needed for `total` items.
    #[inline]
    pub fn batch_count(&self, total: usize) -> usize {
        total.div_ceil(self.batch_size)
    }

    /// Contiguous index ranges covering `0..total`, in order.
    pub fn batches(&self, total: usize) -> impl Iterator<Item = Range<usize>> + use<> {
        let size = self.batch_size;
        (0..total)
            .step_by(size)
            .map(move |start| start..(start + size).min(total))
    }

    /// Sleeps between batches; no pause after the last one.
    pub async fn pause_after(&self, batch: &Range<usize>, total: usize) {
        if batch.end < total && !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
    }
}
