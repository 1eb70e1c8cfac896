//! Named dispatch presets.
//!
//! A tier bundles rate limit, concurrency and batch size for one quota level of
//! the external service. They are tuned together; picking limits piecemeal
//! tends to either starve the semaphore or trip the far end's limiter.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Named quota level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Tier1,
    Tier2,
    #[default]
    Tier3,
    Tier4,
    Tier5,
}

impl Tier {
    /// All presets, lowest quota first.
    pub const ALL: [Tier; 5] = [
        Tier::Tier1,
        Tier::Tier2,
        Tier::Tier3,
        Tier::Tier4,
        Tier::Tier5,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Tier1 => "tier1",
            Tier::Tier2 => "tier2",
            Tier::Tier3 => "tier3",
            Tier::Tier4 => "tier4",
            Tier::Tier5 => "tier5",
        }
    }

    /// Returns the limits for this tier.
    pub fn config(&self) -> TierConfig {
        match self {
            Tier::Tier1 => TierConfig {
                requests_per_minute: 2,
                max_concurrent: 1,
                batch_size: 10,
                batch_pause: Duration::from_millis(1000),
            },
            Tier::Tier2 => TierConfig {
                requests_per_minute: 45,
                max_concurrent: 15,
                batch_size: 50,
                batch_pause: Duration::from_millis(1000),
            },
            Tier::Tier3 => TierConfig {
                requests_per_minute: 480,
                max_concurrent: 60,
                batch_size: 120,
                batch_pause: Duration::from_millis(200),
            },
            Tier::Tier4 => TierConfig {
                requests_per_minute: 4500,
                max_concurrent: 100,
                batch_size: 200,
                batch_pause: Duration::from_millis(500),
            },
            Tier::Tier5 => TierConfig {
                requests_per_minute: 4950,
                max_concurrent: 200,
                batch_size: 500,
                batch_pause: Duration::from_millis(500),
            },
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tier1" => Ok(Tier::Tier1),
            "tier2" => Ok(Tier::Tier2),
            "tier3" => Ok(Tier::Tier3),
            "tier4" => Ok(Tier::Tier4),
            "tier5" => Ok(Tier::Tier5),
            _ => Err(ConfigError::UnknownTier {
                value: s.to_string(),
            }),
        }
    }
}

/// Dispatch limits used for one `categorize` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TierConfig {
    /// Ceiling on admitted calls in any trailing 60 seconds.
    pub requests_per_minute: usize,
    /// Ceiling on calls outstanding at once.
    pub max_concurrent: usize,
    /// Titles dispatched together before the next pause.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_pause: Duration,
}

impl Default for TierConfig {
    fn default() -> Self {
        Tier::default().config()
    }
}

impl From<Tier> for TierConfig {
    fn from(tier: Tier) -> Self {
        tier.config()
    }
}

impl TierConfig {
    /// Rejects zero limits, which would stall dispatch forever.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("requests_per_minute", self.requests_per_minute),
            ("max_concurrent", self.max_concurrent),
            ("batch_size", self.batch_size),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    name: field,
                    value: value.to_string(),
                    reason: "must be at least 1",
                });
            }
        }
        Ok(())
    }

    /// Same limits with a different batch pause.
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }
}
