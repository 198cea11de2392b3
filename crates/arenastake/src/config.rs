//! Runtime configuration for the engine, the keeper, and the simulated
//! oracle.
//!
//! Durations are written in milliseconds on the wire
//! (`"interval_ms": 600000`) so configs stay readable as JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the engine actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Command channel capacity. Callers wait when it is full.
    pub channel_size: usize,

    /// Notifications buffered per subscriber before the slowest one
    /// starts lagging.
    pub notification_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            notification_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Both capacities must be at least 1 (tokio panics on 0).
    pub fn validated(mut self) -> Self {
        if self.channel_size == 0 {
            tracing::warn!("channel_size 0, using 1");
            self.channel_size = 1;
        }
        if self.notification_capacity == 0 {
            tracing::warn!("notification_capacity 0, using 1");
            self.notification_capacity = 1;
        }
        self
    }
}

/// What the keeper does when a run fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverrunPolicy {
    /// Skip the missed runs and resume one interval from now.
    #[default]
    Skip,
    /// Keep the original cadence; missed runs fire back to back.
    Drop,
}

/// Settings for the distribution keeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// Time between distribution attempts.
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,

    /// Random extra delay (0..max) before the first attempt.
    #[serde(rename = "initial_jitter_ms", with = "millis")]
    pub initial_jitter: Duration,

    pub policy: OverrunPolicy,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            initial_jitter: Duration::from_secs(1),
            policy: OverrunPolicy::Skip,
        }
    }
}

impl KeeperConfig {
    /// Shortest allowed interval.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// A config firing every `interval` with default jitter and policy.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Raises `interval` to [`Self::MIN_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            tracing::warn!(
                interval_ms = self.interval.as_millis() as u64,
                "keeper interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

/// Settings for the simulated randomness oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Delay between a request and its callback.
    #[serde(rename = "fulfillment_delay_ms", with = "millis")]
    pub fulfillment_delay: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            fulfillment_delay: Duration::from_millis(500),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
