//! Absorber configuration.

use arenastake_protocol::{AccountId, Amount};
use serde::{Deserialize, Serialize};

/// Epoch timing and reward emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Minimum seconds between two distributions.
    pub epoch_length_secs: u64,

    /// Pool units emitted per elapsed second of an epoch.
    pub reward_rate: Amount,
}

impl EpochSchedule {
    /// Short epochs with a high rate, for test deployments.
    pub fn accelerated() -> Self {
        Self {
            epoch_length_secs: 10,
            reward_rate: 300_000,
        }
    }

    /// Ten-minute epochs.
    pub fn standard() -> Self {
        Self {
            epoch_length_secs: 600,
            reward_rate: 15,
        }
    }
}

impl Default for EpochSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

/// Settings for the reward ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsorberConfig {
    #[serde(default)]
    pub schedule: EpochSchedule,

    /// Share of each pool reserved for artifact stakers, in basis points.
    /// Only reserved when some artifacts are staked.
    #[serde(default = "default_artifact_share_bps")]
    pub artifact_share_bps: u16,

    /// The only account allowed to distribute.
    pub operator: AccountId,

    /// Holds staked credit and artifacts.
    pub vault: AccountId,

    /// Pays out claimed rewards.
    pub treasury: AccountId,
}

fn default_artifact_share_bps() -> u16 {
    2_000
}

impl AbsorberConfig {
    /// Standard schedule and default artifact share.
    pub fn new(operator: AccountId, vault: AccountId, treasury: AccountId) -> Self {
        Self {
            schedule: EpochSchedule::standard(),
            artifact_share_bps: default_artifact_share_bps(),
            operator,
            vault,
            treasury,
        }
    }

    /// Replaces the schedule.
    pub fn with_schedule(mut self, schedule: EpochSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Clamps `artifact_share_bps` to 10 000 and the epoch length to at
    /// least one second.
    pub fn validated(mut self) -> Self {
        if self.artifact_share_bps > 10_000 {
            tracing::warn!(
                artifact_share_bps = self.artifact_share_bps,
                "artifact share above 100%, clamping"
            );
            self.artifact_share_bps = 10_000;
        }
        if self.schedule.epoch_length_secs == 0 {
            tracing::warn!("zero epoch length, using 1s");
            self.schedule.epoch_length_secs = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_presets() {
        assert_eq!(EpochSchedule::accelerated().epoch_length_secs, 10);
        assert_eq!(EpochSchedule::accelerated().reward_rate, 300_000);
        assert_eq!(EpochSchedule::standard().epoch_length_secs, 600);
        assert_eq!(EpochSchedule::standard().reward_rate, 15);
        assert_eq!(EpochSchedule::default(), EpochSchedule::standard());
    }

    #[test]
    fn test_validated_clamps_share_and_length() {
        let config = AbsorberConfig {
            artifact_share_bps: 20_000,
            ..AbsorberConfig::new(AccountId(1), AccountId(2), AccountId(3))
        }
        .with_schedule(EpochSchedule {
            epoch_length_secs: 0,
            reward_rate: 1,
        })
        .validated();
        assert_eq!(config.artifact_share_bps, 10_000);
        assert_eq!(config.schedule.epoch_length_secs, 1);
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let json = r#"{"operator": 1, "vault": 2, "treasury": 3}"#;
        let config: AbsorberConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.artifact_share_bps, 2_000);
        assert_eq!(config.schedule, EpochSchedule::standard());
        assert_eq!(config.vault, AccountId(2));
    }
}
