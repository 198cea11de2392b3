//! Reward policy: turning an oracle word into a reward count.
//!
//! The shape is fixed (a small bounded count per participant, drawn from
//! that participant's own word), the reduction is pluggable. The
//! terminator bonus is applied by the manager on top of the policy.

use arenastake_protocol::{Amount, RandomWord};

use crate::ArenaConfig;

/// Maps one random word to a participant's reward count.
///
/// Implementations must be pure: the same word always yields the same
/// count, and a participant's count never depends on anyone else's word.
pub trait RewardPolicy: Send + Sync {
    fn units_for(&self, word: RandomWord) -> Amount;
}

/// `floor + word % span`: a uniform draw from `floor..floor + span`.
///
/// With the default config this yields 1 or 2 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRewardPolicy {
    floor: Amount,
    span: Amount,
}

impl RangeRewardPolicy {
    /// A policy drawing from `floor..floor + span`. A zero span is
    /// treated as 1 (always `floor`).
    pub fn new(floor: Amount, span: Amount) -> Self {
        Self {
            floor,
            span: span.max(1),
        }
    }

    /// The policy described by `config.reward_floor` and `config.reward_span`.
    pub fn from_config(config: &ArenaConfig) -> Self {
        Self::new(config.reward_floor, config.reward_span)
    }
}

impl RewardPolicy for RangeRewardPolicy {
    fn units_for(&self, word: RandomWord) -> Amount {
        self.floor.saturating_add(word % self.span)
    }
}
