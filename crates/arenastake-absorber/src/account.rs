//! Per-player stake state and stake-time accrual.

use arenastake_protocol::{AccountId, Amount, FactionId, Timestamp};
use serde::{Deserialize, Serialize};

/// One player's position in the ledger.
///
/// Created on the player's first stake of either asset and never removed,
/// so `player_id` stays stable even after a full unstake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeAccount {
    pub account: AccountId,

    /// Sequential from 1 in order of first stake.
    pub player_id: u64,

    /// Mirrored from the directory at first stake.
    pub faction: FactionId,

    pub staked_tokens: Amount,
    pub staked_artifacts: Amount,

    /// `∫ staked_tokens dt` from the last distribution up to `last_update`.
    pub accumulator: Amount,
    /// `∫ staked_artifacts dt` over the same window.
    pub artifact_accumulator: Amount,
    pub last_update: Timestamp,

    /// Credited by distributions, not yet claimed.
    pub claimable: Amount,
}

impl StakeAccount {
    pub(crate) fn open(
        account: AccountId,
        player_id: u64,
        faction: FactionId,
        now: Timestamp,
    ) -> Self {
        Self {
            account,
            player_id,
            faction,
            staked_tokens: 0,
            staked_artifacts: 0,
            accumulator: 0,
            artifact_accumulator: 0,
            last_update: now,
            claimable: 0,
        }
    }

    /// Stake-time weight accrued up to `now`, without mutating.
    pub fn weight_at(&self, now: Timestamp) -> Amount {
        let elapsed = now.saturating_sub(self.last_update) as Amount;
        self.accumulator
            .saturating_add(self.staked_tokens.saturating_mul(elapsed))
    }

    /// Artifact stake-time weight accrued up to `now`. Splits a faction's
    /// slice of the artifact pool between its members.
    pub fn artifact_weight_at(&self, now: Timestamp) -> Amount {
        let elapsed = now.saturating_sub(self.last_update) as Amount;
        self.artifact_accumulator
            .saturating_add(self.staked_artifacts.saturating_mul(elapsed))
    }

    /// Folds the time since `last_update` into both accumulators at the
    /// current balances. Must run before every balance change.
    pub(crate) fn accrue(&mut self, now: Timestamp) {
        self.accumulator = self.weight_at(now);
        self.artifact_accumulator = self.artifact_weight_at(now);
        self.last_update = self.last_update.max(now);
    }

    /// Starts a fresh weighting window at `now`.
    pub(crate) fn reset_window(&mut self, now: Timestamp) {
        self.accumulator = 0;
        self.artifact_accumulator = 0;
        self.last_update = now;
    }
}
