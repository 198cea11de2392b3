//! Arena configuration.

use arenastake_protocol::{Amount, FactionId};
use serde::{Deserialize, Serialize};

/// Settings for the session manager.
///
/// Deployments override fields with struct-update syntax:
/// `ArenaConfig { max_players: 12, ..ArenaConfig::default() }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Smallest allowed session, inclusive.
    pub min_players: usize,

    /// Largest allowed session, inclusive.
    pub max_players: usize,

    /// Lowest reward count a participant can draw.
    pub reward_floor: Amount,

    /// Number of distinct reward counts above the floor
    /// (`floor..floor + span`).
    pub reward_span: Amount,

    /// Extra units for whoever terminated the session.
    pub terminator_bonus: Amount,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 24,
            reward_floor: 1,
            reward_span: 2,
            terminator_bonus: 1,
        }
    }
}

impl ArenaConfig {
    /// Largest session the oracle can be asked about: one word per player,
    /// counted as a `u32`.
    pub const PLAYER_LIMIT: usize = u32::MAX as usize;

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called by [`SessionManager::new`](crate::SessionManager::new). Rules:
    /// - `min_players` is at least [`FactionId::COUNT`] (every faction
    ///   must be present, so smaller sessions could never start).
    /// - `max_players` is at least `min_players` and at most
    ///   [`PLAYER_LIMIT`](Self::PLAYER_LIMIT).
    /// - `reward_span` is at least 1.
    pub fn validated(mut self) -> Self {
        if self.min_players < FactionId::COUNT {
            tracing::warn!(
                min_players = self.min_players,
                factions = FactionId::COUNT,
                "min_players below faction count, raising"
            );
            self.min_players = FactionId::COUNT;
        }
        if self.max_players < self.min_players {
            tracing::warn!(
                max_players = self.max_players,
                min_players = self.min_players,
                "max_players below min_players, raising"
            );
            self.max_players = self.min_players;
        }
        if self.max_players > Self::PLAYER_LIMIT {
            tracing::warn!(
                max_players = self.max_players,
                limit = Self::PLAYER_LIMIT,
                "max_players above word limit, capping"
            );
            self.max_players = Self::PLAYER_LIMIT;
            self.min_players = self.min_players.min(Self::PLAYER_LIMIT);
        }
        self.reward_span = self.reward_span.max(1);
        self
    }

    /// `true` if a session of `size` players is allowed.
    pub fn accepts_size(&self, size: usize) -> bool {
        (self.min_players..=self.max_players).contains(&size)
    }
}
