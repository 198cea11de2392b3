//! Core types shared by every Arenastake layer.
//!
//! Identity newtypes, the session status enum, and the notifications the
//! arena and the absorber publish. Everything here is serializable so a
//! notification can leave the process unchanged (indexers, UIs, logs).

use serde::{Deserialize, Serialize};

use std::fmt;

/// Seconds since the Unix epoch, as reported by the host clock.
pub type Timestamp = u64;

/// Quantity of fungible credit or reward units.
///
/// Credit amounts routinely use 18 decimals (`10_000 × 10^18`), so
/// 64 bits are not enough.
pub type Amount = u128;

/// One pseudorandom value delivered by the randomness oracle.
pub type RandomWord = u128;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A participant identity (a wallet, a player account).
///
/// Newtype over `u64` so it cannot be confused with a [`SessionId`] or a
/// [`RequestId`]. `#[serde(transparent)]` keeps the wire form a plain
/// number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// Identifier of an arena session. Assigned monotonically from 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Identifier of an outstanding randomness request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Start of the id range reserved for oracle-issued requests.
    ///
    /// Ids a caller registers directly must lie below it, so an id the
    /// oracle hands out can never already belong to another session.
    pub const ORACLE_BASE: u64 = 1 << 63;

    /// The `n`-th id an oracle issues, counting from 1.
    pub const fn oracle(n: u64) -> Self {
        Self(Self::ORACLE_BASE | n)
    }

    /// `true` if the id lies in the oracle's range.
    pub const fn is_oracle_issued(self) -> bool {
        self.0 >= Self::ORACLE_BASE
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_oracle_issued() {
            write!(f, "Q-o{}", self.0 - Self::ORACLE_BASE)
        } else {
            write!(f, "Q-{}", self.0)
        }
    }
}

/// One of the fixed factions a player can belong to.
///
/// The set is closed: [`FactionId::ALL`] lists every valid value and
/// [`FactionId::new`] refuses anything else, so a `FactionId` in hand is
/// always valid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct FactionId(u8);

impl FactionId {
    /// Number of factions in the game.
    pub const COUNT: usize = 3;

    /// Every faction, in ascending order.
    pub const ALL: [FactionId; Self::COUNT] = [FactionId(1), FactionId(2), FactionId(3)];

    /// Returns the faction numbered `raw`, or `None` if it is outside `1..=3`.
    pub fn new(raw: u8) -> Option<Self> {
        if (1..=Self::COUNT as u8).contains(&raw) {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// The raw faction number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position inside [`FactionId::ALL`].
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<u8> for FactionId {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("invalid faction {raw}"))
    }
}

impl From<FactionId> for u8 {
    fn from(faction: FactionId) -> u8 {
        faction.0
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F-{}", self.0)
    }
}

/// The two balances the core moves around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Asset {
    /// Fungible credit, staked for yield and paid out as rewards.
    Credit,
    /// Scarce reward units issued by arena sessions.
    Artifact,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "Credit"),
            Self::Artifact => write!(f, "Artifact"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Lifecycle of an arena session.
///
/// ```text
/// InGame ──(terminate)──→ Postgame ──(randomness fulfilled)──→ Rewarded
/// ```
///
/// There is no `None` variant: a session that was never created simply
/// has no entry. Transitions only move forward and `Rewarded` is terminal.
/// The numeric codes (1, 2, 3) are the ones external consumers index by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    InGame,
    Postgame,
    Rewarded,
}

impl SessionStatus {
    /// Returns `true` while the session still holds its players
    /// (they cannot join another session).
    pub fn is_live(self) -> bool {
        matches!(self, Self::InGame | Self::Postgame)
    }

    /// The next state, or `None` once rewarded.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::InGame => Some(Self::Postgame),
            Self::Postgame => Some(Self::Rewarded),
            Self::Rewarded => None,
        }
    }

    /// Returns `true` if moving to `target` is a valid single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Stable numeric code (`InGame = 1`, `Postgame = 2`, `Rewarded = 3`).
    pub fn code(self) -> u8 {
        match self {
            Self::InGame => 1,
            Self::Postgame => 2,
            Self::Rewarded => 3,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InGame => write!(f, "InGame"),
            Self::Postgame => write!(f, "Postgame"),
            Self::Rewarded => write!(f, "Rewarded"),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification: what the core tells the outside world
// ---------------------------------------------------------------------------

/// A structured event emitted by the arena or the absorber.
///
/// Every variant carries the session id or the account it concerns, plus
/// the new status or amount. Serde's default external tagging produces
/// `{"SessionCreated": {"session_id": 1, ...}}` on the wire. Internal
/// tagging would buffer fields and cannot carry `u128` amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// A session was created and is now `InGame`.
    SessionCreated {
        session_id: SessionId,
        players: Vec<AccountId>,
    },

    /// A session was terminated and is waiting for randomness.
    SessionPostgame {
        session_id: SessionId,
        request_id: RequestId,
        terminator: AccountId,
    },

    /// Randomness arrived and reward units were issued.
    SessionRewarded {
        session_id: SessionId,
        rewards: Vec<(AccountId, Amount)>,
    },

    /// An account staked credit or artifacts.
    Staked {
        account: AccountId,
        asset: Asset,
        amount: Amount,
    },

    /// An account withdrew staked credit or artifacts.
    Unstaked {
        account: AccountId,
        asset: Asset,
        amount: Amount,
    },

    /// An epoch closed and its pool was credited.
    RewardsDistributed {
        epoch: u64,
        pool: Amount,
        credited: Amount,
    },

    /// One account's share of an epoch distribution.
    RewardCredited {
        account: AccountId,
        epoch: u64,
        amount: Amount,
    },

    /// An account withdrew (or restaked) its claimable balance.
    RewardsClaimed {
        account: AccountId,
        amount: Amount,
        restaked: bool,
    },
}

/// A sequence-numbered notification as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Monotonic per-engine sequence number (starts at 1).
    pub seq: u64,

    /// Host time when the notification was produced.
    pub timestamp: Timestamp,

    /// The event itself.
    pub payload: Notification,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
