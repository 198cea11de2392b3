//! The session record kept in the arena's log.

use arenastake_protocol::{AccountId, Amount, RequestId, SessionId, SessionStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// One arena session.
///
/// Sessions are never deleted. Once rewarded the record stays in the log
/// with its randomness request, terminator, and issued rewards so the
/// outcome can be audited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    /// Participants in the order the creator listed them. The i-th
    /// random word belongs to the i-th player.
    pub players: Vec<AccountId>,

    pub status: SessionStatus,

    /// Who started the session (always one of `players`).
    pub creator: AccountId,

    /// Set once, at termination.
    pub request_id: Option<RequestId>,

    /// Participant who terminated the session; receives the bonus.
    pub terminator: Option<AccountId>,

    pub created_at: Timestamp,
    pub terminated_at: Option<Timestamp>,
    pub rewarded_at: Option<Timestamp>,

    /// Units issued per player at fulfillment, bonus included.
    /// Empty until `Rewarded`.
    pub rewards: Vec<(AccountId, Amount)>,
}

impl Session {
    /// `true` if `account` plays in this session.
    pub fn has_player(&self, account: AccountId) -> bool {
        self.players.contains(&account)
    }

    /// Reward issued to `account`, if the session has been rewarded.
    pub fn reward_of(&self, account: AccountId) -> Option<Amount> {
        self.rewards
            .iter()
            .find(|(player, _)| *player == account)
            .map(|(_, amount)| *amount)
    }
}
