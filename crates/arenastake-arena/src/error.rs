//! Error types for the arena layer.

use arenastake_host::{AssetError, OracleError};
use arenastake_protocol::{AccountId, ErrorKind, FactionId, RequestId, SessionId, SessionStatus};

/// Errors that can occur during session operations.
///
/// Every variant has a stable [`code`](Self::code). Callers and tests
/// branch on it, so codes never change once published.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The caller or a listed player is unknown or frozen.
    #[error("account {0} is not active")]
    AccountInactive(AccountId),

    /// The caller tried to start a session without playing in it.
    #[error("creator {0} is not among the session players")]
    CreatorNotInSession(AccountId),

    /// The same account is listed twice.
    #[error("player {0} is listed more than once")]
    DuplicatePlayer(AccountId),

    /// Too few or too many players.
    #[error("session size {size} outside {min}..={max}")]
    InvalidSessionSize { size: usize, min: usize, max: usize },

    /// A listed player is still held by a live session.
    #[error("player {player} is already in session {session}")]
    PlayerAlreadyInSession { player: AccountId, session: SessionId },

    /// Not every faction is represented.
    #[error("session lacks members of factions {missing:?}")]
    InsufficientFactionCoverage { missing: Vec<FactionId> },

    /// No session with this id was ever created.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// Only participants may terminate a session.
    #[error("account {account} is not a player of session {session}")]
    TerminatorNotInSession { account: AccountId, session: SessionId },

    /// The session is past `InGame`.
    #[error("session {session} is {status}, expected InGame")]
    SessionNotInGame { session: SessionId, status: SessionStatus },

    /// The request id is already bound to a session.
    #[error("request {request} already registered for session {session}")]
    DuplicateRequest { request: RequestId, session: SessionId },

    /// A caller-supplied request id lies in the range only the oracle
    /// may issue from.
    #[error("request {0} is reserved for the randomness oracle")]
    ReservedRequestId(RequestId),

    /// The oracle returned an id outside its range or one already bound.
    /// The session was left `InGame`.
    #[error("oracle returned unusable request id {0}")]
    InvalidOracleRequest(RequestId),

    /// The request id matches no session awaiting randomness: never
    /// issued, or already fulfilled.
    #[error("no session awaiting randomness for request {0}")]
    UnknownSession(RequestId),

    /// The oracle delivered the wrong number of words.
    #[error("expected {expected} random words, got {actual}")]
    RandomWordsMismatch { expected: usize, actual: usize },

    /// The oracle refused the request.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The asset ledger refused to issue the rewards.
    #[error(transparent)]
    Issuance(#[from] AssetError),
}

impl ArenaError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountInactive(_) => "ACCOUNT_NOT_ACTIVE",
            Self::CreatorNotInSession(_) => "CREATOR_NOT_IN_SESSION",
            Self::DuplicatePlayer(_) => "DUPLICATE_PLAYER",
            Self::InvalidSessionSize { .. } => "INVALID_SESSION_SIZE",
            Self::PlayerAlreadyInSession { .. } => "PLAYER_IN_SESSION",
            Self::InsufficientFactionCoverage { .. } => "NOT_ENOUGH_FACTION_MEMBERS",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::TerminatorNotInSession { .. } => "TERMINATOR_NOT_IN_SESSION",
            Self::SessionNotInGame { .. } => "SESSION_NOT_IN_GAME",
            Self::DuplicateRequest { .. } => "REQUEST_ALREADY_REGISTERED",
            Self::ReservedRequestId(_) => "REQUEST_ID_RESERVED",
            Self::InvalidOracleRequest(_) => "INVALID_ORACLE_REQUEST",
            Self::UnknownSession(_) => "SESSION_MUST_EXIST",
            Self::RandomWordsMismatch { .. } => "INVALID_RANDOM_WORDS",
            Self::Oracle(e) => e.code(),
            Self::Issuance(e) => e.code(),
        }
    }

    /// Taxonomy bucket.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CreatorNotInSession(_) | Self::TerminatorNotInSession { .. } => {
                ErrorKind::AccessViolation
            }
            Self::AccountInactive(_)
            | Self::DuplicatePlayer(_)
            | Self::InvalidSessionSize { .. }
            | Self::PlayerAlreadyInSession { .. }
            | Self::InsufficientFactionCoverage { .. }
            | Self::SessionNotFound(_)
            | Self::SessionNotInGame { .. }
            | Self::DuplicateRequest { .. }
            | Self::ReservedRequestId(_)
            | Self::UnknownSession(_)
            | Self::RandomWordsMismatch { .. } => ErrorKind::StateInvariantViolation,
            Self::Oracle(_) | Self::InvalidOracleRequest(_) | Self::Issuance(_) => {
                ErrorKind::External
            }
        }
    }
}
