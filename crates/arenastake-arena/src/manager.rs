//! The session manager: owns every arena session and its rewards.
//!
//! Responsibilities:
//! - Validating and creating sessions (size, membership, faction coverage)
//! - Terminating sessions and registering their randomness request
//! - Matching oracle callbacks to live requests and issuing rewards
//! - Keeping the append-only session log and the notification outbox
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain state machine (`&mut self` everywhere).
//! Operations are serialized by whoever owns it, normally the engine
//! actor. Each operation validates everything before it mutates anything,
//! so a rejected call leaves no trace.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arenastake_host::{Host, RandomnessOracle};
use arenastake_protocol::{
    AccountId, Amount, Asset, FactionId, Notification, RandomWord, RequestId, SessionId,
    SessionStatus,
};

use crate::{ArenaConfig, ArenaError, RangeRewardPolicy, RewardPolicy, Session};

/// Manages the arena session lifecycle.
///
/// ```text
/// start_session() ──→ [InGame] ──terminate_session()──→ [Postgame]
///                                                           │
///                                   fulfill_randomness() ───┘──→ [Rewarded]
/// ```
pub struct SessionManager {
    config: ArenaConfig,
    host: Host,
    oracle: Arc<dyn RandomnessOracle>,
    policy: Box<dyn RewardPolicy>,

    /// Append-only log. `SessionId(n)` lives at index `n - 1`.
    sessions: Vec<Session>,

    /// Players held by a live (`InGame`/`Postgame`) session.
    /// A player appears at most once (key invariant).
    active_players: HashMap<AccountId, SessionId>,

    /// Every request id ever registered. Entries are never removed, so a
    /// replayed or stale callback can never be bound to another session.
    requests: HashMap<RequestId, SessionId>,

    outbox: Vec<Notification>,
}

impl SessionManager {
    /// Creates a manager using the config's [`RangeRewardPolicy`].
    pub fn new(config: ArenaConfig, host: Host, oracle: Arc<dyn RandomnessOracle>) -> Self {
        let config = config.validated();
        let policy = Box::new(RangeRewardPolicy::from_config(&config));
        Self {
            config,
            host,
            oracle,
            policy,
            sessions: Vec::new(),
            active_players: HashMap::new(),
            requests: HashMap::new(),
            outbox: Vec::new(),
        }
    }

    /// Replaces the reward policy.
    pub fn with_policy(mut self, policy: Box<dyn RewardPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// The validated configuration in use.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    // =====================================================================
    // Operations
    // =====================================================================

    /// Starts a new session with `players`, created by `caller`.
    ///
    /// # Errors
    /// Checked in this order:
    /// - [`ArenaError::AccountInactive`]: caller inactive
    /// - [`ArenaError::InvalidSessionSize`]: outside `min..=max`
    /// - [`ArenaError::CreatorNotInSession`]: caller not listed
    /// - per player, in list order: [`ArenaError::DuplicatePlayer`],
    ///   [`ArenaError::AccountInactive`], [`ArenaError::PlayerAlreadyInSession`]
    /// - [`ArenaError::InsufficientFactionCoverage`]: a faction is missing
    pub fn start_session(
        &mut self,
        caller: AccountId,
        players: Vec<AccountId>,
    ) -> Result<SessionId, ArenaError> {
        self.require_active(caller)?;

        if !self.config.accepts_size(players.len()) {
            return Err(ArenaError::InvalidSessionSize {
                size: players.len(),
                min: self.config.min_players,
                max: self.config.max_players,
            });
        }
        if !players.contains(&caller) {
            return Err(ArenaError::CreatorNotInSession(caller));
        }

        let mut seen = HashSet::with_capacity(players.len());
        let mut covered = [false; FactionId::COUNT];
        for &player in &players {
            if !seen.insert(player) {
                return Err(ArenaError::DuplicatePlayer(player));
            }
            let faction = self.active_faction(player)?;
            if let Some(&session) = self.active_players.get(&player) {
                return Err(ArenaError::PlayerAlreadyInSession { player, session });
            }
            covered[faction.index()] = true;
        }

        let missing: Vec<FactionId> = FactionId::ALL
            .into_iter()
            .filter(|f| !covered[f.index()])
            .collect();
        if !missing.is_empty() {
            return Err(ArenaError::InsufficientFactionCoverage { missing });
        }

        let id = SessionId(self.sessions.len() as u64 + 1);
        for &player in &players {
            self.active_players.insert(player, id);
        }
        self.sessions.push(Session {
            id,
            players: players.clone(),
            status: SessionStatus::InGame,
            creator: caller,
            request_id: None,
            terminator: None,
            created_at: self.host.now(),
            terminated_at: None,
            rewarded_at: None,
            rewards: Vec::new(),
        });

        tracing::info!(session_id = %id, creator = %caller, players = players.len(), "session created");
        self.outbox.push(Notification::SessionCreated {
            session_id: id,
            players,
        });
        Ok(id)
    }

    /// Terminates a session and requests its randomness from the oracle.
    ///
    /// Returns the request id the oracle issued. Every check runs before
    /// the oracle is contacted, so a rejected call sends no request.
    ///
    /// # Errors
    /// - the checks of [`terminate_session_with_request`](Self::terminate_session_with_request)
    ///   up to and including [`ArenaError::SessionNotInGame`]
    /// - [`ArenaError::Oracle`]: the oracle refused the request
    /// - [`ArenaError::InvalidOracleRequest`]: the oracle broke its id
    ///   contract (id outside [`RequestId::oracle`]'s range, or reused)
    pub fn terminate_session(
        &mut self,
        caller: AccountId,
        session_id: SessionId,
    ) -> Result<RequestId, ArenaError> {
        let size = self.check_terminable(caller, session_id)?.players.len();
        let num_words = u32::try_from(size).map_err(|_| ArenaError::InvalidSessionSize {
            size,
            min: self.config.min_players,
            max: self.config.max_players,
        })?;

        let request_id = self.oracle.request_randomness(session_id, num_words)?;
        if !request_id.is_oracle_issued() || self.requests.contains_key(&request_id) {
            tracing::warn!(%session_id, %request_id, "oracle issued an unusable request id");
            return Err(ArenaError::InvalidOracleRequest(request_id));
        }
        self.register_termination(caller, session_id, request_id)?;
        Ok(request_id)
    }

    /// Terminates a session using a request id obtained elsewhere.
    ///
    /// # Errors
    /// - [`ArenaError::AccountInactive`]: caller inactive
    /// - [`ArenaError::SessionNotFound`]: unknown session id
    /// - [`ArenaError::TerminatorNotInSession`]: caller not a participant
    /// - [`ArenaError::SessionNotInGame`]: already terminated
    /// - [`ArenaError::ReservedRequestId`]: id in the oracle's range
    /// - [`ArenaError::DuplicateRequest`]: request id already bound
    pub fn terminate_session_with_request(
        &mut self,
        caller: AccountId,
        session_id: SessionId,
        request_id: RequestId,
    ) -> Result<(), ArenaError> {
        self.check_terminable(caller, session_id)?;
        if request_id.is_oracle_issued() {
            return Err(ArenaError::ReservedRequestId(request_id));
        }
        self.register_termination(caller, session_id, request_id)
    }

    /// Delivers the oracle's words for `request_id` and issues rewards.
    ///
    /// The caller is not checked: holding a live request id is the only
    /// credential. Each player draws from their own word; the terminator
    /// gets the configured bonus on top.
    ///
    /// # Errors
    /// - [`ArenaError::UnknownSession`]: request never registered, its
    ///   session is no longer `Postgame` (already fulfilled), or the
    ///   session awaits a different request
    /// - [`ArenaError::RandomWordsMismatch`]: word count ≠ player count
    /// - [`ArenaError::Issuance`]: the ledger refused the mint
    pub fn fulfill_randomness(
        &mut self,
        request_id: RequestId,
        words: &[RandomWord],
    ) -> Result<Vec<(AccountId, Amount)>, ArenaError> {
        let index = self
            .requests
            .get(&request_id)
            .map(|id| Self::index_of(*id))
            .filter(|&i| {
                self.sessions.get(i).is_some_and(|s| {
                    s.status == SessionStatus::Postgame && s.request_id == Some(request_id)
                })
            })
            .ok_or(ArenaError::UnknownSession(request_id))?;

        let session = &self.sessions[index];
        if words.len() != session.players.len() {
            return Err(ArenaError::RandomWordsMismatch {
                expected: session.players.len(),
                actual: words.len(),
            });
        }

        let rewards: Vec<(AccountId, Amount)> = session
            .players
            .iter()
            .zip(words)
            .map(|(&player, &word)| {
                let mut units = self.policy.units_for(word);
                if session.terminator == Some(player) {
                    units = units.saturating_add(self.config.terminator_bonus);
                }
                (player, units)
            })
            .collect();

        self.host.assets.mint_batch(Asset::Artifact, &rewards)?;

        let now = self.host.now();
        let session = &mut self.sessions[index];
        debug_assert!(session.status.can_transition_to(SessionStatus::Rewarded));
        session.status = SessionStatus::Rewarded;
        session.rewarded_at = Some(now);
        session.rewards = rewards.clone();
        let session_id = session.id;
        for player in &session.players {
            self.active_players.remove(player);
        }

        tracing::info!(
            %session_id,
            %request_id,
            issued = rewards.iter().map(|(_, a)| *a).sum::<Amount>(),
            "session rewarded"
        );
        self.outbox.push(Notification::SessionRewarded {
            session_id,
            rewards: rewards.clone(),
        });
        Ok(rewards)
    }

    // =====================================================================
    // Queries
    // =====================================================================

    /// Looks up a session by id.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(Self::index_of(id))
    }

    /// The live session holding `account`, if any.
    pub fn active_session_of(&self, account: AccountId) -> Option<SessionId> {
        self.active_players.get(&account).copied()
    }

    /// The session a request id was registered for (fulfilled or not).
    pub fn session_for_request(&self, request_id: RequestId) -> Option<SessionId> {
        self.requests.get(&request_id).copied()
    }

    /// Every session ever created, oldest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Number of sessions ever created.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Takes the notifications produced since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn index_of(id: SessionId) -> usize {
        (id.0 as usize).wrapping_sub(1)
    }

    fn require_active(&self, account: AccountId) -> Result<(), ArenaError> {
        if self.host.directory.is_active(account) {
            Ok(())
        } else {
            Err(ArenaError::AccountInactive(account))
        }
    }

    fn active_faction(&self, account: AccountId) -> Result<FactionId, ArenaError> {
        self.require_active(account)?;
        self.host
            .directory
            .faction_of(account)
            .ok_or(ArenaError::AccountInactive(account))
    }

    fn check_terminable(
        &self,
        caller: AccountId,
        session_id: SessionId,
    ) -> Result<&Session, ArenaError> {
        self.require_active(caller)?;
        let session = self
            .session(session_id)
            .ok_or(ArenaError::SessionNotFound(session_id))?;
        if !session.has_player(caller) {
            return Err(ArenaError::TerminatorNotInSession {
                account: caller,
                session: session_id,
            });
        }
        if session.status != SessionStatus::InGame {
            return Err(ArenaError::SessionNotInGame {
                session: session_id,
                status: session.status,
            });
        }
        Ok(session)
    }

    fn register_termination(
        &mut self,
        caller: AccountId,
        session_id: SessionId,
        request_id: RequestId,
    ) -> Result<(), ArenaError> {
        if let Some(&bound) = self.requests.get(&request_id) {
            return Err(ArenaError::DuplicateRequest {
                request: request_id,
                session: bound,
            });
        }
        let now = self.host.now();
        let index = Self::index_of(session_id);
        let session = self
            .sessions
            .get_mut(index)
            .ok_or(ArenaError::SessionNotFound(session_id))?;

        session.status = SessionStatus::Postgame;
        session.request_id = Some(request_id);
        session.terminator = Some(caller);
        session.terminated_at = Some(now);
        self.requests.insert(request_id, session_id);

        tracing::info!(%session_id, %request_id, terminator = %caller, "session in postgame");
        self.outbox.push(Notification::SessionPostgame {
            session_id,
            request_id,
            terminator: caller,
        });
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .field("active_players", &self.active_players.len())
            .finish()
    }
}
