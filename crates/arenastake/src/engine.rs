//! Engine actor: one Tokio task that owns the arena and the ledger.
//!
//! Every operation travels through a bounded mpsc channel and is applied
//! in arrival order, so operations are totally ordered and each one is
//! atomic. Callers get their result on a oneshot reply channel.
//! Notifications produced by an operation are stamped with a sequence
//! number and published on a broadcast channel before the next command
//! is read.

use arenastake_absorber::{EpochRecord, RewardLedger, StakeAccount};
use arenastake_arena::{Session, SessionManager};
use arenastake_host::Host;
use arenastake_protocol::{
    AccountId, Amount, Asset, Envelope, FactionId, RandomWord, RequestId, SessionId, Timestamp,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{EngineConfig, Error};

type Reply<T> = oneshot::Sender<Result<T, Error>>;

/// Commands sent to the engine actor.
enum Command {
    StartSession {
        caller: AccountId,
        players: Vec<AccountId>,
        reply: Reply<SessionId>,
    },
    TerminateSession {
        caller: AccountId,
        session_id: SessionId,
        /// `None` asks the injected oracle for an id.
        request_id: Option<RequestId>,
        reply: Reply<RequestId>,
    },
    FulfillRandomness {
        request_id: RequestId,
        words: Vec<RandomWord>,
        reply: Reply<Vec<(AccountId, Amount)>>,
    },
    Stake {
        caller: AccountId,
        asset: Asset,
        amount: Amount,
        reply: Reply<()>,
    },
    Unstake {
        caller: AccountId,
        asset: Asset,
        amount: Amount,
        reply: Reply<()>,
    },
    Distribute {
        caller: AccountId,
        reply: Reply<EpochRecord>,
    },
    Claim {
        caller: AccountId,
        auto_restake: bool,
        reply: Reply<Amount>,
    },
    GetSession {
        session_id: SessionId,
        reply: oneshot::Sender<Option<Session>>,
    },
    GetActiveSession {
        account: AccountId,
        reply: oneshot::Sender<Option<SessionId>>,
    },
    GetStakeAccount {
        account: AccountId,
        reply: oneshot::Sender<Option<StakeAccount>>,
    },
    GetLedgerInfo {
        reply: oneshot::Sender<LedgerInfo>,
    },
    Shutdown,
}

/// A snapshot of ledger-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerInfo {
    /// Number of the open epoch (from 1).
    pub current_epoch: u64,
    pub next_distribution_at: Timestamp,
    pub total_staked_tokens: Amount,
    pub total_staked_artifacts: Amount,
    /// Indexed by [`FactionId::index`].
    pub faction_artifacts: [Amount; FactionId::COUNT],
    /// Every completed distribution, oldest first.
    pub epochs: Vec<EpochRecord>,
}

/// Handle to a running engine. Used to submit operations.
///
/// Cheap to clone: an `mpsc::Sender` plus a `broadcast::Sender`.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Command>,
    notifications: broadcast::Sender<Envelope>,
}

impl EngineHandle {
    /// Spawns the engine actor and returns a handle to it.
    ///
    /// `host` supplies the timestamps stamped on envelopes; pass the same
    /// host the arena and the ledger were built with.
    pub fn spawn(
        config: EngineConfig,
        host: Host,
        arena: SessionManager,
        ledger: RewardLedger,
    ) -> Self {
        let config = config.validated();
        let (tx, rx) = mpsc::channel(config.channel_size);
        let (notifications, _) = broadcast::channel(config.notification_capacity);

        let actor = EngineActor {
            host,
            arena,
            ledger,
            receiver: rx,
            notifications: notifications.clone(),
            seq: 0,
        };
        tokio::spawn(actor.run());

        Self {
            sender: tx,
            notifications,
        }
    }

    /// Subscribes to notifications published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.notifications.subscribe()
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    // --- Arena -----------------------------------------------------------

    /// See [`SessionManager::start_session`].
    pub async fn start_session(
        &self,
        caller: AccountId,
        players: Vec<AccountId>,
    ) -> Result<SessionId, Error> {
        self.request(|reply| Command::StartSession {
            caller,
            players,
            reply,
        })
        .await?
    }

    /// See [`SessionManager::terminate_session`].
    pub async fn terminate_session(
        &self,
        caller: AccountId,
        session_id: SessionId,
    ) -> Result<RequestId, Error> {
        self.request(|reply| Command::TerminateSession {
            caller,
            session_id,
            request_id: None,
            reply,
        })
        .await?
    }

    /// See [`SessionManager::terminate_session_with_request`].
    pub async fn terminate_session_with_request(
        &self,
        caller: AccountId,
        session_id: SessionId,
        request_id: RequestId,
    ) -> Result<(), Error> {
        self.request(|reply| Command::TerminateSession {
            caller,
            session_id,
            request_id: Some(request_id),
            reply,
        })
        .await?
        .map(|_| ())
    }

    /// See [`SessionManager::fulfill_randomness`].
    pub async fn fulfill_randomness(
        &self,
        request_id: RequestId,
        words: Vec<RandomWord>,
    ) -> Result<Vec<(AccountId, Amount)>, Error> {
        self.request(|reply| Command::FulfillRandomness {
            request_id,
            words,
            reply,
        })
        .await?
    }

    pub async fn session(&self, session_id: SessionId) -> Result<Option<Session>, Error> {
        self.request(|reply| Command::GetSession { session_id, reply })
            .await
    }

    pub async fn active_session_of(&self, account: AccountId) -> Result<Option<SessionId>, Error> {
        self.request(|reply| Command::GetActiveSession { account, reply })
            .await
    }

    // --- Absorber --------------------------------------------------------

    /// See [`RewardLedger::stake_tokens`].
    pub async fn stake_tokens(&self, caller: AccountId, amount: Amount) -> Result<(), Error> {
        self.stake(caller, Asset::Credit, amount).await
    }

    /// See [`RewardLedger::unstake_tokens`].
    pub async fn unstake_tokens(&self, caller: AccountId, amount: Amount) -> Result<(), Error> {
        self.unstake(caller, Asset::Credit, amount).await
    }

    /// See [`RewardLedger::stake_artifacts`].
    pub async fn stake_artifacts(&self, caller: AccountId, amount: Amount) -> Result<(), Error> {
        self.stake(caller, Asset::Artifact, amount).await
    }

    /// See [`RewardLedger::unstake_artifacts`].
    pub async fn unstake_artifacts(&self, caller: AccountId, amount: Amount) -> Result<(), Error> {
        self.unstake(caller, Asset::Artifact, amount).await
    }

    /// See [`RewardLedger::distribute_rewards`].
    pub async fn distribute_rewards(&self, caller: AccountId) -> Result<EpochRecord, Error> {
        self.request(|reply| Command::Distribute { caller, reply })
            .await?
    }

    /// See [`RewardLedger::claim_epoch_rewards`].
    pub async fn claim_epoch_rewards(
        &self,
        caller: AccountId,
        auto_restake: bool,
    ) -> Result<Amount, Error> {
        self.request(|reply| Command::Claim {
            caller,
            auto_restake,
            reply,
        })
        .await?
    }

    pub async fn stake_account(&self, account: AccountId) -> Result<Option<StakeAccount>, Error> {
        self.request(|reply| Command::GetStakeAccount { account, reply })
            .await
    }

    pub async fn ledger_info(&self) -> Result<LedgerInfo, Error> {
        self.request(|reply| Command::GetLedgerInfo { reply }).await
    }

    /// Tells the engine to stop. Later calls fail with
    /// [`Error::EngineUnavailable`].
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.sender
            .send(Command::Shutdown)
            .await
            .map_err(|_| Error::EngineUnavailable)
    }

    // --- Internals -------------------------------------------------------

    async fn stake(&self, caller: AccountId, asset: Asset, amount: Amount) -> Result<(), Error> {
        self.request(|reply| Command::Stake {
            caller,
            asset,
            amount,
            reply,
        })
        .await?
    }

    async fn unstake(&self, caller: AccountId, asset: Asset, amount: Amount) -> Result<(), Error> {
        self.request(|reply| Command::Unstake {
            caller,
            asset,
            amount,
            reply,
        })
        .await?
    }

    /// Sends a command built around a fresh reply channel and waits for
    /// the answer.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| Error::EngineUnavailable)?;
        reply_rx.await.map_err(|_| Error::EngineUnavailable)
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("closed", &self.is_closed())
            .field("subscribers", &self.notifications.receiver_count())
            .finish()
    }
}

/// The actor state. Runs inside a Tokio task.
struct EngineActor {
    host: Host,
    arena: SessionManager,
    ledger: RewardLedger,
    receiver: mpsc::Receiver<Command>,
    notifications: broadcast::Sender<Envelope>,
    seq: u64,
}

impl EngineActor {
    /// Processes commands until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!("engine started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                Command::StartSession {
                    caller,
                    players,
                    reply,
                } => {
                    let result = self.arena.start_session(caller, players);
                    self.respond("start_session", reply, result);
                }
                Command::TerminateSession {
                    caller,
                    session_id,
                    request_id,
                    reply,
                } => {
                    let result = match request_id {
                        Some(id) => self
                            .arena
                            .terminate_session_with_request(caller, session_id, id)
                            .map(|()| id),
                        None => self.arena.terminate_session(caller, session_id),
                    };
                    self.respond("terminate_session", reply, result);
                }
                Command::FulfillRandomness {
                    request_id,
                    words,
                    reply,
                } => {
                    let result = self.arena.fulfill_randomness(request_id, &words);
                    self.respond("fulfill_randomness", reply, result);
                }
                Command::Stake {
                    caller,
                    asset,
                    amount,
                    reply,
                } => {
                    let result = match asset {
                        Asset::Credit => self.ledger.stake_tokens(caller, amount),
                        Asset::Artifact => self.ledger.stake_artifacts(caller, amount),
                    };
                    self.respond("stake", reply, result);
                }
                Command::Unstake {
                    caller,
                    asset,
                    amount,
                    reply,
                } => {
                    let result = match asset {
                        Asset::Credit => self.ledger.unstake_tokens(caller, amount),
                        Asset::Artifact => self.ledger.unstake_artifacts(caller, amount),
                    };
                    self.respond("unstake", reply, result);
                }
                Command::Distribute { caller, reply } => {
                    let result = self.ledger.distribute_rewards(caller);
                    self.respond("distribute_rewards", reply, result);
                }
                Command::Claim {
                    caller,
                    auto_restake,
                    reply,
                } => {
                    let result = self.ledger.claim_epoch_rewards(caller, auto_restake);
                    self.respond("claim_epoch_rewards", reply, result);
                }
                Command::GetSession { session_id, reply } => {
                    let _ = reply.send(self.arena.session(session_id).cloned());
                }
                Command::GetActiveSession { account, reply } => {
                    let _ = reply.send(self.arena.active_session_of(account));
                }
                Command::GetStakeAccount { account, reply } => {
                    let _ = reply.send(self.ledger.stake_account(account).cloned());
                }
                Command::GetLedgerInfo { reply } => {
                    let _ = reply.send(self.ledger_info());
                }
                Command::Shutdown => {
                    tracing::info!("engine shutting down");
                    break;
                }
            }
        }

        tracing::info!(
            sessions = self.arena.session_count(),
            epoch = self.ledger.current_epoch(),
            "engine stopped"
        );
    }

    /// Publishes what the operation produced, then replies.
    fn respond<T, E: Into<Error>>(
        &mut self,
        operation: &'static str,
        reply: Reply<T>,
        result: Result<T, E>,
    ) {
        let result: Result<T, Error> = result.map_err(Into::into);
        if let Err(e) = &result {
            tracing::debug!(operation, code = e.code(), error = %e, "operation rejected");
        }
        self.publish();
        if reply.send(result).is_err() {
            tracing::warn!(operation, "caller dropped before reply");
        }
    }

    fn publish(&mut self) {
        let timestamp = self.host.now();
        let pending = self
            .arena
            .drain_notifications()
            .into_iter()
            .chain(self.ledger.drain_notifications());
        for payload in pending {
            self.seq += 1;
            // No subscribers is fine; the envelope is dropped.
            let _ = self.notifications.send(Envelope {
                seq: self.seq,
                timestamp,
                payload,
            });
        }
    }

    fn ledger_info(&self) -> LedgerInfo {
        LedgerInfo {
            current_epoch: self.ledger.current_epoch(),
            next_distribution_at: self.ledger.next_distribution_at(),
            total_staked_tokens: self.ledger.total_staked_tokens(),
            total_staked_artifacts: self.ledger.total_staked_artifacts(),
            faction_artifacts: FactionId::ALL.map(|f| self.ledger.faction_artifacts(f)),
            epochs: self.ledger.epochs().to_vec(),
        }
    }
}
