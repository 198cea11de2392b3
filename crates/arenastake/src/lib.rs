//! # Arenastake
//!
//! Arena sessions with randomness-driven rewards, feeding a time-weighted
//! staking pool.
//!
//! Players form sessions that cover every faction. When a participant
//! ends a session, a randomness request goes out; the oracle's callback
//! issues each player one or two artifacts (plus a bonus for whoever
//! ended it). Artifacts and fungible credit can then be staked in the
//! absorber, which pays out a reward pool once per epoch in proportion
//! to each player's stake-time weight.
//!
//! This facade crate ties the layers together:
//!
//! - [`EngineHandle`]: one actor owning the arena and the ledger, so
//!   every operation is applied atomically in arrival order
//! - [`SimulatedOracle`]: asynchronous randomness for local runs
//! - [`spawn_keeper`]: calls `distribute_rewards` on a timer
//! - [`Error`]: one error type over every layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use arenastake::prelude::*;
//!
//! # async fn run() -> Result<(), Error> {
//! let directory = Arc::new(InMemoryDirectory::new());
//! let assets = Arc::new(InMemoryAssets::new());
//! let host = Host::new(directory.clone(), assets.clone(), Arc::new(SystemClock));
//!
//! let (oracle, responder) = SimulatedOracle::new(OracleConfig::default());
//! let arena = SessionManager::new(ArenaConfig::default(), host.clone(), Arc::new(oracle));
//! let ledger = RewardLedger::new(
//!     AbsorberConfig::new(AccountId(100), AccountId(200), AccountId(300)),
//!     host.clone(),
//! );
//!
//! let engine = EngineHandle::spawn(EngineConfig::default(), host, arena, ledger);
//! responder.spawn(engine.clone());
//! let (_keeper, _task) = spawn_keeper(engine.clone(), AccountId(100), KeeperConfig::default());
//!
//! directory.create_account(AccountId(1), 1)?;
//! // ... start sessions, stake, claim
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod keeper;
mod oracle;

pub use config::{EngineConfig, KeeperConfig, OracleConfig, OverrunPolicy};
pub use engine::{EngineHandle, LedgerInfo};
pub use error::Error;
pub use keeper::{KeeperHandle, KeeperMetrics, KeeperSchedule, RunInfo, spawn_keeper};
pub use oracle::{OracleResponder, SimulatedOracle};

pub use arenastake_absorber as absorber;
pub use arenastake_arena as arena;
pub use arenastake_host as host;
pub use arenastake_protocol as protocol;

/// Everything needed to wire up and drive an Arenastake deployment.
pub mod prelude {
    pub use crate::{
        EngineConfig, EngineHandle, Error, KeeperConfig, KeeperHandle, LedgerInfo, OracleConfig,
        OverrunPolicy, SimulatedOracle, spawn_keeper,
    };
    pub use arenastake_absorber::{
        AbsorberConfig, EpochRecord, EpochSchedule, RewardLedger, StakeAccount,
    };
    pub use arenastake_arena::{ArenaConfig, Session, SessionManager};
    pub use arenastake_host::{
        AccountDirectory, AssetLedger, Clock, Host, InMemoryAssets, InMemoryDirectory,
        ManualClock, SystemClock,
    };
    pub use arenastake_protocol::{
        AccountId, Amount, Asset, Codec, Envelope, FactionId, JsonCodec, Notification,
        RequestId, SessionId, SessionStatus,
    };
}
