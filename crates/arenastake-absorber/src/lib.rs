//! The absorber: a time-weighted stake ledger for Arenastake.
//!
//! Players stake fungible credit and the artifacts they won in the arena.
//! Once per epoch the operator distributes a reward pool. Each player's
//! share is proportional to their stake-time weight: the area under their
//! staked-credit curve since the last distribution, not their balance at
//! the moment of distribution.
//!
//! # Key types
//!
//! - [`RewardLedger`]: stake, unstake, distribute, claim
//! - [`StakeAccount`]: one player's balances and accrual state
//! - [`AbsorberConfig`] / [`EpochSchedule`]: custody accounts and epoch timing
//! - [`EpochRecord`]: one entry in the distribution history
//!
//! # Accrual
//!
//! ```text
//! balance
//!   │      ┌──────────┐
//!   │ ┌────┘          │
//!   │ │   weight = ∫ balance dt
//!   └─┴───────────────┴──→ time
//!   epoch start     distribution
//! ```
//!
//! Every balance change first folds `balance × elapsed` into the
//! accumulators (one for credit, one for artifacts), then applies the
//! delta. No per-second bookkeeping.

mod account;
mod config;
mod distribution;
mod error;
mod ledger;

pub use account::StakeAccount;
pub use config::{AbsorberConfig, EpochSchedule};
pub use distribution::{EpochRecord, proportional};
pub use error::AbsorberError;
pub use ledger::RewardLedger;
