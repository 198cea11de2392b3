//! External collaborators for Arenastake.
//!
//! The arena and the absorber never own accounts, balances, randomness,
//! or time. They consult collaborators through the traits defined here:
//!
//! - [`AccountDirectory`]: is this account active, which faction is it in?
//! - [`AssetLedger`]: balances and atomic transfers of credit and artifacts
//! - [`RandomnessOracle`]: issues request ids; words arrive later as a
//!   separate inbound call
//! - [`Clock`]: the current host time
//!
//! Each trait ships with an in-memory implementation so the core can run
//! (and be tested) without a chain, a database, or a VRF service.
//!
//! # How it fits in the stack
//!
//! ```text
//! Arena / Absorber (above)  ← hold a Host handle, never a global registry
//!     ↕
//! Host (this crate)  ← traits + in-memory implementations
//!     ↕
//! Protocol (below)  ← AccountId, FactionId, Asset, Amount
//! ```

mod assets;
mod clock;
mod directory;
mod error;
mod oracle;

use std::sync::Arc;

pub use assets::{AssetLedger, InMemoryAssets};
pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{AccountDirectory, InMemoryDirectory};
pub use error::{AssetError, DirectoryError, OracleError};
pub use oracle::{QueuedOracle, RandomnessOracle, RandomnessRequest};

/// Handles to the collaborators a core component consults.
///
/// Supplied at construction. Cloning is cheap (three `Arc` bumps), so the
/// arena and the absorber can share the same directory, ledger, and clock.
#[derive(Clone)]
pub struct Host {
    pub directory: Arc<dyn AccountDirectory>,
    pub assets: Arc<dyn AssetLedger>,
    pub clock: Arc<dyn Clock>,
}

impl Host {
    /// Bundles the three collaborators.
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        assets: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            assets,
            clock,
        }
    }

    /// Current host time.
    pub fn now(&self) -> arenastake_protocol::Timestamp {
        self.clock.now()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").field("now", &self.clock.now()).finish()
    }
}
