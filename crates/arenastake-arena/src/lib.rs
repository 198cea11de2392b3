//! Arena sessions for Arenastake.
//!
//! A session is a group of 3–24 players, covering every faction, that
//! plays together and is rewarded with scarce artifacts once it ends.
//! Rewards depend on oracle randomness, so ending a session is split in
//! two steps: termination registers a randomness request, and the
//! oracle's later callback issues the rewards.
//!
//! # Key types
//!
//! - [`SessionManager`]: creates, terminates, and rewards sessions
//! - [`Session`]: one entry in the append-only session log
//! - [`ArenaConfig`]: size bounds and reward shape
//! - [`RewardPolicy`]: how a random word becomes a reward count

mod config;
mod error;
mod manager;
mod policy;
mod session;

pub use config::ArenaConfig;
pub use error::ArenaError;
pub use manager::SessionManager;
pub use policy::{RangeRewardPolicy, RewardPolicy};
pub use session::Session;
