//! Account directory: who is active, and which faction are they in.
//!
//! Arenastake doesn't manage accounts itself. The [`AccountDirectory`]
//! trait is the read-only view the core needs; whoever owns accounts
//! (a registry contract, a user service) implements it.
//! [`InMemoryDirectory`] is the reference implementation, complete with
//! the management surface (create, defect, freeze) tests need.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use arenastake_protocol::{AccountId, FactionId};

use crate::DirectoryError;

/// Read-only account lookups consulted by the arena and the absorber.
///
/// `Send + Sync` because the directory is shared (behind an `Arc`) with
/// the engine task.
pub trait AccountDirectory: Send + Sync {
    /// `true` if the account exists and is not frozen.
    fn is_active(&self, account: AccountId) -> bool;

    /// The account's faction, or `None` if it was never created.
    fn faction_of(&self, account: AccountId) -> Option<FactionId>;
}

#[derive(Debug, Clone, Copy)]
struct AccountRecord {
    faction: FactionId,
    frozen: bool,
}

/// An [`AccountDirectory`] backed by a `HashMap`.
///
/// Interior mutability (`RwLock`) lets tests freeze or create accounts
/// while the same directory is held by the core.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<HashMap<AccountId, AccountRecord>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account in `faction` (numbered `1..=3`).
    ///
    /// # Errors
    /// - [`DirectoryError::InvalidFaction`]: faction out of range
    /// - [`DirectoryError::AlreadyHasFaction`]: account already exists
    pub fn create_account(&self, account: AccountId, faction: u8) -> Result<(), DirectoryError> {
        let faction = FactionId::new(faction).ok_or(DirectoryError::InvalidFaction(faction))?;
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&account) {
            return Err(DirectoryError::AlreadyHasFaction(account));
        }
        accounts.insert(
            account,
            AccountRecord {
                faction,
                frozen: false,
            },
        );
        tracing::info!(%account, %faction, "account created");
        Ok(())
    }

    /// Moves an active account to a different faction.
    ///
    /// # Errors
    /// - [`DirectoryError::InvalidFaction`]: faction out of range
    /// - [`DirectoryError::AccountInactive`]: unknown or frozen account
    /// - [`DirectoryError::CannotDefectToSameFaction`]: no change requested
    pub fn defect(&self, account: AccountId, faction: u8) -> Result<(), DirectoryError> {
        let faction = FactionId::new(faction).ok_or(DirectoryError::InvalidFaction(faction))?;
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let record = accounts
            .get_mut(&account)
            .filter(|r| !r.frozen)
            .ok_or(DirectoryError::AccountInactive(account))?;
        if record.faction == faction {
            return Err(DirectoryError::CannotDefectToSameFaction(account, faction));
        }
        let from = record.faction;
        record.faction = faction;
        tracing::info!(%account, %from, to = %faction, "account defected");
        Ok(())
    }

    /// Freezes or unfreezes an account. Frozen accounts are inactive.
    ///
    /// # Errors
    /// Returns [`DirectoryError::AccountNotFound`] for unknown accounts.
    pub fn set_frozen(&self, account: AccountId, frozen: bool) -> Result<(), DirectoryError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let record = accounts
            .get_mut(&account)
            .ok_or(DirectoryError::AccountNotFound(account))?;
        record.frozen = frozen;
        tracing::info!(%account, frozen, "freeze status changed");
        Ok(())
    }

    /// `Some(frozen)` for known accounts, `None` otherwise.
    pub fn is_frozen(&self, account: AccountId) -> Option<bool> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.get(&account).map(|r| r.frozen)
    }

    /// Number of accounts (frozen or not) in `faction`.
    pub fn total_faction_members(&self, faction: FactionId) -> usize {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.values().filter(|r| r.faction == faction).count()
    }
}

impl AccountDirectory for InMemoryDirectory {
    fn is_active(&self, account: AccountId) -> bool {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.get(&account).is_some_and(|r| !r.frozen)
    }

    fn faction_of(&self, account: AccountId) -> Option<FactionId> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.get(&account).map(|r| r.faction)
    }
}
