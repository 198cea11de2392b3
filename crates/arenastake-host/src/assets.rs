//! Asset ledger: balances and transfers of credit and artifacts.
//!
//! The core never implements a token standard. It asks an
//! [`AssetLedger`] to move balances and relies on two guarantees:
//! every call is all-or-nothing, and an underfunded transfer is rejected
//! by the ledger itself.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use arenastake_protocol::{AccountId, Amount, Asset};

use crate::AssetError;

/// Balance primitives for fungible credit and reward units.
pub trait AssetLedger: Send + Sync {
    /// Spendable balance of `asset` held by `account`.
    fn balance_of(&self, account: AccountId, asset: Asset) -> Amount;

    /// Moves `amount` of `asset` from `from` to `to`.
    ///
    /// # Errors
    /// [`AssetError::InsufficientBalance`] if `from` holds less than
    /// `amount`; [`AssetError::Overflow`] if `to` would overflow. Either
    /// way nothing moved.
    fn transfer(
        &self,
        asset: Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), AssetError>;

    /// Issues new units to several accounts at once.
    ///
    /// All grants apply or none do.
    fn mint_batch(&self, asset: Asset, grants: &[(AccountId, Amount)]) -> Result<(), AssetError>;
}

/// An [`AssetLedger`] backed by a `HashMap` behind a `Mutex`.
///
/// One lock guards every balance, so a transfer or a batch mint is atomic
/// with respect to every other call.
#[derive(Debug, Default)]
pub struct InMemoryAssets {
    balances: Mutex<HashMap<(AccountId, Asset), Amount>>,
}

impl InMemoryAssets {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues `amount` of `asset` to a single account.
    pub fn mint(&self, account: AccountId, asset: Asset, amount: Amount) -> Result<(), AssetError> {
        self.mint_batch(asset, &[(account, amount)])
    }

    /// Total supply of `asset` across all accounts.
    pub fn total_supply(&self, asset: Asset) -> Amount {
        let balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        balances
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl AssetLedger for InMemoryAssets {
    fn balance_of(&self, account: AccountId, asset: Asset) -> Amount {
        let balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        balances.get(&(account, asset)).copied().unwrap_or(0)
    }

    fn transfer(
        &self,
        asset: Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);

        let available = balances.get(&(from, asset)).copied().unwrap_or(0);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                account: from,
                asset,
                available,
                requested: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        let received = balances.get(&(to, asset)).copied().unwrap_or(0);
        let credited = received.checked_add(amount).ok_or(AssetError::Overflow {
            account: to,
            asset,
            amount,
        })?;

        balances.insert((from, asset), available - amount);
        balances.insert((to, asset), credited);
        tracing::trace!(%from, %to, %asset, amount, "asset transfer");
        Ok(())
    }

    fn mint_batch(&self, asset: Asset, grants: &[(AccountId, Amount)]) -> Result<(), AssetError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);

        // Stage every new balance first so a late overflow leaves the map
        // untouched. Repeated recipients accumulate in the staging map.
        let mut staged: HashMap<AccountId, Amount> = HashMap::new();
        for &(account, amount) in grants {
            let current = match staged.get(&account) {
                Some(v) => *v,
                None => balances.get(&(account, asset)).copied().unwrap_or(0),
            };
            let next = current.checked_add(amount).ok_or(AssetError::Overflow {
                account,
                asset,
                amount,
            })?;
            staged.insert(account, next);
        }

        for (account, balance) in staged {
            balances.insert((account, asset), balance);
        }
        tracing::trace!(%asset, grants = grants.len(), "asset batch minted");
        Ok(())
    }
}
