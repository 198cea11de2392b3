//! The reward ledger: stake custody, accrual, distribution, claims.
//!
//! # Custody
//!
//! ```text
//!            stake                      claim
//! player ──────────→ vault    treasury ──────→ player
//!        ←──────────                   ──────→ vault   (auto-restake)
//!          unstake
//! ```
//!
//! Every operation validates first, then performs its single external
//! transfer, then mutates ledger state. If the transfer fails nothing
//! has changed.

use std::collections::HashMap;

use arenastake_host::Host;
use arenastake_protocol::{AccountId, Amount, Asset, FactionId, Notification, Timestamp};

use crate::distribution::{Contribution, allocate};
use crate::{AbsorberConfig, AbsorberError, EpochRecord, StakeAccount};

/// Time-weighted stake ledger with epoch-gated distribution.
pub struct RewardLedger {
    config: AbsorberConfig,
    host: Host,

    accounts: HashMap<AccountId, StakeAccount>,
    /// Accounts in player-id order (`players[id - 1]`).
    players: Vec<AccountId>,

    /// Staked artifacts per faction. Always sums to `total_artifacts`.
    faction_artifacts: [Amount; FactionId::COUNT],
    total_tokens: Amount,
    total_artifacts: Amount,

    epoch: u64,
    epoch_start: Timestamp,
    history: Vec<EpochRecord>,

    outbox: Vec<Notification>,
}

impl RewardLedger {
    /// Creates a ledger whose first epoch starts now.
    pub fn new(config: AbsorberConfig, host: Host) -> Self {
        let config = config.validated();
        let epoch_start = host.now();
        Self {
            config,
            host,
            accounts: HashMap::new(),
            players: Vec::new(),
            faction_artifacts: [0; FactionId::COUNT],
            total_tokens: 0,
            total_artifacts: 0,
            epoch: 1,
            epoch_start,
            history: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &AbsorberConfig {
        &self.config
    }

    // =====================================================================
    // Staking
    // =====================================================================

    /// Moves `amount` credit from `caller` into the vault.
    ///
    /// # Errors
    /// - [`AbsorberError::AccountInactive`]
    /// - [`AbsorberError::AmountNotPositive`]
    /// - [`AbsorberError::Transfer`]: the ledger's own reason, unchanged
    pub fn stake_tokens(&mut self, caller: AccountId, amount: Amount) -> Result<(), AbsorberError> {
        self.require_active(caller)?;
        if amount == 0 {
            return Err(AbsorberError::AmountNotPositive);
        }
        let faction = self.faction_for_open(caller)?;
        self.host
            .assets
            .transfer(Asset::Credit, caller, self.config.vault, amount)?;

        let now = self.host.now();
        let account = self.account_or_open(caller, faction, now);
        account.accrue(now);
        account.staked_tokens = account.staked_tokens.saturating_add(amount);
        self.total_tokens = self.total_tokens.saturating_add(amount);

        self.emit_stake(caller, Asset::Credit, amount, true);
        Ok(())
    }

    /// Returns `amount` staked credit from the vault to `caller`.
    ///
    /// # Errors
    /// - [`AbsorberError::AccountInactive`]
    /// - [`AbsorberError::AmountIsZero`]
    /// - [`AbsorberError::NoStakedBalance`]
    /// - [`AbsorberError::UnstakeExceedsBalance`]
    /// - [`AbsorberError::Transfer`]
    pub fn unstake_tokens(
        &mut self,
        caller: AccountId,
        amount: Amount,
    ) -> Result<(), AbsorberError> {
        self.check_unstake(caller, Asset::Credit, amount)?;
        self.host
            .assets
            .transfer(Asset::Credit, self.config.vault, caller, amount)?;

        let now = self.host.now();
        if let Some(account) = self.accounts.get_mut(&caller) {
            account.accrue(now);
            account.staked_tokens -= amount;
        }
        self.total_tokens -= amount;

        self.emit_stake(caller, Asset::Credit, amount, false);
        Ok(())
    }

    /// Moves `amount` artifacts from `caller` into the vault and adds
    /// them to the caller's faction aggregate.
    ///
    /// # Errors
    /// - [`AbsorberError::AccountInactive`]
    /// - [`AbsorberError::AmountIsZero`]
    /// - [`AbsorberError::InsufficientBalance`]
    /// - [`AbsorberError::Transfer`]
    pub fn stake_artifacts(
        &mut self,
        caller: AccountId,
        amount: Amount,
    ) -> Result<(), AbsorberError> {
        self.require_active(caller)?;
        if amount == 0 {
            return Err(AbsorberError::AmountIsZero);
        }
        let available = self.host.assets.balance_of(caller, Asset::Artifact);
        if available < amount {
            return Err(AbsorberError::InsufficientBalance {
                account: caller,
                available,
                requested: amount,
            });
        }
        let faction = self.faction_for_open(caller)?;
        self.host
            .assets
            .transfer(Asset::Artifact, caller, self.config.vault, amount)?;

        let now = self.host.now();
        let account = self.account_or_open(caller, faction, now);
        account.accrue(now);
        account.staked_artifacts = account.staked_artifacts.saturating_add(amount);
        let f = account.faction.index();
        self.faction_artifacts[f] = self.faction_artifacts[f].saturating_add(amount);
        self.total_artifacts = self.total_artifacts.saturating_add(amount);

        self.emit_stake(caller, Asset::Artifact, amount, true);
        Ok(())
    }

    /// Returns `amount` staked artifacts to `caller`.
    ///
    /// # Errors
    /// Same shape as [`unstake_tokens`](Self::unstake_tokens).
    pub fn unstake_artifacts(
        &mut self,
        caller: AccountId,
        amount: Amount,
    ) -> Result<(), AbsorberError> {
        self.check_unstake(caller, Asset::Artifact, amount)?;
        self.host
            .assets
            .transfer(Asset::Artifact, self.config.vault, caller, amount)?;

        let now = self.host.now();
        if let Some(account) = self.accounts.get_mut(&caller) {
            account.accrue(now);
            account.staked_artifacts -= amount;
            self.faction_artifacts[account.faction.index()] -= amount;
        }
        self.total_artifacts -= amount;

        self.emit_stake(caller, Asset::Artifact, amount, false);
        Ok(())
    }

    // =====================================================================
    // Distribution and claims
    // =====================================================================

    /// Closes the current epoch and credits its pool.
    ///
    /// The pool is `reward_rate × elapsed`. The artifact share goes to
    /// artifact stakers by faction, the rest by credit stake-time weight
    /// (see [`proportional`](crate::proportional) for the rounding rule).
    /// Every weighting window restarts at `now`.
    ///
    /// # Errors
    /// - [`AbsorberError::Unauthorized`]: caller is not the operator
    /// - [`AbsorberError::EpochAlreadyDistributed`]: epoch not over
    /// - [`AbsorberError::NoStakeToDistribute`]: nothing staked, or no weight
    pub fn distribute_rewards(&mut self, caller: AccountId) -> Result<EpochRecord, AbsorberError> {
        if caller != self.config.operator {
            return Err(AbsorberError::Unauthorized(caller));
        }
        let now = self.host.now();
        let next_at = self.next_distribution_at();
        if now < next_at {
            return Err(AbsorberError::EpochAlreadyDistributed { next_at });
        }

        let contributions: Vec<Contribution> = self
            .players
            .iter()
            .filter_map(|id| self.accounts.get(id))
            .map(|a| Contribution {
                account: a.account,
                faction: a.faction,
                weight: a.weight_at(now),
                artifact_weight: a.artifact_weight_at(now),
            })
            .filter(|c| c.weight > 0 || c.artifact_weight > 0)
            .collect();
        if self.total_tokens == 0 || contributions.is_empty() {
            return Err(AbsorberError::NoStakeToDistribute);
        }

        let elapsed = Amount::from(now - self.epoch_start);
        let pool = self.config.schedule.reward_rate.saturating_mul(elapsed);
        let allocation = allocate(
            pool,
            self.config.artifact_share_bps,
            &self.faction_artifacts,
            &contributions,
        );

        for &(account_id, amount) in &allocation.credits {
            if let Some(account) = self.accounts.get_mut(&account_id) {
                account.claimable = account.claimable.saturating_add(amount);
            }
            self.outbox.push(Notification::RewardCredited {
                account: account_id,
                epoch: self.epoch,
                amount,
            });
        }
        for account in self.accounts.values_mut() {
            account.reset_window(now);
        }

        let record = EpochRecord {
            number: self.epoch,
            started_at: self.epoch_start,
            distributed_at: now,
            pool,
            credited: allocation.credited(),
        };
        tracing::info!(
            epoch = record.number,
            pool,
            credited = record.credited,
            token_pool = allocation.token_pool,
            artifact_pool = allocation.artifact_pool,
            recipients = allocation.credits.len(),
            "rewards distributed"
        );
        self.outbox.push(Notification::RewardsDistributed {
            epoch: record.number,
            pool,
            credited: record.credited,
        });

        self.history.push(record.clone());
        self.epoch += 1;
        self.epoch_start = now;
        Ok(record)
    }

    /// Pays out the caller's claimable balance, or restakes it.
    ///
    /// Returns the amount claimed. A zero balance succeeds with 0.
    ///
    /// # Errors
    /// - [`AbsorberError::AccountInactive`]
    /// - [`AbsorberError::AccountDoesNotExist`]: caller never staked
    /// - [`AbsorberError::Transfer`]: treasury could not pay
    pub fn claim_epoch_rewards(
        &mut self,
        caller: AccountId,
        auto_restake: bool,
    ) -> Result<Amount, AbsorberError> {
        self.require_active(caller)?;
        let amount = self
            .accounts
            .get(&caller)
            .ok_or(AbsorberError::AccountDoesNotExist(caller))?
            .claimable;
        if amount == 0 {
            tracing::debug!(account = %caller, "nothing to claim");
            return Ok(0);
        }

        let to = if auto_restake { self.config.vault } else { caller };
        self.host
            .assets
            .transfer(Asset::Credit, self.config.treasury, to, amount)?;

        let now = self.host.now();
        if let Some(account) = self.accounts.get_mut(&caller) {
            account.claimable = 0;
            if auto_restake {
                account.accrue(now);
                account.staked_tokens = account.staked_tokens.saturating_add(amount);
            }
        }
        if auto_restake {
            self.total_tokens = self.total_tokens.saturating_add(amount);
        }

        tracing::info!(account = %caller, amount, restaked = auto_restake, "rewards claimed");
        self.outbox.push(Notification::RewardsClaimed {
            account: caller,
            amount,
            restaked: auto_restake,
        });
        Ok(amount)
    }

    // =====================================================================
    // Queries
    // =====================================================================

    /// Sequential player id, or 0 if `account` never staked.
    pub fn player_id_of(&self, account: AccountId) -> u64 {
        self.accounts.get(&account).map_or(0, |a| a.player_id)
    }

    pub fn stake_account(&self, account: AccountId) -> Option<&StakeAccount> {
        self.accounts.get(&account)
    }

    pub fn staked_tokens(&self, account: AccountId) -> Amount {
        self.accounts.get(&account).map_or(0, |a| a.staked_tokens)
    }

    pub fn staked_artifacts(&self, account: AccountId) -> Amount {
        self.accounts.get(&account).map_or(0, |a| a.staked_artifacts)
    }

    pub fn claimable(&self, account: AccountId) -> Amount {
        self.accounts.get(&account).map_or(0, |a| a.claimable)
    }

    /// Credit stake-time weight accrued so far this epoch.
    pub fn pending_weight(&self, account: AccountId) -> Amount {
        let now = self.host.now();
        self.accounts.get(&account).map_or(0, |a| a.weight_at(now))
    }

    /// Artifact stake-time weight accrued so far this epoch.
    pub fn pending_artifact_weight(&self, account: AccountId) -> Amount {
        let now = self.host.now();
        self.accounts
            .get(&account)
            .map_or(0, |a| a.artifact_weight_at(now))
    }

    pub fn faction_artifacts(&self, faction: FactionId) -> Amount {
        self.faction_artifacts[faction.index()]
    }

    pub fn total_staked_tokens(&self) -> Amount {
        self.total_tokens
    }

    pub fn total_staked_artifacts(&self) -> Amount {
        self.total_artifacts
    }

    /// Number of the open epoch (from 1).
    pub fn current_epoch(&self) -> u64 {
        self.epoch
    }

    /// Earliest time the open epoch can be distributed.
    pub fn next_distribution_at(&self) -> Timestamp {
        self.epoch_start
            .saturating_add(self.config.schedule.epoch_length_secs)
    }

    /// Every completed distribution, oldest first.
    pub fn epochs(&self) -> &[EpochRecord] {
        &self.history
    }

    /// Takes the notifications produced since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn require_active(&self, account: AccountId) -> Result<(), AbsorberError> {
        if self.host.directory.is_active(account) {
            Ok(())
        } else {
            Err(AbsorberError::AccountInactive(account))
        }
    }

    /// The caller's ledger faction: the one recorded at first stake, or
    /// the directory's for a caller about to open an account.
    fn faction_for_open(&self, caller: AccountId) -> Result<FactionId, AbsorberError> {
        if let Some(account) = self.accounts.get(&caller) {
            return Ok(account.faction);
        }
        self.host
            .directory
            .faction_of(caller)
            .ok_or(AbsorberError::AccountInactive(caller))
    }

    fn account_or_open(
        &mut self,
        caller: AccountId,
        faction: FactionId,
        now: Timestamp,
    ) -> &mut StakeAccount {
        let players = &mut self.players;
        self.accounts.entry(caller).or_insert_with(|| {
            players.push(caller);
            let player_id = players.len() as u64;
            tracing::info!(account = %caller, player_id, %faction, "stake account opened");
            StakeAccount::open(caller, player_id, faction, now)
        })
    }

    fn check_unstake(
        &self,
        caller: AccountId,
        asset: Asset,
        amount: Amount,
    ) -> Result<(), AbsorberError> {
        self.require_active(caller)?;
        if amount == 0 {
            return Err(AbsorberError::AmountIsZero);
        }
        let staked = match asset {
            Asset::Credit => self.staked_tokens(caller),
            Asset::Artifact => self.staked_artifacts(caller),
        };
        if staked == 0 {
            return Err(AbsorberError::NoStakedBalance {
                account: caller,
                asset,
            });
        }
        if amount > staked {
            return Err(AbsorberError::UnstakeExceedsBalance {
                asset,
                staked,
                requested: amount,
            });
        }
        Ok(())
    }

    fn emit_stake(&mut self, account: AccountId, asset: Asset, amount: Amount, staked: bool) {
        if staked {
            tracing::info!(%account, %asset, amount, "staked");
            self.outbox.push(Notification::Staked {
                account,
                asset,
                amount,
            });
        } else {
            tracing::info!(%account, %asset, amount, "unstaked");
            self.outbox.push(Notification::Unstaked {
                account,
                asset,
                amount,
            });
        }
    }
}

impl std::fmt::Debug for RewardLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardLedger")
            .field("epoch", &self.epoch)
            .field("epoch_start", &self.epoch_start)
            .field("players", &self.players.len())
            .field("total_tokens", &self.total_tokens)
            .field("total_artifacts", &self.total_artifacts)
            .finish()
    }
}
