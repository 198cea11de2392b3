//! Integration tests for the reward ledger against in-memory host
//! collaborators and a manual clock.

use std::sync::Arc;

use arenastake_absorber::{AbsorberConfig, AbsorberError, EpochSchedule, RewardLedger};
use arenastake_host::{AssetLedger, Host, InMemoryAssets, InMemoryDirectory, ManualClock};
use arenastake_protocol::{AccountId, Amount, Asset, FactionId, Notification};

const OPERATOR: AccountId = AccountId(100);
const VAULT: AccountId = AccountId(200);
const TREASURY: AccountId = AccountId(300);
const START: u64 = 1_000;

// =========================================================================
// Fixture
// =========================================================================

struct Absorber {
    ledger: RewardLedger,
    directory: Arc<InMemoryDirectory>,
    assets: Arc<InMemoryAssets>,
    clock: Arc<ManualClock>,
}

fn aid(id: u64) -> AccountId {
    AccountId(id)
}

fn faction(raw: u8) -> FactionId {
    FactionId::new(raw).unwrap()
}

/// Accounts 1..=6 cycle through factions 1, 2, 3 and hold 10 000 credit
/// each. Epochs are 100 s at 10 units per second; the treasury can pay
/// one million.
fn absorber() -> Absorber {
    let directory = Arc::new(InMemoryDirectory::new());
    let assets = Arc::new(InMemoryAssets::new());
    for id in 1..=6u64 {
        directory
            .create_account(aid(id), ((id - 1) % 3 + 1) as u8)
            .unwrap();
        assets.mint(aid(id), Asset::Credit, 10_000).unwrap();
    }
    assets.mint(TREASURY, Asset::Credit, 1_000_000).unwrap();

    let clock = Arc::new(ManualClock::new(START));
    let host = Host::new(directory.clone(), assets.clone(), clock.clone());
    let config = AbsorberConfig::new(OPERATOR, VAULT, TREASURY).with_schedule(EpochSchedule {
        epoch_length_secs: 100,
        reward_rate: 10,
    });
    Absorber {
        ledger: RewardLedger::new(config, host),
        directory,
        assets,
        clock,
    }
}

fn faction_sum(ledger: &RewardLedger) -> Amount {
    FactionId::ALL
        .iter()
        .map(|f| ledger.faction_artifacts(*f))
        .sum()
}

// =========================================================================
// Token staking
// =========================================================================

#[test]
fn test_unstake_tokens_bounded_by_staked_balance() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 1_000).unwrap();

    let err = a.ledger.unstake_tokens(aid(1), 10_000).unwrap_err();
    assert_eq!(err.code(), "INVALID_UNSTAKE_OPERATION");
    assert_eq!(a.ledger.staked_tokens(aid(1)), 1_000);

    a.ledger.unstake_tokens(aid(1), 1_000).unwrap();
    assert_eq!(a.ledger.staked_tokens(aid(1)), 0);
    assert_eq!(a.ledger.total_staked_tokens(), 0);
    assert_eq!(a.assets.balance_of(aid(1), Asset::Credit), 10_000);
    assert_eq!(a.assets.balance_of(VAULT, Asset::Credit), 0);
}

#[test]
fn test_stake_tokens_moves_credit_into_vault() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 2_500).unwrap();
    assert_eq!(a.assets.balance_of(aid(1), Asset::Credit), 7_500);
    assert_eq!(a.assets.balance_of(VAULT, Asset::Credit), 2_500);
    assert_eq!(a.ledger.total_staked_tokens(), 2_500);
}

#[test]
fn test_stake_tokens_zero_rejected() {
    let mut a = absorber();
    let err = a.ledger.stake_tokens(aid(1), 0).unwrap_err();
    assert_eq!(err, AbsorberError::AmountNotPositive);
    assert_eq!(err.code(), "AMOUNT_NOT_HIGHER_THAN_0");
}

#[test]
fn test_stake_tokens_over_balance_surfaces_transfer_error() {
    let mut a = absorber();
    let err = a.ledger.stake_tokens(aid(1), 10_001).unwrap_err();
    assert_eq!(err.code(), "TRANSFER_AMOUNT_EXCEEDS_BALANCE");
    // Nothing changed, not even the player id.
    assert_eq!(a.ledger.player_id_of(aid(1)), 0);
    assert_eq!(a.ledger.total_staked_tokens(), 0);
}

#[test]
fn test_stake_inactive_account_rejected() {
    let mut a = absorber();
    a.directory.set_frozen(aid(2), true).unwrap();
    let err = a.ledger.stake_tokens(aid(2), 10).unwrap_err();
    assert_eq!(err, AbsorberError::AccountInactive(aid(2)));

    let err = a.ledger.stake_tokens(aid(42), 10).unwrap_err();
    assert_eq!(err.code(), "ACCOUNT_NOT_ACTIVE");
}

#[test]
fn test_unstake_validation_order() {
    let mut a = absorber();
    let err = a.ledger.unstake_tokens(aid(1), 0).unwrap_err();
    assert_eq!(err.code(), "AMOUNT_IS_0");

    let err = a.ledger.unstake_tokens(aid(1), 5).unwrap_err();
    assert_eq!(err.code(), "STAKED_BALANCE_IS_0");

    a.directory.set_frozen(aid(1), true).unwrap();
    let err = a.ledger.unstake_tokens(aid(1), 0).unwrap_err();
    assert_eq!(err.code(), "ACCOUNT_NOT_ACTIVE");
}

#[test]
fn test_player_ids_assigned_on_first_stake() {
    let mut a = absorber();
    assert_eq!(a.ledger.player_id_of(aid(3)), 0);

    a.ledger.stake_tokens(aid(3), 1).unwrap();
    a.ledger.stake_tokens(aid(1), 1).unwrap();
    a.ledger.stake_tokens(aid(3), 1).unwrap();
    a.assets.mint(aid(5), Asset::Artifact, 1).unwrap();
    a.ledger.stake_artifacts(aid(5), 1).unwrap();

    assert_eq!(a.ledger.player_id_of(aid(3)), 1);
    assert_eq!(a.ledger.player_id_of(aid(1)), 2);
    assert_eq!(a.ledger.player_id_of(aid(5)), 3);

    // Stable after a full unstake.
    a.ledger.unstake_tokens(aid(3), 2).unwrap();
    assert_eq!(a.ledger.player_id_of(aid(3)), 1);
}

// =========================================================================
// Artifact staking
// =========================================================================

#[test]
fn test_stake_artifacts_requires_balance() {
    let mut a = absorber();
    a.assets.mint(aid(1), Asset::Artifact, 2).unwrap();

    let err = a.ledger.stake_artifacts(aid(1), 3).unwrap_err();
    assert_eq!(
        err,
        AbsorberError::InsufficientBalance {
            account: aid(1),
            available: 2,
            requested: 3,
        }
    );
    assert_eq!(err.code(), "NOT_ENOUGH_BALANCE");

    let err = a.ledger.stake_artifacts(aid(1), 0).unwrap_err();
    assert_eq!(err.code(), "AMOUNT_IS_0");
}

#[test]
fn test_unstake_artifacts_validation() {
    let mut a = absorber();
    a.assets.mint(aid(1), Asset::Artifact, 5).unwrap();

    let err = a.ledger.unstake_artifacts(aid(1), 1).unwrap_err();
    assert_eq!(err.code(), "STAKED_BALANCE_IS_0");

    a.ledger.stake_artifacts(aid(1), 5).unwrap();
    let err = a.ledger.unstake_artifacts(aid(1), 6).unwrap_err();
    assert_eq!(err.code(), "INVALID_UNSTAKE_OPERATION");
    a.ledger.unstake_artifacts(aid(1), 5).unwrap();
    assert_eq!(a.assets.balance_of(aid(1), Asset::Artifact), 5);
}

#[test]
fn test_faction_aggregates_track_player_stakes() {
    let mut a = absorber();
    for id in 1..=6 {
        a.assets.mint(aid(id), Asset::Artifact, 10).unwrap();
    }

    let ops: [(u64, bool, Amount); 9] = [
        (1, true, 4),
        (2, true, 3),
        (4, true, 10),
        (1, false, 2),
        (3, true, 7),
        (4, false, 10),
        (6, true, 1),
        (2, true, 7),
        (3, false, 7),
    ];
    for (id, stake, amount) in ops {
        if stake {
            a.ledger.stake_artifacts(aid(id), amount).unwrap();
        } else {
            a.ledger.unstake_artifacts(aid(id), amount).unwrap();
        }
        let player_sum: Amount = (1..=6).map(|i| a.ledger.staked_artifacts(aid(i))).sum();
        assert_eq!(faction_sum(&a.ledger), player_sum);
        assert_eq!(a.ledger.total_staked_artifacts(), player_sum);
    }

    // 1 and 4 are faction 1, 2 is faction 2, 6 is faction 3.
    assert_eq!(a.ledger.faction_artifacts(faction(1)), 2);
    assert_eq!(a.ledger.faction_artifacts(faction(2)), 10);
    assert_eq!(a.ledger.faction_artifacts(faction(3)), 1);
}

#[test]
fn test_faction_is_fixed_at_first_stake() {
    let mut a = absorber();
    a.assets.mint(aid(1), Asset::Artifact, 4).unwrap();
    a.ledger.stake_artifacts(aid(1), 2).unwrap();

    a.directory.defect(aid(1), 2).unwrap();
    a.ledger.stake_artifacts(aid(1), 2).unwrap();

    assert_eq!(a.ledger.faction_artifacts(faction(1)), 4);
    assert_eq!(a.ledger.faction_artifacts(faction(2)), 0);
    assert_eq!(a.ledger.stake_account(aid(1)).unwrap().faction, faction(1));
}

// =========================================================================
// Distribution
// =========================================================================

#[test]
fn test_distribute_weights_by_stake_time() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.clock.advance(50);
    a.ledger.stake_tokens(aid(2), 100).unwrap();
    a.clock.advance(50);

    assert_eq!(a.ledger.pending_weight(aid(1)), 100 * 100);
    assert_eq!(a.ledger.pending_weight(aid(2)), 100 * 50);

    let record = a.ledger.distribute_rewards(OPERATOR).unwrap();
    assert_eq!(record.number, 1);
    assert_eq!(record.started_at, START);
    assert_eq!(record.distributed_at, START + 100);
    assert_eq!(record.pool, 1_000);

    // 2:1 split of 1 000, floored.
    assert_eq!(a.ledger.claimable(aid(1)), 666);
    assert_eq!(a.ledger.claimable(aid(2)), 333);
    assert_eq!(record.credited, 999);
}

#[test]
fn test_distribute_accrues_at_prior_balance() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 10).unwrap();
    a.clock.advance(30);
    a.ledger.stake_tokens(aid(1), 90).unwrap();
    a.clock.advance(70);

    // 10 × 30 + 100 × 70
    assert_eq!(a.ledger.pending_weight(aid(1)), 7_300);
}

#[test]
fn test_distribute_resets_weighting_window() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.clock.advance(100);
    a.ledger.distribute_rewards(OPERATOR).unwrap();

    assert_eq!(a.ledger.pending_weight(aid(1)), 0);
    a.clock.advance(10);
    assert_eq!(a.ledger.pending_weight(aid(1)), 1_000);
}

#[test]
fn test_distribute_once_per_epoch() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();

    a.clock.advance(99);
    let err = a.ledger.distribute_rewards(OPERATOR).unwrap_err();
    assert_eq!(err, AbsorberError::EpochAlreadyDistributed { next_at: START + 100 });

    a.clock.advance(1);
    a.ledger.distribute_rewards(OPERATOR).unwrap();

    let err = a.ledger.distribute_rewards(OPERATOR).unwrap_err();
    assert_eq!(err.code(), "DISTRIBUTION_ALREADY_HAPPENED");
    assert_eq!(a.ledger.current_epoch(), 2);
    assert_eq!(a.ledger.next_distribution_at(), START + 200);

    a.clock.advance(100);
    let record = a.ledger.distribute_rewards(OPERATOR).unwrap();
    assert_eq!(record.number, 2);
    assert_eq!(a.ledger.epochs().len(), 2);
    assert_eq!(a.ledger.current_epoch(), 3);
}

#[test]
fn test_distribute_late_epoch_pool_covers_elapsed_time() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 1).unwrap();
    a.clock.advance(250);
    let record = a.ledger.distribute_rewards(OPERATOR).unwrap();
    assert_eq!(record.pool, 2_500);
    assert_eq!(a.ledger.next_distribution_at(), START + 350);
}

#[test]
fn test_distribute_requires_operator() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.clock.advance(100);
    let err = a.ledger.distribute_rewards(aid(1)).unwrap_err();
    assert_eq!(err, AbsorberError::Unauthorized(aid(1)));
    assert_eq!(err.code(), "UNAUTHORIZED");
}

#[test]
fn test_distribute_without_stake_rejected() {
    let mut a = absorber();
    a.clock.advance(100);
    let err = a.ledger.distribute_rewards(OPERATOR).unwrap_err();
    assert_eq!(err.code(), "NO_TOKENS_STAKED");

    // Staked and fully withdrawn: still nothing staked.
    a.ledger.stake_tokens(aid(1), 10).unwrap();
    a.clock.advance(5);
    a.ledger.unstake_tokens(aid(1), 10).unwrap();
    let err = a.ledger.distribute_rewards(OPERATOR).unwrap_err();
    assert_eq!(err, AbsorberError::NoStakeToDistribute);
    assert_eq!(a.ledger.current_epoch(), 1);
}

#[test]
fn test_distribute_reserves_artifact_share() {
    let mut a = absorber();
    a.assets.mint(aid(1), Asset::Artifact, 10).unwrap();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.ledger.stake_artifacts(aid(1), 10).unwrap();
    a.ledger.stake_tokens(aid(2), 100).unwrap();
    a.clock.advance(100);

    a.ledger.distribute_rewards(OPERATOR).unwrap();
    // 800 token pool split evenly; faction 1's 200 slice goes to its only
    // artifact staker.
    assert_eq!(a.ledger.claimable(aid(1)), 400 + 200);
    assert_eq!(a.ledger.claimable(aid(2)), 400);
}

#[test]
fn test_distribute_artifact_only_staker_earns_faction_slice() {
    let mut a = absorber();
    a.assets.mint(aid(1), Asset::Artifact, 10).unwrap();
    a.ledger.stake_artifacts(aid(1), 10).unwrap();
    // Player 4 shares faction 1 with player 1 but stakes no artifacts.
    a.ledger.stake_tokens(aid(4), 100).unwrap();
    a.ledger.stake_tokens(aid(2), 100).unwrap();
    a.clock.advance(100);
    assert_eq!(a.ledger.pending_weight(aid(1)), 0);
    assert_eq!(a.ledger.pending_artifact_weight(aid(1)), 1_000);

    let record = a.ledger.distribute_rewards(OPERATOR).unwrap();
    assert_eq!(record.pool, 1_000);
    assert_eq!(a.ledger.claimable(aid(1)), 200);
    assert_eq!(a.ledger.claimable(aid(4)), 400);
    assert_eq!(a.ledger.claimable(aid(2)), 400);
    assert_eq!(record.credited, 1_000);
}

#[test]
fn test_distribute_splits_faction_slice_by_artifact_time() {
    let mut a = absorber();
    a.assets.mint(aid(1), Asset::Artifact, 30).unwrap();
    a.assets.mint(aid(4), Asset::Artifact, 30).unwrap();
    a.ledger.stake_tokens(aid(2), 100).unwrap();
    a.ledger.stake_artifacts(aid(1), 30).unwrap();
    a.clock.advance(50);
    // Same amount, half the time.
    a.ledger.stake_artifacts(aid(4), 30).unwrap();
    a.clock.advance(50);

    a.ledger.distribute_rewards(OPERATOR).unwrap();
    // Faction 1 holds every artifact: its 200 slice splits 3000 : 1500.
    assert_eq!(a.ledger.claimable(aid(1)), 133);
    assert_eq!(a.ledger.claimable(aid(4)), 66);
    assert_eq!(a.ledger.claimable(aid(2)), 800);
}

#[test]
fn test_distribute_conserves_pool() {
    let mut a = absorber();
    let stakes: [(u64, Amount); 6] = [(1, 17), (2, 3_331), (3, 9), (4, 777), (5, 1), (6, 4_096)];
    for (i, (id, amount)) in stakes.iter().enumerate() {
        a.assets.mint(aid(*id), Asset::Artifact, *id as Amount).unwrap();
        a.ledger.stake_artifacts(aid(*id), *id as Amount).unwrap();
        a.ledger.stake_tokens(aid(*id), *amount).unwrap();
        a.clock.advance(7 + i as u64 * 13);
    }
    a.clock.advance(100);

    let record = a.ledger.distribute_rewards(OPERATOR).unwrap();
    let claimable: Amount = (1..=6).map(|id| a.ledger.claimable(aid(id))).sum();
    assert!(record.credited <= record.pool);
    assert_eq!(claimable, record.credited);
}

#[test]
fn test_distribute_emits_credit_notifications() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.clock.advance(100);
    a.ledger.drain_notifications();

    a.ledger.distribute_rewards(OPERATOR).unwrap();
    assert_eq!(
        a.ledger.drain_notifications(),
        vec![
            Notification::RewardCredited {
                account: aid(1),
                epoch: 1,
                amount: 1_000,
            },
            Notification::RewardsDistributed {
                epoch: 1,
                pool: 1_000,
                credited: 1_000,
            },
        ]
    );
}

// =========================================================================
// Claims
// =========================================================================

#[test]
fn test_claim_pays_from_treasury() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.clock.advance(100);
    a.ledger.distribute_rewards(OPERATOR).unwrap();

    let claimed = a.ledger.claim_epoch_rewards(aid(1), false).unwrap();
    assert_eq!(claimed, 1_000);
    assert_eq!(a.ledger.claimable(aid(1)), 0);
    assert_eq!(a.assets.balance_of(aid(1), Asset::Credit), 9_900 + 1_000);
    assert_eq!(a.assets.balance_of(TREASURY, Asset::Credit), 999_000);

    // Nothing left: succeeds with zero.
    assert_eq!(a.ledger.claim_epoch_rewards(aid(1), false).unwrap(), 0);
}

#[test]
fn test_claim_with_restake_folds_into_stake() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.clock.advance(100);
    a.ledger.distribute_rewards(OPERATOR).unwrap();

    a.clock.advance(10);
    a.ledger.claim_epoch_rewards(aid(1), true).unwrap();
    assert_eq!(a.ledger.staked_tokens(aid(1)), 1_100);
    assert_eq!(a.ledger.total_staked_tokens(), 1_100);
    assert_eq!(a.assets.balance_of(VAULT, Asset::Credit), 1_100);
    assert_eq!(a.assets.balance_of(aid(1), Asset::Credit), 9_900);

    // Restake is a fresh stake event: prior balance until now, new after.
    a.clock.advance(10);
    assert_eq!(a.ledger.pending_weight(aid(1)), 100 * 10 + 1_100 * 10);

    let notes = a.ledger.drain_notifications();
    assert!(notes.contains(&Notification::RewardsClaimed {
        account: aid(1),
        amount: 1_000,
        restaked: true,
    }));
}

#[test]
fn test_claim_without_stake_account_rejected() {
    let mut a = absorber();
    let err = a.ledger.claim_epoch_rewards(aid(4), false).unwrap_err();
    assert_eq!(err, AbsorberError::AccountDoesNotExist(aid(4)));
    assert_eq!(err.code(), "ACCOUNT_DOES_NOT_EXIST");
}

#[test]
fn test_claim_with_empty_treasury_keeps_claimable() {
    let mut a = absorber();
    a.ledger.stake_tokens(aid(1), 100).unwrap();
    a.clock.advance(100);
    a.ledger.distribute_rewards(OPERATOR).unwrap();

    // Drain the treasury.
    a.assets
        .transfer(Asset::Credit, TREASURY, aid(6), 1_000_000)
        .unwrap();

    let err = a.ledger.claim_epoch_rewards(aid(1), false).unwrap_err();
    assert_eq!(err.code(), "TRANSFER_AMOUNT_EXCEEDS_BALANCE");
    assert_eq!(a.ledger.claimable(aid(1)), 1_000);
}
