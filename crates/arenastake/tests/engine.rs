//! Integration tests for the engine actor and the simulated oracle.

use std::sync::Arc;
use std::time::Duration;

use arenastake::prelude::*;
use arenastake::host::QueuedOracle;
use arenastake::protocol::ErrorKind;
use tokio::sync::broadcast;

const OPERATOR: AccountId = AccountId(100);
const VAULT: AccountId = AccountId(200);
const TREASURY: AccountId = AccountId(300);

// =========================================================================
// Helpers
// =========================================================================

struct Fixture {
    engine: EngineHandle,
    directory: Arc<InMemoryDirectory>,
    assets: Arc<InMemoryAssets>,
    clock: Arc<ManualClock>,
}

fn aid(id: u64) -> AccountId {
    AccountId(id)
}

fn trio() -> Vec<AccountId> {
    vec![aid(1), aid(2), aid(3)]
}

/// Accounts 1..=6 in factions 1, 2, 3, each holding 1 000 credit.
fn parts() -> (Arc<InMemoryDirectory>, Arc<InMemoryAssets>, Arc<ManualClock>, Host) {
    let directory = Arc::new(InMemoryDirectory::new());
    let assets = Arc::new(InMemoryAssets::new());
    for id in 1..=6u64 {
        directory
            .create_account(aid(id), ((id - 1) % 3 + 1) as u8)
            .unwrap();
        assets.mint(aid(id), Asset::Credit, 1_000).unwrap();
    }
    assets.mint(TREASURY, Asset::Credit, 1_000_000).unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let host = Host::new(directory.clone(), assets.clone(), clock.clone());
    (directory, assets, clock, host)
}

fn absorber_config() -> AbsorberConfig {
    AbsorberConfig::new(OPERATOR, VAULT, TREASURY).with_schedule(EpochSchedule {
        epoch_length_secs: 100,
        reward_rate: 10,
    })
}

fn spawn_with(oracle: Arc<dyn arenastake::host::RandomnessOracle>) -> Fixture {
    let (directory, assets, clock, host) = parts();
    let arena = SessionManager::new(ArenaConfig::default(), host.clone(), oracle);
    let ledger = RewardLedger::new(absorber_config(), host.clone());
    let engine = EngineHandle::spawn(EngineConfig::default(), host, arena, ledger);
    Fixture {
        engine,
        directory,
        assets,
        clock,
    }
}

fn spawn() -> Fixture {
    spawn_with(Arc::new(QueuedOracle::new()))
}

async fn next_payload(rx: &mut broadcast::Receiver<Envelope>) -> Notification {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("notification timed out")
        .expect("notification channel closed")
        .payload
}

// =========================================================================
// Arena through the engine
// =========================================================================

#[tokio::test]
async fn test_engine_session_lifecycle() {
    let f = spawn();
    let id = f.engine.start_session(aid(1), trio()).await.unwrap();
    f.engine
        .terminate_session_with_request(aid(1), id, RequestId(9))
        .await
        .unwrap();

    let rewards = f
        .engine
        .fulfill_randomness(RequestId(9), vec![1, 0, 1])
        .await
        .unwrap();
    assert_eq!(rewards, vec![(aid(1), 3), (aid(2), 1), (aid(3), 2)]);

    let session = f.engine.session(id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Rewarded);
    assert_eq!(f.engine.active_session_of(aid(1)).await.unwrap(), None);
    assert_eq!(f.assets.balance_of(aid(1), Asset::Artifact), 3);
}

#[tokio::test]
async fn test_engine_surfaces_core_errors() {
    let f = spawn();
    f.directory.set_frozen(aid(2), true).unwrap();

    let err = f.engine.start_session(aid(1), trio()).await.unwrap_err();
    assert!(matches!(err, Error::Arena(_)));
    assert_eq!(err.code(), "ACCOUNT_NOT_ACTIVE");

    let err = f.engine.stake_tokens(aid(1), 0).await.unwrap_err();
    assert_eq!(err.code(), "AMOUNT_NOT_HIGHER_THAN_0");
    assert_eq!(err.kind(), ErrorKind::ArithmeticBoundsViolation);
}

#[tokio::test]
async fn test_engine_publishes_sequenced_envelopes() {
    let f = spawn();
    let mut rx = f.engine.subscribe();

    let id = f.engine.start_session(aid(1), trio()).await.unwrap();
    f.engine.stake_tokens(aid(4), 10).await.unwrap();
    // Rejected operations publish nothing.
    let _ = f.engine.stake_tokens(aid(4), 0).await;
    f.engine.terminate_session(aid(2), id).await.unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    let third = rx.recv().await.unwrap();
    assert_eq!((first.seq, second.seq, third.seq), (1, 2, 3));
    assert_eq!(first.timestamp, 1_000);
    assert!(matches!(first.payload, Notification::SessionCreated { .. }));
    assert!(matches!(second.payload, Notification::Staked { .. }));
    assert!(matches!(
        third.payload,
        Notification::SessionPostgame { terminator, .. } if terminator == aid(2)
    ));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_envelopes_encode_as_json() {
    let f = spawn();
    let mut rx = f.engine.subscribe();
    f.engine.stake_tokens(aid(1), 250).await.unwrap();

    let envelope = rx.recv().await.unwrap();
    let bytes = JsonCodec.encode(&envelope).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["seq"], 1);
    assert_eq!(json["payload"]["Staked"]["account"], 1);
    assert_eq!(json["payload"]["Staked"]["asset"], "Credit");
}

// =========================================================================
// Absorber through the engine
// =========================================================================

#[tokio::test]
async fn test_engine_stake_distribute_claim() {
    let f = spawn();
    f.engine.stake_tokens(aid(1), 300).await.unwrap();
    f.engine.stake_tokens(aid(2), 100).await.unwrap();
    f.clock.advance(100);

    let record = f.engine.distribute_rewards(OPERATOR).await.unwrap();
    assert_eq!(record.pool, 1_000);

    let claimed = f.engine.claim_epoch_rewards(aid(1), false).await.unwrap();
    assert_eq!(claimed, 750);
    assert_eq!(f.assets.balance_of(aid(1), Asset::Credit), 700 + 750);

    let info = f.engine.ledger_info().await.unwrap();
    assert_eq!(info.current_epoch, 2);
    assert_eq!(info.next_distribution_at, 1_200);
    assert_eq!(info.total_staked_tokens, 400);
    assert_eq!(info.epochs.len(), 1);

    let account = f.engine.stake_account(aid(2)).await.unwrap().unwrap();
    assert_eq!(account.claimable, 250);
    assert_eq!(account.player_id, 2);
}

#[tokio::test]
async fn test_engine_serializes_concurrent_stakes() {
    let f = spawn();
    let mut tasks = Vec::new();
    for id in 1..=6u64 {
        for _ in 0..10 {
            let engine = f.engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.stake_tokens(aid(id), 7).await
            }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let info = f.engine.ledger_info().await.unwrap();
    assert_eq!(info.total_staked_tokens, 6 * 10 * 7);
    assert_eq!(f.assets.balance_of(VAULT, Asset::Credit), 6 * 10 * 7);
}

#[tokio::test]
async fn test_engine_rewards_flow_into_artifact_stakes() {
    let f = spawn();
    let id = f.engine.start_session(aid(1), trio()).await.unwrap();
    f.engine
        .terminate_session_with_request(aid(3), id, RequestId(1))
        .await
        .unwrap();
    f.engine
        .fulfill_randomness(RequestId(1), vec![0, 0, 0])
        .await
        .unwrap();

    // Player 3 won 1 + 1 bonus and stakes both.
    f.engine.stake_artifacts(aid(3), 2).await.unwrap();
    let info = f.engine.ledger_info().await.unwrap();
    assert_eq!(info.faction_artifacts, [0, 0, 2]);
    assert_eq!(info.total_staked_artifacts, 2);

    let err = f.engine.stake_artifacts(aid(3), 1).await.unwrap_err();
    assert_eq!(err.code(), "NOT_ENOUGH_BALANCE");
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_engine_calls_after_shutdown_fail() {
    let f = spawn();
    f.engine.shutdown().await.unwrap();

    let err = f.engine.start_session(aid(1), trio()).await.unwrap_err();
    assert!(matches!(err, Error::EngineUnavailable));
    assert_eq!(err.code(), "ENGINE_UNAVAILABLE");

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(f.engine.is_closed());
    assert!(f.engine.ledger_info().await.is_err());
}

// =========================================================================
// Simulated oracle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_simulated_oracle_fulfills_after_delay() {
    let (oracle, responder) = SimulatedOracle::new(OracleConfig {
        fulfillment_delay: Duration::from_millis(500),
    });
    let f = spawn_with(Arc::new(oracle));
    responder.spawn(f.engine.clone());
    let mut rx = f.engine.subscribe();

    let id = f.engine.start_session(aid(4), vec![aid(4), aid(5), aid(6)]).await.unwrap();
    let request = f.engine.terminate_session(aid(4), id).await.unwrap();
    assert_eq!(request, RequestId::oracle(1));

    let session = f.engine.session(id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Postgame);

    assert!(matches!(next_payload(&mut rx).await, Notification::SessionCreated { .. }));
    assert!(matches!(next_payload(&mut rx).await, Notification::SessionPostgame { .. }));
    let Notification::SessionRewarded { session_id, rewards } = next_payload(&mut rx).await else {
        panic!("expected SessionRewarded");
    };
    assert_eq!(session_id, id);
    assert_eq!(rewards.len(), 3);
    for (player, units) in &rewards {
        let expected = if *player == aid(4) { 2..=3 } else { 1..=2 };
        assert!(expected.contains(units), "{player} got {units}");
    }

    let session = f.engine.session(id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Rewarded);
}
