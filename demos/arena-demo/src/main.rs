//! End-to-end walk through an arena session and one reward epoch.
//!
//! ```text
//! cargo run -p arena-demo [config.json]
//! RUST_LOG=debug cargo run -p arena-demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use arenastake::prelude::*;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

const OPERATOR: AccountId = AccountId(100);
const VAULT: AccountId = AccountId(200);
const TREASURY: AccountId = AccountId(300);

const START: u64 = 1_700_000_000;
const STARTING_CREDIT: Amount = 10_000;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    arena: ArenaConfig,
    absorber: AbsorberConfig,
    engine: EngineConfig,
    keeper: KeeperConfig,
    oracle: OracleConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            absorber: AbsorberConfig::new(OPERATOR, VAULT, TREASURY)
                .with_schedule(EpochSchedule::accelerated()),
            engine: EngineConfig::default(),
            keeper: KeeperConfig::with_interval(Duration::from_millis(200)),
            oracle: OracleConfig::default(),
        }
    }
}

fn load_config() -> Result<DemoConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read(&path)?;
            let config = serde_json::from_slice(&raw)?;
            info!(%path, "loaded demo config");
            Ok(config)
        }
        None => Ok(DemoConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Logs every envelope as JSON until the engine shuts down.
fn log_notifications(mut rx: broadcast::Receiver<Envelope>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => match JsonCodec.encode(&envelope) {
                    Ok(bytes) => info!(json = %String::from_utf8_lossy(&bytes), "notification"),
                    Err(e) => tracing::warn!(error = %e, "failed to encode notification"),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "notification log lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn wait_for_rewards(
    rx: &mut broadcast::Receiver<Envelope>,
    session: SessionId,
) -> Result<Vec<(AccountId, Amount)>, Box<dyn std::error::Error>> {
    loop {
        match rx.recv().await?.payload {
            Notification::SessionRewarded {
                session_id,
                rewards,
            } if session_id == session => return Ok(rewards),
            _ => {}
        }
    }
}

async fn wait_for_distribution(
    keeper: &KeeperHandle,
    interval: Duration,
) -> Result<EpochRecord, Error> {
    loop {
        if let Some(record) = keeper.metrics().await?.last_epoch {
            return Ok(record);
        }
        tokio::time::sleep(interval).await;
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config()?;
    let operator = config.absorber.operator;
    let treasury = config.absorber.treasury;
    let epoch_length = config.absorber.schedule.epoch_length_secs;

    let directory = Arc::new(InMemoryDirectory::new());
    let assets = Arc::new(InMemoryAssets::new());
    let clock = Arc::new(ManualClock::new(START));

    let players = [AccountId(1), AccountId(2), AccountId(3)];
    for (player, faction) in players.iter().zip(1u8..) {
        directory.create_account(*player, faction)?;
        assets.mint(*player, Asset::Credit, STARTING_CREDIT)?;
    }
    assets.mint(treasury, Asset::Credit, Amount::from(u64::MAX))?;

    let host = Host::new(directory.clone(), assets.clone(), clock.clone());
    let (oracle, responder) = SimulatedOracle::new(config.oracle);
    let arena = SessionManager::new(config.arena, host.clone(), Arc::new(oracle));
    let ledger = RewardLedger::new(config.absorber, host.clone());
    let engine = EngineHandle::spawn(config.engine, host, arena, ledger);

    let logger = log_notifications(engine.subscribe());
    let mut events = engine.subscribe();
    let responder_task = responder.spawn(engine.clone());

    // Session: p1 opens and ends it, the oracle answers asynchronously.
    let [p1, p2, p3] = players;
    let session = engine.start_session(p1, players.to_vec()).await?;
    let request = engine.terminate_session(p1, session).await?;
    info!(%session, %request, "waiting for randomness");

    let rewards =
        tokio::time::timeout(Duration::from_secs(10), wait_for_rewards(&mut events, session))
            .await??;
    for (player, units) in &rewards {
        info!(%player, units, "artifacts issued");
    }

    // Staking: everyone stakes credit and the artifacts they just won.
    for (player, credit) in players.iter().zip([1_000, 2_000, 3_000]) {
        engine.stake_tokens(*player, credit).await?;
        let won = assets.balance_of(*player, Asset::Artifact);
        if won > 0 {
            engine.stake_artifacts(*player, won).await?;
        }
    }

    // One epoch later the keeper closes it.
    clock.advance(epoch_length);
    let (keeper, keeper_task) = spawn_keeper(engine.clone(), operator, config.keeper.clone());
    let record = tokio::time::timeout(
        Duration::from_secs(10) + config.keeper.interval * 2,
        wait_for_distribution(&keeper, config.keeper.interval),
    )
    .await??;
    info!(
        epoch = record.number,
        pool = record.pool,
        credited = record.credited,
        "epoch closed"
    );

    // Claims: p1 withdraws, p2 compounds, p3 leaves.
    let paid = engine.claim_epoch_rewards(p1, false).await?;
    let restaked = engine.claim_epoch_rewards(p2, true).await?;
    engine.unstake_tokens(p3, 3_000).await?;
    info!(paid, restaked, "claims settled");

    let info = engine.ledger_info().await?;
    info!(
        epoch = info.current_epoch,
        next_distribution_at = info.next_distribution_at,
        total_staked_tokens = info.total_staked_tokens,
        total_staked_artifacts = info.total_staked_artifacts,
        faction_artifacts = ?info.faction_artifacts,
        "ledger state"
    );
    for player in players {
        info!(
            %player,
            credit = assets.balance_of(player, Asset::Credit),
            artifacts = assets.balance_of(player, Asset::Artifact),
            "final balances"
        );
    }

    keeper.stop().await?;
    keeper_task.await?;
    // The responder exits once the engine drops the oracle; after that the
    // last handle here is the only thing keeping the notification log open.
    engine.shutdown().await?;
    responder_task.await?;
    drop(engine);
    logger.await?;
    Ok(())
}
