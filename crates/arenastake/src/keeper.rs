//! Distribution keeper: calls `distribute_rewards` on a timer.
//!
//! The ledger itself enforces the epoch gate, so the keeper does not
//! need to know the epoch length. It simply tries every `interval`;
//! attempts inside an epoch come back as `EpochAlreadyDistributed` and
//! are counted as rejections, not failures.
//!
//! # Structure
//!
//! [`KeeperSchedule`] is the timing half (interval, jitter, overrun
//! policy, pause/resume, counters) and can drive any loop. [`spawn_keeper`]
//! wraps it in a task with a control channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = control_rx.recv() => { /* pause, resume, stop */ }
//!         run = schedule.wait_for_run() => {
//!             let result = engine.distribute_rewards(operator).await;
//!             schedule.record(&result);
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use arenastake_absorber::{AbsorberError, EpochRecord};
use arenastake_protocol::AccountId;
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::{EngineHandle, Error, KeeperConfig, OverrunPolicy};

// ---------------------------------------------------------------------------
// Run info and metrics
// ---------------------------------------------------------------------------

/// Information about one scheduled attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    /// Monotonically increasing attempt number (starts at 1).
    pub run: u64,
    /// `true` if this attempt fired late.
    pub overrun: bool,
    /// Attempts skipped because of the overrun (0 in normal operation).
    pub runs_skipped: u64,
}

/// Counters for the keeper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeeperMetrics {
    /// Attempts made.
    pub attempts: u64,
    /// Attempts that closed an epoch.
    pub distributed: u64,
    /// Expected rejections: epoch not over, or nothing staked.
    pub rejected: u64,
    /// Any other error.
    pub failed: u64,
    /// Attempts skipped by the overrun policy.
    pub skipped: u64,
    /// The most recent successful distribution.
    pub last_epoch: Option<EpochRecord>,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Fixed-interval schedule for distribution attempts.
pub struct KeeperSchedule {
    config: KeeperConfig,
    run_count: u64,
    next_run: Instant,
    paused: bool,
    metrics: KeeperMetrics,
}

impl KeeperSchedule {
    /// Creates a schedule whose first attempt fires after one interval
    /// plus random jitter.
    pub fn new(config: KeeperConfig) -> Self {
        let config = config.validated();
        let jitter = if config.initial_jitter.is_zero() {
            Duration::ZERO
        } else {
            let max = config.initial_jitter.as_millis() as u64;
            Duration::from_millis(rand::rng().random_range(0..max.max(1)))
        };
        debug!(
            interval_ms = config.interval.as_millis() as u64,
            jitter_ms = jitter.as_millis() as u64,
            policy = ?config.policy,
            "keeper schedule created"
        );
        Self {
            next_run: Instant::now() + config.interval + jitter,
            config,
            run_count: 0,
            paused: false,
            metrics: KeeperMetrics::default(),
        }
    }

    /// Waits until the next attempt is due.
    ///
    /// While paused this future pends forever; `select!` keeps serving
    /// its other branches.
    pub async fn wait_for_run(&mut self) -> RunInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }
        let next = self.next_run;
        let interval = self.config.interval;
        time::sleep_until(next).await;

        let now = Instant::now();
        self.run_count += 1;
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by >= interval;
        let mut runs_skipped = 0;

        self.next_run = match self.config.policy {
            OverrunPolicy::Skip => {
                if overrun {
                    runs_skipped = (late_by.as_nanos() / interval.as_nanos()) as u64;
                    warn!(
                        run = self.run_count,
                        skipped = runs_skipped,
                        late_ms = late_by.as_millis() as u64,
                        "keeper overrun, skipping ahead"
                    );
                }
                now + interval
            }
            OverrunPolicy::Drop => next + interval,
        };
        self.metrics.skipped += runs_skipped;

        RunInfo {
            run: self.run_count,
            overrun,
            runs_skipped,
        }
    }

    /// Records the outcome of an attempt.
    pub fn record(&mut self, result: &Result<EpochRecord, Error>) {
        self.metrics.attempts += 1;
        match result {
            Ok(record) => {
                self.metrics.distributed += 1;
                self.metrics.last_epoch = Some(record.clone());
                info!(
                    epoch = record.number,
                    pool = record.pool,
                    credited = record.credited,
                    "keeper distributed rewards"
                );
            }
            Err(Error::Absorber(
                e @ (AbsorberError::EpochAlreadyDistributed { .. }
                | AbsorberError::NoStakeToDistribute),
            )) => {
                self.metrics.rejected += 1;
                debug!(code = e.code(), "keeper attempt rejected");
            }
            Err(e) => {
                self.metrics.failed += 1;
                warn!(code = e.code(), error = %e, "keeper attempt failed");
            }
        }
    }

    /// Stops firing until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(run = self.run_count, "keeper paused");
        }
    }

    /// Resumes one full interval from now, so time spent paused does not
    /// turn into a burst of attempts.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_run = Instant::now() + self.config.interval;
            debug!(run = self.run_count, "keeper resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    pub fn metrics(&self) -> &KeeperMetrics {
        &self.metrics
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}

// ---------------------------------------------------------------------------
// Keeper task
// ---------------------------------------------------------------------------

enum Control {
    Pause,
    Resume,
    Metrics(oneshot::Sender<KeeperMetrics>),
    Stop,
}

/// Handle to a running keeper task.
#[derive(Clone, Debug)]
pub struct KeeperHandle {
    control: mpsc::Sender<Control>,
}

impl KeeperHandle {
    pub async fn pause(&self) -> Result<(), Error> {
        self.send(Control::Pause).await
    }

    pub async fn resume(&self) -> Result<(), Error> {
        self.send(Control::Resume).await
    }

    /// Snapshot of the keeper's counters.
    pub async fn metrics(&self) -> Result<KeeperMetrics, Error> {
        let (tx, rx) = oneshot::channel();
        self.send(Control::Metrics(tx)).await?;
        rx.await.map_err(|_| Error::EngineUnavailable)
    }

    /// Stops the keeper task.
    pub async fn stop(&self) -> Result<(), Error> {
        self.send(Control::Stop).await
    }

    async fn send(&self, control: Control) -> Result<(), Error> {
        self.control
            .send(control)
            .await
            .map_err(|_| Error::EngineUnavailable)
    }
}

/// Spawns a keeper that distributes as `operator` on `config`'s schedule.
///
/// The task ends on [`KeeperHandle::stop`], when every handle is dropped,
/// or when the engine stops.
pub fn spawn_keeper(
    engine: EngineHandle,
    operator: AccountId,
    config: KeeperConfig,
) -> (KeeperHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(8);
    let mut schedule = KeeperSchedule::new(config);

    let task = tokio::spawn(async move {
        info!(%operator, "keeper started");
        loop {
            tokio::select! {
                control = rx.recv() => match control {
                    Some(Control::Pause) => schedule.pause(),
                    Some(Control::Resume) => schedule.resume(),
                    Some(Control::Metrics(reply)) => {
                        let _ = reply.send(schedule.metrics().clone());
                    }
                    Some(Control::Stop) | None => break,
                },
                _ = schedule.wait_for_run() => {
                    let result = engine.distribute_rewards(operator).await;
                    if matches!(result, Err(Error::EngineUnavailable)) {
                        warn!("engine unavailable, keeper stopping");
                        break;
                    }
                    schedule.record(&result);
                }
            }
        }
        info!(
            attempts = schedule.metrics().attempts,
            distributed = schedule.metrics().distributed,
            "keeper stopped"
        );
    });

    (KeeperHandle { control: tx }, task)
}
