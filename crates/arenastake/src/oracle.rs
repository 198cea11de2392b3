//! A simulated randomness oracle.
//!
//! Requests leave the engine synchronously (the arena calls
//! [`RandomnessOracle::request_randomness`] while terminating a session)
//! and come back later as an ordinary inbound engine call. Between the
//! two, the request is just a message on a channel:
//!
//! ```text
//! engine ──request──→ SimulatedOracle ──mpsc──→ OracleResponder
//!   ↑                                               │ sleep(delay)
//!   └────────── fulfill_randomness(id, words) ──────┘ rand words
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use arenastake_host::{OracleError, RandomnessOracle, RandomnessRequest};
use arenastake_protocol::{RandomWord, RequestId, SessionId};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{EngineHandle, OracleConfig};

/// The request side: hands out sequential oracle-range ids and queues
/// requests for the responder.
#[derive(Debug)]
pub struct SimulatedOracle {
    last_id: AtomicU64,
    requests: mpsc::UnboundedSender<RandomnessRequest>,
}

/// The callback side: turns queued requests into fulfillments.
#[derive(Debug)]
pub struct OracleResponder {
    config: OracleConfig,
    requests: mpsc::UnboundedReceiver<RandomnessRequest>,
}

impl SimulatedOracle {
    /// Creates a connected oracle and responder pair.
    ///
    /// Pass the oracle to the session manager, then start the responder
    /// with [`OracleResponder::spawn`] once the engine is running.
    pub fn new(config: OracleConfig) -> (Self, OracleResponder) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                last_id: AtomicU64::new(0),
                requests: tx,
            },
            OracleResponder {
                config,
                requests: rx,
            },
        )
    }
}

impl RandomnessOracle for SimulatedOracle {
    fn request_randomness(
        &self,
        session_id: SessionId,
        num_words: u32,
    ) -> Result<RequestId, OracleError> {
        let request_id = RequestId::oracle(self.last_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.requests
            .send(RandomnessRequest {
                request_id,
                session_id,
                num_words,
            })
            .map_err(|_| OracleError::Unavailable("responder stopped".into()))?;
        tracing::debug!(%request_id, %session_id, num_words, "randomness requested");
        Ok(request_id)
    }
}

impl OracleResponder {
    /// Runs the responder until the oracle side is dropped.
    ///
    /// Each request is answered from its own task after the configured
    /// delay, so a slow callback never holds up the next one.
    pub fn spawn(mut self, engine: EngineHandle) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(request) = self.requests.recv().await {
                let engine = engine.clone();
                let delay = self.config.fulfillment_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let words = random_words(request.num_words);
                    match engine.fulfill_randomness(request.request_id, words).await {
                        Ok(rewards) => tracing::debug!(
                            request_id = %request.request_id,
                            recipients = rewards.len(),
                            "randomness fulfilled"
                        ),
                        Err(e) => tracing::warn!(
                            request_id = %request.request_id,
                            code = e.code(),
                            error = %e,
                            "randomness callback rejected"
                        ),
                    }
                });
            }
            tracing::debug!("oracle responder stopped");
        })
    }
}

fn random_words(n: u32) -> Vec<RandomWord> {
    let mut rng = rand::rng();
    (0..n).map(|_| rng.random()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_sequential() {
        let (oracle, _responder) = SimulatedOracle::new(OracleConfig::default());
        let a = oracle.request_randomness(SessionId(1), 3).unwrap();
        let b = oracle.request_randomness(SessionId(2), 4).unwrap();
        assert_eq!(a, RequestId::oracle(1));
        assert_eq!(b, RequestId::oracle(2));
    }

    #[test]
    fn test_request_fails_when_responder_dropped() {
        let (oracle, responder) = SimulatedOracle::new(OracleConfig::default());
        drop(responder);
        let err = oracle.request_randomness(SessionId(1), 3).unwrap_err();
        assert_eq!(err.code(), "ORACLE_UNAVAILABLE");
    }

    #[test]
    fn test_random_words_count() {
        assert_eq!(random_words(5).len(), 5);
        assert!(random_words(0).is_empty());
    }
}
