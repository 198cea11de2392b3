//! Randomness oracle: request now, receive words later.
//!
//! A request is a side effect of terminating a session. The oracle hands
//! back a [`RequestId`] immediately; the words arrive later through a
//! separate call (`SessionManager::fulfill_randomness`) that is matched
//! against the table of outstanding requests. No call stack survives the
//! gap between the two.

use std::sync::{Mutex, PoisonError};

use arenastake_protocol::{RequestId, SessionId};

use crate::OracleError;

/// One outstanding request, as seen by the oracle side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub request_id: RequestId,
    pub session_id: SessionId,
    pub num_words: u32,
}

/// Accepts randomness requests correlated to a session.
pub trait RandomnessOracle: Send + Sync {
    /// Registers a request for `num_words` words and returns its id.
    ///
    /// Ids must be unique and built with [`RequestId::oracle`]; the
    /// range below it belongs to ids callers register themselves.
    ///
    /// # Errors
    /// [`OracleError::Unavailable`] if the request could not be queued.
    fn request_randomness(
        &self,
        session_id: SessionId,
        num_words: u32,
    ) -> Result<RequestId, OracleError>;
}

/// An oracle that only records requests.
///
/// Ids are `RequestId::oracle(1)`, `RequestId::oracle(2)`, and so on.
/// Tests pull the pending requests with [`QueuedOracle::take_pending`]
/// and deliver whatever words they like.
#[derive(Debug, Default)]
pub struct QueuedOracle {
    inner: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    last_id: u64,
    pending: Vec<RandomnessRequest>,
}

impl QueuedOracle {
    /// Creates an oracle with no requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns every request issued since the last call.
    pub fn take_pending(&self) -> Vec<RandomnessRequest> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut state.pending)
    }
}

impl RandomnessOracle for QueuedOracle {
    fn request_randomness(
        &self,
        session_id: SessionId,
        num_words: u32,
    ) -> Result<RequestId, OracleError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.last_id += 1;
        let request_id = RequestId::oracle(state.last_id);
        state.pending.push(RandomnessRequest {
            request_id,
            session_id,
            num_words,
        });
        tracing::debug!(%request_id, %session_id, num_words, "randomness requested");
        Ok(request_id)
    }
}
