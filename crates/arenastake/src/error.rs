//! Unified error type for Arenastake.

use arenastake_absorber::AbsorberError;
use arenastake_arena::ArenaError;
use arenastake_host::{AssetError, DirectoryError, OracleError};
use arenastake_protocol::{ErrorKind, ProtocolError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `arenastake` facade you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?`
/// converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Encoding or decoding a notification failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The in-memory directory's management surface rejected a call.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The asset ledger rejected a transfer or mint.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// The randomness oracle could not take a request.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// A session operation was rejected.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// A staking operation was rejected.
    #[error(transparent)]
    Absorber(#[from] AbsorberError),

    /// The engine actor has stopped; no further operations are accepted.
    #[error("engine unavailable")]
    EngineUnavailable,
}

impl Error {
    /// Stable reason code of the underlying error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Directory(e) => e.code(),
            Self::Asset(e) => e.code(),
            Self::Oracle(e) => e.code(),
            Self::Arena(e) => e.code(),
            Self::Absorber(e) => e.code(),
            Self::EngineUnavailable => "ENGINE_UNAVAILABLE",
        }
    }

    /// Taxonomy bucket of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Arena(e) => e.kind(),
            Self::Absorber(e) => e.kind(),
            Self::Asset(e) => e.kind(),
            Self::Protocol(_) | Self::Directory(_) | Self::Oracle(_) | Self::EngineUnavailable => {
                ErrorKind::External
            }
        }
    }
}
