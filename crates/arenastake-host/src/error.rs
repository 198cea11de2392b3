//! Error types for the host collaborators.

use arenastake_protocol::{AccountId, Amount, Asset, ErrorKind, FactionId};

/// Errors from the in-memory account directory's own management surface.
///
/// The core only ever *reads* the directory, so these never surface from
/// arena or absorber operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The faction number is outside the fixed enumeration.
    #[error("invalid faction {0}")]
    InvalidFaction(u8),

    /// `create_account` was called twice for the same account.
    #[error("account {0} already has a faction")]
    AlreadyHasFaction(AccountId),

    /// The account does not exist or is frozen.
    #[error("account {0} is not active")]
    AccountInactive(AccountId),

    /// The account asked to defect to the faction it is already in.
    #[error("account {0} is already in faction {1}")]
    CannotDefectToSameFaction(AccountId, FactionId),

    /// Freeze/unfreeze targeted an account that was never created.
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
}

impl DirectoryError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFaction(_) => "INVALID_FACTION",
            Self::AlreadyHasFaction(_) => "PLAYER_ALREADY_HAS_FACTION",
            Self::AccountInactive(_) => "ACCOUNT_NOT_ACTIVE",
            Self::CannotDefectToSameFaction(..) => "CANNOT_DEFECT_TO_SAME_FACTION",
            Self::AccountNotFound(_) => "ACCOUNT_DOES_NOT_EXIST",
        }
    }
}

/// Errors from an [`AssetLedger`](crate::AssetLedger).
///
/// The core surfaces these verbatim: a failed stake transfer reports the
/// ledger's own reason, not a reinterpretation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// The sender does not hold enough of the asset. No balance changed.
    #[error("transfer amount exceeds balance: {account} holds {available} {asset}, needs {requested}")]
    InsufficientBalance {
        account: AccountId,
        asset: Asset,
        available: Amount,
        requested: Amount,
    },

    /// A credit would overflow the recipient's balance. No balance changed.
    #[error("balance overflow crediting {amount} {asset} to {account}")]
    Overflow {
        account: AccountId,
        asset: Asset,
        amount: Amount,
    },
}

impl AssetError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "TRANSFER_AMOUNT_EXCEEDS_BALANCE",
            Self::Overflow { .. } => "BALANCE_OVERFLOW",
        }
    }

    /// Ledger failures are always external to the core.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::External
    }
}

/// Errors from a [`RandomnessOracle`](crate::RandomnessOracle).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The oracle could not accept the request (service gone, queue closed).
    #[error("randomness oracle unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "ORACLE_UNAVAILABLE",
        }
    }
}
