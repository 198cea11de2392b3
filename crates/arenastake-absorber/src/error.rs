//! Error types for the absorber layer.

use arenastake_host::AssetError;
use arenastake_protocol::{AccountId, Amount, Asset, ErrorKind, Timestamp};

/// Errors that can occur during ledger operations.
///
/// Codes are stable; each one is unique within the operation that can
/// return it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbsorberError {
    /// The caller is unknown or frozen.
    #[error("account {0} is not active")]
    AccountInactive(AccountId),

    /// `stake_tokens` with a zero amount.
    #[error("stake amount must be greater than zero")]
    AmountNotPositive,

    /// A zero amount anywhere else.
    #[error("amount is zero")]
    AmountIsZero,

    /// Unstaking with nothing staked.
    #[error("account {account} has no staked {asset}")]
    NoStakedBalance { account: AccountId, asset: Asset },

    /// Unstaking more than is staked.
    #[error("cannot unstake {requested} {asset}, only {staked} staked")]
    UnstakeExceedsBalance {
        asset: Asset,
        staked: Amount,
        requested: Amount,
    },

    /// Staking more artifacts than the caller holds.
    #[error("account {account} holds {available} artifacts, needs {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },

    /// Only the operator may distribute.
    #[error("account {0} is not the operator")]
    Unauthorized(AccountId),

    /// The current epoch has not run its full length.
    #[error("epoch not over, next distribution at {next_at}")]
    EpochAlreadyDistributed { next_at: Timestamp },

    /// Nobody has stake-time weight this epoch.
    #[error("no stake to distribute to")]
    NoStakeToDistribute,

    /// The caller never staked.
    #[error("account {0} has no stake account")]
    AccountDoesNotExist(AccountId),

    /// The asset ledger refused a transfer. Surfaced unchanged.
    #[error(transparent)]
    Transfer(#[from] AssetError),
}

impl AbsorberError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountInactive(_) => "ACCOUNT_NOT_ACTIVE",
            Self::AmountNotPositive => "AMOUNT_NOT_HIGHER_THAN_0",
            Self::AmountIsZero => "AMOUNT_IS_0",
            Self::NoStakedBalance { .. } => "STAKED_BALANCE_IS_0",
            Self::UnstakeExceedsBalance { .. } => "INVALID_UNSTAKE_OPERATION",
            Self::InsufficientBalance { .. } => "NOT_ENOUGH_BALANCE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::EpochAlreadyDistributed { .. } => "DISTRIBUTION_ALREADY_HAPPENED",
            Self::NoStakeToDistribute => "NO_TOKENS_STAKED",
            Self::AccountDoesNotExist(_) => "ACCOUNT_DOES_NOT_EXIST",
            Self::Transfer(e) => e.code(),
        }
    }

    /// Taxonomy bucket.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::AccessViolation,
            Self::AccountInactive(_) | Self::AccountDoesNotExist(_) => {
                ErrorKind::StateInvariantViolation
            }
            Self::AmountNotPositive
            | Self::AmountIsZero
            | Self::NoStakedBalance { .. }
            | Self::UnstakeExceedsBalance { .. }
            | Self::InsufficientBalance { .. } => ErrorKind::ArithmeticBoundsViolation,
            Self::EpochAlreadyDistributed { .. } => ErrorKind::TemporalGuardViolation,
            Self::NoStakeToDistribute => ErrorKind::ResourceExhaustion,
            Self::Transfer(e) => e.kind(),
        }
    }
}
