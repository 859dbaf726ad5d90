//! Error taxonomy for the dashboard core.
//!
//! Nothing here is fatal to the host page: every failure is a value the
//! caller turns into a visible status change.

use anchor_lang::prelude::Pubkey;
use opclw_codec::CodecError;
use thiserror::Error;

use crate::capabilities::{RpcError, StoreError, WalletError};
use crate::config::ConfigError;

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

/// Malformed or truncated record. Scoped to one record; batches skip it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed account data: {0}")]
    Layout(#[from] CodecError),

    #[error("invalid {field} key: {value:?}")]
    InvalidKey { field: &'static str, value: String },

    #[error("invalid {field} timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("invalid base64 account data: {0}")]
    Base64(String),
}

/// Bad user input. Blocks submission before anything is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    EmptyField(&'static str),

    #[error("reward is not a number: {0:?}")]
    InvalidAmount(String),

    #[error("reward must be a finite number")]
    NonFiniteAmount,

    #[error("reward cannot be negative")]
    NegativeAmount,

    #[error("reward is too large")]
    AmountOverflow,

    #[error("deadline is not a recognised date: {0:?}")]
    InvalidDeadline(String),

    #[error("deadline cannot be before 1970")]
    NegativeDeadline,

    #[error("minimum reputation is not a number: {0:?}")]
    InvalidReputation(String),

    #[error("lesson #{sequence} already exists; the vault counter is stale, reload and retry")]
    LessonSequenceTaken { sequence: u64 },
}

/// Wallet rejection or network failure during send/confirm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("wallet rejected the transaction: {0}")]
    WalletRejected(String),

    #[error("recent blockhash expired before submission")]
    BlockhashExpired,

    #[error("network error during submission: {0}")]
    Network(String),

    #[error("transaction {submission_id} was not confirmed")]
    NotConfirmed { submission_id: String },

    #[error("{signer} is not a required signer of this transaction")]
    SignerNotRequired { signer: Pubkey },

    #[error("could not create signing key: {0}")]
    KeyGeneration(String),
}

impl SubmissionError {
    /// Whether resubmitting the same form (with a fresh blockhash) can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BlockhashExpired | Self::Network(_) | Self::NotConfirmed { .. }
        )
    }
}

/// Missing provider, unreachable RPC or store. Rendered as an empty state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    #[error("connect your wallet first")]
    WalletNotConnected,

    #[error("no wallet provider detected")]
    NoWalletProvider,

    #[error("hosted record store is not configured")]
    StoreUnavailable,

    #[error("hosted record store error: {0}")]
    Store(String),

    #[error("rpc unavailable: {0}")]
    Rpc(String),

    #[error("knowledge vault {vault} is not initialized")]
    VaultNotInitialized { vault: Pubkey },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("instruction encoding failed: {0}")]
    Encode(#[from] CodecError),
}

impl DashboardError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submission(err) => err.is_retryable(),
            Self::Connectivity(ConnectivityError::Rpc(_)) => true,
            _ => false,
        }
    }
}

impl From<RpcError> for ConnectivityError {
    fn from(err: RpcError) -> Self {
        Self::Rpc(err.to_string())
    }
}

impl From<RpcError> for SubmissionError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::BlockhashExpired => Self::BlockhashExpired,
            RpcError::Request(message) => Self::Network(message),
        }
    }
}

impl From<StoreError> for ConnectivityError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<WalletError> for SubmissionError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Rejected(message) => Self::WalletRejected(message),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<WalletError> for ConnectivityError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Unavailable => Self::NoWalletProvider,
            WalletError::Rejected(_) | WalletError::Unsupported | WalletError::Other(_) => {
                Self::WalletNotConnected
            }
        }
    }
}
