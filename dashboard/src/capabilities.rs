//! Capabilities the dashboard consumes from its host.
//!
//! The wallet, the RPC connection and the hosted record store are all
//! injected into [`crate::session::Dashboard`]; nothing here reaches into
//! global state.

use std::fmt;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_hash::Hash;
use thiserror::Error;

use crate::accounts::RawAccount;
use crate::store::{AgentProfile, LessonRow, TaskRow};
use crate::transaction::TransactionEnvelope;

/// Transaction signature as returned by the wallet or RPC (base58).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recent blockhash plus the last block height at which it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessToken {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

/// SPL token balance of one owner for one mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub amount: u64,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn ui_amount(&self) -> f64 {
        self.amount as f64 / 10_f64.powi(i32::from(self.decimals))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet provider available")]
    Unavailable,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("operation not supported by this wallet")]
    Unsupported,

    #[error("wallet error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("blockhash not found")]
    BlockhashExpired,

    #[error("{0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Browser wallet (Phantom, Solflare, ...).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn connect(&self) -> Result<Pubkey, WalletError>;

    fn supports_sign_and_send(&self) -> bool {
        false
    }

    async fn sign_and_send_transaction(
        &self,
        _envelope: &TransactionEnvelope,
    ) -> Result<SubmissionId, WalletError> {
        Err(WalletError::Unsupported)
    }

    /// Returns the fully signed transaction in wire format.
    async fn sign_transaction(&self, envelope: &TransactionEnvelope) -> Result<Vec<u8>, WalletError>;
}

/// Solana JSON-RPC connection.
#[async_trait]
pub trait Network: Send + Sync {
    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, RpcError>;

    async fn get_token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<TokenAmount>, RpcError>;

    async fn get_program_accounts(&self, program: &Pubkey) -> Result<Vec<RawAccount>, RpcError>;

    async fn get_account_info(&self, account: &Pubkey) -> Result<Option<Vec<u8>>, RpcError>;

    async fn get_latest_blockhash(&self) -> Result<FreshnessToken, RpcError>;

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<SubmissionId, RpcError>;

    /// `Ok(false)` when the cluster reports the transaction failed or never
    /// reached the requested commitment.
    async fn confirm_transaction(
        &self,
        id: &SubmissionId,
        commitment: Commitment,
    ) -> Result<bool, RpcError>;
}

/// Hosted mirror of marketplace and vault data plus agent profiles.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_tasks(&self) -> Result<Vec<TaskRow>, StoreError>;

    async fn load_lessons(&self) -> Result<Vec<LessonRow>, StoreError>;

    async fn get_agent_profile(&self, wallet: &str) -> Result<Option<AgentProfile>, StoreError>;

    /// Returns the stored row when the backend echoes it.
    async fn upsert_agent_profile(
        &self,
        profile: &AgentProfile,
    ) -> Result<Option<AgentProfile>, StoreError>;
}
