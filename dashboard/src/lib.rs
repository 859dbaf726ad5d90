#![forbid(unsafe_code)]
//! Account decoding and transaction assembly for the OPCLW agent dashboard.
//!
//! The dashboard lists tasks from the task marketplace program and lessons
//! from the knowledge vault program, and builds the create, accept, complete
//! and publish transactions a connected wallet signs. Wallet, RPC and the
//! hosted record store are injected through [`capabilities`].

pub mod accounts;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod instructions;
pub mod loader;
pub mod pda;
pub mod session;
pub mod store;
pub mod transaction;

pub use anchor_lang::prelude::Pubkey;
pub use solana_hash::Hash;

pub use accounts::{
    decode_lesson_account, decode_task_account, decode_vault_state, DecodeStats, DecodeWarnings,
    LessonRecord, RawAccount, TaskRecord, TaskStatus, VaultState,
};
pub use capabilities::{
    Commitment, FreshnessToken, Network, RecordStore, RpcError, StoreError, SubmissionId,
    TokenAmount, WalletError, WalletProvider,
};
pub use config::{DashboardConfig, ProgramIds};
pub use error::{
    ConnectivityError, DashboardError, DecodeError, Result, SubmissionError, ValidationError,
};
pub use forms::{CreateTaskForm, ProfileForm, PublishLessonForm};
pub use loader::{LoadOutcome, Stage};
pub use session::{Dashboard, Registration, SubmissionReceipt};
pub use store::{AgentProfile, LessonRow, ProfileStats, TaskRow};
pub use transaction::{EphemeralSigner, TransactionEnvelope};
