//! Record loading: hosted store first, chain second, fenced against
//! out-of-order completion.

use std::sync::atomic::{AtomicU64, Ordering};

use anchor_lang::prelude::Pubkey;
use serde::Serialize;

use crate::accounts::{decode_lesson_batch, decode_task_batch, DecodeStats, LessonRecord, TaskRecord};
use crate::capabilities::{Network, RecordStore};
use crate::error::ConnectivityError;
use crate::store::{map_lesson_rows, map_task_rows};

/// Issued per reload; only the most recent token may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReloadToken(u64);

#[derive(Debug, Default)]
pub struct ReloadFence {
    latest: AtomicU64,
}

impl ReloadFence {
    pub fn issue(&self) -> ReloadToken {
        ReloadToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: ReloadToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Supersedes every outstanding token.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

/// Where a list was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    HostedStore,
    OnChain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub served_by: Stage,
    pub stats: DecodeStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Applied { served_by: Stage, count: usize },
    /// A newer reload was issued while this one was in flight.
    Superseded,
}

pub struct TwoStageLoader<'a> {
    store: Option<&'a dyn RecordStore>,
    network: &'a dyn Network,
}

impl<'a> TwoStageLoader<'a> {
    pub fn new(store: Option<&'a dyn RecordStore>, network: &'a dyn Network) -> Self {
        Self { store, network }
    }

    pub async fn load_tasks(&self, program: &Pubkey) -> Result<Loaded<TaskRecord>, ConnectivityError> {
        if let Some(store) = self.store {
            match store.load_tasks().await {
                Ok(rows) if !rows.is_empty() => {
                    let (records, stats) = map_task_rows(rows);
                    if !records.is_empty() {
                        tracing::debug!(count = records.len(), failed = stats.failed, "tasks served by hosted store");
                        return Ok(Loaded {
                            records,
                            served_by: Stage::HostedStore,
                            stats,
                        });
                    }
                    tracing::warn!(failed = stats.failed, "no usable hosted task rows, reading chain");
                }
                Ok(_) => tracing::debug!("hosted store has no tasks, reading chain"),
                Err(err) => tracing::warn!(error = %err, "hosted task load failed, reading chain"),
            }
        }

        let accounts = self.network.get_program_accounts(program).await?;
        let (records, stats) = decode_task_batch(&accounts);
        tracing::debug!(
            accounts = accounts.len(),
            decoded = stats.decoded,
            failed = stats.failed,
            "tasks served by chain"
        );
        Ok(Loaded {
            records,
            served_by: Stage::OnChain,
            stats,
        })
    }

    /// `vault` fills hosted rows that omit it.
    pub async fn load_lessons(
        &self,
        program: &Pubkey,
        vault: Pubkey,
    ) -> Result<Loaded<LessonRecord>, ConnectivityError> {
        if let Some(store) = self.store {
            match store.load_lessons().await {
                Ok(rows) if !rows.is_empty() => {
                    let (records, stats) = map_lesson_rows(rows, vault);
                    if !records.is_empty() {
                        tracing::debug!(count = records.len(), failed = stats.failed, "lessons served by hosted store");
                        return Ok(Loaded {
                            records,
                            served_by: Stage::HostedStore,
                            stats,
                        });
                    }
                    tracing::warn!(failed = stats.failed, "no usable hosted lesson rows, reading chain");
                }
                Ok(_) => tracing::debug!("hosted store has no lessons, reading chain"),
                Err(err) => tracing::warn!(error = %err, "hosted lesson load failed, reading chain"),
            }
        }

        let accounts = self.network.get_program_accounts(program).await?;
        let (records, stats) = decode_lesson_batch(&accounts);
        tracing::debug!(
            accounts = accounts.len(),
            decoded = stats.decoded,
            failed = stats.failed,
            "lessons served by chain"
        );
        Ok(Loaded {
            records,
            served_by: Stage::OnChain,
            stats,
        })
    }
}
