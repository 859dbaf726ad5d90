//! Typed views of task marketplace and knowledge vault accounts.
//!
//! Account layouts (after the 8-byte account discriminator):
//!
//! | Account | Fields |
//! |---------|--------|
//! | Task    | creator(32) title(str) description(str) reward(u64) deadline(i64) skills(vec<str>) min_reputation(u8) status(u8) assigned_flag(u8) [agent(32)] created_at(i64) completed_flag(u8) [completed_at(i64)] |
//! | Lesson  | vault(32) author(32) bump(u8) sequence(u64) upvotes(u64) created_at(i64) updated_at(i64) title(str) summary(str) content(str) tags(str) |
//! | Vault   | authority(32) bump(u8) total_lessons(u64) |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use anchor_lang::prelude::Pubkey;
use base64::Engine as _;
use opclw_codec::ByteReader;
use serde::Serialize;

use crate::config::{ACCOUNT_DISCRIMINATOR_LEN, TOKEN_DECIMALS_SCALE};
use crate::error::DecodeError;

/// Presence flag value that means the optional field follows.
pub const FIELD_PRESENT: u8 = 1;

/// Account as returned by `getProgramAccounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub pubkey: Pubkey,
    pub data: Vec<u8>,
}

/// Task status, stored on the wire as an index into this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TaskStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ORDERED: [TaskStatus; 4] = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ORDERED.get(usize::from(index)).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Accepts `"In Progress"`, `"in_progress"`, `"in-progress"`, any case.
    pub fn parse_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "open" => Some(Self::Open),
            "inprogress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Open → InProgress → Completed, or Open → Cancelled.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (Open, Cancelled) | (InProgress, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(serialize_with = "base58::serialize")]
    pub pubkey: Pubkey,
    #[serde(serialize_with = "base58::serialize")]
    pub creator: Pubkey,
    pub title: String,
    pub description: String,
    /// Smallest units.
    pub reward: u64,
    /// Unix seconds, 0 = no deadline.
    pub deadline: i64,
    pub skills: Vec<String>,
    pub min_reputation: u8,
    pub status: TaskStatus,
    #[serde(serialize_with = "base58::serialize_option")]
    pub assigned_agent: Option<Pubkey>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

/// Field combinations the marketplace program never produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskInconsistency {
    AgentOnOpenTask,
    CompletedAtWithoutCompletion,
}

impl TaskRecord {
    pub fn reward_ui(&self) -> f64 {
        self.reward as f64 / TOKEN_DECIMALS_SCALE as f64
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline != 0
    }

    pub fn inconsistencies(&self) -> Vec<TaskInconsistency> {
        let mut found = Vec::new();
        if self.assigned_agent.is_some() && self.status == TaskStatus::Open {
            found.push(TaskInconsistency::AgentOnOpenTask);
        }
        if self.completed_at.is_some() && self.status != TaskStatus::Completed {
            found.push(TaskInconsistency::CompletedAtWithoutCompletion);
        }
        found
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    #[serde(serialize_with = "base58::serialize")]
    pub pubkey: Pubkey,
    #[serde(serialize_with = "base58::serialize")]
    pub vault: Pubkey,
    #[serde(serialize_with = "base58::serialize")]
    pub author: Pubkey,
    pub sequence: u64,
    pub upvotes: u64,
    pub created_at: i64,
    pub updated_at: i64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultState {
    #[serde(serialize_with = "base58::serialize")]
    pub authority: Pubkey,
    pub bump: u8,
    pub total_lessons: u64,
}

impl VaultState {
    /// Sequence number the next published lesson must carry.
    pub fn next_sequence(&self) -> u64 {
        self.total_lessons.saturating_add(1)
    }
}

/// Per-batch decode counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeStats {
    pub decoded: usize,
    pub failed: usize,
    pub status_fallbacks: usize,
}

/// Cumulative decode anomalies, readable by operators.
#[derive(Debug, Default)]
pub struct DecodeWarnings {
    status_fallbacks: AtomicU64,
    failed_records: AtomicU64,
}

impl DecodeWarnings {
    pub fn record(&self, stats: &DecodeStats) {
        self.status_fallbacks
            .fetch_add(stats.status_fallbacks as u64, Ordering::Relaxed);
        self.failed_records
            .fetch_add(stats.failed as u64, Ordering::Relaxed);
    }

    pub fn status_fallbacks(&self) -> u64 {
        self.status_fallbacks.load(Ordering::Relaxed)
    }

    pub fn failed_records(&self) -> u64 {
        self.failed_records.load(Ordering::Relaxed)
    }
}

pub fn decode_task_account(pubkey: Pubkey, data: &[u8]) -> Result<TaskRecord, DecodeError> {
    decode_task(pubkey, data).map(|(record, _)| record)
}

pub fn decode_lesson_account(pubkey: Pubkey, data: &[u8]) -> Result<LessonRecord, DecodeError> {
    let mut reader = ByteReader::new(data);
    reader.skip(ACCOUNT_DISCRIMINATOR_LEN)?;

    let vault = Pubkey::new_from_array(reader.read_key()?);
    let author = Pubkey::new_from_array(reader.read_key()?);
    let _bump = reader.read_u8()?;
    let sequence = reader.read_u64()?;
    let upvotes = reader.read_u64()?;
    let created_at = reader.read_i64()?;
    let updated_at = reader.read_i64()?;
    let title = reader.read_string()?;
    let summary = reader.read_string()?;
    let content = reader.read_string()?;
    let tags = parse_tags(&reader.read_string()?);

    Ok(LessonRecord {
        pubkey,
        vault,
        author,
        sequence,
        upvotes,
        created_at,
        updated_at,
        title,
        summary,
        content,
        tags,
    })
}

pub fn decode_vault_state(data: &[u8]) -> Result<VaultState, DecodeError> {
    let mut reader = ByteReader::new(data);
    reader.skip(ACCOUNT_DISCRIMINATOR_LEN)?;

    Ok(VaultState {
        authority: Pubkey::new_from_array(reader.read_key()?),
        bump: reader.read_u8()?,
        total_lessons: reader.read_u64()?,
    })
}

/// Decodes every account that parses as a task, newest first.
pub fn decode_task_batch(accounts: &[RawAccount]) -> (Vec<TaskRecord>, DecodeStats) {
    let mut stats = DecodeStats::default();
    let mut records = Vec::with_capacity(accounts.len());

    for account in accounts {
        match decode_task(account.pubkey, &account.data) {
            Ok((record, fallback)) => {
                if fallback.is_some() {
                    stats.status_fallbacks += 1;
                }
                let issues = record.inconsistencies();
                if !issues.is_empty() {
                    tracing::debug!(task = %record.pubkey, ?issues, "task fields disagree with status");
                }
                stats.decoded += 1;
                records.push(record);
            }
            Err(err) => {
                stats.failed += 1;
                tracing::warn!(account = %account.pubkey, error = %err, "skipping undecodable task account");
            }
        }
    }

    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    (records, stats)
}

/// Decodes every account that parses as a lesson, newest first.
pub fn decode_lesson_batch(accounts: &[RawAccount]) -> (Vec<LessonRecord>, DecodeStats) {
    let mut stats = DecodeStats::default();
    let mut records = Vec::with_capacity(accounts.len());

    for account in accounts {
        match decode_lesson_account(account.pubkey, &account.data) {
            Ok(record) => {
                stats.decoded += 1;
                records.push(record);
            }
            Err(err) => {
                stats.failed += 1;
                tracing::warn!(account = %account.pubkey, error = %err, "skipping undecodable lesson account");
            }
        }
    }

    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    (records, stats)
}

/// Splits a comma-joined tag string into trimmed, non-empty tokens.
pub fn parse_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decodes the base64 `data` field of an RPC account response.
pub fn account_data_from_base64(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| DecodeError::Base64(err.to_string()))
}

/// Returns the record plus the raw status byte when it was out of range.
fn decode_task(pubkey: Pubkey, data: &[u8]) -> Result<(TaskRecord, Option<u8>), DecodeError> {
    let mut reader = ByteReader::new(data);
    reader.skip(ACCOUNT_DISCRIMINATOR_LEN)?;

    let creator = Pubkey::new_from_array(reader.read_key()?);
    let title = reader.read_string()?;
    let description = reader.read_string()?;
    let reward = reader.read_u64()?;
    let deadline = reader.read_i64()?;
    let skills = reader.read_string_vec()?;
    let min_reputation = reader.read_u8()?;

    let status_byte = reader.read_u8()?;
    let (status, fallback) = match TaskStatus::from_index(status_byte) {
        Some(status) => (status, None),
        None => {
            tracing::warn!(task = %pubkey, status_byte, "status index out of range, treating as Open");
            (TaskStatus::Open, Some(status_byte))
        }
    };

    let assigned_agent = if reader.read_u8()? == FIELD_PRESENT {
        Some(Pubkey::new_from_array(reader.read_key()?))
    } else {
        None
    };
    let created_at = reader.read_i64()?;
    let completed_at = if reader.read_u8()? == FIELD_PRESENT {
        Some(reader.read_i64()?)
    } else {
        None
    };

    Ok((
        TaskRecord {
            pubkey,
            creator,
            title,
            description,
            reward,
            deadline,
            skills,
            min_reputation,
            status,
            assigned_agent,
            created_at,
            completed_at,
        },
        fallback,
    ))
}

mod base58 {
    use anchor_lang::prelude::Pubkey;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn serialize_option<S: Serializer>(
        key: &Option<Pubkey>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => serializer.collect_str(key),
            None => serializer.serialize_none(),
        }
    }
}
