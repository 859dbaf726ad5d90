//! Rows of the hosted record store and their mapping onto account records.
//!
//! The store mirrors on-chain data with looser typing: keys are base58
//! strings, amounts may arrive as numbers or numeric strings, tags as an
//! array or a comma-joined string, and timestamps as RFC 3339 or Postgres
//! text.

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::{parse_tags, DecodeStats, LessonRecord, TaskRecord, TaskStatus};
use crate::config::TOKEN_DECIMALS_SCALE;
use crate::error::DecodeError;
use crate::forms::ProfileFields;

const POSTGRES_TIMESTAMPTZ: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"];
const POSTGRES_TIMESTAMP: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Array column or comma-joined text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    List(Vec<String>),
    Joined(String),
}

impl ListField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Joined(joined) => parse_tags(&joined),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRow {
    pub id: Option<String>,
    pub on_chain_pubkey: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "numeric::option_u64")]
    pub reward_amount: Option<u64>,
    pub creator_wallet: Option<String>,
    pub assignee_wallet: Option<String>,
    pub status: Option<String>,
    pub skills: Option<ListField>,
    #[serde(deserialize_with = "numeric::option_reputation")]
    pub min_reputation: Option<u8>,
    #[serde(deserialize_with = "numeric::option_text")]
    pub deadline: Option<String>,
    #[serde(deserialize_with = "numeric::option_text")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "numeric::option_text")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonRow {
    pub id: Option<String>,
    pub on_chain_pubkey: Option<String>,
    pub vault: Option<String>,
    pub author_wallet: Option<String>,
    #[serde(deserialize_with = "numeric::option_u64")]
    pub sequence: Option<u64>,
    #[serde(deserialize_with = "numeric::option_u64")]
    pub upvotes: Option<u64>,
    #[serde(deserialize_with = "numeric::option_text")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "numeric::option_text")]
    pub updated_at: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub tags: Option<ListField>,
}

/// `agent_profiles` row, keyed by wallet address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub wallet_address: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default, deserialize_with = "numeric::option_u64")]
    pub reputation_score: Option<u64>,
    #[serde(default, deserialize_with = "numeric::option_u64")]
    pub tasks_completed: Option<u64>,
    #[serde(default, deserialize_with = "numeric::option_f64")]
    pub lifetime_earnings: Option<f64>,
}

/// Completed work of one wallet, derived from the loaded task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub tasks_completed: u64,
    /// Human units.
    pub earnings: f64,
}

impl ProfileStats {
    pub fn from_tasks(tasks: &[TaskRecord], wallet: &Pubkey) -> Self {
        tasks
            .iter()
            .filter(|task| {
                task.status == TaskStatus::Completed && task.assigned_agent.as_ref() == Some(wallet)
            })
            .fold(Self::default(), |stats, task| Self {
                tasks_completed: stats.tasks_completed + 1,
                earnings: stats.earnings + task.reward as f64 / TOKEN_DECIMALS_SCALE as f64,
            })
    }
}

/// Values shown on the profile card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetrics {
    pub reputation: u64,
    pub tasks_completed: u64,
    pub earnings: f64,
}

impl AgentProfile {
    /// Upsert payload: form fields replace the text columns, counters are
    /// carried from the stored row or filled from `stats`.
    pub fn for_upsert(
        wallet: &Pubkey,
        fields: ProfileFields,
        existing: Option<&AgentProfile>,
        stats: &ProfileStats,
    ) -> Self {
        Self {
            wallet_address: wallet.to_string(),
            display_name: fields.display_name,
            bio: fields.bio,
            contact: fields.contact,
            timezone: fields.timezone,
            reputation_score: Some(existing.and_then(|p| p.reputation_score).unwrap_or(0)),
            tasks_completed: Some(
                existing
                    .and_then(|p| p.tasks_completed)
                    .unwrap_or(stats.tasks_completed),
            ),
            lifetime_earnings: Some(
                existing
                    .and_then(|p| p.lifetime_earnings)
                    .unwrap_or(stats.earnings),
            ),
        }
    }

    /// Stored counters win; missing ones fall back to `stats`.
    pub fn metrics(profile: Option<&AgentProfile>, stats: &ProfileStats) -> ProfileMetrics {
        ProfileMetrics {
            reputation: profile.and_then(|p| p.reputation_score).unwrap_or(0),
            tasks_completed: profile
                .and_then(|p| p.tasks_completed)
                .unwrap_or(stats.tasks_completed),
            earnings: profile
                .and_then(|p| p.lifetime_earnings)
                .unwrap_or(stats.earnings),
        }
    }
}

impl TaskRow {
    pub fn into_record(self) -> Result<TaskRecord, DecodeError> {
        map_task(self).map(|(record, _)| record)
    }
}

impl LessonRow {
    /// `default_vault` fills rows that do not name their vault.
    pub fn into_record(self, default_vault: Pubkey) -> Result<LessonRecord, DecodeError> {
        let pubkey = row_key(self.on_chain_pubkey.as_deref(), self.id.as_deref())?;
        let vault = match non_empty(self.vault.as_deref()) {
            Some(vault) => parse_key("vault", vault)?,
            None => default_vault,
        };
        let author = required_key("author_wallet", self.author_wallet.as_deref())?;
        let created_at = match non_empty(self.created_at.as_deref()) {
            Some(raw) => parse_timestamp("created_at", raw)?,
            None => Utc::now().timestamp(),
        };
        let updated_at = match non_empty(self.updated_at.as_deref()) {
            Some(raw) => parse_timestamp("updated_at", raw)?,
            None => created_at,
        };

        Ok(LessonRecord {
            pubkey,
            vault,
            author,
            sequence: self.sequence.unwrap_or(0),
            upvotes: self.upvotes.unwrap_or(0),
            created_at,
            updated_at,
            title: self.title.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            tags: self.tags.map(ListField::into_vec).unwrap_or_default(),
        })
    }
}

/// Maps hosted task rows, skipping rows without usable keys, newest first.
pub fn map_task_rows(rows: Vec<TaskRow>) -> (Vec<TaskRecord>, DecodeStats) {
    let mut stats = DecodeStats::default();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        match map_task(row) {
            Ok((record, fallback)) => {
                if fallback {
                    stats.status_fallbacks += 1;
                }
                stats.decoded += 1;
                records.push(record);
            }
            Err(err) => {
                stats.failed += 1;
                tracing::warn!(error = %err, "skipping hosted task row");
            }
        }
    }

    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    (records, stats)
}

pub fn map_lesson_rows(rows: Vec<LessonRow>, default_vault: Pubkey) -> (Vec<LessonRecord>, DecodeStats) {
    let mut stats = DecodeStats::default();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        match row.into_record(default_vault) {
            Ok(record) => {
                stats.decoded += 1;
                records.push(record);
            }
            Err(err) => {
                stats.failed += 1;
                tracing::warn!(error = %err, "skipping hosted lesson row");
            }
        }
    }

    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    (records, stats)
}

/// RFC 3339, Postgres `timestamp[tz]` text, or bare unix seconds.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<i64, DecodeError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.timestamp());
    }
    for format in POSTGRES_TIMESTAMPTZ {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Ok(parsed.timestamp());
        }
    }
    for format in POSTGRES_TIMESTAMP {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed.and_utc().timestamp());
        }
    }
    raw.parse::<i64>().map_err(|_| DecodeError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

fn map_task(row: TaskRow) -> Result<(TaskRecord, bool), DecodeError> {
    let pubkey = row_key(row.on_chain_pubkey.as_deref(), row.id.as_deref())?;
    let creator = required_key("creator_wallet", row.creator_wallet.as_deref())?;
    let assigned_agent = non_empty(row.assignee_wallet.as_deref())
        .map(|raw| parse_key("assignee_wallet", raw))
        .transpose()?;

    let parsed_status = row.status.as_deref().and_then(TaskStatus::parse_label);
    if parsed_status.is_none() {
        tracing::warn!(task = %pubkey, status = ?row.status, "unknown hosted status, treating as Open");
    }

    let created_at = match non_empty(row.created_at.as_deref()) {
        Some(raw) => parse_timestamp("created_at", raw)?,
        None => Utc::now().timestamp(),
    };
    let deadline = non_empty(row.deadline.as_deref())
        .map(|raw| parse_timestamp("deadline", raw))
        .transpose()?
        .unwrap_or(0);
    let completed_at = non_empty(row.completed_at.as_deref())
        .map(|raw| parse_timestamp("completed_at", raw))
        .transpose()?;

    let record = TaskRecord {
        pubkey,
        creator,
        title: row.title.unwrap_or_default(),
        description: row.description.unwrap_or_default(),
        reward: row.reward_amount.unwrap_or(0),
        deadline,
        skills: row.skills.map(ListField::into_vec).unwrap_or_default(),
        min_reputation: row.min_reputation.unwrap_or(0),
        status: parsed_status.unwrap_or_default(),
        assigned_agent,
        created_at,
        completed_at,
    };
    Ok((record, parsed_status.is_none()))
}

/// `on_chain_pubkey`, falling back to `id`.
fn row_key(on_chain: Option<&str>, id: Option<&str>) -> Result<Pubkey, DecodeError> {
    let raw = non_empty(on_chain).or_else(|| non_empty(id)).unwrap_or("");
    parse_key("on_chain_pubkey", raw)
}

fn required_key(field: &'static str, raw: Option<&str>) -> Result<Pubkey, DecodeError> {
    parse_key(field, non_empty(raw).unwrap_or(""))
}

fn parse_key(field: &'static str, raw: &str) -> Result<Pubkey, DecodeError> {
    Pubkey::from_str(raw.trim()).map_err(|_| DecodeError::InvalidKey {
        field,
        value: raw.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

mod numeric {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    use crate::config::MAX_MIN_REPUTATION;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    /// Unparsable values read as absent.
    pub fn option_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
            Some(NumberOrText::Unsigned(value)) => Some(value),
            Some(NumberOrText::Float(value)) if value.is_finite() && value >= 0.0 => {
                Some(value as u64)
            }
            Some(NumberOrText::Text(text)) => text.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn option_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
            Some(NumberOrText::Unsigned(value)) => Some(value as f64),
            Some(NumberOrText::Signed(value)) => Some(value as f64),
            Some(NumberOrText::Float(value)) => Some(value),
            Some(NumberOrText::Text(text)) => text.trim().parse().ok(),
            _ => None,
        })
    }

    /// Clamped to `0..=MAX_MIN_REPUTATION`; fractions truncate.
    pub fn option_reputation<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u8>, D::Error> {
        Ok(option_f64(deserializer)?
            .filter(|value| !value.is_nan())
            .map(|value| value.clamp(0.0, f64::from(MAX_MIN_REPUTATION)) as u8))
    }

    /// Timestamp columns: text is kept as-is, unix seconds become their
    /// decimal text.
    pub fn option_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
            Some(NumberOrText::Unsigned(value)) => Some(value.to_string()),
            Some(NumberOrText::Signed(value)) => Some(value.to_string()),
            Some(NumberOrText::Float(value)) if value.is_finite() => {
                Some((value.trunc() as i64).to_string())
            }
            Some(NumberOrText::Text(text)) => Some(text),
            _ => None,
        })
    }
}
