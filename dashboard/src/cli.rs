//! JSON outputs for the `opclw-dashboard` binary.

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use base64::Engine as _;
use serde_json::json;
use thiserror::Error;

use crate::accounts::{account_data_from_base64, decode_lesson_account, decode_task_account};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::forms::CreateTaskForm;
use crate::instructions::encode_create_task;
use crate::pda::{agent_address, lesson_address, vault_address};

pub const USAGE: &str = "usage: opclw-dashboard \
[decode-task PUBKEY|decode-lesson PUBKEY|encode-create-task|derive (agent WALLET|vault|lesson SEQ)|programs]";

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid public key: {0:?}")]
    InvalidKey(String),

    #[error("invalid lesson sequence: {0:?}")]
    InvalidSequence(String),

    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveTarget {
    Agent(Pubkey),
    Vault,
    Lesson(u64),
}

impl DeriveTarget {
    pub fn parse(kind: Option<&str>, value: Option<&str>) -> Result<Self, CliError> {
        match (kind, value) {
            (Some("agent"), Some(wallet)) => Ok(Self::Agent(parse_key(wallet)?)),
            (Some("vault"), None) => Ok(Self::Vault),
            (Some("lesson"), Some(sequence)) => sequence
                .trim()
                .parse()
                .map(Self::Lesson)
                .map_err(|_| CliError::InvalidSequence(sequence.to_string())),
            (kind, _) => Err(CliError::Usage(format!(
                "unsupported derive target: {}",
                kind.unwrap_or("<none>")
            ))),
        }
    }
}

pub fn parse_key(value: &str) -> Result<Pubkey, CliError> {
    Pubkey::from_str(value.trim()).map_err(|_| CliError::InvalidKey(value.to_string()))
}

/// `encoded` is the base64 `data` field of an RPC account response.
pub fn decode_task_output(pubkey: Pubkey, encoded: &str) -> Result<String, CliError> {
    let data = account_data_from_base64(encoded).map_err(DashboardError::from)?;
    let record = decode_task_account(pubkey, &data).map_err(DashboardError::from)?;
    Ok(serde_json::to_string_pretty(&record)?)
}

pub fn decode_lesson_output(pubkey: Pubkey, encoded: &str) -> Result<String, CliError> {
    let data = account_data_from_base64(encoded).map_err(DashboardError::from)?;
    let record = decode_lesson_account(pubkey, &data).map_err(DashboardError::from)?;
    Ok(serde_json::to_string_pretty(&record)?)
}

/// Validates a create-task form and prints the instruction payload.
pub fn encode_create_task_output(form_json: &str) -> Result<String, CliError> {
    let form: CreateTaskForm = serde_json::from_str(form_json)?;
    let args = form.validate().map_err(DashboardError::from)?;
    let data = encode_create_task(&args).map_err(DashboardError::from)?;
    let output = json!({
        "args": args,
        "len": data.len(),
        "base64": base64::engine::general_purpose::STANDARD.encode(&data),
        "bytes": data,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn derive_output(config: &DashboardConfig, target: DeriveTarget) -> String {
    let programs = &config.programs;
    let (address, bump) = match target {
        DeriveTarget::Agent(wallet) => agent_address(&wallet, &programs.agent_registry),
        DeriveTarget::Vault => vault_address(&programs.knowledge_vault),
        DeriveTarget::Lesson(sequence) => {
            let (vault, _) = vault_address(&programs.knowledge_vault);
            lesson_address(&vault, sequence, &programs.knowledge_vault)
        }
    };
    json!({ "address": address.to_string(), "bump": bump }).to_string()
}

pub fn programs_output(config: &DashboardConfig) -> String {
    let programs = &config.programs;
    json!({
        "cluster": config.cluster,
        "agentRegistry": programs.agent_registry.to_string(),
        "taskMarketplace": programs.task_marketplace.to_string(),
        "knowledgeVault": programs.knowledge_vault.to_string(),
        "opclwMint": programs.opclw_mint.to_string(),
    })
    .to_string()
}
