#![forbid(unsafe_code)]

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use thiserror::Error;

pub const DEFAULT_CLUSTER: &str = "devnet";
pub const CLUSTER_ENV_VAR: &str = "OPCLW_CLUSTER";

/// OPCLW has 9 decimals.
pub const TOKEN_DECIMALS_SCALE: u64 = 1_000_000_000;
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const MAX_MIN_REPUTATION: u8 = 100;
pub const ACCOUNT_DISCRIMINATOR_LEN: usize = 8;
pub const INSTRUCTION_DISCRIMINATOR_LEN: usize = 8;

pub type Discriminator = [u8; INSTRUCTION_DISCRIMINATOR_LEN];

/// Instruction discriminators published in the deployed programs' IDLs.
pub mod discriminators {
    use super::Discriminator;

    pub const CREATE_TASK: Discriminator = [194, 80, 6, 180, 232, 127, 48, 171];
    pub const ACCEPT_TASK: Discriminator = [222, 196, 79, 165, 120, 30, 38, 120];
    pub const COMPLETE_TASK: Discriminator = [109, 167, 192, 41, 129, 108, 220, 196];
    pub const PUBLISH_LESSON: Discriminator = [166, 244, 160, 23, 160, 37, 13, 54];
}

/// Derived-address seeds.
pub mod seeds {
    pub const AGENT: &[u8] = b"agent";
    pub const VAULT: &[u8] = b"vault";
    pub const LESSON: &[u8] = b"lesson";
}

pub const AGENT_REGISTRY_PROGRAM_ID: &str = "BJguwXHSe67eoqHQjATboCPK6u7zaLhPrTSj65RTJGSg";
pub const TASK_MARKETPLACE_PROGRAM_ID: &str = "3aiES4fjQwPAyKxUEkR9sYDpXuGtpkd5B368prXyHhXJ";
pub const KNOWLEDGE_VAULT_PROGRAM_ID: &str = "8G59DbwXcjdcrwKnDJnynokXPh2MtR6VHHxWbFvNzgGG";
pub const OPCLW_MINT: &str = "Duo62HVJ2nu2ViEqoJrUHubzvBdDDNdvU4gDpfHo1q7o";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub cluster: &'static str,
    pub agent_registry: &'static str,
    pub task_marketplace: &'static str,
    pub knowledge_vault: &'static str,
    pub opclw_mint: &'static str,
}

/// Parsed program identities for one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramIds {
    pub agent_registry: Pubkey,
    pub task_marketplace: Pubkey,
    pub knowledge_vault: Pubkey,
    pub opclw_mint: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cluster has no known deployment: {0}")]
    UnknownCluster(String),

    #[error("invalid {name} program id: {value}")]
    InvalidProgramId { name: &'static str, value: &'static str },
}

// Localnet test validators load the devnet program binaries at the same addresses.
pub const DEPLOYMENTS: [Deployment; 2] = [
    Deployment {
        cluster: DEFAULT_CLUSTER,
        agent_registry: AGENT_REGISTRY_PROGRAM_ID,
        task_marketplace: TASK_MARKETPLACE_PROGRAM_ID,
        knowledge_vault: KNOWLEDGE_VAULT_PROGRAM_ID,
        opclw_mint: OPCLW_MINT,
    },
    Deployment {
        cluster: "localnet",
        agent_registry: AGENT_REGISTRY_PROGRAM_ID,
        task_marketplace: TASK_MARKETPLACE_PROGRAM_ID,
        knowledge_vault: KNOWLEDGE_VAULT_PROGRAM_ID,
        opclw_mint: OPCLW_MINT,
    },
];

pub fn require_deployment(cluster: &str) -> Result<&'static Deployment, ConfigError> {
    DEPLOYMENTS
        .iter()
        .find(|deployment| deployment.cluster == cluster)
        .ok_or_else(|| ConfigError::UnknownCluster(cluster.to_string()))
}

/// Cluster named by `OPCLW_CLUSTER`, or the default.
pub fn cluster_from_env() -> String {
    std::env::var(CLUSTER_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CLUSTER.to_string())
}

impl Deployment {
    pub fn program_ids(&self) -> Result<ProgramIds, ConfigError> {
        Ok(ProgramIds {
            agent_registry: parse_id("agent registry", self.agent_registry)?,
            task_marketplace: parse_id("task marketplace", self.task_marketplace)?,
            knowledge_vault: parse_id("knowledge vault", self.knowledge_vault)?,
            opclw_mint: parse_id("OPCLW mint", self.opclw_mint)?,
        })
    }
}

/// Resolved settings a dashboard session runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub cluster: String,
    pub programs: ProgramIds,
}

impl DashboardConfig {
    pub fn for_cluster(cluster: &str) -> Result<Self, ConfigError> {
        let deployment = require_deployment(cluster)?;
        Ok(Self {
            cluster: deployment.cluster.to_string(),
            programs: deployment.program_ids()?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::for_cluster(&cluster_from_env())
    }
}

fn parse_id(name: &'static str, value: &'static str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value).map_err(|_| ConfigError::InvalidProgramId { name, value })
}
