//! Dashboard session: connected wallet, loaded lists and the write actions.
//!
//! State sits behind a `parking_lot` lock that is never held across an
//! await. Lists are replaced wholesale, and only by the latest reload.

use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use parking_lot::RwLock;
use serde::Serialize;

use crate::accounts::{
    decode_vault_state, DecodeWarnings, LessonRecord, TaskRecord, TaskStatus, VaultState,
};
use crate::capabilities::{Network, RecordStore, SubmissionId, TokenAmount, WalletProvider};
use crate::config::{DashboardConfig, LAMPORTS_PER_SOL};
use crate::error::{ConnectivityError, Result, ValidationError};
use crate::forms::{CreateTaskForm, ProfileForm, PublishLessonForm};
use crate::instructions::{
    accept_task_instruction, complete_task_instruction, create_task_instruction,
    publish_lesson_instruction,
};
use crate::loader::{LoadOutcome, ReloadFence, Stage, TwoStageLoader};
use crate::pda::{agent_address, lesson_address, vault_address};
use crate::store::{AgentProfile, ProfileMetrics, ProfileStats};
use crate::transaction::{EphemeralSigner, TransactionAssembler, TransactionSigner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    #[default]
    Unknown,
    Registered,
    NotRegistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Balances {
    pub lamports: Option<u64>,
    /// `None` when the wallet holds no OPCLW token account.
    pub opclw: Option<TokenAmount>,
}

impl Balances {
    pub fn sol(&self) -> f64 {
        self.lamports.unwrap_or(0) as f64 / LAMPORTS_PER_SOL as f64
    }

    pub fn opclw(&self) -> f64 {
        self.opclw.map(|amount| amount.ui_amount()).unwrap_or(0.0)
    }
}

/// Actions the connected wallet may take on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskActions {
    pub accept: bool,
    pub complete: bool,
}

impl TaskActions {
    /// Anyone but the creator may accept an open task; the creator marks
    /// in-progress work complete.
    pub fn for_task(task: &TaskRecord, wallet: Option<&Pubkey>) -> Self {
        let Some(wallet) = wallet else {
            return Self::default();
        };
        let is_creator = task.creator == *wallet;
        Self {
            accept: task.status == TaskStatus::Open && !is_creator,
            complete: task.status == TaskStatus::InProgress && is_creator,
        }
    }
}

/// Per-part results of a full refresh.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub balances: Result<Balances>,
    pub registration: Result<Registration>,
    pub tasks: Result<LoadOutcome>,
    pub lessons: Result<LoadOutcome>,
    pub profile: Result<Option<AgentProfile>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub id: SubmissionId,
    /// Task or lesson account the transaction wrote.
    pub account: Pubkey,
    /// `None` when the follow-up reload failed.
    pub reload: Option<LoadOutcome>,
}

#[derive(Debug, Default)]
struct SessionState {
    wallet: Option<Pubkey>,
    agent: Option<Pubkey>,
    registration: Registration,
    balances: Balances,
    tasks: Vec<TaskRecord>,
    tasks_from: Option<Stage>,
    lessons: Vec<LessonRecord>,
    lessons_from: Option<Stage>,
    profile: Option<AgentProfile>,
    stats: ProfileStats,
    vault: Option<VaultState>,
}

impl SessionState {
    fn recompute_stats(&mut self) {
        self.stats = match &self.wallet {
            Some(wallet) => ProfileStats::from_tasks(&self.tasks, wallet),
            None => ProfileStats::default(),
        };
    }
}

pub struct Dashboard {
    config: DashboardConfig,
    wallet: Arc<dyn WalletProvider>,
    network: Arc<dyn Network>,
    store: Option<Arc<dyn RecordStore>>,
    state: RwLock<SessionState>,
    task_fence: ReloadFence,
    lesson_fence: ReloadFence,
    profile_fence: ReloadFence,
    warnings: DecodeWarnings,
}

impl Dashboard {
    pub fn new(
        config: DashboardConfig,
        wallet: Arc<dyn WalletProvider>,
        network: Arc<dyn Network>,
        store: Option<Arc<dyn RecordStore>>,
    ) -> Self {
        Self {
            config,
            wallet,
            network,
            store,
            state: RwLock::new(SessionState::default()),
            task_fence: ReloadFence::default(),
            lesson_fence: ReloadFence::default(),
            profile_fence: ReloadFence::default(),
            warnings: DecodeWarnings::default(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Connects the wallet, then refreshes everything concurrently.
    pub async fn connect(&self) -> Result<RefreshReport> {
        let wallet = self.wallet.connect().await.map_err(|err| {
            tracing::warn!(error = %err, "wallet connection failed");
            ConnectivityError::from(err)
        })?;
        self.set_wallet(wallet);
        tracing::info!(wallet = %wallet, cluster = %self.config.cluster, "wallet connected");
        Ok(self.refresh_all().await)
    }

    /// Host callback for the wallet's account-change event.
    pub async fn handle_account_change(&self, account: Option<Pubkey>) -> Option<RefreshReport> {
        match account {
            None => {
                self.profile_fence.invalidate();
                let mut state = self.state.write();
                state.wallet = None;
                state.agent = None;
                state.registration = Registration::Unknown;
                state.balances = Balances::default();
                state.profile = None;
                state.stats = ProfileStats::default();
                tracing::info!("wallet disconnected");
                None
            }
            Some(wallet) => {
                self.profile_fence.invalidate();
                self.set_wallet(wallet);
                tracing::info!(wallet = %wallet, "wallet account changed");
                Some(self.refresh_all().await)
            }
        }
    }

    pub async fn refresh_all(&self) -> RefreshReport {
        let (balances, registration, tasks, lessons, profile) = futures::join!(
            self.refresh_balances(),
            self.refresh_registration(),
            self.reload_tasks(),
            self.reload_lessons(),
            self.load_profile(),
        );
        RefreshReport {
            balances,
            registration,
            tasks,
            lessons,
            profile,
        }
    }

    /// SOL and OPCLW balances; a failed lookup keeps the previous value.
    pub async fn refresh_balances(&self) -> Result<Balances> {
        let wallet = self.require_wallet()?;
        let mint = self.config.programs.opclw_mint;
        let (lamports, token) = futures::join!(
            self.network.get_balance(&wallet),
            self.network.get_token_balance(&wallet, &mint),
        );

        let mut state = self.state.write();
        if state.wallet != Some(wallet) {
            return Ok(state.balances);
        }
        match lamports {
            Ok(lamports) => state.balances.lamports = Some(lamports),
            Err(err) => tracing::warn!(error = %err, "SOL balance lookup failed"),
        }
        match token {
            Ok(amount) => state.balances.opclw = amount,
            Err(err) => tracing::warn!(error = %err, "OPCLW balance lookup failed"),
        }
        Ok(state.balances)
    }

    pub async fn refresh_registration(&self) -> Result<Registration> {
        let wallet = self.require_wallet()?;
        let (agent, _) = agent_address(&wallet, &self.config.programs.agent_registry);
        let account = self
            .network
            .get_account_info(&agent)
            .await
            .map_err(ConnectivityError::from)?;
        let registration = if account.is_some() {
            Registration::Registered
        } else {
            Registration::NotRegistered
        };

        let mut state = self.state.write();
        if state.wallet == Some(wallet) {
            state.agent = Some(agent);
            state.registration = registration;
        }
        tracing::debug!(agent = %agent, ?registration, "agent registration checked");
        Ok(registration)
    }

    pub async fn reload_tasks(&self) -> Result<LoadOutcome> {
        let token = self.task_fence.issue();
        let loader = TwoStageLoader::new(self.store.as_deref(), self.network.as_ref());
        let loaded = loader
            .load_tasks(&self.config.programs.task_marketplace)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "task load failed");
                err
            })?;
        let mut state = self.state.write();
        if !self.task_fence.is_current(token) {
            tracing::debug!(?token, "discarding superseded task load");
            return Ok(LoadOutcome::Superseded);
        }
        self.warnings.record(&loaded.stats);
        let count = loaded.records.len();
        state.tasks = loaded.records;
        state.tasks_from = Some(loaded.served_by);
        state.recompute_stats();
        Ok(LoadOutcome::Applied {
            served_by: loaded.served_by,
            count,
        })
    }

    pub async fn reload_lessons(&self) -> Result<LoadOutcome> {
        let token = self.lesson_fence.issue();
        let (vault, _) = vault_address(&self.config.programs.knowledge_vault);
        let loader = TwoStageLoader::new(self.store.as_deref(), self.network.as_ref());
        let loaded = loader
            .load_lessons(&self.config.programs.knowledge_vault, vault)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "lesson load failed");
                err
            })?;
        let mut state = self.state.write();
        if !self.lesson_fence.is_current(token) {
            tracing::debug!(?token, "discarding superseded lesson load");
            return Ok(LoadOutcome::Superseded);
        }
        self.warnings.record(&loaded.stats);
        let count = loaded.records.len();
        state.lessons = loaded.records;
        state.lessons_from = Some(loaded.served_by);
        Ok(LoadOutcome::Applied {
            served_by: loaded.served_by,
            count,
        })
    }

    /// Reads the vault counter; a missing vault account is an error.
    pub async fn vault_state(&self) -> Result<VaultState> {
        let (vault, _) = vault_address(&self.config.programs.knowledge_vault);
        let data = self
            .network
            .get_account_info(&vault)
            .await
            .map_err(ConnectivityError::from)?
            .ok_or(ConnectivityError::VaultNotInitialized { vault })?;
        let decoded = decode_vault_state(&data)?;
        self.state.write().vault = Some(decoded);
        Ok(decoded)
    }

    pub async fn create_task(&self, form: &CreateTaskForm) -> Result<SubmissionReceipt> {
        let wallet = self.require_wallet()?;
        let args = form.validate()?;
        let task = EphemeralSigner::generate()?;
        let ix = create_task_instruction(
            self.config.programs.task_marketplace,
            task.pubkey(),
            wallet,
            &args,
        )?;

        let signers: [&dyn TransactionSigner; 1] = [&task];
        let id = self.send(&wallet, &[ix], &signers).await?;
        tracing::info!(signature = %id, task = %task.pubkey(), reward = args.reward, "task created");
        let reload = settled(self.reload_tasks().await);
        Ok(SubmissionReceipt {
            id,
            account: task.pubkey(),
            reload,
        })
    }

    pub async fn accept_task(&self, task: &Pubkey) -> Result<SubmissionReceipt> {
        let wallet = self.require_wallet()?;
        let agent = {
            let state = self.state.read();
            state.agent
        }
        .unwrap_or_else(|| agent_address(&wallet, &self.config.programs.agent_registry).0);
        let ix = accept_task_instruction(self.config.programs.task_marketplace, *task, agent, wallet);

        let id = self.send(&wallet, &[ix], &[]).await?;
        tracing::info!(signature = %id, task = %task, "task accepted");
        let reload = settled(self.reload_tasks().await);
        Ok(SubmissionReceipt {
            id,
            account: *task,
            reload,
        })
    }

    /// Also refreshes balances, since completion pays out.
    pub async fn complete_task(&self, task: &Pubkey) -> Result<SubmissionReceipt> {
        let wallet = self.require_wallet()?;
        let ix = complete_task_instruction(self.config.programs.task_marketplace, *task, wallet);

        let id = self.send(&wallet, &[ix], &[]).await?;
        tracing::info!(signature = %id, task = %task, "task completed");
        let (tasks, balances) = futures::join!(self.reload_tasks(), self.refresh_balances());
        if let Err(err) = balances {
            tracing::warn!(error = %err, "balance refresh after completion failed");
        }
        Ok(SubmissionReceipt {
            id,
            account: *task,
            reload: settled(tasks),
        })
    }

    /// Publishes at `total_lessons + 1`; refuses if that lesson already exists.
    pub async fn publish_lesson(&self, form: &PublishLessonForm) -> Result<SubmissionReceipt> {
        let wallet = self.require_wallet()?;
        let fields = form.validate()?;
        let program = self.config.programs.knowledge_vault;
        let vault_state = self.vault_state().await?;
        let args = fields.at_sequence(vault_state.next_sequence());

        let (vault, _) = vault_address(&program);
        let (lesson, _) = lesson_address(&vault, args.sequence, &program);
        let existing = self
            .network
            .get_account_info(&lesson)
            .await
            .map_err(ConnectivityError::from)?;
        if existing.is_some() {
            tracing::warn!(lesson = %lesson, sequence = args.sequence, "lesson account already exists");
            return Err(ValidationError::LessonSequenceTaken {
                sequence: args.sequence,
            }
            .into());
        }

        let ix = publish_lesson_instruction(program, vault, lesson, wallet, &args)?;
        let id = self.send(&wallet, &[ix], &[]).await?;
        tracing::info!(signature = %id, lesson = %lesson, sequence = args.sequence, "lesson published");
        let reload = settled(self.reload_lessons().await);
        Ok(SubmissionReceipt {
            id,
            account: lesson,
            reload,
        })
    }

    /// Loads the stored profile of the connected wallet. On failure the
    /// cached profile is cleared.
    pub async fn load_profile(&self) -> Result<Option<AgentProfile>> {
        let wallet = self.require_wallet()?;
        let store = self
            .store
            .as_deref()
            .ok_or(ConnectivityError::StoreUnavailable)?;
        let token = self.profile_fence.issue();
        let result = store.get_agent_profile(&wallet.to_string()).await;

        let mut state = self.state.write();
        let current = self.profile_fence.is_current(token) && state.wallet == Some(wallet);
        match result {
            Ok(profile) => {
                if current {
                    state.profile = profile.clone();
                }
                Ok(profile)
            }
            Err(err) => {
                tracing::warn!(error = %err, "profile load failed");
                if current {
                    state.profile = None;
                }
                Err(ConnectivityError::from(err).into())
            }
        }
    }

    pub async fn save_profile(&self, form: &ProfileForm) -> Result<AgentProfile> {
        let wallet = self.require_wallet()?;
        let store = self
            .store
            .as_deref()
            .ok_or(ConnectivityError::StoreUnavailable)?;
        let payload = {
            let state = self.state.read();
            AgentProfile::for_upsert(&wallet, form.normalize(), state.profile.as_ref(), &state.stats)
        };

        let echoed = store.upsert_agent_profile(&payload).await.map_err(|err| {
            tracing::error!(error = %err, "profile update failed");
            ConnectivityError::from(err)
        })?;
        let saved = echoed.unwrap_or(payload);
        let mut state = self.state.write();
        if state.wallet == Some(wallet) {
            state.profile = Some(saved.clone());
        }
        tracing::info!(wallet = %wallet, "profile saved");
        Ok(saved)
    }

    pub fn wallet_address(&self) -> Option<Pubkey> {
        self.state.read().wallet
    }

    pub fn agent_address(&self) -> Option<Pubkey> {
        self.state.read().agent
    }

    pub fn registration(&self) -> Registration {
        self.state.read().registration
    }

    pub fn balances(&self) -> Balances {
        self.state.read().balances
    }

    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.state.read().tasks.clone()
    }

    pub fn lessons(&self) -> Vec<LessonRecord> {
        self.state.read().lessons.clone()
    }

    pub fn tasks_served_by(&self) -> Option<Stage> {
        self.state.read().tasks_from
    }

    pub fn lessons_served_by(&self) -> Option<Stage> {
        self.state.read().lessons_from
    }

    /// Tasks created by the connected wallet.
    pub fn created_tasks(&self) -> Vec<TaskRecord> {
        let state = self.state.read();
        let Some(wallet) = state.wallet else {
            return Vec::new();
        };
        state
            .tasks
            .iter()
            .filter(|task| task.creator == wallet)
            .cloned()
            .collect()
    }

    /// Tasks assigned to the connected wallet.
    pub fn accepted_tasks(&self) -> Vec<TaskRecord> {
        let state = self.state.read();
        let Some(wallet) = state.wallet else {
            return Vec::new();
        };
        state
            .tasks
            .iter()
            .filter(|task| task.assigned_agent == Some(wallet))
            .cloned()
            .collect()
    }

    pub fn task_actions(&self, task: &TaskRecord) -> TaskActions {
        TaskActions::for_task(task, self.state.read().wallet.as_ref())
    }

    pub fn profile(&self) -> Option<AgentProfile> {
        self.state.read().profile.clone()
    }

    pub fn profile_stats(&self) -> ProfileStats {
        self.state.read().stats
    }

    pub fn profile_metrics(&self) -> ProfileMetrics {
        let state = self.state.read();
        AgentProfile::metrics(state.profile.as_ref(), &state.stats)
    }

    pub fn cached_vault_state(&self) -> Option<VaultState> {
        self.state.read().vault
    }

    pub fn decode_warnings(&self) -> &DecodeWarnings {
        &self.warnings
    }

    fn require_wallet(&self) -> Result<Pubkey> {
        self.state
            .read()
            .wallet
            .ok_or_else(|| ConnectivityError::WalletNotConnected.into())
    }

    fn set_wallet(&self, wallet: Pubkey) {
        let (agent, _) = agent_address(&wallet, &self.config.programs.agent_registry);
        let mut state = self.state.write();
        if state.wallet != Some(wallet) {
            state.profile = None;
            state.registration = Registration::Unknown;
            state.balances = Balances::default();
        }
        state.wallet = Some(wallet);
        state.agent = Some(agent);
        state.recompute_stats();
    }

    async fn send(
        &self,
        wallet: &Pubkey,
        instructions: &[Instruction],
        extra_signers: &[&dyn TransactionSigner],
    ) -> Result<SubmissionId> {
        let assembler = TransactionAssembler::new(self.network.as_ref());
        let envelope = assembler.assemble(wallet, instructions, extra_signers).await?;
        Ok(assembler.submit(self.wallet.as_ref(), &envelope).await?)
    }
}

fn settled(reload: Result<LoadOutcome>) -> Option<LoadOutcome> {
    match reload {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            tracing::warn!(error = %err, "reload after submission failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(creator: Pubkey, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            pubkey: Pubkey::new_unique(),
            creator,
            title: "t".into(),
            description: "d".into(),
            reward: 1,
            deadline: 0,
            skills: Vec::new(),
            min_reputation: 0,
            status,
            assigned_agent: None,
            created_at: 0,
            completed_at: None,
        }
    }

    #[test]
    fn creator_cannot_accept_own_task() {
        let me = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        let mine = task(me, TaskStatus::Open);
        assert_eq!(TaskActions::for_task(&mine, Some(&me)), TaskActions::default());

        let theirs = task(other, TaskStatus::Open);
        assert!(TaskActions::for_task(&theirs, Some(&me)).accept);
        assert!(!TaskActions::for_task(&theirs, None).accept);
    }

    #[test]
    fn only_creator_completes_in_progress_work() {
        let me = Pubkey::new_unique();
        let running = task(me, TaskStatus::InProgress);
        assert!(TaskActions::for_task(&running, Some(&me)).complete);
        assert!(!TaskActions::for_task(&running, Some(&Pubkey::new_unique())).complete);

        let done = task(me, TaskStatus::Completed);
        assert_eq!(TaskActions::for_task(&done, Some(&me)), TaskActions::default());
    }

    #[test]
    fn balances_scale_to_display_units() {
        let balances = Balances {
            lamports: Some(1_500_000_000),
            opclw: Some(TokenAmount {
                amount: 12_500_000_000,
                decimals: 9,
            }),
        };
        assert_eq!(balances.sol(), 1.5);
        assert_eq!(balances.opclw(), 12.5);
        assert_eq!(Balances::default().opclw(), 0.0);
    }
}
