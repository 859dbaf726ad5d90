//! In-memory wallet, RPC and record store for session tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use opclw_codec::ByteWriter;
use opclw_dashboard::capabilities::{
    Commitment, FreshnessToken, Network, RecordStore, RpcError, StoreError, SubmissionId,
    TokenAmount, WalletError, WalletProvider,
};
use opclw_dashboard::config::DEFAULT_CLUSTER;
use opclw_dashboard::{
    AgentProfile, Dashboard, DashboardConfig, Hash, LessonRow, Pubkey, RawAccount, TaskRow,
    TransactionEnvelope,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

pub fn key(byte: u8) -> Pubkey {
    Pubkey::new_from_array([byte; 32])
}

pub fn devnet() -> DashboardConfig {
    DashboardConfig::for_cluster(DEFAULT_CLUSTER).expect("devnet must resolve")
}

#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub creator: Pubkey,
    pub title: String,
    pub reward: u64,
    pub status: u8,
    pub assigned: Option<Pubkey>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

impl TaskSpec {
    pub fn open(creator: Pubkey, title: &str, created_at: i64) -> Self {
        Self {
            creator,
            title: title.to_string(),
            reward: 5_000_000_000,
            status: 0,
            assigned: None,
            created_at,
            completed_at: None,
        }
    }

    pub fn completed_by(mut self, agent: Pubkey) -> Self {
        self.status = 2;
        self.assigned = Some(agent);
        self.completed_at = Some(self.created_at + 60);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_bytes(&[1_u8; 8]);
        w.put_key(&self.creator.to_bytes());
        w.put_string(&self.title).expect("title");
        w.put_string("description").expect("description");
        w.put_u64(self.reward);
        w.put_i64(0);
        w.put_string_vec(&["rust"]).expect("skills");
        w.put_u8(10);
        w.put_u8(u64::from(self.status));
        match self.assigned {
            Some(agent) => {
                w.put_u8(1);
                w.put_key(&agent.to_bytes());
            }
            None => {
                w.put_u8(0);
            }
        }
        w.put_i64(self.created_at);
        match self.completed_at {
            Some(at) => {
                w.put_u8(1);
                w.put_i64(at);
            }
            None => {
                w.put_u8(0);
            }
        }
        w.into_bytes()
    }

    pub fn account(&self, pubkey: Pubkey) -> RawAccount {
        RawAccount {
            pubkey,
            data: self.bytes(),
        }
    }
}

pub fn lesson_bytes(vault: Pubkey, author: Pubkey, sequence: u64, created_at: i64) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.put_bytes(&[2_u8; 8]);
    w.put_key(&vault.to_bytes());
    w.put_key(&author.to_bytes());
    w.put_u8(255);
    w.put_u64(sequence);
    w.put_u64(0);
    w.put_i64(created_at);
    w.put_i64(created_at);
    w.put_string("Lesson").expect("title");
    w.put_string("Summary").expect("summary");
    w.put_string("Content").expect("content");
    w.put_string("rust,solana").expect("tags");
    w.into_bytes()
}

pub fn vault_bytes(authority: Pubkey, total_lessons: u64) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.put_bytes(&[3_u8; 8]);
    w.put_key(&authority.to_bytes());
    w.put_u8(254);
    w.put_u64(total_lessons);
    w.into_bytes()
}

pub struct MockWallet {
    pub key: Pubkey,
    pub sign_and_send: bool,
    pub reject: AtomicBool,
    pub unavailable: bool,
    pub signed: Mutex<Vec<TransactionEnvelope>>,
}

impl MockWallet {
    pub fn new(key: Pubkey) -> Self {
        Self {
            key,
            sign_and_send: false,
            reject: AtomicBool::new(false),
            unavailable: false,
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sign_and_send(mut self) -> Self {
        self.sign_and_send = true;
        self
    }

    pub fn last_envelope(&self) -> TransactionEnvelope {
        self.signed
            .lock()
            .last()
            .cloned()
            .expect("wallet must have seen a transaction")
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self) -> Result<Pubkey, WalletError> {
        if self.unavailable {
            return Err(WalletError::Unavailable);
        }
        Ok(self.key)
    }

    fn supports_sign_and_send(&self) -> bool {
        self.sign_and_send
    }

    async fn sign_and_send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SubmissionId, WalletError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("user declined".into()));
        }
        let mut signed = self.signed.lock();
        signed.push(envelope.clone());
        Ok(SubmissionId(format!("wallet-sig-{}", signed.len())))
    }

    async fn sign_transaction(&self, envelope: &TransactionEnvelope) -> Result<Vec<u8>, WalletError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("user declined".into()));
        }
        self.signed.lock().push(envelope.clone());
        Ok(envelope.serialize())
    }
}

pub struct MockNetwork {
    pub lamports: Mutex<Result<u64, RpcError>>,
    pub token: Mutex<Option<TokenAmount>>,
    pub program_accounts: Mutex<HashMap<Pubkey, Vec<RawAccount>>>,
    /// Served before `program_accounts`, one response per call.
    pub queued_program_accounts: Mutex<VecDeque<Vec<RawAccount>>>,
    pub program_accounts_error: Mutex<Option<RpcError>>,
    pub accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    pub blockhash_error: Mutex<Option<RpcError>>,
    pub confirms: AtomicBool,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub confirmations: Mutex<Vec<(SubmissionId, Commitment)>>,
    pub blockhash_calls: AtomicUsize,
    /// The next `get_program_accounts` call waits on this after taking its response.
    pub gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            lamports: Mutex::new(Ok(2_000_000_000)),
            token: Mutex::new(Some(TokenAmount {
                amount: 12_500_000_000,
                decimals: 9,
            })),
            program_accounts: Mutex::new(HashMap::new()),
            queued_program_accounts: Mutex::new(VecDeque::new()),
            program_accounts_error: Mutex::new(None),
            accounts: Mutex::new(HashMap::new()),
            blockhash_error: Mutex::new(None),
            confirms: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
            blockhash_calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
        }
    }
}

impl MockNetwork {
    pub fn set_program_accounts(&self, program: Pubkey, accounts: Vec<RawAccount>) {
        self.program_accounts.lock().insert(program, accounts);
    }

    pub fn set_account(&self, pubkey: Pubkey, data: Vec<u8>) {
        self.accounts.lock().insert(pubkey, data);
    }

    pub fn hold_next_program_accounts(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn get_balance(&self, _owner: &Pubkey) -> Result<u64, RpcError> {
        self.lamports.lock().clone()
    }

    async fn get_token_balance(
        &self,
        _owner: &Pubkey,
        _mint: &Pubkey,
    ) -> Result<Option<TokenAmount>, RpcError> {
        Ok(*self.token.lock())
    }

    async fn get_program_accounts(&self, program: &Pubkey) -> Result<Vec<RawAccount>, RpcError> {
        let failure = self.program_accounts_error.lock().clone();
        if let Some(err) = failure {
            return Err(err);
        }
        let queued = self.queued_program_accounts.lock().pop_front();
        let response = queued.unwrap_or_else(|| {
            self.program_accounts
                .lock()
                .get(program)
                .cloned()
                .unwrap_or_default()
        });
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(response)
    }

    async fn get_account_info(&self, account: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
        Ok(self.accounts.lock().get(account).cloned())
    }

    async fn get_latest_blockhash(&self) -> Result<FreshnessToken, RpcError> {
        let call = self.blockhash_calls.fetch_add(1, Ordering::SeqCst) as u8;
        let failure = self.blockhash_error.lock().clone();
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(FreshnessToken {
            blockhash: Hash::new_from_array([call.wrapping_add(1); 32]),
            last_valid_block_height: 500,
        })
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<SubmissionId, RpcError> {
        let mut sent = self.sent.lock();
        sent.push(wire.to_vec());
        Ok(SubmissionId(format!("rpc-sig-{}", sent.len())))
    }

    async fn confirm_transaction(
        &self,
        id: &SubmissionId,
        commitment: Commitment,
    ) -> Result<bool, RpcError> {
        self.confirmations.lock().push((id.clone(), commitment));
        Ok(self.confirms.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct MockStore {
    pub tasks: Mutex<Vec<TaskRow>>,
    pub lessons: Mutex<Vec<LessonRow>>,
    pub fail_loads: AtomicBool,
    pub profiles: Mutex<HashMap<String, AgentProfile>>,
    pub echo_upserts: AtomicBool,
    pub upserts: Mutex<Vec<AgentProfile>>,
}

#[async_trait]
impl RecordStore for MockStore {
    async fn load_tasks(&self) -> Result<Vec<TaskRow>, StoreError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError("relation \"tasks\" does not exist".into()));
        }
        Ok(self.tasks.lock().clone())
    }

    async fn load_lessons(&self) -> Result<Vec<LessonRow>, StoreError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError("relation \"lessons\" does not exist".into()));
        }
        Ok(self.lessons.lock().clone())
    }

    async fn get_agent_profile(&self, wallet: &str) -> Result<Option<AgentProfile>, StoreError> {
        Ok(self.profiles.lock().get(wallet).cloned())
    }

    async fn upsert_agent_profile(
        &self,
        profile: &AgentProfile,
    ) -> Result<Option<AgentProfile>, StoreError> {
        self.upserts.lock().push(profile.clone());
        self.profiles
            .lock()
            .insert(profile.wallet_address.clone(), profile.clone());
        if self.echo_upserts.load(Ordering::SeqCst) {
            Ok(Some(profile.clone()))
        } else {
            Ok(None)
        }
    }
}

pub struct Harness {
    pub wallet: Arc<MockWallet>,
    pub network: Arc<MockNetwork>,
    pub store: Option<Arc<MockStore>>,
    pub dashboard: Dashboard,
}

impl Harness {
    pub fn new(wallet: MockWallet, store: Option<MockStore>) -> Self {
        let wallet = Arc::new(wallet);
        let network = Arc::new(MockNetwork::default());
        let store = store.map(Arc::new);
        let dashboard = Dashboard::new(
            devnet(),
            wallet.clone(),
            network.clone(),
            store.clone().map(|store| store as Arc<dyn RecordStore>),
        );
        Self {
            wallet,
            network,
            store,
            dashboard,
        }
    }

    pub fn chain_only(wallet_key: Pubkey) -> Self {
        Self::new(MockWallet::new(wallet_key), None)
    }

    pub fn store(&self) -> &MockStore {
        self.store.as_deref().expect("harness has a store")
    }
}
