#![allow(dead_code)]

use async_trait::async_trait;
use claimkit_sdk::advanced::transaction::{SignedTransaction, TxType};
use claimkit_sdk::core::connection::LedgerGateway;
use claimkit_sdk::types::{
    Address, AppId, AssetId, PendingTransaction, Round, StateEntry, StateValue, SuggestedParams,
    TxId,
};
use claimkit_sdk::{AppSpec, ClaimSdkError, ClaimWorkflow, ContractClient, LocalAccount, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const APP_ID: AppId = 736014374;

#[derive(Default)]
struct LedgerState {
    round: Round,
    global_state: Vec<StateEntry>,
    holdings: BTreeMap<Address, BTreeSet<AssetId>>,
    submitted: Vec<SignedTransaction>,
    /// tx id -> (round it confirms in, transaction)
    in_flight: HashMap<TxId, (Round, SignedTransaction)>,
    confirmed: HashMap<TxId, Round>,
    transient_read_failures: u32,
    read_attempts: u32,
}

/// In-memory ledger with a single application, confirming transactions one round after submission.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
    fee_per_byte: u64,
    reject_opt_ins: Option<String>,
    reject_app_calls: Option<String>,
    never_confirm: bool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_global_uint(self, key: &str, value: u64) -> Self {
        self.state.lock().await.global_state.push(StateEntry {
            key: key.as_bytes().to_vec(),
            value: StateValue::Uint(value),
        });
        self
    }

    pub async fn with_global_bytes(self, key: &str, value: &[u8]) -> Self {
        self.state.lock().await.global_state.push(StateEntry {
            key: key.as_bytes().to_vec(),
            value: StateValue::Bytes(value.to_vec()),
        });
        self
    }

    pub async fn with_holding(self, address: Address, asset_id: AssetId) -> Self {
        self.state
            .lock()
            .await
            .holdings
            .entry(address)
            .or_default()
            .insert(asset_id);
        self
    }

    pub fn with_fee_per_byte(mut self, fee_per_byte: u64) -> Self {
        self.fee_per_byte = fee_per_byte;
        self
    }

    pub fn rejecting_opt_ins(mut self, reason: &str) -> Self {
        self.reject_opt_ins = Some(reason.to_string());
        self
    }

    pub fn rejecting_app_calls(mut self, reason: &str) -> Self {
        self.reject_app_calls = Some(reason.to_string());
        self
    }

    /// Accept application calls again, keeping the shared ledger state
    pub fn accepting_app_calls(mut self) -> Self {
        self.reject_app_calls = None;
        self
    }

    /// Advance rounds without ever confirming submitted transactions
    pub fn never_confirming(mut self) -> Self {
        self.never_confirm = true;
        self
    }

    /// Make the next `count` state reads fail with a network error
    pub async fn fail_reads(self, count: u32) -> Self {
        self.state.lock().await.transient_read_failures = count;
        self
    }

    pub async fn submitted(&self) -> Vec<SignedTransaction> {
        self.state.lock().await.submitted.clone()
    }

    pub async fn submitted_of(&self, kind: TxType) -> Vec<SignedTransaction> {
        self.submitted()
            .await
            .into_iter()
            .filter(|tx| tx.transaction().tx_type == kind)
            .collect()
    }

    pub async fn holds(&self, address: &Address, asset_id: AssetId) -> bool {
        self.state
            .lock()
            .await
            .holdings
            .get(address)
            .map(|h| h.contains(&asset_id))
            .unwrap_or(false)
    }

    pub async fn read_attempts(&self) -> u32 {
        self.state.lock().await.read_attempts
    }

    async fn read_gate(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.read_attempts += 1;
        if state.transient_read_failures > 0 {
            state.transient_read_failures -= 1;
            return Err(ClaimSdkError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn account_holdings(&self, address: &Address) -> Result<BTreeSet<AssetId>> {
        self.read_gate().await?;
        Ok(self
            .state
            .lock()
            .await
            .holdings
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn application_global_state(&self, app_id: AppId) -> Result<Vec<StateEntry>> {
        self.read_gate().await?;
        if app_id != APP_ID {
            return Err(ClaimSdkError::NotFound(format!("application {} does not exist", app_id)));
        }
        Ok(self.state.lock().await.global_state.clone())
    }

    async fn suggested_params(&self) -> Result<SuggestedParams> {
        let round = self.state.lock().await.round;
        Ok(SuggestedParams {
            fee_per_byte: self.fee_per_byte,
            min_fee: 1_000,
            first_valid: round,
            last_valid: round + 1_000,
            genesis_id: "mocknet-v1".to_string(),
            genesis_hash: [9u8; 32],
        })
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxId> {
        let rejection = match tx.transaction().tx_type {
            TxType::AssetTransfer => self.reject_opt_ins.clone(),
            TxType::ApplicationCall => self.reject_app_calls.clone(),
        };

        let mut state = self.state.lock().await;
        state.submitted.push(tx.clone());
        if let Some(reason) = rejection {
            return Err(ClaimSdkError::Rejected(reason));
        }

        let tx_id = tx.id()?;
        let confirm_at = state.round + 1;
        state.in_flight.insert(tx_id.clone(), (confirm_at, tx.clone()));
        Ok(tx_id)
    }

    async fn last_round(&self) -> Result<Round> {
        Ok(self.state.lock().await.round)
    }

    async fn wait_for_block_after(&self, round: Round) -> Result<Round> {
        let mut state = self.state.lock().await;
        state.round = state.round.max(round) + 1;
        if self.never_confirm {
            return Ok(state.round);
        }

        let now = state.round;
        let due: Vec<TxId> = state
            .in_flight
            .iter()
            .filter(|(_, (at, _))| *at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for tx_id in due {
            if let Some((_, signed)) = state.in_flight.remove(&tx_id) {
                let tx = signed.transaction();
                if tx.tx_type == TxType::AssetTransfer && tx.asset_receiver == Some(tx.sender) {
                    state.holdings.entry(tx.sender).or_default().insert(tx.asset_id);
                }
                state.confirmed.insert(tx_id, now);
            }
        }
        Ok(now)
    }

    async fn pending_transaction(&self, tx_id: &TxId) -> Result<PendingTransaction> {
        let state = self.state.lock().await;
        if let Some(round) = state.confirmed.get(tx_id) {
            return Ok(PendingTransaction {
                confirmed_round: Some(*round),
                ..Default::default()
            });
        }
        if state.in_flight.contains_key(tx_id) {
            return Ok(PendingTransaction::default());
        }
        Err(ClaimSdkError::NotFound(format!("transaction {} not found", tx_id)))
    }
}

pub fn test_account() -> LocalAccount {
    LocalAccount::from_seed([21u8; 32])
}

pub fn workflow(ledger: &MockLedger) -> ClaimWorkflow<MockLedger, LocalAccount> {
    let spec = AppSpec::default_claim_spec().expect("default spec parses");
    let contract = ContractClient::new(ledger.clone(), APP_ID, spec);
    ClaimWorkflow::new(contract, test_account())
}
