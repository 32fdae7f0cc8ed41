//! The claim workflow: resolve the asset, register for it if needed, claim it.
//!
//! Steps run strictly forward and each one fails fast. Reads are safe to repeat;
//! the registration and claim transactions are each submitted at most once.

use crate::advanced::fees::FeePolicy;
use crate::advanced::transaction::Transaction;
use crate::basic::contract::{CallOptions, ContractClient};
use crate::core::connection::LedgerGateway;
use crate::core::constants::{ASSET_STATE_KEY, CLAIM_FEE, CLAIM_METHOD};
use crate::core::signer::ClaimSigner;
use crate::error::ClaimSdkError;
use crate::types::{AssetId, GlobalStateSnapshot, Round, StateValue, TxId};
use crate::utils;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Workflow states, in the order they are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClaimStep {
    Init,
    ResolveAssetId,
    CheckRegistration,
    Register,
    InvokeClaim,
    Done,
}

impl fmt::Display for ClaimStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClaimStep::Init => "Init",
            ClaimStep::ResolveAssetId => "ResolveAssetId",
            ClaimStep::CheckRegistration => "CheckRegistration",
            ClaimStep::Register => "Register",
            ClaimStep::InvokeClaim => "InvokeClaim",
            ClaimStep::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a claim run
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Required on-chain state is missing or invalid
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A read step could not complete
    #[error("{step} failed: {source}")]
    Read {
        step: ClaimStep,
        #[source]
        source: ClaimSdkError,
    },

    /// The registration (opt-in) transaction was not confirmed
    #[error("Registration for asset {asset_id} failed: {source}")]
    Registration {
        asset_id: AssetId,
        #[source]
        source: ClaimSdkError,
    },

    /// The claim call was rejected or not confirmed
    #[error("Claim of asset {asset_id} failed: {source}")]
    Claim {
        asset_id: AssetId,
        #[source]
        source: ClaimSdkError,
    },
}

impl ClaimError {
    /// Step the workflow was in when it failed
    pub fn step(&self) -> ClaimStep {
        match self {
            ClaimError::Precondition(_) => ClaimStep::ResolveAssetId,
            ClaimError::Read { step, .. } => *step,
            ClaimError::Registration { .. } => ClaimStep::Register,
            ClaimError::Claim { .. } => ClaimStep::InvokeClaim,
        }
    }

    /// Whether re-running the whole workflow may succeed without outside changes
    pub fn is_transient(&self) -> bool {
        match self {
            ClaimError::Precondition(_) => false,
            ClaimError::Read { source, .. }
            | ClaimError::Registration { source, .. }
            | ClaimError::Claim { source, .. } => source.is_transient(),
        }
    }
}

/// Bounded retry for transient failures of read steps.
///
/// Transactions are never resubmitted; only ResolveAssetId and
/// CheckRegistration are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per read, including the first
    pub attempts: u32,

    /// Delay before the first retry; doubled after each retry
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Successful outcome of a claim run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub asset_id: AssetId,

    /// Registration transaction, when the account was not yet registered
    pub registration_tx: Option<TxId>,

    pub claim_tx: TxId,

    pub confirmed_round: Round,
}

/// Extract the claimable asset id from a global state snapshot.
///
/// The key must be present and hold a strictly positive integer.
pub fn extract_asset_id(snapshot: &GlobalStateSnapshot) -> Result<AssetId, ClaimError> {
    match snapshot.get(ASSET_STATE_KEY) {
        None => Err(ClaimError::Precondition(format!(
            "global state has no {:?} key",
            ASSET_STATE_KEY
        ))),
        Some(StateValue::Bytes(_)) => Err(ClaimError::Precondition(format!(
            "global state key {:?} is not numeric",
            ASSET_STATE_KEY
        ))),
        Some(StateValue::Uint(0)) => Err(ClaimError::Precondition(format!(
            "global state key {:?} is zero",
            ASSET_STATE_KEY
        ))),
        Some(StateValue::Uint(asset_id)) => Ok(*asset_id),
    }
}

/// Drives one account through one claim sequence against one contract.
pub struct ClaimWorkflow<G, S> {
    contract: ContractClient<G>,
    signer: S,
    retry: RetryPolicy,
    claim_fee: FeePolicy,
}

impl<G: LedgerGateway, S: ClaimSigner> ClaimWorkflow<G, S> {
    pub fn new(contract: ContractClient<G>, signer: S) -> Self {
        Self {
            contract,
            signer,
            retry: RetryPolicy::none(),
            claim_fee: FeePolicy::claim(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Raise the flat claim fee. Values below the claim minimum are ignored.
    pub fn with_claim_fee(mut self, fee: u64) -> Self {
        self.claim_fee = FeePolicy::flat(fee.max(CLAIM_FEE));
        self
    }

    pub fn claim_fee(&self) -> FeePolicy {
        self.claim_fee
    }

    pub fn contract(&self) -> &ContractClient<G> {
        &self.contract
    }

    /// Run every step once and return the single terminal outcome
    pub async fn run(&self) -> Result<ClaimReceipt, ClaimError> {
        info!(
            step = %ClaimStep::Init,
            app_id = self.contract.app_id,
            account = %self.signer.address(),
            "starting claim"
        );

        let asset_id = self.resolve_asset_id().await?;

        let registration_tx = if self.check_registration(asset_id).await? {
            info!(asset_id, "account already registered, skipping registration");
            None
        } else {
            Some(self.register(asset_id).await?)
        };

        let (claim_tx, confirmed_round) = self.invoke_claim(asset_id).await?;
        info!(step = %ClaimStep::Done, asset_id, %claim_tx, confirmed_round, "claim confirmed");

        Ok(ClaimReceipt {
            asset_id,
            registration_tx,
            claim_tx,
            confirmed_round,
        })
    }

    /// Read the global state and extract the asset id
    pub async fn resolve_asset_id(&self) -> Result<AssetId, ClaimError> {
        info!(
            step = %ClaimStep::ResolveAssetId,
            app_id = self.contract.app_id,
            "reading global state"
        );
        let snapshot = self
            .with_read_retry(ClaimStep::ResolveAssetId, || self.contract.read_global_state())
            .await?;

        let asset_id = extract_asset_id(&snapshot)?;
        info!(asset_id, "resolved asset id");
        Ok(asset_id)
    }

    /// Whether the account already holds the asset
    pub async fn check_registration(&self, asset_id: AssetId) -> Result<bool, ClaimError> {
        let address = self.signer.address();
        info!(
            step = %ClaimStep::CheckRegistration,
            asset_id,
            account = %address,
            "checking holdings"
        );

        self.with_read_retry(ClaimStep::CheckRegistration, || {
            utils::is_opted_in(self.contract.gateway(), &address, asset_id)
        })
        .await
    }

    /// Submit the zero-amount self transfer that registers the account, and wait for it
    pub async fn register(&self, asset_id: AssetId) -> Result<TxId, ClaimError> {
        info!(step = %ClaimStep::Register, asset_id, "registering account for asset");
        let failed = |source| ClaimError::Registration { asset_id, source };

        let gateway = self.contract.gateway();
        let params = gateway.suggested_params().await.map_err(failed)?;
        let mut tx = Transaction::asset_opt_in(self.signer.address(), asset_id, &params);
        FeePolicy::suggested().apply(&mut tx, &params).map_err(failed)?;

        let signed = self.signer.sign_transaction(&tx).await.map_err(failed)?;
        let tx_id = gateway.submit(&signed).await.map_err(failed)?;
        info!(asset_id, %tx_id, fee = tx.fee, "submitted registration");

        let receipt = gateway
            .wait_for_confirmation(&tx_id, self.contract.max_rounds)
            .await
            .map_err(failed)?;
        info!(
            asset_id,
            tx_id = %receipt.tx_id,
            round = receipt.confirmed_round,
            "registration confirmed"
        );
        Ok(receipt.tx_id)
    }

    /// Call the claim method with the flat claim fee
    pub async fn invoke_claim(&self, asset_id: AssetId) -> Result<(TxId, Round), ClaimError> {
        info!(
            step = %ClaimStep::InvokeClaim,
            asset_id,
            fee = self.claim_fee.min_fee,
            "calling {}",
            CLAIM_METHOD
        );

        let result = self
            .contract
            .call_method(
                CLAIM_METHOD,
                &[],
                &self.signer,
                self.claim_fee,
                CallOptions::default().with_foreign_asset(asset_id),
            )
            .await
            .map_err(|source| ClaimError::Claim { asset_id, source })?;

        Ok((result.tx_id, result.confirmed_round))
    }

    async fn with_read_retry<T, F, Fut>(
        &self,
        step: ClaimStep,
        mut read: F,
    ) -> Result<T, ClaimError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = crate::error::Result<T>>,
    {
        let mut attempt = 1;
        let mut delay = self.retry.backoff;

        loop {
            match read().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.attempts => {
                    warn!(%step, attempt, error = %e, "read failed, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                },
                Err(source) => return Err(ClaimError::Read { step, source }),
            }
        }
    }
}
