use crate::advanced::fees::FeePolicy;
use crate::advanced::transaction::Transaction;
use crate::core::abi::{AbiValue, AppSpec};
use crate::core::connection::LedgerGateway;
use crate::core::constants::DEFAULT_MAX_ROUNDS;
use crate::core::signer::ClaimSigner;
use crate::error::{ClaimSdkError, Result};
use crate::types::{Address, AppId, AssetId, CallResult, GlobalStateSnapshot};
use crate::utils;
use tracing::{debug, info};

/// Extra references and metadata attached to an application call
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Assets the contract touches (for example, the asset an inner transfer moves)
    pub foreign_assets: Vec<AssetId>,

    /// Accounts the contract reads or pays
    pub foreign_accounts: Vec<Address>,

    pub note: Vec<u8>,
}

impl CallOptions {
    pub fn with_foreign_asset(mut self, asset_id: AssetId) -> Self {
        self.foreign_assets.push(asset_id);
        self
    }
}

/// A deployed application bound to its ABI and a ledger gateway.
#[derive(Debug, Clone)]
pub struct ContractClient<G> {
    gateway: G,

    /// Application id of the deployed contract
    pub app_id: AppId,

    /// ABI description of the contract
    pub spec: AppSpec,

    /// Rounds to wait for a call to be confirmed
    pub max_rounds: u64,
}

impl<G: LedgerGateway> ContractClient<G> {
    pub fn new(gateway: G, app_id: AppId, spec: AppSpec) -> Self {
        Self {
            gateway,
            app_id,
            spec,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Rounds to wait for each call; at least one round is always polled
    pub fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Read the application's global state at the current round
    pub async fn read_global_state(&self) -> Result<GlobalStateSnapshot> {
        let entries = self
            .gateway
            .application_global_state(self.app_id)
            .await
            .map_err(|e| match e {
                ClaimSdkError::NotFound(reason) => ClaimSdkError::Network(format!(
                    "application {} cannot be fetched: {}",
                    self.app_id, reason
                )),
                other => other,
            })?;

        let snapshot = utils::decode_global_state(entries, &self.spec)?;
        debug!(app_id = self.app_id, keys = snapshot.len(), "read global state");
        Ok(snapshot)
    }

    /// Call an ABI method: build, sign, submit and wait for confirmation.
    ///
    /// Exactly one transaction is submitted. A rejected call is reported, not retried.
    pub async fn call_method(
        &self,
        method_name: &str,
        args: &[AbiValue],
        signer: &dyn ClaimSigner,
        fee_policy: FeePolicy,
        options: CallOptions,
    ) -> Result<CallResult> {
        let method = self.spec.method(method_name)?;
        let app_args = method.encode_call(args)?;

        let params = self.gateway.suggested_params().await?;
        let mut tx = Transaction::app_call(signer.address(), self.app_id, app_args, &params)
            .with_foreign_assets(options.foreign_assets)
            .with_foreign_accounts(options.foreign_accounts)
            .with_note(options.note);
        fee_policy.apply(&mut tx, &params)?;

        let signed = signer.sign_transaction(&tx).await?;
        let rejected = |reason: String| ClaimSdkError::CallRejected {
            method: method.signature(),
            reason,
        };

        let tx_id = self.gateway.submit(&signed).await.map_err(|e| match e {
            ClaimSdkError::Rejected(reason) => rejected(reason),
            other => other,
        })?;
        info!(
            app_id = self.app_id,
            method = %method.signature(),
            %tx_id,
            fee = tx.fee,
            "submitted application call"
        );

        let receipt = self
            .gateway
            .wait_for_confirmation(&tx_id, self.max_rounds)
            .await
            .map_err(|e| match e {
                ClaimSdkError::Rejected(reason) => rejected(reason),
                other => other,
            })?;

        let return_value = if method.returns_void() {
            None
        } else {
            utils::find_return_value(&receipt.logs)
        };

        Ok(CallResult {
            tx_id: receipt.tx_id,
            confirmed_round: receipt.confirmed_round,
            return_value,
        })
    }
}
