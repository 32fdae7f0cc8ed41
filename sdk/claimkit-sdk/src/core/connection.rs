use crate::advanced::transaction::SignedTransaction;
use crate::error::{ClaimSdkError, Result};
use crate::types::{
    Address, AppId, AssetId, ConfirmedReceipt, PendingTransaction, Round, StateEntry,
    SuggestedParams, TxId,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

/// Network access needed to read state and push transactions through to confirmation.
///
/// Implemented over HTTP by [`crate::core::algod::AlgodGateway`]; tests provide
/// in-memory ledgers.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Asset ids the account currently holds (is opted in to)
    async fn account_holdings(&self, address: &Address) -> Result<BTreeSet<AssetId>>;

    /// Raw global state of an application at the current round
    async fn application_global_state(&self, app_id: AppId) -> Result<Vec<StateEntry>>;

    async fn suggested_params(&self) -> Result<SuggestedParams>;

    /// Submit a signed transaction. Synchronous refusal is reported as `Rejected`.
    async fn submit(&self, tx: &SignedTransaction) -> Result<TxId>;

    /// Latest round known to the node
    async fn last_round(&self) -> Result<Round>;

    /// Block until the node has seen a block after `round`; returns the new last round
    async fn wait_for_block_after(&self, round: Round) -> Result<Round>;

    async fn pending_transaction(&self, tx_id: &TxId) -> Result<PendingTransaction>;

    /// Poll round by round until `tx_id` is confirmed or `max_rounds` rounds pass.
    async fn wait_for_confirmation(
        &self,
        tx_id: &TxId,
        max_rounds: u64,
    ) -> Result<ConfirmedReceipt> {
        let start = self.last_round().await?;
        let mut current = start;

        while current < start + max_rounds {
            match self.pending_transaction(tx_id).await {
                Ok(pending) => {
                    if let Some(confirmed_round) = pending.confirmed_round.filter(|r| *r > 0) {
                        debug!(%tx_id, confirmed_round, "transaction confirmed");
                        return Ok(ConfirmedReceipt {
                            tx_id: tx_id.clone(),
                            confirmed_round,
                            logs: pending.logs,
                        });
                    }
                    if !pending.pool_error.is_empty() {
                        return Err(ClaimSdkError::Rejected(pending.pool_error));
                    }
                },
                // Not visible to this node yet
                Err(ClaimSdkError::NotFound(_)) => {},
                Err(e) => return Err(e),
            }

            debug!(%tx_id, round = current, "waiting for next round");
            current = self.wait_for_block_after(current).await?.max(current + 1);
        }

        Err(ClaimSdkError::Timeout {
            tx_id: tx_id.clone(),
            rounds: max_rounds,
        })
    }
}
