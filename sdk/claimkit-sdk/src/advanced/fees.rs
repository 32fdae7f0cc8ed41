use crate::advanced::transaction::Transaction;
use crate::core::constants::{CLAIM_FEE, MIN_TXN_FEE};
use crate::error::Result;
use crate::types::SuggestedParams;

/// How the fee of an outgoing transaction is chosen.
///
/// A flat policy pays exactly `min_fee` whatever the network suggests. This
/// is what calls issuing inner transactions need: the outer fee must cover the
/// minimum fee of every inner transaction it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// Lower bound for the fee, or the exact fee when `flat` is set
    pub min_fee: u64,

    /// Use `min_fee` verbatim instead of the suggested per-byte fee
    pub flat: bool,
}

impl FeePolicy {
    /// Suggested per-byte fee, never below the network minimum
    pub fn suggested() -> Self {
        Self {
            min_fee: 0,
            flat: false,
        }
    }

    pub fn flat(fee: u64) -> Self {
        Self {
            min_fee: fee,
            flat: true,
        }
    }

    /// Flat fee used by `claimAsset`
    pub fn claim() -> Self {
        Self::flat(CLAIM_FEE)
    }

    /// Compute the fee for `tx` under this policy
    pub fn fee_for(&self, tx: &Transaction, params: &SuggestedParams) -> Result<u64> {
        if self.flat {
            return Ok(self.min_fee);
        }

        let by_size = params.fee_per_byte.saturating_mul(tx.estimate_size()?);
        let network_min = if params.min_fee > 0 {
            params.min_fee
        } else {
            MIN_TXN_FEE
        };
        Ok(by_size.max(network_min).max(self.min_fee))
    }

    /// Set the fee of `tx` under this policy
    pub fn apply(&self, tx: &mut Transaction, params: &SuggestedParams) -> Result<()> {
        tx.fee = self.fee_for(tx, params)?;
        Ok(())
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::suggested()
    }
}
