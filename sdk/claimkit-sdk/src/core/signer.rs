use crate::advanced::transaction::{SignedTransaction, Transaction};
use crate::core::mnemonic;
use crate::error::Result;
use crate::types::Address;
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;

/// Abstraction for an entity that can sign transactions.
/// This allows the SDK to work with:
/// 1. Local keys derived from a mnemonic (CLI)
/// 2. Remote signers such as hardware wallets or KMS backends
#[async_trait]
pub trait ClaimSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign a transaction sent from `address()`.
    async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction>;
}

/// An ed25519 account held in process memory
pub struct LocalAccount {
    signing_key: SigningKey,
    address: Address,
}

impl LocalAccount {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let address = Address::from_public_key(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    /// Derive the account from a 25-word mnemonic
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        let seed = mnemonic::seed_from_mnemonic(phrase)?;
        Ok(Self::from_seed(seed))
    }
}

impl fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ClaimSigner for LocalAccount {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction> {
        let message = tx.bytes_to_sign()?;
        let signature = self.signing_key.sign(&message);
        Ok(SignedTransaction::new(tx.clone(), signature.to_bytes()))
    }
}
