use crate::types::{Address, TxId};
use thiserror::Error;

/// SDK-specific error types for ledger and contract operations
#[derive(Debug, Error)]
pub enum ClaimSdkError {
    /// Connectivity, HTTP or node-side failure while talking to the network
    #[error("Network error: {0}")]
    Network(String),

    /// Account, application or transaction unknown to the network
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transaction refused by the node (bad fee, stale params, overspend)
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Transaction not confirmed within the round budget
    #[error("Transaction {tx_id} not confirmed after {rounds} rounds")]
    Timeout { tx_id: TxId, rounds: u64 },

    /// Global state value does not match its declared ABI type
    #[error("Cannot decode state key {key:?}: {reason}")]
    StateDecode { key: String, reason: String },

    /// Method not declared in the application spec
    #[error("Method {0} not declared in the application spec")]
    MethodNotFound(String),

    /// Application call rejected by the node or the contract logic
    #[error("Call to {method} rejected: {reason}")]
    CallRejected { method: String, reason: String },

    /// Application spec could not be parsed
    #[error("Invalid application spec: {0}")]
    InvalidAppSpec(String),

    /// ABI argument does not match the declared method signature
    #[error("Invalid ABI argument: {0}")]
    InvalidArgument(String),

    /// Mnemonic has the wrong length, unknown words or a bad checksum
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Address is not valid base32 or has a bad checksum
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Account unknown to the network
    #[error("Account not found: {0}")]
    AccountNotFound(Address),

    /// Msgpack encoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] rmp_serde::encode::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ClaimSdkError {
    /// Network and confirmation failures clear up on their own; re-running is safe.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }
}

impl From<reqwest::Error> for ClaimSdkError {
    fn from(err: reqwest::Error) -> Self {
        ClaimSdkError::Network(err.to_string())
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, ClaimSdkError>;
