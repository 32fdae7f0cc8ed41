pub mod advanced;
pub mod basic;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::advanced::fees::FeePolicy;
pub use crate::advanced::transaction::{SignedTransaction, Transaction};
pub use crate::basic::claim::{
    extract_asset_id, ClaimError, ClaimReceipt, ClaimStep, ClaimWorkflow, RetryPolicy,
};
pub use crate::basic::contract::{CallOptions, ContractClient};
pub use crate::core::abi::{AbiValue, AppSpec};
pub use crate::core::algod::AlgodGateway;
pub use crate::core::connection::LedgerGateway;
pub use crate::core::signer::{ClaimSigner, LocalAccount};
pub use crate::error::{ClaimSdkError, Result};
pub use crate::types::{
    Address, AppId, AssetId, CallResult, ConfirmedReceipt, GlobalStateSnapshot, Round,
    StateValue, TxId,
};
pub use crate::utils::is_opted_in;
