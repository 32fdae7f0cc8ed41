//! Transaction building and canonical msgpack encoding.
//!
//! Fields are declared in wire-key order and zero values are skipped, which
//! is what the network expects from a canonical encoding.

use crate::core::constants::{SIGNATURE_OVERHEAD, TX_TAG};
use crate::error::Result;
use crate::types::{Address, AppId, AssetId, Round, SuggestedParams, TxId};
use crate::utils;
use data_encoding::BASE32_NOPAD;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    AssetTransfer,
    ApplicationCall,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::AssetTransfer => "axfer",
            TxType::ApplicationCall => "appl",
        }
    }
}

impl Serialize for TxType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    #[serde(rename = "aamt", skip_serializing_if = "is_zero")]
    pub asset_amount: u64,

    #[serde(
        rename = "apaa",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_byte_slices"
    )]
    pub app_args: Vec<Vec<u8>>,

    #[serde(rename = "apas", skip_serializing_if = "Vec::is_empty")]
    pub foreign_assets: Vec<AssetId>,

    #[serde(rename = "apat", skip_serializing_if = "Vec::is_empty")]
    pub foreign_accounts: Vec<Address>,

    #[serde(rename = "apid", skip_serializing_if = "is_zero")]
    pub app_id: AppId,

    #[serde(rename = "arcv", skip_serializing_if = "Option::is_none")]
    pub asset_receiver: Option<Address>,

    #[serde(rename = "fee", skip_serializing_if = "is_zero")]
    pub fee: u64,

    #[serde(rename = "fv", skip_serializing_if = "is_zero")]
    pub first_valid: Round,

    #[serde(rename = "gen", skip_serializing_if = "String::is_empty")]
    pub genesis_id: String,

    #[serde(rename = "gh", serialize_with = "serialize_bytes")]
    pub genesis_hash: [u8; 32],

    #[serde(rename = "lv", skip_serializing_if = "is_zero")]
    pub last_valid: Round,

    #[serde(
        rename = "note",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_bytes"
    )]
    pub note: Vec<u8>,

    #[serde(rename = "snd")]
    pub sender: Address,

    #[serde(rename = "type")]
    pub tx_type: TxType,

    #[serde(rename = "xaid", skip_serializing_if = "is_zero")]
    pub asset_id: AssetId,
}

impl Transaction {
    fn base(sender: Address, tx_type: TxType, params: &SuggestedParams) -> Self {
        Self {
            asset_amount: 0,
            app_args: Vec::new(),
            foreign_assets: Vec::new(),
            foreign_accounts: Vec::new(),
            app_id: 0,
            asset_receiver: None,
            fee: 0,
            first_valid: params.first_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            last_valid: params.last_valid,
            note: Vec::new(),
            sender,
            tx_type,
            asset_id: 0,
        }
    }

    /// Zero-amount transfer of an asset to oneself, which registers the sender to hold it
    pub fn asset_opt_in(sender: Address, asset_id: AssetId, params: &SuggestedParams) -> Self {
        let mut tx = Self::base(sender, TxType::AssetTransfer, params);
        tx.asset_id = asset_id;
        tx.asset_receiver = Some(sender);
        tx
    }

    /// NoOp application call with the given (already ABI-encoded) arguments
    pub fn app_call(
        sender: Address,
        app_id: AppId,
        app_args: Vec<Vec<u8>>,
        params: &SuggestedParams,
    ) -> Self {
        let mut tx = Self::base(sender, TxType::ApplicationCall, params);
        tx.app_id = app_id;
        tx.app_args = app_args;
        tx
    }

    pub fn with_foreign_assets(mut self, assets: Vec<AssetId>) -> Self {
        self.foreign_assets = assets;
        self
    }

    pub fn with_foreign_accounts(mut self, accounts: Vec<Address>) -> Self {
        self.foreign_accounts = accounts;
        self
    }

    pub fn with_note(mut self, note: Vec<u8>) -> Self {
        self.note = note;
        self
    }

    /// Canonical msgpack encoding of the transaction body
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Bytes covered by the signature: `"TX"` followed by the encoded body
    pub fn bytes_to_sign(&self) -> Result<Vec<u8>> {
        let body = self.encode()?;
        let mut out = Vec::with_capacity(TX_TAG.len() + body.len());
        out.extend_from_slice(TX_TAG);
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn id(&self) -> Result<TxId> {
        let digest = utils::sha512_256(&self.bytes_to_sign()?);
        Ok(TxId::new(BASE32_NOPAD.encode(&digest)))
    }

    /// Size of the signed transaction, used for per-byte fee estimation
    pub fn estimate_size(&self) -> Result<u64> {
        Ok(self.encode()?.len() as u64 + SIGNATURE_OVERHEAD)
    }
}

/// A transaction with its ed25519 signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    #[serde(rename = "sig", serialize_with = "serialize_bytes")]
    signature: [u8; 64],

    #[serde(rename = "txn")]
    transaction: Transaction,
}

impl SignedTransaction {
    pub fn new(transaction: Transaction, signature: [u8; 64]) -> Self {
        Self {
            signature,
            transaction,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn signature(&self) -> &[u8; 64] {
        &self.signature
    }

    pub fn id(&self) -> Result<TxId> {
        self.transaction.id()
    }

    /// Wire encoding submitted to the node
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

fn serialize_bytes<S: Serializer, T: AsRef<[u8]>>(
    value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_bytes(value.as_ref())
}

struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

fn serialize_byte_slices<S: Serializer>(
    values: &[Vec<u8>],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for value in values {
        seq.serialize_element(&RawBytes(value))?;
    }
    seq.end()
}
