use crate::error::ClaimSdkError;
use crate::utils;
use data_encoding::BASE32_NOPAD;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Asset (ASA) identifier
pub type AssetId = u64;

/// Application identifier
pub type AppId = u64;

/// Ledger round number
pub type Round = u64;

/// 32-byte account address (an ed25519 public key)
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const LEN: usize = 32;
    const CHECKSUM_LEN: usize = 4;

    pub fn from_public_key(public_key: [u8; 32]) -> Self {
        Self(public_key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Last four bytes of the SHA-512/256 digest of the public key
    fn checksum(&self) -> [u8; 4] {
        let digest = utils::sha512_256(&self.0);
        let mut out = [0u8; Self::CHECKSUM_LEN];
        out.copy_from_slice(&digest[32 - Self::CHECKSUM_LEN..]);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(Self::LEN + Self::CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = ClaimSdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = BASE32_NOPAD
            .decode(s.trim().as_bytes())
            .map_err(|e| ClaimSdkError::InvalidAddress(format!("{}: {}", s, e)))?;
        if raw.len() != Self::LEN + Self::CHECKSUM_LEN {
            return Err(ClaimSdkError::InvalidAddress(format!(
                "{}: expected {} bytes, got {}",
                s,
                Self::LEN + Self::CHECKSUM_LEN,
                raw.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[..Self::LEN]);
        let address = Self(key);
        if address.checksum()[..] != raw[Self::LEN..] {
            return Err(ClaimSdkError::InvalidAddress(format!("{}: bad checksum", s)));
        }
        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

/// Transaction identifier (base32 digest of the encoded transaction)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed global state value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

impl StateValue {
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            StateValue::Uint(v) => Some(*v),
            StateValue::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StateValue::Bytes(b) => Some(b),
            StateValue::Uint(_) => None,
        }
    }
}

/// Raw global state entry as returned by the node (key still undecoded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: Vec<u8>,
    pub value: StateValue,
}

/// Global state of an application, read once at a single round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalStateSnapshot {
    values: BTreeMap<String, StateValue>,
}

impl GlobalStateSnapshot {
    pub fn new(values: BTreeMap<String, StateValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateValue)> {
        self.values.iter()
    }
}

impl FromIterator<(String, StateValue)> for GlobalStateSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, StateValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Network parameters needed to build a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Suggested fee per byte, in microAlgos
    pub fee_per_byte: u64,

    /// Network minimum fee per transaction, in microAlgos
    pub min_fee: u64,

    /// First round the transaction is valid in
    pub first_valid: Round,

    /// Last round the transaction is valid in
    pub last_valid: Round,

    pub genesis_id: String,

    pub genesis_hash: [u8; 32],
}

/// Node view of a submitted transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Round the transaction was confirmed in, if any
    pub confirmed_round: Option<Round>,

    /// Non-empty when the transaction pool dropped the transaction
    pub pool_error: String,

    /// Logs emitted by an application call
    pub logs: Vec<Vec<u8>>,
}

/// A transaction included in a finalized block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedReceipt {
    pub tx_id: TxId,
    pub confirmed_round: Round,
    pub logs: Vec<Vec<u8>>,
}

/// Outcome of a confirmed application call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub tx_id: TxId,
    pub confirmed_round: Round,

    /// Raw ARC-4 return value (without the return prefix), for non-void methods
    pub return_value: Option<Vec<u8>>,
}
