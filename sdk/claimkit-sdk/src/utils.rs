use crate::core::abi::{AppSpec, StateType};
use crate::core::connection::LedgerGateway;
use crate::core::constants::ARC4_RETURN_PREFIX;
use crate::error::{ClaimSdkError, Result};
use crate::types::{Address, AssetId, GlobalStateSnapshot, StateEntry, StateValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha512_256};

//=============================================================================
// Hashing & Encoding Helpers
//=============================================================================

/// SHA-512/256 digest, the hash used for addresses, transaction ids and ABI selectors
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    let digest = Sha512_256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Decode a standard base64 field from a node response
pub fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| ClaimSdkError::Network(format!("malformed base64 in {}: {}", field, e)))
}

//=============================================================================
// State Fetching & Parsing
//=============================================================================

/// Check whether an account already holds (is opted in to) an asset
pub async fn is_opted_in(
    gateway: &impl LedgerGateway,
    address: &Address,
    asset_id: AssetId,
) -> Result<bool> {
    let holdings = gateway.account_holdings(address).await?;
    Ok(holdings.contains(&asset_id))
}

/// Decode raw global state entries against the declared schema of an app spec.
///
/// Declared keys must carry their declared type. Undeclared keys are kept as read.
pub fn decode_global_state(
    entries: Vec<StateEntry>,
    spec: &AppSpec,
) -> Result<GlobalStateSnapshot> {
    let mut values = Vec::with_capacity(entries.len());

    for entry in entries {
        let key = String::from_utf8(entry.key).map_err(|e| ClaimSdkError::StateDecode {
            key: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            reason: "key is not valid UTF-8".to_string(),
        })?;

        if let Some(declared) = spec.declared_global(&key) {
            match (declared, &entry.value) {
                (StateType::Uint64, StateValue::Uint(_))
                | (StateType::Bytes, StateValue::Bytes(_)) => {},
                (expected, _) => {
                    let stored = value_kind(&entry.value);
                    return Err(ClaimSdkError::StateDecode {
                        key,
                        reason: format!("declared {} but stored {}", expected, stored),
                    });
                },
            }
        }

        values.push((key, entry.value));
    }

    Ok(values.into_iter().collect())
}

fn value_kind(value: &StateValue) -> &'static str {
    match value {
        StateValue::Uint(_) => "uint64",
        StateValue::Bytes(_) => "bytes",
    }
}

/// Extract the ARC-4 return value from application call logs.
///
/// The return value is the last log line carrying the return prefix.
pub fn find_return_value(logs: &[Vec<u8>]) -> Option<Vec<u8>> {
    logs.iter()
        .rev()
        .find(|log| log.starts_with(&ARC4_RETURN_PREFIX))
        .map(|log| log[ARC4_RETURN_PREFIX.len()..].to_vec())
}
