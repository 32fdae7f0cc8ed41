//! ARC-32 application specs and ARC-4 method encoding.

use crate::error::{ClaimSdkError, Result};
use crate::types::Address;
use crate::utils;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const DEFAULT_CLAIM_SPEC: &str = include_str!("../../abi/asset_claim.arc32.json");

/// ARC-4 caps direct method arguments; longer lists are packed into a tuple
const MAX_DIRECT_ARGS: usize = 15;

/// Declared type of a global state key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Uint64,
    Bytes,
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateType::Uint64 => f.write_str("uint64"),
            StateType::Bytes => f.write_str("bytes"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeclaredKey {
    #[serde(rename = "type")]
    pub kind: StateType,
    pub key: String,
    #[serde(default)]
    pub descr: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateSchema {
    #[serde(default)]
    pub declared: BTreeMap<String, DeclaredKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub global: StateSchema,
    #[serde(default)]
    pub local: StateSchema,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodArg {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodReturn {
    #[serde(rename = "type")]
    pub kind: String,
}

/// A contract method as declared in the ABI
#[derive(Debug, Clone, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub args: Vec<MethodArg>,
    pub returns: MethodReturn,
    #[serde(default)]
    pub desc: Option<String>,
}

impl Method {
    /// Canonical signature, e.g. `claimAsset()void`
    pub fn signature(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(|a| a.kind.as_str()).collect();
        format!("{}({}){}", self.name, args.join(","), self.returns.kind)
    }

    /// First four bytes of the SHA-512/256 digest of the signature
    pub fn selector(&self) -> [u8; 4] {
        let digest = utils::sha512_256(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    pub fn returns_void(&self) -> bool {
        self.returns.kind == "void"
    }

    /// Build the application arguments: selector followed by each encoded argument
    pub fn encode_call(&self, args: &[AbiValue]) -> Result<Vec<Vec<u8>>> {
        if args.len() != self.args.len() {
            return Err(ClaimSdkError::InvalidArgument(format!(
                "{} takes {} arguments, got {}",
                self.signature(),
                self.args.len(),
                args.len()
            )));
        }
        if args.len() > MAX_DIRECT_ARGS {
            return Err(ClaimSdkError::InvalidArgument(format!(
                "{} has more than {} arguments",
                self.signature(),
                MAX_DIRECT_ARGS
            )));
        }

        let mut app_args = Vec::with_capacity(args.len() + 1);
        app_args.push(self.selector().to_vec());
        for (declared, value) in self.args.iter().zip(args) {
            app_args.push(value.encode_as(&declared.kind)?);
        }
        Ok(app_args)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contract {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<Method>,
}

/// ARC-32 application specification: contract methods plus state schema
#[derive(Debug, Clone, Deserialize)]
pub struct AppSpec {
    pub contract: Contract,
    #[serde(default)]
    pub schema: Schema,
}

impl AppSpec {
    /// Parse an ARC-32 JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClaimSdkError::InvalidAppSpec(e.to_string()))
    }

    /// Load an ARC-32 JSON document from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClaimSdkError::InvalidAppSpec(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Spec of the asset claim contract: `claimAsset()void` and a uint64 `asset` key
    pub fn default_claim_spec() -> Result<Self> {
        Self::from_json(DEFAULT_CLAIM_SPEC)
    }

    pub fn method(&self, name: &str) -> Result<&Method> {
        self.contract
            .methods
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ClaimSdkError::MethodNotFound(name.to_string()))
    }

    /// Declared type of a global state key, looked up by its on-chain key
    pub fn declared_global(&self, key: &str) -> Option<StateType> {
        self.schema
            .global
            .declared
            .values()
            .find(|d| d.key == key)
            .map(|d| d.kind)
    }
}

/// An ABI argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint64(u64),
    Bool(bool),
    Bytes(Vec<u8>),
    String(String),
    Address(Address),
}

impl AbiValue {
    fn encode_as(&self, abi_type: &str) -> Result<Vec<u8>> {
        match (abi_type, self) {
            ("uint64", AbiValue::Uint64(v)) => Ok(v.to_be_bytes().to_vec()),
            ("bool", AbiValue::Bool(b)) => Ok(vec![if *b { 0x80 } else { 0x00 }]),
            ("byte[]", AbiValue::Bytes(b)) => length_prefixed(b),
            ("string", AbiValue::String(s)) => length_prefixed(s.as_bytes()),
            ("address", AbiValue::Address(a)) => Ok(a.as_bytes().to_vec()),
            (expected, value) => Err(ClaimSdkError::InvalidArgument(format!(
                "cannot encode {:?} as {}",
                value, expected
            ))),
        }
    }
}

fn length_prefixed(data: &[u8]) -> Result<Vec<u8>> {
    let len = u16::try_from(data.len())
        .map_err(|_| ClaimSdkError::InvalidArgument("dynamic argument too long".to_string()))?;
    let mut out = Vec::with_capacity(2 + data.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(data);
    Ok(out)
}
