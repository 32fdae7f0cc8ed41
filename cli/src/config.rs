//! Configuration for the claimkit CLI
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags and `CLAIMKIT_*` environment variables.

use crate::error::{CliError, CliResult};
use claimkit_sdk::core::constants::{
    CLAIM_FEE, DEFAULT_ALGOD_URL, DEFAULT_MAX_ROUNDS, MIN_TXN_FEE,
};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Main CLI configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimConfig {
    /// Node and indexer endpoints
    #[serde(default)]
    pub network: NetworkConfig,

    /// Target contract
    #[serde(default)]
    pub contract: ContractConfig,

    /// Claiming account
    #[serde(default)]
    pub account: AccountConfig,

    /// Workflow tuning
    #[serde(default)]
    pub claim: ClaimSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    #[serde(default = "default_algod_url")]
    pub algod_url: String,

    #[serde(default)]
    pub algod_token: Option<Secret>,

    /// Serve holdings lookups from an indexer when set
    #[serde(default)]
    pub indexer_url: Option<String>,

    #[serde(default)]
    pub indexer_token: Option<Secret>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            algod_url: default_algod_url(),
            algod_token: None,
            indexer_url: None,
            indexer_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractConfig {
    /// Application id of the claim contract
    #[serde(default)]
    pub app_id: u64,

    /// ARC-32 spec file; the built-in claim spec is used when unset
    #[serde(default)]
    pub app_spec: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// 25-word mnemonic of the claiming account
    #[serde(default)]
    pub mnemonic: Option<Secret>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimSettings {
    /// Rounds to wait for each transaction
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u64,

    /// Flat fee of the claim call in microAlgos
    #[serde(default = "default_claim_fee")]
    pub fee: u64,

    /// Extra attempts for failed state reads
    #[serde(default)]
    pub read_retries: u32,

    /// Delay before the first read retry, in milliseconds
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            fee: default_claim_fee(),
            read_retries: 0,
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level, used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// A string that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub app_id: Option<u64>,
    pub app_spec: Option<PathBuf>,
    pub algod_url: Option<String>,
    pub algod_token: Option<Secret>,
    pub indexer_url: Option<String>,
    pub indexer_token: Option<Secret>,
    pub mnemonic: Option<Secret>,
    pub max_rounds: Option<u64>,
    pub claim_fee: Option<u64>,
    pub read_retries: Option<u32>,
    pub log_level: Option<String>,
    pub log_json: bool,
}

// Default value helpers
fn default_algod_url() -> String {
    DEFAULT_ALGOD_URL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_rounds() -> u64 {
    DEFAULT_MAX_ROUNDS
}

fn default_claim_fee() -> u64 {
    CLAIM_FEE
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClaimConfig {
    /// Load configuration from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply command-line and environment overrides on top of file values
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(app_id) = overrides.app_id {
            self.contract.app_id = app_id;
        }
        if overrides.app_spec.is_some() {
            self.contract.app_spec = overrides.app_spec;
        }
        if let Some(url) = overrides.algod_url {
            self.network.algod_url = url;
        }
        if overrides.algod_token.is_some() {
            self.network.algod_token = overrides.algod_token;
        }
        if overrides.indexer_url.is_some() {
            self.network.indexer_url = overrides.indexer_url;
        }
        if overrides.indexer_token.is_some() {
            self.network.indexer_token = overrides.indexer_token;
        }
        if overrides.mnemonic.is_some() {
            self.account.mnemonic = overrides.mnemonic;
        }
        if let Some(max_rounds) = overrides.max_rounds {
            self.claim.max_rounds = max_rounds;
        }
        if let Some(fee) = overrides.claim_fee {
            self.claim.fee = fee;
        }
        if let Some(retries) = overrides.read_retries {
            self.claim.read_retries = retries;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self.logging.json |= overrides.log_json;
    }

    /// Check that everything needed for a run is present and sane
    pub fn validate(&self) -> CliResult<()> {
        if self.contract.app_id == 0 {
            return Err(CliError::Config(
                "no application id (set contract.app_id or CLAIMKIT_APP_ID)".to_string(),
            ));
        }
        if self.account.mnemonic.as_ref().map_or(true, |m| m.expose().trim().is_empty()) {
            return Err(CliError::Config(
                "no account mnemonic (set account.mnemonic or CLAIMKIT_MNEMONIC)".to_string(),
            ));
        }
        if self.claim.fee < MIN_TXN_FEE {
            return Err(CliError::Config(format!(
                "claim fee {} is below the network minimum of {}",
                self.claim.fee, MIN_TXN_FEE
            )));
        }
        if self.claim.max_rounds == 0 {
            return Err(CliError::Config("max_rounds must be at least 1".to_string()));
        }
        if self.network.request_timeout_secs == 0 {
            return Err(CliError::Config("request_timeout_secs must be at least 1".to_string()));
        }
        if self.network.algod_url.trim().is_empty() {
            return Err(CliError::Config("algod_url is empty".to_string()));
        }
        Ok(())
    }
}
