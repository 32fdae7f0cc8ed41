//! CLI error types

use claimkit_sdk::{ClaimError, ClaimSdkError};
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file missing, malformed or incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// Setting up the account, gateway or contract failed
    #[error("Setup failed: {0}")]
    Setup(#[from] ClaimSdkError),

    /// The claim workflow ended in a failure
    #[error(transparent)]
    Claim(#[from] ClaimError),
}

impl CliError {
    /// Process exit code: 2 for bad input, 75 (temporary failure) when a
    /// re-run may succeed, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 2,
            CliError::Setup(
                ClaimSdkError::InvalidMnemonic(_) | ClaimSdkError::InvalidAppSpec(_),
            ) => 2,
            CliError::Claim(e) if e.is_transient() => 75,
            _ => 1,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
