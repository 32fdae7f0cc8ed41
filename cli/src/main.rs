//! claimkit - claim the asset published by an Algorand claim contract
//!
//! Reads the contract's `asset` global state key, opts the account in to that
//! asset if needed, then calls `claimAsset` with a flat fee. Exits 0 once the
//! claim is confirmed.

use clap::Parser;
use claimkit_sdk::core::constants::CLAIM_FEE;
use claimkit_sdk::{
    AlgodGateway, AppSpec, ClaimReceipt, ClaimSigner, ClaimWorkflow, ContractClient,
    LocalAccount, RetryPolicy,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;

use config::{ClaimConfig, LoggingConfig, Overrides, Secret};
use error::{CliError, CliResult};

/// claimkit CLI
#[derive(Parser)]
#[command(name = "claimkit")]
#[command(about = "Claim the asset handed out by an Algorand claim contract", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CLAIMKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Application id of the claim contract
    #[arg(short, long, env = "CLAIMKIT_APP_ID")]
    app_id: Option<u64>,

    /// ARC-32 application spec file
    #[arg(long, env = "CLAIMKIT_APP_SPEC")]
    app_spec: Option<PathBuf>,

    /// Node (algod) URL
    #[arg(long, env = "CLAIMKIT_ALGOD_URL")]
    algod_url: Option<String>,

    /// Node API token
    #[arg(long, env = "CLAIMKIT_ALGOD_TOKEN", hide_env_values = true)]
    algod_token: Option<String>,

    /// Indexer URL, used for holdings lookups
    #[arg(long, env = "CLAIMKIT_INDEXER_URL")]
    indexer_url: Option<String>,

    /// Indexer API token
    #[arg(long, env = "CLAIMKIT_INDEXER_TOKEN", hide_env_values = true)]
    indexer_token: Option<String>,

    /// 25-word account mnemonic (prefer the environment variable)
    #[arg(long, env = "CLAIMKIT_MNEMONIC", hide_env_values = true)]
    mnemonic: Option<String>,

    /// Rounds to wait for each transaction
    #[arg(long, env = "CLAIMKIT_MAX_ROUNDS")]
    max_rounds: Option<u64>,

    /// Flat claim fee in microAlgos
    #[arg(long, env = "CLAIMKIT_CLAIM_FEE")]
    claim_fee: Option<u64>,

    /// Extra attempts for failed state reads
    #[arg(long, env = "CLAIMKIT_READ_RETRIES")]
    read_retries: Option<u32>,

    /// Log level
    #[arg(long, env = "CLAIMKIT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "CLAIMKIT_LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn overrides(self) -> Overrides {
        Overrides {
            app_id: self.app_id,
            app_spec: self.app_spec,
            algod_url: self.algod_url,
            algod_token: self.algod_token.map(Secret::new),
            indexer_url: self.indexer_url,
            indexer_token: self.indexer_token.map(Secret::new),
            mnemonic: self.mnemonic.map(Secret::new),
            max_rounds: self.max_rounds,
            claim_fee: self.claim_fee,
            read_retries: self.read_retries,
            log_level: self.log_level,
            log_json: self.log_json,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("claimkit: {}", e);
            return ExitCode::from(e.exit_code());
        },
    };

    init_tracing(&config.logging);

    match run(&config).await {
        Ok(receipt) => {
            info!(
                asset_id = receipt.asset_id,
                claim_tx = %receipt.claim_tx,
                registration_tx = receipt.registration_tx.as_ref().map(|t| t.as_str()),
                round = receipt.confirmed_round,
                "asset claimed"
            );
            println!("{}", receipt.claim_tx);
            ExitCode::SUCCESS
        },
        Err(CliError::Claim(e)) => {
            error!(step = %e.step(), transient = e.is_transient(), error = %e, "claim failed");
            ExitCode::from(CliError::Claim(e).exit_code())
        },
        Err(e) => {
            error!(error = %e, "claim not started");
            ExitCode::from(e.exit_code())
        },
    }
}

fn load_config(cli: Cli) -> CliResult<ClaimConfig> {
    let mut config = ClaimConfig::load(cli.config.as_deref())?;
    config.apply(cli.overrides());
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.clone().into());

    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(config: &ClaimConfig) -> CliResult<ClaimReceipt> {
    let network = &config.network;
    let mut gateway = AlgodGateway::with_timeout(
        &network.algod_url,
        network.algod_token.as_ref().map(|t| t.expose().to_string()),
        Duration::from_secs(network.request_timeout_secs),
    )?;
    if let Some(indexer_url) = &network.indexer_url {
        gateway = gateway.with_indexer(
            indexer_url,
            network.indexer_token.as_ref().map(|t| t.expose().to_string()),
        );
    }

    let mnemonic = config
        .account
        .mnemonic
        .as_ref()
        .ok_or_else(|| CliError::Config("no account mnemonic".to_string()))?;
    let account = LocalAccount::from_mnemonic(mnemonic.expose())?;

    let spec = match &config.contract.app_spec {
        Some(path) => AppSpec::from_file(path)?,
        None => AppSpec::default_claim_spec()?,
    };

    info!(
        app_id = config.contract.app_id,
        account = %account.address(),
        algod = gateway.algod_url(),
        indexer = gateway.indexer_url(),
        "claimkit v{}",
        env!("CARGO_PKG_VERSION")
    );

    if config.claim.fee < CLAIM_FEE {
        warn!(
            fee = config.claim.fee,
            minimum = CLAIM_FEE,
            "claim fee raised to the claim minimum"
        );
    }

    let contract = ContractClient::new(gateway, config.contract.app_id, spec)
        .with_max_rounds(config.claim.max_rounds);
    let retry = RetryPolicy::new(
        config.claim.read_retries.saturating_add(1),
        Duration::from_millis(config.claim.retry_backoff_ms),
    );

    let workflow = ClaimWorkflow::new(contract, account)
        .with_retry(retry)
        .with_claim_fee(config.claim.fee);

    Ok(workflow.run().await?)
}
