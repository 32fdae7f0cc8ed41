// Example: Reading a contract's global state and the claimable asset
//
// This example demonstrates how to:
// 1. Connect to a public testnet node
// 2. Bind the claim contract to its application spec
// 3. Read and print the global state
// 4. Extract the claimable asset id
//
// Usage: cargo run --example read_global_state -- [APP_ID]

use claimkit_sdk::core::constants::DEFAULT_ALGOD_URL;
use claimkit_sdk::types::StateValue;
use claimkit_sdk::{extract_asset_id, AlgodGateway, AppSpec, ContractClient};

const DEFAULT_APP_ID: u64 = 736014374;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app_id = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => DEFAULT_APP_ID,
    };

    // 1. Public nodes do not need a token
    let gateway = AlgodGateway::new(DEFAULT_ALGOD_URL, None)?;

    // 2. Bind the contract
    let contract = ContractClient::new(gateway, app_id, AppSpec::default_claim_spec()?);

    // 3. Read global state
    println!("Reading global state of application {}...", app_id);
    let snapshot = contract.read_global_state().await?;
    for (key, value) in snapshot.iter() {
        match value {
            StateValue::Uint(v) => println!("  {} = {}", key, v),
            StateValue::Bytes(b) => println!("  {} = 0x{}", key, data_encoding::HEXLOWER.encode(b)),
        }
    }

    // 4. Resolve the asset the contract hands out
    match extract_asset_id(&snapshot) {
        Ok(asset_id) => println!("\nClaimable asset: {}", asset_id),
        Err(e) => println!("\nNothing to claim: {}", e),
    }

    Ok(())
}
