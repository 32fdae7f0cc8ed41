// Default endpoints (Algorand testnet via algonode)
pub const DEFAULT_ALGOD_URL: &str = "https://testnet-api.algonode.cloud";
pub const DEFAULT_INDEXER_URL: &str = "https://testnet-idx.algonode.cloud";

pub const ALGOD_TOKEN_HEADER: &str = "X-Algo-API-Token";
pub const INDEXER_TOKEN_HEADER: &str = "X-Indexer-API-Token";

/// Global state key holding the claimable asset id
pub const ASSET_STATE_KEY: &str = "asset";

/// Contract method that transfers the asset to the caller
pub const CLAIM_METHOD: &str = "claimAsset";

/// Flat fee for the claim call, covering the outer call and its inner transfers
pub const CLAIM_FEE: u64 = 6_000;

/// Network minimum fee per transaction, in microAlgos
pub const MIN_TXN_FEE: u64 = 1_000;

/// Rounds to wait for a submitted transaction before giving up
pub const DEFAULT_MAX_ROUNDS: u64 = 5;

/// Validity window for built transactions, in rounds
pub const DEFAULT_VALIDITY_WINDOW: u64 = 1_000;

/// Bytes a signature adds to an encoded transaction, used for fee estimation
pub const SIGNATURE_OVERHEAD: u64 = 75;

/// Domain separation prefix for transaction ids and signatures
pub const TX_TAG: &[u8] = b"TX";

/// Log prefix marking an ARC-4 method return value
pub const ARC4_RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];
