//! HTTP gateway for the node (algod) and index (indexer) REST APIs

use crate::advanced::transaction::SignedTransaction;
use crate::core::connection::LedgerGateway;
use crate::core::constants::{
    ALGOD_TOKEN_HEADER, DEFAULT_VALIDITY_WINDOW, INDEXER_TOKEN_HEADER, MIN_TXN_FEE,
};
use crate::error::{ClaimSdkError, Result};
use crate::types::{
    Address, AppId, AssetId, PendingTransaction, Round, StateEntry, StateValue, SuggestedParams,
    TxId,
};
use crate::utils::decode_base64;
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Global state value type tag for byte slices (1) and integers (2)
const TEAL_BYTES: u8 = 1;
const TEAL_UINT: u8 = 2;

#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    token: Option<String>,
    token_header: &'static str,
}

impl Endpoint {
    fn new(url: &str, token: Option<String>, token_header: &'static str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            token_header,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(self.token_header, token),
            None => request,
        }
    }
}

/// Ledger gateway backed by an algod node, optionally reading holdings from an indexer
pub struct AlgodGateway {
    client: Client,
    algod: Endpoint,
    indexer: Option<Endpoint>,
}

impl AlgodGateway {
    /// Create a gateway for the node at `algod_url`
    pub fn new(algod_url: &str, algod_token: Option<String>) -> Result<Self> {
        Self::with_timeout(algod_url, algod_token, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        algod_url: &str,
        algod_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            algod: Endpoint::new(algod_url, algod_token, ALGOD_TOKEN_HEADER),
            indexer: None,
        })
    }

    /// Serve account holdings from an indexer instead of the node.
    ///
    /// An indexer lags the node by a few rounds, so an opt-in confirmed moments
    /// ago may be missing from its answer. Holdings read at a round older than
    /// the node's last round are discarded and re-read from the node.
    pub fn with_indexer(mut self, indexer_url: &str, indexer_token: Option<String>) -> Self {
        self.indexer = Some(Endpoint::new(indexer_url, indexer_token, INDEXER_TOKEN_HEADER));
        self
    }

    pub fn algod_url(&self) -> &str {
        &self.algod.base_url
    }

    pub fn indexer_url(&self) -> Option<&str> {
        self.indexer.as_ref().map(|i| i.base_url.as_str())
    }

    async fn node_holdings(&self, address: &Address) -> Result<BTreeSet<AssetId>> {
        let path = format!("/v2/accounts/{}?format=json", address);
        let account: AccountResponse = self
            .get(&self.algod, &path)
            .await
            .map_err(|e| not_found_as_account(e, address))?;

        Ok(account.assets.into_iter().map(|a| a.asset_id).collect())
    }

    /// Holdings from the indexer with the oldest round any page was served at
    async fn indexer_holdings(
        &self,
        indexer: &Endpoint,
        address: &Address,
    ) -> Result<(BTreeSet<AssetId>, Round)> {
        let mut holdings = BTreeSet::new();
        let mut indexed_round = Round::MAX;
        let mut next: Option<String> = None;

        loop {
            let path = match &next {
                Some(token) => format!("/v2/accounts/{}/assets?next={}", address, token),
                None => format!("/v2/accounts/{}/assets", address),
            };
            let page: IndexerAssetsResponse = self
                .get(indexer, &path)
                .await
                .map_err(|e| not_found_as_account(e, address))?;

            let done = page.assets.is_empty() || page.next_token.is_none();
            indexed_round = indexed_round.min(page.current_round);
            holdings.extend(page.assets.into_iter().filter(|a| !a.deleted).map(|a| a.asset_id));
            if done {
                break;
            }
            next = page.next_token;
        }

        Ok((holdings, indexed_round))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint, path: &str) -> Result<T> {
        let url = endpoint.url(path);
        debug!(%url, "GET");
        let response = endpoint.authorize(self.client.get(&url)).send().await?;
        handle_response(response).await
    }
}

#[async_trait]
impl LedgerGateway for AlgodGateway {
    async fn account_holdings(&self, address: &Address) -> Result<BTreeSet<AssetId>> {
        let Some(indexer) = &self.indexer else {
            return self.node_holdings(address).await;
        };

        let (holdings, indexed_round) = self.indexer_holdings(indexer, address).await?;
        let node_round = self.last_round().await?;
        if indexed_round < node_round {
            debug!(indexed_round, node_round, "indexer behind node, reading holdings from node");
            return self.node_holdings(address).await;
        }
        Ok(holdings)
    }

    async fn application_global_state(&self, app_id: AppId) -> Result<Vec<StateEntry>> {
        let app: ApplicationResponse = self
            .get(&self.algod, &format!("/v2/applications/{}", app_id))
            .await?;

        app.params
            .global_state
            .into_iter()
            .map(|kv| {
                let undecodable = |e: ClaimSdkError| ClaimSdkError::StateDecode {
                    key: kv.key.clone(),
                    reason: e.to_string(),
                };
                let key = decode_base64("global-state key", &kv.key).map_err(undecodable)?;
                let value = match kv.value.kind {
                    TEAL_UINT => StateValue::Uint(kv.value.uint),
                    TEAL_BYTES => StateValue::Bytes(
                        decode_base64("global-state value", &kv.value.bytes).map_err(undecodable)?,
                    ),
                    other => {
                        return Err(ClaimSdkError::StateDecode {
                            key: String::from_utf8_lossy(&key).into_owned(),
                            reason: format!("unknown value type {}", other),
                        })
                    },
                };
                Ok(StateEntry { key, value })
            })
            .collect()
    }

    async fn suggested_params(&self) -> Result<SuggestedParams> {
        let params: ParamsResponse = self.get(&self.algod, "/v2/transactions/params").await?;
        let hash = decode_base64("genesis-hash", &params.genesis_hash)?;
        let genesis_hash: [u8; 32] = hash.as_slice().try_into().map_err(|_| {
            ClaimSdkError::Network(format!("genesis-hash has {} bytes, expected 32", hash.len()))
        })?;

        Ok(SuggestedParams {
            fee_per_byte: params.fee,
            min_fee: if params.min_fee > 0 { params.min_fee } else { MIN_TXN_FEE },
            first_valid: params.last_round,
            last_valid: params.last_round + DEFAULT_VALIDITY_WINDOW,
            genesis_id: params.genesis_id,
            genesis_hash,
        })
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxId> {
        let url = self.algod.url("/v2/transactions");
        let body = tx.encode()?;
        debug!(%url, bytes = body.len(), "POST signed transaction");

        let response = self
            .algod
            .authorize(self.client.post(&url))
            .header(header::CONTENT_TYPE, "application/x-binary")
            .body(body)
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            return Err(ClaimSdkError::Rejected(error_message(response).await));
        }
        let submitted: SubmitResponse = handle_response(response).await?;
        Ok(TxId::new(submitted.tx_id))
    }

    async fn last_round(&self) -> Result<Round> {
        let status: StatusResponse = self.get(&self.algod, "/v2/status").await?;
        Ok(status.last_round)
    }

    async fn wait_for_block_after(&self, round: Round) -> Result<Round> {
        let status: StatusResponse = self
            .get(&self.algod, &format!("/v2/status/wait-for-block-after/{}", round))
            .await?;
        Ok(status.last_round)
    }

    async fn pending_transaction(&self, tx_id: &TxId) -> Result<PendingTransaction> {
        let pending: PendingResponse = self
            .get(&self.algod, &format!("/v2/transactions/pending/{}?format=json", tx_id))
            .await?;

        let logs = pending
            .logs
            .iter()
            .map(|log| decode_base64("logs", log))
            .collect::<Result<Vec<_>>>()?;

        Ok(PendingTransaction {
            confirmed_round: pending.confirmed_round,
            pool_error: pending.pool_error,
            logs,
        })
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| ClaimSdkError::Network(format!("malformed response: {}", e)))
    } else if status == StatusCode::NOT_FOUND {
        Err(ClaimSdkError::NotFound(error_message(response).await))
    } else {
        let message = error_message(response).await;
        Err(ClaimSdkError::Network(format!("HTTP {}: {}", status.as_u16(), message)))
    }
}

/// Pull the `message` field out of an error body, falling back to the raw text
async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or(text)
}

fn not_found_as_account(err: ClaimSdkError, address: &Address) -> ClaimSdkError {
    match err {
        ClaimSdkError::NotFound(_) => ClaimSdkError::AccountNotFound(*address),
        other => other,
    }
}

//=============================================================================
// Wire Types
//=============================================================================

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "last-round")]
    last_round: Round,
}

#[derive(Debug, Deserialize)]
struct ParamsResponse {
    fee: u64,
    #[serde(rename = "min-fee", default)]
    min_fee: u64,
    #[serde(rename = "last-round")]
    last_round: Round,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: Option<Round>,
    #[serde(rename = "pool-error", default)]
    pool_error: String,
    #[serde(default)]
    logs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AssetHolding {
    #[serde(rename = "asset-id")]
    asset_id: AssetId,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    assets: Vec<AssetHolding>,
}

#[derive(Debug, Deserialize)]
struct IndexerAssetsResponse {
    #[serde(default)]
    assets: Vec<AssetHolding>,
    #[serde(rename = "next-token", default)]
    next_token: Option<String>,
    #[serde(rename = "current-round", default)]
    current_round: Round,
}

#[derive(Debug, Deserialize)]
struct TealValue {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    bytes: String,
    #[serde(default)]
    uint: u64,
}

#[derive(Debug, Deserialize)]
struct TealKeyValue {
    key: String,
    value: TealValue,
}

#[derive(Debug, Deserialize)]
struct ApplicationParams {
    #[serde(rename = "global-state", default)]
    global_state: Vec<TealKeyValue>,
}

#[derive(Debug, Deserialize)]
struct ApplicationResponse {
    params: ApplicationParams,
}
