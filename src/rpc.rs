use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::models::{
    BlockchainInfo, MempoolInfo, NetworkInfo, NetworkTraffic, NodeSnapshot, Nodes, RpcRecord,
    Shape,
};
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::Error as _;
use serde_json::{json, Value};
use std::fmt;
use std::time::{Duration, Instant};

const JSONRPC_VERSION: &str = "1.0";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// The serialized request travels as the only query pair, under the
/// positional key `0`.
pub const PAYLOAD_QUERY_KEY: &str = "0";

pub const GET_MEMPOOL_INFO: &str = "getmempoolinfo";
pub const GET_PEER_INFO: &str = "getpeerinfo";
pub const GET_NET_TOTALS: &str = "getnettotals";
pub const GET_BLOCKCHAIN_INFO: &str = "getblockchaininfo";
pub const GET_NETWORK_INFO: &str = "getnetworkinfo";

/// Builds the JSON-RPC body shared by every supported method. None of them
/// take parameters.
pub fn request_payload(method: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": [],
    })
}

/// Parses `body` as the record `method` returns. The top level must match
/// `T::SHAPE` before field decoding starts.
pub fn decode_body<T: RpcRecord>(method: &'static str, body: &str) -> Result<T, RpcError> {
    let decode_err = |source| RpcError::Decode { method, source };
    let value: Value = serde_json::from_str(body).map_err(decode_err)?;

    let matches = match (T::SHAPE, &value) {
        (Shape::Array, Value::Array(_)) => true,
        (Shape::Object(keys), Value::Object(map)) => keys.iter().any(|k| map.contains_key(*k)),
        _ => false,
    };
    if !matches {
        let expected = match T::SHAPE {
            Shape::Array => "a JSON array",
            Shape::Object(_) => "a JSON object with at least one known field",
        };
        return Err(decode_err(serde_json::Error::custom(format!(
            "expected {}, got {}",
            expected,
            json_kind(&value)
        ))));
    }

    serde_json::from_value(value).map_err(decode_err)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object with no known field",
    }
}

/// Typed client for a node's state-inspection RPC methods.
///
/// Cloning is cheap and clones share nothing mutable, so a single client can
/// serve any number of concurrent calls.
#[derive(Clone)]
pub struct RpcClient {
    http: Client,
    // Carries the credentials as userinfo; never log it.
    url: Url,
    endpoint: String,
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    pub fn new(config: RpcConfig) -> Result<Self, RpcError> {
        let host = config.url.trim();
        let host = host
            .strip_prefix("http://")
            .unwrap_or(host)
            .trim_end_matches('/');
        if host.is_empty() {
            return Err(RpcError::InvalidEndpoint("empty RPC URL".to_string()));
        }
        if host.contains("://") {
            return Err(RpcError::InvalidEndpoint(format!(
                "{}: only plain http endpoints are supported",
                host
            )));
        }

        let mut url = Url::parse(&format!("http://{}", host))
            .map_err(|e| RpcError::InvalidEndpoint(format!("{}: {}", host, e)))?;
        url.set_username(&config.username)
            .and_then(|_| url.set_password(Some(&config.password)))
            .map_err(|_| RpcError::InvalidEndpoint(format!("{} cannot carry credentials", host)))?;

        let timeout = Duration::from_secs(config.timeout_secs());
        let http = reqwest::ClientBuilder::new()
            .pool_max_idle_per_host(0)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .user_agent(concat!("node-rpc-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url,
            endpoint: host.to_string(),
        })
    }

    /// The configured host, without credentials.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch_mempool_info(&self) -> Result<MempoolInfo, RpcError> {
        self.rpc_call(GET_MEMPOOL_INFO).await
    }

    pub async fn fetch_peer_info(&self) -> Result<Nodes, RpcError> {
        self.rpc_call(GET_PEER_INFO).await
    }

    pub async fn fetch_net_totals(&self) -> Result<NetworkTraffic, RpcError> {
        self.rpc_call(GET_NET_TOTALS).await
    }

    pub async fn fetch_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        self.rpc_call(GET_BLOCKCHAIN_INFO).await
    }

    pub async fn fetch_network_info(&self) -> Result<NetworkInfo, RpcError> {
        self.rpc_call(GET_NETWORK_INFO).await
    }

    /// Issues all five calls concurrently. The first failure aborts the
    /// snapshot.
    pub async fn fetch_snapshot(&self) -> Result<NodeSnapshot, RpcError> {
        let fetched_at = Utc::now();
        let (mempool, peers, net_totals, blockchain, network) = tokio::try_join!(
            self.fetch_mempool_info(),
            self.fetch_peer_info(),
            self.fetch_net_totals(),
            self.fetch_blockchain_info(),
            self.fetch_network_info(),
        )?;

        Ok(NodeSnapshot {
            fetched_at,
            mempool,
            peers,
            net_totals,
            blockchain,
            network,
        })
    }

    async fn rpc_call<T>(&self, method: &'static str) -> Result<T, RpcError>
    where
        T: RpcRecord,
    {
        let payload = request_payload(method).to_string();
        tracing::debug!(method, endpoint = %self.endpoint, "sending RPC request");

        let start = Instant::now();
        let response = self
            .http
            .get(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .query(&[(PAYLOAD_QUERY_KEY, payload)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(method, endpoint = %self.endpoint, error = %e, "RPC request failed");
                RpcError::Transport(e)
            })?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(method, endpoint = %self.endpoint, status = status.as_u16(), "node returned error status");
            return Err(RpcError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(method, latency_ms, bytes = body.len(), "RPC response received");
        decode_body(method, &body)
    }
}
