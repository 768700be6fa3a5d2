//! Records decoded from the node's state-inspection RPC methods, plus the
//! snapshot and summary types the dashboard builds from them.
//!
//! Every RPC record is `#[serde(default)]`: a field the node leaves out
//! decodes to its default, while a field of the wrong JSON type fails.
//! The top level of a body is checked against [`RpcRecord::SHAPE`] first,
//! since a defaulted struct would otherwise accept an array or an unrelated
//! object and come out all zeroes.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level JSON a method's response body must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// An object carrying at least one of these keys.
    Object(&'static [&'static str]),
    Array,
}

/// A record returned as the whole body of one RPC method.
pub trait RpcRecord: DeserializeOwned {
    const SHAPE: Shape;
}

/// `getmempoolinfo`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MempoolInfo {
    pub loaded: bool,
    pub size: u64,
    pub usage: u64,
    pub maxmempool: u64,
    pub mempoolminfee: f64,
    pub minrelayfee: f64,
    pub unbroadcastcount: u64,
}

/// One entry of `getpeerinfo`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerInfo {
    pub id: u64,
    pub addr: String,
    pub addrbind: String,
    pub network: String,
    pub mapped_as: Option<u32>,
    pub services: String,
    pub servicenames: Vec<String>,
    pub relaytxes: bool,
    // Unix epoch seconds
    pub lastsend: i64,
    pub lastrecv: i64,
    pub last_transaction: i64,
    pub last_block: i64,
    pub bytessent: u64,
    pub bytesrecv: u64,
    pub conntime: i64,
    pub timeoffset: i64,
    // Seconds; absent until the first ping completes
    pub pingtime: Option<f64>,
    pub minping: Option<f64>,
    pub pingwait: Option<f64>,
    pub version: u32,
    pub subver: String,
    pub inbound: bool,
    pub addnode: bool,
    pub connection_type: String,
    pub startingheight: i64,
    pub banscore: i64,
    pub synced_headers: i64,
    pub synced_blocks: i64,
    pub inflight: Vec<u64>,
    pub whitelisted: bool,
    pub permissions: Vec<String>,
    pub minfeefilter: f64,
    pub bytessent_per_msg: BTreeMap<String, u64>,
    pub bytesrecv_per_msg: BTreeMap<String, u64>,
}

/// `getpeerinfo`, in the order the node reports peers.
pub type Nodes = Vec<PeerInfo>;

/// `getnettotals`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkTraffic {
    #[serde(alias = "totalbytesrcv")]
    pub totalbytesrecv: u64,
    pub totalbytessent: u64,
    // Unix epoch milliseconds
    pub timemillis: i64,
    pub uploadtarget: UploadTarget,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadTarget {
    pub timeframe: u64,
    // bytes
    pub target: u64,
    pub target_reached: bool,
    pub serve_historical_blocks: bool,
    pub bytes_left_in_cycle: u64,
    pub time_left_in_cycle: u64,
}

/// `getblockchaininfo`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    pub bestblockhash: String,
    pub difficulty: f64,
    pub mediantime: i64,
    pub verificationprogress: f64,
    pub initialblockdownload: bool,
    pub chainwork: String,
    pub size_on_disk: u64,
    pub pruned: bool,
    pub pruneheight: Option<u64>,
    pub automatic_pruning: Option<bool>,
    pub softforks: BTreeMap<String, Softfork>,
    pub warnings: String,
}

/// Activation state of a single soft fork, keyed by name in
/// [`BlockchainInfo::softforks`].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Softfork {
    /// `"buried"` or `"bip9"`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(alias = "bip69")]
    pub bip9: Option<Bip9Status>,
    pub height: Option<u64>,
    pub active: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bip9Status {
    /// One of `defined`, `started`, `locked_in`, `active`, `failed`.
    pub status: String,
    pub bit: Option<u8>,
    pub start_time: i64,
    pub timeout: i64,
    pub since: u64,
    pub statistics: Option<Bip9Statistics>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bip9Statistics {
    pub period: u32,
    pub threshold: u32,
    pub elapsed: u32,
    pub count: u32,
    pub possible: bool,
}

/// `getnetworkinfo`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInfo {
    pub version: u32,
    pub subversion: String,
    pub protocolversion: u32,
    pub localservices: String,
    pub localservicenames: Vec<String>,
    pub localrelay: bool,
    pub timeoffset: i64,
    pub connections: u32,
    pub connections_in: u32,
    pub networks: Vec<Network>,
    pub relayfee: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub name: String,
    pub limited: bool,
    pub reachable: bool,
    pub proxy: String,
    pub proxy_randomize_credentials: bool,
}

impl RpcRecord for MempoolInfo {
    const SHAPE: Shape = Shape::Object(&[
        "loaded",
        "size",
        "usage",
        "maxmempool",
        "mempoolminfee",
        "minrelayfee",
        "unbroadcastcount",
    ]);
}

impl RpcRecord for Nodes {
    const SHAPE: Shape = Shape::Array;
}

impl RpcRecord for NetworkTraffic {
    const SHAPE: Shape = Shape::Object(&[
        "totalbytesrecv",
        "totalbytesrcv",
        "totalbytessent",
        "timemillis",
        "uploadtarget",
    ]);
}

impl RpcRecord for BlockchainInfo {
    const SHAPE: Shape = Shape::Object(&[
        "chain",
        "blocks",
        "headers",
        "bestblockhash",
        "difficulty",
        "mediantime",
        "verificationprogress",
        "initialblockdownload",
        "chainwork",
        "size_on_disk",
        "pruned",
        "pruneheight",
        "automatic_pruning",
        "softforks",
        "warnings",
    ]);
}

impl RpcRecord for NetworkInfo {
    const SHAPE: Shape = Shape::Object(&[
        "version",
        "subversion",
        "protocolversion",
        "localservices",
        "localservicenames",
        "localrelay",
        "timeoffset",
        "connections",
        "connections_in",
        "networks",
        "relayfee",
    ]);
}

/// All five records, fetched together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub mempool: MempoolInfo,
    pub peers: Nodes,
    pub net_totals: NetworkTraffic,
    pub blockchain: BlockchainInfo,
    pub network: NetworkInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub peer_id: u64,
    pub addr: String,
    pub pingtime_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub fetched_at: DateTime<Utc>,
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    pub header_lag: u64,
    pub sync_percentage: f64,
    pub initial_block_download: bool,
    pub total_peers: usize,
    pub inbound_peers: usize,
    pub outbound_peers: usize,
    pub fastest_peer: String,
    pub slowest_peer: String,
    pub average_ping_ms: f64,
    pub ping_leaderboard: Vec<LeaderboardEntry>,
    pub mempool_size: u64,
    pub mempool_usage_percentage: f64,
    pub total_bytes_sent: u64,
    pub total_bytes_recv: u64,
    pub upload_target_reached: bool,
    pub reachable_networks: Vec<String>,
    pub active_softforks: Vec<String>,
}
