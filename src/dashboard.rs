use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::RpcError;
use crate::models::{LeaderboardEntry, NodeSnapshot, NodeSummary};
use crate::rpc::RpcClient;

const LEADERBOARD_SIZE: usize = 4;

pub fn summarize(snapshot: &NodeSnapshot) -> NodeSummary {
    let chain = &snapshot.blockchain;
    let header_lag = chain.headers.saturating_sub(chain.blocks);
    let sync_percentage = (chain.verificationprogress * 100.0).clamp(0.0, 100.0);

    let total_peers = snapshot.peers.len();
    let inbound_peers = snapshot.peers.iter().filter(|p| p.inbound).count();

    let mut ping_leaderboard: Vec<LeaderboardEntry> = snapshot
        .peers
        .iter()
        .filter_map(|p| {
            p.pingtime.map(|secs| LeaderboardEntry {
                peer_id: p.id,
                addr: p.addr.clone(),
                pingtime_ms: secs * 1000.0,
            })
        })
        .collect();
    ping_leaderboard.sort_by(|a, b| {
        a.pingtime_ms
            .partial_cmp(&b.pingtime_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let (fastest_peer, slowest_peer, average_ping_ms) =
        match (ping_leaderboard.first(), ping_leaderboard.last()) {
            (Some(fastest), Some(slowest)) => {
                let average = ping_leaderboard.iter().map(|e| e.pingtime_ms).sum::<f64>()
                    / ping_leaderboard.len() as f64;
                (fastest.addr.clone(), slowest.addr.clone(), average)
            }
            _ => (String::from("No data"), String::from("No data"), 0.0),
        };
    ping_leaderboard.truncate(LEADERBOARD_SIZE);

    let mempool = &snapshot.mempool;
    let mempool_usage_percentage = if mempool.maxmempool == 0 {
        0.0
    } else {
        (mempool.usage as f64 / mempool.maxmempool as f64) * 100.0
    };

    let reachable_networks = snapshot
        .network
        .networks
        .iter()
        .filter(|n| n.reachable)
        .map(|n| n.name.clone())
        .collect();

    // BTreeMap keeps these sorted by name.
    let active_softforks = chain
        .softforks
        .iter()
        .filter(|(_, fork)| fork.active)
        .map(|(name, _)| name.clone())
        .collect();

    NodeSummary {
        fetched_at: snapshot.fetched_at,
        chain: chain.chain.clone(),
        blocks: chain.blocks,
        headers: chain.headers,
        header_lag,
        sync_percentage,
        initial_block_download: chain.initialblockdownload,
        total_peers,
        inbound_peers,
        outbound_peers: total_peers - inbound_peers,
        fastest_peer,
        slowest_peer,
        average_ping_ms,
        ping_leaderboard,
        mempool_size: mempool.size,
        mempool_usage_percentage,
        total_bytes_sent: snapshot.net_totals.totalbytessent,
        total_bytes_recv: snapshot.net_totals.totalbytesrecv,
        upload_target_reached: snapshot.net_totals.uploadtarget.target_reached,
        reachable_networks,
        active_softforks,
    }
}

/// An RPC failure surfaced to dashboard callers as `502 Bad Gateway`.
pub struct UpstreamError(RpcError);

impl From<RpcError> for UpstreamError {
    fn from(err: RpcError) -> Self {
        UpstreamError(err)
    }
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "node query failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

pub async fn get_snapshot(
    State(client): State<Arc<RpcClient>>,
) -> Result<Json<NodeSnapshot>, UpstreamError> {
    Ok(Json(client.fetch_snapshot().await?))
}

pub async fn get_summary(
    State(client): State<Arc<RpcClient>>,
) -> Result<Json<NodeSummary>, UpstreamError> {
    let snapshot = client.fetch_snapshot().await?;
    Ok(Json(summarize(&snapshot)))
}
