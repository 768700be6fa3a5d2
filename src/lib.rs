//! Client for the state-inspection RPC methods of a blockchain full node:
//! `getmempoolinfo`, `getpeerinfo`, `getnettotals`, `getblockchaininfo` and
//! `getnetworkinfo`.
//!
//! ```no_run
//! use node_rpc_monitor::{RpcClient, RpcConfig};
//!
//! # async fn demo() -> Result<(), node_rpc_monitor::RpcError> {
//! let client = RpcClient::new(RpcConfig::new("127.0.0.1:8332", "alice", "secret"))?;
//! let mempool = client.fetch_mempool_info().await?;
//! println!("{} transactions in mempool", mempool.size);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod rpc;

pub use config::RpcConfig;
pub use error::{ConfigError, RpcError};
pub use rpc::RpcClient;
