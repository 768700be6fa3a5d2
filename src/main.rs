use axum::{response::Redirect, routing::get, Router};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use node_rpc_monitor::config::{load_config, AppConfig, ServerConfig};
use node_rpc_monitor::dashboard::{get_snapshot, get_summary, summarize};
use node_rpc_monitor::RpcClient;

/// CLI arguments
#[derive(Parser)]
#[command(name = "node-rpc-monitor", about = "Full node state-inspection RPC client")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// RPC host, e.g. 127.0.0.1:8332
    #[arg(long, global = true, env = "RPC_URL")]
    rpc_url: Option<String>,

    #[arg(long, global = true, env = "RPC_USERNAME")]
    rpc_username: Option<String>,

    #[arg(long, global = true, env = "RPC_PASSWORD", hide_env_values = true)]
    rpc_password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// getmempoolinfo
    Mempool,
    /// getpeerinfo
    Peers,
    /// getnettotals
    NetTotals,
    /// getblockchaininfo
    Blockchain,
    /// getnetworkinfo
    Network,
    /// All five calls at once
    Snapshot,
    /// Condensed dashboard view of a snapshot
    Summary,
    /// Serve the snapshot and summary over HTTP
    Serve {
        /// IP address to bind the server to
        #[arg(long)]
        listen_ip: Option<String>,

        /// Port to bind the server to
        #[arg(long)]
        port: Option<u16>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn serve(client: RpcClient, server: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/api/summary") }))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/summary", get(get_summary))
        .with_state(Arc::new(client));

    let ip = server.listen_ip.unwrap_or_else(|| "127.0.0.1".to_string());
    let port = server.port.unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", ip, port).parse()?;

    tracing::info!(%addr, "dashboard API listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let mut config: AppConfig = load_config(&args.config)?;

    // Flags and environment win over the TOML file
    if let Some(url) = args.rpc_url {
        config.rpc.url = url;
    }
    if let Some(username) = args.rpc_username {
        config.rpc.username = username;
    }
    if let Some(password) = args.rpc_password {
        config.rpc.password = password;
    }
    config.rpc.validate()?;

    let client = RpcClient::new(config.rpc)?;
    tracing::debug!(endpoint = client.endpoint(), "client ready");

    match args.command {
        Command::Mempool => print_json(&client.fetch_mempool_info().await?)?,
        Command::Peers => print_json(&client.fetch_peer_info().await?)?,
        Command::NetTotals => print_json(&client.fetch_net_totals().await?)?,
        Command::Blockchain => print_json(&client.fetch_blockchain_info().await?)?,
        Command::Network => print_json(&client.fetch_network_info().await?)?,
        Command::Snapshot => print_json(&client.fetch_snapshot().await?)?,
        Command::Summary => print_json(&summarize(&client.fetch_snapshot().await?))?,
        Command::Serve { listen_ip, port } => {
            let mut server = config.server;
            if let Some(ip) = listen_ip {
                server.listen_ip = Some(ip);
            }
            if let Some(port) = port {
                server.port = Some(port);
            }
            serve(client, server).await?;
        }
    }

    Ok(())
}
