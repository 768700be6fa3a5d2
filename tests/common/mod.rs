//! A stand-in node: an axum server on an ephemeral port that records every
//! request it receives and answers with canned bodies.

#![allow(dead_code)]

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use node_rpc_monitor::rpc::PAYLOAD_QUERY_KEY;

#[derive(Debug, Clone)]
pub struct Captured {
    pub query: Option<String>,
    pub host: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

impl Captured {
    /// The JSON-RPC request decoded from the query string.
    pub fn payload(&self) -> Value {
        let url = reqwest::Url::parse(&format!(
            "http://stub/?{}",
            self.query.as_deref().unwrap_or_default()
        ))
        .expect("query should form a valid URL");
        let (_, raw) = url
            .query_pairs()
            .find(|(key, _)| key == PAYLOAD_QUERY_KEY)
            .expect("payload query pair");
        serde_json::from_str(&raw).expect("payload should be JSON")
    }

    pub fn method(&self) -> String {
        self.payload()["method"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

pub struct StubNode {
    pub addr: SocketAddr,
    status: StatusCode,
    bodies: HashMap<String, String>,
    fallback: String,
    delay: Duration,
    requests: Mutex<Vec<Captured>>,
}

impl StubNode {
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn last_request(&self) -> Captured {
        self.requests().pop().expect("stub saw no request")
    }
}

pub struct StubBuilder {
    status: StatusCode,
    bodies: HashMap<String, String>,
    fallback: String,
    delay: Duration,
}

impl StubBuilder {
    /// Answers each method with a minimal well-formed body.
    pub fn new() -> Self {
        let bodies = [
            ("getmempoolinfo", r#"{"loaded": true}"#),
            ("getpeerinfo", "[]"),
            ("getnettotals", r#"{"totalbytessent": 0}"#),
            ("getblockchaininfo", r#"{"chain": "regtest"}"#),
            ("getnetworkinfo", r#"{"connections": 0}"#),
        ]
        .into_iter()
        .map(|(method, body)| (method.to_string(), body.to_string()))
        .collect();

        Self {
            status: StatusCode::OK,
            bodies,
            fallback: String::from("{}"),
            delay: Duration::ZERO,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Body returned for every method, replacing the per-method defaults.
    /// Later `method_body` calls still take precedence.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.bodies.clear();
        self.fallback = body.into();
        self
    }

    pub fn method_body(mut self, method: &str, body: impl Into<String>) -> Self {
        self.bodies.insert(method.to_string(), body.into());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn spawn(self) -> Arc<StubNode> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let stub = Arc::new(StubNode {
            addr,
            status: self.status,
            bodies: self.bodies,
            fallback: self.fallback,
            delay: self.delay,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/", get(handle))
            .with_state(Arc::clone(&stub));
        let server = axum::Server::from_tcp(listener)
            .expect("stub server")
            .serve(app.into_make_service());
        tokio::spawn(async move {
            let _ = server.await;
        });

        stub
    }
}

async fn handle(
    State(stub): State<Arc<StubNode>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let captured = Captured {
        query,
        host: header("host"),
        authorization: header("authorization"),
        content_type: header("content-type"),
    };
    let method = captured.method();
    stub.requests.lock().expect("lock").push(captured);

    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }

    let body = stub.bodies.get(&method).unwrap_or(&stub.fallback).clone();
    (stub.status, body)
}

/// An address nothing listens on.
pub fn closed_port_host() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    addr.to_string()
}
