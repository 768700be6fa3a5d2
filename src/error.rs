use thiserror::Error;

/// Failure of a single fetch against the node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// DNS, connection refused, timeout or TLS failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node answered HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Body was not JSON, or not the shape `method` returns.
    #[error("failed to decode `{method}` response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}
