use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("dispute error: {0}")]
    Dispute(#[from] layer_dispute::DisputeError),

    #[error("store error: {0}")]
    Store(#[from] layer_store::StoreError),

    #[error("lmdb error: {0}")]
    Lmdb(#[from] layer_store_lmdb::LmdbError),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
