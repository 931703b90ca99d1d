use plexus::error::NetworkError;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("could not determine data directory")]
    NoDataDir,

    #[error("invalid setting {key}: {reason}")]
    Setting { key: &'static str, reason: String },
}
