use elect_types::ElectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("election error: {0}")]
    Election(#[from] ElectionError),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
