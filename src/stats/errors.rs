use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Failed to access statistics file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed statistics file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid channel id: {0:?}")]
    InvalidChannel(String),
}
