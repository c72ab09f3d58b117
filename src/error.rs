use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecallError>;

#[derive(Debug, Error)]
pub enum RecallError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl RecallError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
