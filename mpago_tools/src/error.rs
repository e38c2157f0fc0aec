use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MpagoApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the payment gateway: {0}")]
    NetworkError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Gateway query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl MpagoApiError {
    /// True for failures that a retry has a reasonable chance of fixing: network-level errors
    /// and the usual transient HTTP statuses. Everything else (4xx, malformed responses) fails
    /// immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            MpagoApiError::NetworkError(_) => true,
            MpagoApiError::QueryError { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}
