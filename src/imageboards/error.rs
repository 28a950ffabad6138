use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Board returned HTTP {status}")]
    UnexpectedStatus { status: StatusCode },

    #[error("Connection Error")]
    ConnectionError(#[from] reqwest::Error),

    #[error("Board returned an invalid response")]
    InvalidResponse(#[from] serde_json::Error),
}
