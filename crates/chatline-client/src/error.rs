use chatline_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the proxy, as received
    #[error("HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Storage error: {0}")]
    Persist(#[from] PersistError),

    #[error("Session not initialized")]
    NotReady,

    #[error("A message is already being sent")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,
}

pub type Result<T> = std::result::Result<T, ClientError>;
