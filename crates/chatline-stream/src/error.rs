use thiserror::Error;

/// Failure to turn one SSE line into a payload.
///
/// Decode errors never end a stream: the decoder logs them and moves on.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid UTF-8 in stream line: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Malformed JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
