//! Streaming half of the chatline pipeline.
//!
//! Raw bytes from the conversation endpoint go through [`SseDecoder`] (or
//! [`decode_sse_stream`]) to JSON payloads, then through [`interpret`] to the
//! internal [`StreamEvent`] model.

pub mod buffer_utils;
pub mod decoder;
pub mod error;
pub mod interpreter;
pub mod streaming;

pub use buffer_utils::CircularLineBuffer;
pub use decoder::{decode_line, decode_sse_stream, SseDecoder, DONE_SENTINEL};
pub use error::DecodeError;
pub use interpreter::{interpret, stream_events, UpstreamEvent};
pub use streaming::StreamEvent;
