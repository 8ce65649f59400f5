use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::buffer_utils::CircularLineBuffer;
use crate::error::DecodeError;

/// Payload the upstream sends to mark the logical end of a turn.
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_FIELD: &str = "data:";

/// Decode a single SSE line.
///
/// Returns `Ok(None)` for lines that carry no payload: blank separators,
/// comments, non-`data` fields and the done sentinel.
pub fn decode_line(line: &str) -> Result<Option<Value>, DecodeError> {
    let Some(data) = line.strip_prefix(DATA_FIELD) else {
        return Ok(None);
    };
    let data = data.strip_prefix(' ').unwrap_or(data).trim_end();

    if data == DONE_SENTINEL {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(data)?))
}

/// Incremental SSE decoder.
///
/// Feed it chunks as they arrive; every call hands back the payloads of the
/// lines completed so far. Chunk boundaries carry no meaning.
pub struct SseDecoder {
    buffer: CircularLineBuffer,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            buffer: CircularLineBuffer::with_capacity(4096),
        }
    }

    /// Add a chunk and return the payloads of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend(chunk);

        let mut payloads = Vec::new();
        while let Some(line) = self.buffer.next_line() {
            if let Some(payload) = accept(line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line left unterminated when the stream closed.
    pub fn finish(&mut self) -> Vec<Value> {
        self.buffer
            .take_remainder()
            .and_then(accept)
            .into_iter()
            .collect()
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn accept(line: Result<String, DecodeError>) -> Option<Value> {
    let line = match line {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping undecodable SSE line");
            return None;
        }
    };

    match decode_line(&line) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, line = %line, "Failed to parse SSE payload");
            None
        }
    }
}

/// Turn a stream of byte chunks into a stream of JSON payloads.
///
/// Transport errors are passed through and end the stream.
pub fn decode_sse_stream<S, B, E>(chunks: S) -> impl Stream<Item = Result<Value, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut decoder = SseDecoder::new();
        let mut failed = false;

        while let Some(chunk_result) = chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    for payload in decoder.push(bytes.as_ref()) {
                        yield Ok(payload);
                    }
                }
                Err(e) => {
                    failed = true;
                    yield Err(e);
                    break;
                }
            }
        }

        if !failed {
            for payload in decoder.finish() {
                yield Ok(payload);
            }
        }
    }
}
