//! Server-Sent Events (SSE) parser for OpenAI streaming responses

use async_stream::stream;
use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::fmt::Display;
use tracing::debug;

use crate::llm::core::error::LlmError;
use crate::llm::core::provider::TextStream;

use super::types::ChatCompletionChunk;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// What a single line of the body contributes
#[derive(Debug, PartialEq)]
enum Line {
    /// A text delta to forward
    Fragment(String),
    /// The provider's end marker
    Done,
    /// Comments, other fields, heartbeats, malformed or empty records
    Skip,
}

/// Parse a stream of bytes as OpenAI SSE records
///
/// OpenAI's streaming format is one `data: <json>` line per record,
/// terminated by `data: [DONE]`:
/// ```text
/// data: {"choices":[{"delta":{"content":"Hel"}}]}
///
/// data: {"choices":[{"delta":{"content":"lo"}}]}
///
/// data: [DONE]
/// ```
///
/// This parser:
/// 1. Buffers bytes only until a full line is available
/// 2. Ignores lines that are not `data:` records
/// 3. Ends the sequence on `[DONE]` or when the body closes
/// 4. Skips payloads that are not valid chunk JSON
/// 5. Yields each non-empty `choices[0].delta.content` immediately
///
/// A read error from the underlying body is yielded once and ends the sequence.
pub fn parse_sse_stream<S, E>(byte_stream: S) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(LlmError::StreamError(e.to_string()));
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                match parse_line(&line[..newline_pos]) {
                    Ok(Line::Fragment(text)) => yield Ok(text),
                    Ok(Line::Done) => return,
                    Ok(Line::Skip) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        // Body closed without a trailing newline
        if !buffer.is_empty() {
            match parse_line(&buffer) {
                Ok(Line::Fragment(text)) => yield Ok(text),
                Ok(_) => {}
                Err(e) => yield Err(e),
            }
        }
    })
}

/// Interpret one line (without its `\n`)
fn parse_line(raw: &[u8]) -> Result<Line, LlmError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = std::str::from_utf8(raw)
        .map_err(|e| LlmError::StreamError(format!("Invalid UTF-8 in stream: {}", e)))?;

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(Line::Skip);
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == DONE_MARKER {
        return Ok(Line::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(payload) {
        Ok(chunk) => Ok(chunk.into_text().map(Line::Fragment).unwrap_or(Line::Skip)),
        Err(e) => {
            debug!(error = %e, payload, "skipping malformed upstream record");
            Ok(Line::Skip)
        }
    }
}
