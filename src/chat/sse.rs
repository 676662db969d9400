use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;

use crate::error::ChatError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// JSON payload carried on a `data:` line.
#[derive(Debug, Deserialize)]
pub struct StreamPayload {
    /// The incremental content token, if the line carries one.
    pub content: Option<String>,
}

/// One decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseFrame {
    /// An incremental content token.
    Token(String),
    /// The `[DONE]` sentinel; the stream is over.
    Done,
}

/// Incremental decoder for the backend's `data:`-line event stream.
///
/// Chunk boundaries carry no meaning: bytes are staged until they form valid
/// UTF-8, text is staged until it forms complete lines, and only complete
/// lines are decoded. After the `[DONE]` sentinel the decoder is fused and
/// ignores all further input. One decoder per connection attempt.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buffer: String,
    utf8_buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one transport chunk and drain every frame it completes.
    pub(crate) fn push_chunk(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        if self.done {
            return Vec::new();
        }
        self.push_bytes(bytes);
        self.drain_frames()
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.utf8_buffer.extend_from_slice(bytes);
        match std::str::from_utf8(&self.utf8_buffer) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.utf8_buffer.clear();
            }
            Err(err) => self.consume_valid_prefix(err.valid_up_to()),
        }
    }

    fn consume_valid_prefix(&mut self, valid_up_to: usize) {
        if valid_up_to == 0 {
            return;
        }

        let valid = String::from_utf8_lossy(&self.utf8_buffer[..valid_up_to]);
        self.buffer.push_str(&valid);
        self.utf8_buffer.drain(..valid_up_to);
    }

    fn drain_frames(&mut self) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        while let Some(line) = self.next_line() {
            match decode_line(&line) {
                Some(SseFrame::Done) => {
                    self.done = true;
                    frames.push(SseFrame::Done);
                    break;
                }
                Some(frame) => frames.push(frame),
                None => {}
            }
        }
        frames
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.find('\n')?;
        let line = self.buffer[..pos].trim_end_matches('\r').to_string();
        self.buffer.drain(..=pos);
        Some(line)
    }
}

/// Decode one complete line.
///
/// Lines without the `data: ` prefix (blanks, comments, other SSE fields)
/// and payloads that are not JSON objects with a string `content` field are
/// dropped without error; a malformed server line must not kill the stream.
fn decode_line(line: &str) -> Option<SseFrame> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }
    serde_json::from_str::<StreamPayload>(payload)
        .ok()
        .and_then(|p| p.content)
        .map(SseFrame::Token)
}

/// Adapt a streaming HTTP response into a finite stream of content tokens.
///
/// The stream ends on the `[DONE]` sentinel, on transport close (normal
/// completion), or after a single `Err` item for a mid-stream transport
/// failure. It is not restartable.
pub(crate) fn sse_token_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>> {
    let stream = response
        .bytes_stream()
        .scan(SseDecoder::new(), |decoder, chunk| {
            let items = handle_chunk(decoder, chunk);
            async move { items }
        })
        .flat_map(futures::stream::iter);

    Box::pin(stream)
}

fn handle_chunk(
    decoder: &mut SseDecoder,
    chunk: Result<Bytes, reqwest::Error>,
) -> Option<Vec<Result<String, ChatError>>> {
    if decoder.is_done() {
        return None;
    }

    let bytes = match chunk {
        Ok(bytes) => bytes,
        Err(err) => {
            decoder.done = true;
            return Some(vec![Err(ChatError::Transport(err.to_string()))]);
        }
    };

    let items = decoder
        .push_chunk(&bytes)
        .into_iter()
        .filter_map(|frame| match frame {
            SseFrame::Token(token) => Some(Ok(token)),
            SseFrame::Done => None,
        })
        .collect();
    Some(items)
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
