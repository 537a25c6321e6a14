//! Newline-delimited JSON frame decoding.
//!
//! The backend streams one JSON object per line. Network chunks do not
//! respect line boundaries (or UTF-8 boundaries), so bytes are buffered
//! until a full line is available. Lines that are not valid UTF-8 or fail to
//! parse are skipped, as is any line longer than the decoder's limit.

use std::collections::VecDeque;
use std::fmt::Display;

use futures::{Stream, StreamExt};
use llmgate_core::backend::{Frame, FrameStream};
use llmgate_core::error::BackendError;
use tracing::{trace, warn};

/// Longest line buffered before it is dropped.
pub const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Incremental line splitter + frame parser.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_line: usize,
    /// Inside an over-long line; bytes are dropped up to the next newline.
    discarding: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line,
            discarding: false,
        }
    }

    /// Feed raw bytes; returns the frames of every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if let Some(frame) = decode_line(&line) {
                frames.push(frame);
            }
        }

        if self.buffer.len() > self.max_line {
            if !self.discarding {
                warn!(limit = self.max_line, "Dropping over-long frame line");
            }
            self.buffer.clear();
            self.discarding = true;
        }
        frames
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        decode_line(&rest)
    }
}

/// Parse one line. Blank lines, invalid UTF-8 and malformed JSON yield `None`.
fn decode_line(line: &[u8]) -> Option<Frame> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            trace!(error = %e, "Ignoring frame that is not UTF-8");
            return None;
        }
    };
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<Frame>(text) {
        Ok(frame) => Some(frame),
        Err(e) => {
            trace!(line = %text, error = %e, "Ignoring unparseable frame");
            None
        }
    }
}

struct DecodeState<S> {
    body: S,
    decoder: FrameDecoder,
    pending: VecDeque<Frame>,
    finished: bool,
}

/// Turn a byte-chunk stream into a lazily-read [`FrameStream`].
///
/// The body is only polled when no decoded frame is waiting. A body error
/// becomes one `BackendError::Connection` item, after which the stream ends.
pub fn frames<S, B, E>(body: S) -> FrameStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        body,
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let decoded = state.decoder.push(bytes.as_ref());
                    state.pending.extend(decoded);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(BackendError::Connection(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    }))
}
