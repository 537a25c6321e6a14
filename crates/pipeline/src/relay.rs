//! Streaming relay: backend frames in, outward [`StreamChunk`]s out.
//!
//! Frames are consumed one at a time, only when the consumer asks for the
//! next chunk. Dropping the relay drops the frame stream, which releases the
//! backend connection.

use futures::{Stream, StreamExt};
use llmgate_core::backend::FrameStream;
use llmgate_core::message::StreamChunk;
use tracing::{debug, warn};

struct RelayState {
    frames: FrameStream,
    full_text: String,
    finished: bool,
}

/// Re-emit `frames` as outward chunks.
///
/// - A frame with a `response` fragment or `done = true` becomes one
///   [`StreamChunk::Delta`] whose `full_text` includes the fragment.
/// - Frames with neither are skipped.
/// - After a `done` frame the stream ends without reading the backend again.
/// - A backend error becomes a single [`StreamChunk::Error`], then the stream ends.
/// - If the frames run out without `done`, the stream just ends.
pub fn relay(frames: FrameStream) -> impl Stream<Item = StreamChunk> + Send {
    let state = RelayState {
        frames,
        full_text: String::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        let chunk = loop {
            match state.frames.next().await {
                Some(Ok(frame)) => {
                    if frame.response.is_none() && !frame.done {
                        continue;
                    }

                    let text = frame.response.unwrap_or_default();
                    state.full_text.push_str(&text);
                    if frame.done {
                        debug!(chars = state.full_text.chars().count(), "Stream complete");
                    }

                    break StreamChunk::Delta {
                        text,
                        full_text: state.full_text.clone(),
                        done: frame.done,
                    };
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Stream aborted");
                    break StreamChunk::Error {
                        error: e.to_string(),
                    };
                }
                None => return None,
            }
        };

        state.finished = chunk.is_terminal();
        Some((chunk, state))
    })
}
