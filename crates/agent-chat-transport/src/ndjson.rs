//! Newline-delimited JSON framing.

use std::{collections::VecDeque, fmt::Display};

use agent_chat_core::{FrameStream, GatewayError, RawFrame};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// Incremental splitter turning arbitrary byte chunks into lines.
///
/// Blank lines are dropped. A trailing `\r` is stripped.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
}

impl LineSplitter {
    /// Feed a chunk and drain complete lines.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(self.scanned + offset + 1).freeze();
            self.scanned = 0;
            if let Some(frame) = to_frame(line) {
                frames.push(frame);
            }
        }
        self.scanned = self.buffer.len();
        frames
    }

    /// Drain the unterminated tail at end of stream.
    pub fn finish(&mut self) -> Option<RawFrame> {
        self.scanned = 0;
        let rest = self.buffer.split().freeze();
        to_frame(rest)
    }

    #[must_use]
    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

fn to_frame(line: Bytes) -> Option<RawFrame> {
    let end = line
        .iter()
        .rposition(|b| !matches!(b, b'\n' | b'\r'))
        .map_or(0, |i| i + 1);
    let line = line.slice(..end);
    if line.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(RawFrame::new(line))
    }
}

struct FrameState<S> {
    bytes: S,
    splitter: LineSplitter,
    pending: VecDeque<RawFrame>,
    finished: bool,
}

/// Turn a byte stream into a [`FrameStream`].
///
/// A chunk error is yielded once as `Transport` and ends the stream; lines
/// completed before it are still delivered first.
pub fn frames_from_bytes<S, E>(bytes: S) -> FrameStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
{
    let state = FrameState {
        bytes,
        splitter: LineSplitter::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(frame) = st.pending.pop_front() {
                return Some((Ok(frame), st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => st.pending.extend(st.splitter.feed(&chunk)),
                Some(Err(e)) => {
                    st.finished = true;
                    tracing::warn!("Stream interrupted: {e}");
                    return Some((Err(GatewayError::Transport(e.to_string())), st));
                }
                None => {
                    st.finished = true;
                    st.pending.extend(st.splitter.finish());
                }
            }
        }
    })
    .boxed()
}
