//! Stream aggregation: raw reply frames in, ordered text fragments out.
//!
//! Malformed frames (partial or keep-alive lines) are skipped. A transport
//! interruption ends the reply with whatever was already extracted.

use agent_chat_core::{FrameStream, GatewayError, RawFrame, StreamFragment};
use futures::{StreamExt, stream::BoxStream};

/// Collected assistant reply of one send-message call.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    /// Fragments in frame order, then part order.
    pub fragments: Vec<StreamFragment>,
    /// Set when the transport failed mid-stream.
    pub interrupted: Option<GatewayError>,
}

impl Reply {
    /// No text came back.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fragments concatenated.
    #[must_use]
    pub fn text(&self) -> String {
        self.fragments.iter().map(StreamFragment::as_str).collect()
    }
}

/// Text fragments carried by one frame. Undecodable frames yield nothing.
#[must_use]
pub fn fragments_in_frame(frame: &RawFrame) -> Vec<StreamFragment> {
    let decoded = match frame.decode() {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::trace!("Skipping malformed frame: {e}");
            return Vec::new();
        }
    };

    decoded
        .content
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.visible_text())
                .map(StreamFragment::new)
                .collect()
        })
        .unwrap_or_default()
}

/// Reduce a finished sequence of frames.
#[must_use]
pub fn aggregate<I>(frames: I) -> Vec<StreamFragment>
where
    I: IntoIterator<Item = RawFrame>,
{
    frames
        .into_iter()
        .flat_map(|frame| fragments_in_frame(&frame))
        .collect()
}

/// Fragments as each frame arrives.
///
/// An `Err` item reports the transport interruption and is the last item.
#[must_use]
pub fn fragment_stream(
    frames: FrameStream,
) -> BoxStream<'static, Result<StreamFragment, GatewayError>> {
    frames
        .flat_map(|item| {
            let items: Vec<Result<StreamFragment, GatewayError>> = match item {
                Ok(frame) => fragments_in_frame(&frame).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            futures::stream::iter(items)
        })
        .boxed()
}

/// Drain a frame stream into a [`Reply`].
pub async fn collect(frames: FrameStream) -> Reply {
    let mut reply = Reply::default();
    let mut fragments = fragment_stream(frames);

    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => reply.fragments.push(fragment),
            Err(e) => {
                tracing::warn!(
                    received = reply.fragments.len(),
                    "Reply stream interrupted: {e}"
                );
                reply.interrupted = Some(e);
                break;
            }
        }
    }

    reply
}
