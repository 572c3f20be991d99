//! Streaming relay
//!
//! Moves upstream body chunks to the client through a bounded channel. A
//! spawned task owns the upstream stream and feeds the channel; the response
//! body drains the receiving end. Whichever side finishes first ends the
//! handoff: a dropped receiver (client gone) makes the producer stop reading
//! and drop the upstream stream, which releases the connection.

use std::fmt::Display;
use std::io;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::proxy::RelayContext;
use crate::routes::metrics::record_stream_chunks;

/// Receiving end of a relayed upstream body
pub type RelayStream = ReceiverStream<io::Result<Bytes>>;

/// Spawn the producer task and return the consumer side.
///
/// Chunks are forwarded in upstream order. Empty chunks are skipped. A
/// mid-stream upstream error is logged and forwarded as the final item, after
/// the bytes already relayed, so the response body aborts instead of ending.
pub fn spawn_relay<S, E>(upstream: S, capacity: usize, ctx: RelayContext) -> RelayStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(capacity.max(1));

    tokio::spawn(async move {
        let mut upstream = Box::pin(upstream);
        let mut chunks = 0usize;
        let mut bytes = 0usize;

        loop {
            let next = tokio::select! {
                _ = tx.closed() => {
                    ctx.log_client_disconnected(chunks);
                    break;
                }
                next = upstream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    let len = chunk.len();
                    if tx.send(Ok(chunk)).await.is_err() {
                        ctx.log_client_disconnected(chunks);
                        break;
                    }
                    chunks += 1;
                    bytes += len;
                }
                Some(Err(e)) => {
                    let message = format!("upstream stream error: {e}");
                    ctx.log_error(&message);
                    // Nobody left to tell if the client is already gone.
                    let _ = tx.send(Err(io::Error::other(message))).await;
                    break;
                }
                None => {
                    ctx.log_stream_ended(chunks, bytes);
                    break;
                }
            }
        }

        record_stream_chunks(ctx.version.as_str(), chunks as u64);
        // `upstream` drops here, returning or closing the pooled connection.
    });

    ReceiverStream::new(rx)
}
