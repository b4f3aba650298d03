//! Per-connection session I/O
//!
//! Each connection runs a reader and a writer task. The writer drains the
//! session's outbound queue onto the socket; the reader decodes frames and
//! hands typed presence updates to the hub. Whichever finishes first ends
//! the session.

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use types::ids::SessionId;

use crate::hub::HubHandle;
use crate::protocol::{self, InboundFrame, OutboundFrame};

/// How long the writer may keep flushing after the reader has gone
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drive one connection until either side closes
pub async fn run_session<W, R, E>(sink: W, stream: R, hub: HubHandle, outbound_capacity: usize)
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let session_id = SessionId::new();
    let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity);

    if let Err(err) = hub.register(session_id, outbound_tx).await {
        warn!(%session_id, error = %err, "Could not register session");
        return;
    }
    info!(%session_id, "Session opened");

    let mut writer = tokio::spawn(write_loop(sink, outbound_rx, session_id));
    let mut reader = tokio::spawn(read_loop(stream, hub.clone(), session_id));

    let reader_done = tokio::select! {
        _ = &mut writer => {
            reader.abort();
            false
        }
        _ = &mut reader => true,
    };

    // Dropping the hub entry closes the outbound queue
    let _ = hub.unregister(session_id).await;

    if reader_done && time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        debug!(%session_id, "Writer did not drain in time");
        writer.abort();
    }

    info!(%session_id, "Session closed");
}

async fn write_loop<W>(mut sink: W, mut outbound: mpsc::Receiver<OutboundFrame>, session_id: SessionId)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(frame) = outbound.recv().await {
        let text = match frame.encode() {
            Ok(text) => text,
            Err(err) => {
                warn!(%session_id, error = %err, "Could not encode frame");
                continue;
            }
        };
        if let Err(err) = sink.send(Message::Text(text.into())).await {
            debug!(%session_id, error = %err, "Write failed");
            break;
        }
    }

    outbound.close();
    let _ = sink.close().await;
}

async fn read_loop<R, E>(mut stream: R, hub: HubHandle, session_id: SessionId)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match protocol::decode_frame(text.as_str()) {
                Ok(InboundFrame::Update(update)) => {
                    if hub.presence(session_id, update.into_presence()).await.is_err() {
                        warn!(%session_id, "Hub stopped");
                        break;
                    }
                }
                Err(err) => warn!(%session_id, error = %err, "Dropping malformed frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(%session_id, error = %err, "Read failed");
                break;
            }
        }
    }
}
