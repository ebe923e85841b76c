//! Per-connection lifecycle.
//!
//! Each accepted socket gets exactly one [`WatchSession`]. This task is the
//! single writer for the socket: it drains the session's event queue into
//! text frames, reads inbound frames as commands or keep-alives, and stops
//! the session when either side goes away.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use super::messages::WatchCommand;
use crate::app_state::AppState;
use crate::domain::WatchEvent;
use crate::error::WatchError;
use crate::watch::{ChannelSink, WatchSession};

/// Runs a watch session for one WebSocket until it ends.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sink, mut events) = ChannelSink::new(state.config.sink_capacity);
    let session = Arc::new(WatchSession::new(
        Arc::clone(&state.source),
        Arc::new(sink),
        state.config.retry,
    ));
    let session_id = session.id();

    if let Err(error) = state.sessions.insert(Arc::clone(&session)).await {
        tracing::error!(%session_id, %error, "could not register session");
        return;
    }
    if let Err(error) = session.start() {
        tracing::error!(%session_id, %error, "could not start session");
        let _ = state.sessions.remove(session_id).await;
        return;
    }
    tracing::info!(%session_id, "ws connection opened");

    forward(&session, &mut ws_rx, &mut ws_tx, &mut events).await;

    drop(events);
    let _ = ws_tx.send(Message::Close(None)).await;
    let _ = state.sessions.remove(session_id).await;

    match session.stop_reason() {
        Some(reason) if reason.is_failure() => {
            tracing::warn!(%session_id, %reason, "ws connection closed after failure");
        }
        reason => {
            tracing::info!(
                %session_id,
                reason = %reason.map_or_else(String::new, ToString::to_string),
                "ws connection closed"
            );
        }
    }
}

/// Moves frames between the socket halves and the session until the
/// session is told to stop.
async fn forward<R, W>(
    session: &WatchSession,
    ws_rx: &mut R,
    ws_tx: &mut W,
    events: &mut mpsc::Receiver<WatchEvent>,
) where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let session_id = session.id();
    loop {
        tokio::select! {
            biased;

            // Shutdown from a failed poller or an explicit stop; checked
            // first so nothing queued afterwards reaches the client
            () = session.stopping() => break,
            // Incoming frame from the client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_text_message(session, &text),
                    Some(Ok(Message::Close(_))) | None => {
                        session.disconnect();
                        break;
                    }
                    Some(Err(error)) => {
                        tracing::debug!(%session_id, %error, "ws read failed");
                        session.disconnect();
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            // Event from one of the session's pollers
            Some(event) = events.recv() => {
                let frame = match event.to_json() {
                    Ok(json) => json,
                    Err(error) => {
                        session.fail(WatchError::SinkWrite(format!("unserializable event: {error}")));
                        break;
                    }
                };
                if let Err(error) = ws_tx.send(Message::text(frame)).await {
                    session.fail(WatchError::SinkWrite(error.to_string()));
                    break;
                }
            }
        }
    }
}

/// Applies a text frame from the client. Anything other than a known
/// command counts as a keep-alive.
fn handle_text_message(session: &WatchSession, text: &str) {
    let Some(command) = WatchCommand::parse(text) else {
        tracing::debug!(session_id = %session.id(), len = text.len(), "ignoring non-command frame");
        return;
    };
    if let Err(error) = session.command(command.into()) {
        tracing::debug!(session_id = %session.id(), %error, "command dropped");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use futures_util::stream;

    use super::*;
    use crate::domain::{EventKind, Watermark};
    use crate::watch::fakes::ScriptedSource;
    use crate::watch::{EventSink, RetryPolicy, StopReason};

    fn session(sink: ChannelSink) -> WatchSession {
        WatchSession::new(
            Arc::new(ScriptedSource::new()),
            Arc::new(sink),
            RetryPolicy::fail_fast(),
        )
    }

    fn event(index: u64) -> WatchEvent {
        WatchEvent::new(EventKind::FetchedJobs, serde_json::json!([]), Watermark::new(index))
    }

    #[tokio::test]
    async fn queued_events_are_dropped_once_stopping() {
        let (sink, mut events) = ChannelSink::new(4);
        let Ok(()) = sink.emit(event(1)).await else {
            panic!("queue has room");
        };
        let session = session(sink);
        session.fail(WatchError::Internal("poller crashed".to_string()));

        let mut inbound = stream::pending::<Result<Message, axum::Error>>();
        let mut written: Vec<Message> = Vec::new();
        let done = tokio::time::timeout(
            Duration::from_secs(2),
            forward(&session, &mut inbound, &mut written, &mut events),
        )
        .await;

        assert!(done.is_ok(), "forward should return once stopping");
        assert!(written.is_empty(), "wrote {written:?} after failure");
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn events_become_text_frames() {
        let (sink, mut events) = ChannelSink::new(4);
        let Ok(()) = sink.emit(event(2)).await else {
            panic!("queue has room");
        };
        let session = session(sink);

        // The peer closes after the queued event has had its turn.
        let mut inbound = stream::once(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, axum::Error>(Message::Close(None))
        })
        .boxed();
        let mut written: Vec<Message> = Vec::new();
        forward(&session, &mut inbound, &mut written, &mut events).await;

        let [Message::Text(frame)] = written.as_slice() else {
            panic!("expected one text frame, got {written:?}");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(frame.as_str()) else {
            panic!("frame is not JSON");
        };
        assert_eq!(value["Kind"], "fetched_jobs");
        assert!(matches!(
            session.stop_reason(),
            Some(StopReason::ClientDisconnected)
        ));
    }
}
