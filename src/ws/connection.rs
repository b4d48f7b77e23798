//! Per-player connection loops.
//!
//! Each player gets two independent tasks: [`read_loop`] turns inbound
//! frames into position updates for the conductor, and [`write_loop`]
//! drains the player's queues onto the socket. The loops never talk to
//! each other; whichever fails first tears the player down through
//! [`Hub::disconnect`], and the registry removal stops the other one.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};

use crate::domain::{Inbox, Player, PlayerId, PositionUpdate, ServerMessage};
use crate::error::HubError;
use crate::service::{Admission, Hub};

/// Runs a freshly upgraded connection until the player leaves.
///
/// Admits the player (which queues its `getId` frame), starts the write
/// loop, hands the join to the conductor and then reads until teardown.
pub async fn run_connection(socket: WebSocket, hub: Hub) {
    let Admission { player, inbox } = match hub.admit().await {
        Ok(admission) => admission,
        Err(e) => {
            tracing::warn!(error = %e, "failed to admit player");
            return;
        }
    };
    let Inbox {
        raw,
        events,
        hangup,
    } = inbox;
    let (ws_tx, ws_rx) = socket.split();

    tokio::spawn(write_loop(hub.clone(), player.id(), ws_tx, raw, events));

    if let Err(e) = hub.announce(player.snapshot()).await {
        tracing::warn!(player_id = %player.id(), error = %e, "join not announced");
        hub.disconnect(player.id()).await;
        return;
    }

    read_loop(hub, player, ws_rx, hangup).await;
}

/// Reads frames until the connection fails or the hub hangs up.
///
/// Every valid frame first moves the player, then goes to the conductor
/// stamped with the player's id. Returns `true` if this loop was the one
/// that tore the player down.
pub async fn read_loop<S>(
    hub: Hub,
    player: Arc<Player>,
    mut ws_rx: S,
    mut hangup: oneshot::Receiver<()>,
) -> bool
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let player_id = player.id();
    loop {
        let frame = tokio::select! {
            biased;
            _ = &mut hangup => {
                tracing::debug!(%player_id, "read loop stopped by teardown");
                break;
            }
            frame = ws_rx.next() => frame,
        };

        match read_update(frame) {
            Ok(Some(update)) => {
                player.move_to(update.position());
                if let Err(e) = hub.publish(update.stamped(player_id)).await {
                    tracing::warn!(%player_id, error = %e, "dropping position update");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) if e.is_disconnect() => {
                tracing::debug!(%player_id, "peer closed connection");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "read loop terminated");
                break;
            }
        }
    }
    hub.disconnect(player_id).await
}

/// Interprets one inbound frame. Control frames yield `Ok(None)`.
fn read_update(
    frame: Option<Result<Message, axum::Error>>,
) -> Result<Option<PositionUpdate>, HubError> {
    match frame {
        None | Some(Ok(Message::Close(_))) => Err(HubError::ConnectionClosed),
        Some(Err(e)) => Err(HubError::Transport(e)),
        Some(Ok(Message::Text(text))) => PositionUpdate::decode(text.as_bytes()).map(Some),
        Some(Ok(Message::Binary(bytes))) => PositionUpdate::decode(&bytes).map(Some),
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(None),
    }
}

/// Writes queued frames until a write fails or the queues close.
///
/// Raw frames are always written before pending structured events.
/// Returns `true` if this loop was the one that tore the player down.
pub async fn write_loop<K>(
    hub: Hub,
    player_id: PlayerId,
    mut ws_tx: K,
    mut raw: mpsc::UnboundedReceiver<Utf8Bytes>,
    mut events: mpsc::Receiver<ServerMessage>,
) -> bool
where
    K: Sink<Message, Error = axum::Error> + Unpin,
{
    let outcome: Result<(), HubError> = loop {
        let frame = tokio::select! {
            biased;
            text = raw.recv() => match text {
                Some(text) => Message::Text(text),
                None => break Ok(()),
            },
            event = events.recv() => match event {
                Some(event) => match event.encode() {
                    Ok(json) => Message::text(json),
                    Err(e) => break Err(e),
                },
                None => break Ok(()),
            },
        };
        if let Err(e) = ws_tx.send(frame).await {
            break Err(HubError::Transport(e));
        }
    };

    match outcome {
        Ok(()) => tracing::debug!(%player_id, "write loop stopped by teardown"),
        Err(e) => tracing::debug!(%player_id, error = %e, "write loop terminated"),
    }
    let tore_down = hub.disconnect(player_id).await;
    let _ = ws_tx.close().await;
    tore_down
}
