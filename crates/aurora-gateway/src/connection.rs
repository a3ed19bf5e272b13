use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use aurora_types::events::Envelope;

use crate::relay::Relay;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single WebSocket connection for `username`.
///
/// Registers the connection in the session registry, then runs a writer
/// task (relayed frames out, plus heartbeat) and a reader task (inbound
/// frames into the relay) until either side ends. Cleanup is identity-
/// checked, so a reconnect that replaced this binding is left alone.
pub async fn handle_connection(socket: WebSocket, relay: Relay, username: String) {
    let (mut sender, mut receiver) = socket.split();

    let registry = relay.registry().clone();
    let (conn_id, mut frames) = registry.register(&username).await;

    info!("{username} connected");

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Writer: relayed frames -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        // Cleared when a newer login for the same username takes over
        // the binding. The displaced connection stays open and can keep
        // sending; it just receives no more relayed frames.
        let mut frames_open = true;

        loop {
            tokio::select! {
                frame = frames.recv(), if frames_open => {
                    match frame {
                        Some(frame) => {
                            if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                        None => frames_open = false,
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("heartbeat timeout (missed {missed_heartbeats} pongs), dropping connection");
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Reader: inbound frames -> relay
    let relay_recv = relay.clone();
    let username_recv = username.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match Envelope::parse(&text) {
                    Ok(event) => relay_recv.handle_event(&username_recv, event).await,
                    Err(e) => {
                        // Malformed frames are skipped; the connection survives.
                        let raw = text.as_str();
                        warn!(
                            "{username_recv} sent a bad frame: {e} -- raw: {}",
                            raw.get(..200).unwrap_or(raw)
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                Message::Binary(_) => {
                    // No binary protocol on this endpoint.
                    warn!("{username_recv} sent a binary frame, closing");
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    registry.unregister(&username, conn_id).await;
    info!("{username} disconnected");
}
