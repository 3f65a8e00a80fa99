use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use donafeed_core::events::LiveEventReceiver;
use donafeed_sdk::objects::{ConnectionStatus, ServerEvent, iso_timestamp};
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;

/// `GET /events/ws`: WebSocket live event stream.
///
/// The first frame is a `connection` greeting carrying the current client
/// count. After that every message on the live broadcast (webhook events
/// and keep-alive pings) is relayed as a JSON text frame until the client
/// disconnects.
pub(super) async fn events_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_events_ws(socket, state))
}

async fn handle_events_ws(mut socket: WebSocket, state: AppState) {
    // Subscribe before greeting so nothing published in between is lost.
    let mut live_rx = state.live_tx.subscribe();
    let client = state.register_stream_client();
    tracing::info!(
        clients = client.count_at_registration(),
        "Stream client connected"
    );

    let greeting = ServerEvent::Connection {
        status: ConnectionStatus::Connected,
        timestamp: iso_timestamp(),
        client_count: client.count_at_registration(),
    };

    if send_json(&mut socket, &greeting).await.is_ok() {
        relay(&mut socket, &mut live_rx).await;
    }

    drop(client);
    tracing::info!(
        remaining = state.stream_clients(),
        "Stream client disconnected"
    );
}

async fn relay(socket: &mut WebSocket, live_rx: &mut LiveEventReceiver) {
    loop {
        tokio::select! {
            result = live_rx.recv() => {
                match result {
                    Ok(event) => {
                        if send_json(socket, &event).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "WS: live receiver lagged, continuing");
                    }
                    Err(RecvError::Closed) => {
                        let _ = socket.send(Message::Close(None)).await;
                        return;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
