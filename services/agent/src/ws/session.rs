//! Manages the gateway WebSocket connection lifecycle for one voice session.

use super::{
    gateway::{GatewayPipeline, GatewayTransport},
    protocol::GatewayMessage,
};
use crate::state::AppState;
use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use cadence_core::{ActiveVoiceConfig, SessionEvent, SessionSequencer};
use futures_util::{StreamExt, stream::SplitStream};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

const EVENT_BUFFER: usize = 64;

/// Axum handler to upgrade a gateway connection to a WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Runs one session over an upgraded gateway connection.
///
/// The read half is pumped into the session's event channel by a separate
/// task; the sequencer owns everything else until the gateway disconnects.
#[instrument(name = "voice_session", skip_all, fields(session_id, %peer))]
async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    tracing::Span::current().record("session_id", session_id.to_string());
    info!("Gateway connected. Starting session...");

    let (socket_tx, socket_rx) = socket.split();
    let sink = Arc::new(Mutex::new(socket_tx));
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let reader = tokio::spawn(forward_gateway_events(socket_rx, event_tx).in_current_span());

    let voice = ActiveVoiceConfig::default();
    let transport = Arc::new(GatewayTransport::new(sink.clone(), session_id));
    let pipeline = Arc::new(GatewayPipeline::new(
        sink,
        voice.clone(),
        state.config.pipeline.clone(),
    ));
    let sequencer = SessionSequencer::new(state.catalog.clone(), transport, pipeline, voice);

    if let Err(e) = sequencer.run(event_rx).await {
        error!(error = %e, "Session terminated with error.");
    }

    reader.abort();
    info!("Session finished.");
}

/// Translates gateway frames into session events, in arrival order.
///
/// Always finishes with `Disconnected` so the session stops delivering
/// notifications once the socket is gone.
async fn forward_gateway_events(
    mut socket_rx: SplitStream<WebSocket>,
    events: mpsc::Sender<SessionEvent>,
) {
    while let Some(msg_result) = socket_rx.next().await {
        let event = match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<GatewayMessage>(&text) {
                Ok(msg) => SessionEvent::from(msg),
                Err(e) => {
                    warn!(error = %e, "Ignoring unrecognized gateway message.");
                    continue;
                }
            },
            Ok(Message::Close(_)) => {
                info!("Gateway sent close frame.");
                break;
            }
            Ok(Message::Binary(_)) => {
                warn!("Ignoring binary frame from gateway.");
                continue;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(e) => {
                error!(error = ?e, "Error receiving from gateway WebSocket.");
                break;
            }
        };
        if events.send(event).await.is_err() {
            return;
        }
    }
    let _ = events.send(SessionEvent::Disconnected).await;
}
