//! WebSocket connection handlers.
//!
//! 接続 1 本ごとに Router として振る舞い、受信メッセージをデコードして
//! ユースケースへ振り分けます。デコードできないメッセージはログに残して
//! 破棄し、接続は開いたままにします。メッセージ単位の失敗はその接続
//! またはそのルームに閉じ、サーバープロセスや他の接続には波及しません。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chanoma_shared::time::get_jst_timestamp;
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{
        CallerIdentity, ConnectionId, DispatchError, MessageContent, OutboundEvent, RoomId,
        Timestamp, Username, WalletAddress,
    },
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Create a channel for this client to receive messages
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    // Register the connection before the upgrade completes
    {
        let mut registry = state.registry.lock().await;
        registry.register(connection_id.clone());
    }
    state
        .message_pusher
        .register_client(connection_id.clone(), tx)
        .await;
    tracing::info!("Connection '{}' established", connection_id);

    ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    // トランスポートエラーは正常な切断と同様に扱う
                    tracing::error!("WebSocket error on '{}': {}", connection_id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_message) => {
                            route_message(&state_clone, &connection_id_clone, client_message)
                                .await;
                        }
                        Err(e) => {
                            // MalformedInput: ログに残して破棄、接続は維持
                            tracing::warn!(
                                "Dropping undecodable message from '{}': {}",
                                connection_id_clone,
                                e
                            );
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // close と error のどちらの経路でも同じ切断処理（冪等）
    state.disconnect_participant_usecase.execute(&connection_id).await;
    tracing::info!("Connection '{}' cleaned up", connection_id);
}

/// 受信メッセージをユースケースへ振り分ける
async fn route_message(state: &Arc<AppState>, connection_id: &ConnectionId, message: ClientMessage) {
    match message {
        ClientMessage::Connect { api_key } => {
            state
                .connect_caller_usecase
                .execute(connection_id, &api_key)
                .await;
        }
        ClientMessage::CreateRoom { room_name, mode } => {
            let room_name = room_name.trim().to_string();
            if room_name.is_empty() {
                notify(state, connection_id, "Room name must not be empty").await;
                return;
            }
            state
                .create_room_usecase
                .execute(connection_id, room_name, mode.into())
                .await;
        }
        ClientMessage::JoinRoom {
            room_id,
            username,
            wallet,
        } => {
            let Ok(room_id) = RoomId::new(room_id) else {
                notify(state, connection_id, "Room id must not be empty").await;
                return;
            };
            let username = match Username::new(username) {
                Ok(username) => username,
                Err(e) => {
                    notify(state, connection_id, &e.to_string()).await;
                    return;
                }
            };
            let wallet = wallet.and_then(|w| WalletAddress::new(w).ok());
            if let Err(e) = state
                .join_room_usecase
                .execute(connection_id, &room_id, username, wallet)
                .await
            {
                // NotFound はこの接続にだけ通知する
                notify(state, connection_id, &e.to_string()).await;
            }
        }
        ClientMessage::Chat { room_id, text } => {
            let Ok(room_id) = RoomId::new(room_id) else {
                notify(state, connection_id, "Room id must not be empty").await;
                return;
            };
            let content = match MessageContent::new(text) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Rejected chat from '{}': {}", connection_id, e);
                    return;
                }
            };
            match state
                .send_chat_usecase
                .execute(connection_id, &room_id, content)
                .await
            {
                Ok(message) => {
                    // メンショントークンを含むチャットがエージェントのトリガー
                    if message.content.as_str().contains(&state.agent_mention) {
                        trigger_agent(
                            state,
                            connection_id,
                            room_id,
                            message.content.as_str().to_string(),
                        )
                        .await;
                    }
                }
                Err(e) => {
                    notify(state, connection_id, &e.to_string()).await;
                }
            }
        }
    }
}

/// エージェント起動を fire-and-forget で開始する
///
/// `dispatch` の完了を Router は待たない。busy の identity に対しては
/// ルームへ system メッセージで通知する。
async fn trigger_agent(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: RoomId,
    text: String,
) {
    let identity = {
        let registry = state.registry.lock().await;
        registry
            .get(connection_id)
            .map(|session| session.identity)
            .unwrap_or(CallerIdentity::Guest)
    };
    let dispatcher = state.agent_dispatcher.clone();
    let broadcaster = state.broadcaster.clone();
    tokio::spawn(async move {
        if let Err(e @ DispatchError::AlreadyProcessing(_)) =
            dispatcher.dispatch(identity, room_id.clone(), text).await
        {
            broadcaster
                .send_to_room(&room_id, &OutboundEvent::System {
                    room_id: Some(room_id.clone()),
                    text: e.to_string(),
                    timestamp: Timestamp::new(get_jst_timestamp()),
                }, None)
                .await;
        }
    });
}

/// この接続にだけ system メッセージを返信する
async fn notify(state: &Arc<AppState>, connection_id: &ConnectionId, text: &str) {
    state
        .broadcaster
        .send_to_connection(connection_id, &OutboundEvent::System {
            room_id: None,
            text: text.to_string(),
            timestamp: Timestamp::new(get_jst_timestamp()),
        })
        .await;
}
