//! WebSocket を使った Broadcaster 実装
//!
//! ドメインイベントをワイヤ JSON に一度だけシリアライズし、
//! ConnectionRegistry でルーム単位の宛先を解決して MessagePusher で
//! 送信します。閉じた接続への配信失敗は pusher 側で警告ログに留まり、
//! 呼び出し元には伝播しません。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Broadcaster, ConnectionId, ConnectionRegistry, MessagePusher, OutboundEvent, RoomId,
};
use crate::infrastructure::dto::conversion::encode_event;

/// WebSocket を使った Broadcaster 実装
pub struct WebSocketBroadcaster {
    /// 接続レジストリ（宛先解決用、共有状態）
    registry: Arc<Mutex<ConnectionRegistry>>,
    /// MessagePusher（実際の送信）
    message_pusher: Arc<dyn MessagePusher>,
}

impl WebSocketBroadcaster {
    /// 新しい WebSocketBroadcaster を作成
    pub fn new(
        registry: Arc<Mutex<ConnectionRegistry>>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    fn encode(event: &OutboundEvent) -> Option<String> {
        match encode_event(event) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to encode outbound event: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Broadcaster for WebSocketBroadcaster {
    async fn send_to_room(
        &self,
        room_id: &RoomId,
        event: &OutboundEvent,
        exclude: Option<&ConnectionId>,
    ) {
        let Some(json) = Self::encode(event) else {
            return;
        };
        let targets: Vec<ConnectionId> = {
            let registry = self.registry.lock().await;
            registry
                .list_by_room(room_id)
                .into_iter()
                .filter(|id| Some(id) != exclude)
                .collect()
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
            tracing::warn!("Failed to broadcast to room {}: {}", room_id, e);
        }
    }

    async fn send_to_connection(&self, connection_id: &ConnectionId, event: &OutboundEvent) {
        let Some(json) = Self::encode(event) else {
            return;
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &json).await {
            // 閉じた接続への配信失敗は黙ってスキップ
            tracing::warn!("Failed to push to connection '{}': {}", connection_id, e);
        }
    }

    async fn send_to_all(&self, event: &OutboundEvent) {
        let Some(json) = Self::encode(event) else {
            return;
        };
        let targets = {
            let registry = self.registry.lock().await;
            registry.all_ids()
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
            tracing::warn!("Failed to broadcast to all connections: {}", e);
        }
    }
}
