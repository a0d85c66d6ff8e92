//! テスト用の Broadcaster 実装
//!
//! 配信されたイベントを種類別（ルーム宛・接続宛・全体宛）に記録し、
//! UseCase 層のテストから順序と内容を検証できるようにします。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Broadcaster, ConnectionId, OutboundEvent, RoomId};

/// 配信内容を記録するだけの Broadcaster
pub struct RecordingBroadcaster {
    room: Mutex<Vec<(RoomId, OutboundEvent, Option<ConnectionId>)>>,
    direct: Mutex<Vec<(ConnectionId, OutboundEvent)>>,
    global: Mutex<Vec<OutboundEvent>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self {
            room: Mutex::new(Vec::new()),
            direct: Mutex::new(Vec::new()),
            global: Mutex::new(Vec::new()),
        }
    }

    /// ルーム宛に配信されたイベント（配信順）
    pub async fn room_events(&self) -> Vec<(RoomId, OutboundEvent, Option<ConnectionId>)> {
        self.room.lock().await.clone()
    }

    /// 特定の接続宛に配信されたイベント（配信順）
    pub async fn direct_events(&self) -> Vec<(ConnectionId, OutboundEvent)> {
        self.direct.lock().await.clone()
    }

    /// 全接続宛に配信されたイベント（配信順）
    pub async fn global_events(&self) -> Vec<OutboundEvent> {
        self.global.lock().await.clone()
    }

    /// 記録を消去する
    pub async fn clear(&self) {
        self.room.lock().await.clear();
        self.direct.lock().await.clear();
        self.global.lock().await.clear();
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn send_to_room(
        &self,
        room_id: &RoomId,
        event: &OutboundEvent,
        exclude: Option<&ConnectionId>,
    ) {
        self.room
            .lock()
            .await
            .push((room_id.clone(), event.clone(), exclude.cloned()));
    }

    async fn send_to_connection(&self, connection_id: &ConnectionId, event: &OutboundEvent) {
        self.direct
            .lock()
            .await
            .push((connection_id.clone(), event.clone()));
    }

    async fn send_to_all(&self, event: &OutboundEvent) {
        self.global.lock().await.push(event.clone());
    }
}
