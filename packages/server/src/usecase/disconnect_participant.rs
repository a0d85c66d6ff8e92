//! UseCase: 切断処理
//!
//! ソケットの close / error の両方からこの経路に入ります。退室イベントと
//! ユーザーリスト更新を流し、レジストリと pusher から登録解除します。
//! どの経路でも失敗しません（登録解除は冪等）。

use std::sync::Arc;

use chanoma_shared::time::get_jst_timestamp;
use tokio::sync::Mutex;

use crate::domain::{
    Broadcaster, ConnectionId, ConnectionRegistry, MessagePusher, OutboundEvent, RoomEvent,
    RoomRepository, Timestamp,
};

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 接続レジストリ（共有状態）
    registry: Arc<Mutex<ConnectionRegistry>>,
    /// Broadcaster（イベント配信の抽象化）
    broadcaster: Arc<dyn Broadcaster>,
    /// MessagePusher（sender の登録解除用）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<Mutex<ConnectionRegistry>>,
        broadcaster: Arc<dyn Broadcaster>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            registry,
            broadcaster,
            message_pusher,
        }
    }

    /// 切断を実行（ルーム未参加でも失敗しない）
    pub async fn execute(&self, connection_id: &ConnectionId) {
        // セッション属性を読み、先にレジストリから外す
        // （以降のブロードキャスト対象からこの接続を除くため）
        let session = {
            let mut registry = self.registry.lock().await;
            let session = registry.get(connection_id).cloned();
            registry.unregister(connection_id);
            session
        };
        self.message_pusher.unregister_client(connection_id).await;

        let Some(session) = session else {
            return;
        };
        let (Some(room_id), Some(username)) = (session.room, session.username) else {
            return;
        };

        if self
            .repository
            .leave_room(&room_id, &username)
            .await
            .is_none()
        {
            return;
        }

        // 退室 system イベント（リプレイログにも記録）とユーザーリスト更新
        let timestamp = Timestamp::new(get_jst_timestamp());
        let text = format!("{} left the room", username);
        if let Err(e) = self
            .repository
            .append_event(&room_id, RoomEvent::System {
                text: text.clone(),
                timestamp,
            })
            .await
        {
            tracing::warn!("Failed to record departure for room {}: {}", room_id, e);
        }
        self.broadcaster
            .send_to_room(&room_id, &OutboundEvent::System {
                room_id: Some(room_id.clone()),
                text,
                timestamp,
            }, None)
            .await;

        let users = self
            .repository
            .user_list(&room_id)
            .await
            .unwrap_or_default();
        self.broadcaster
            .send_to_room(&room_id, &OutboundEvent::UserList {
                room_id: room_id.clone(),
                users,
            }, None)
            .await;

        tracing::info!("'{}' disconnected from room {}", username, room_id);
    }
}
