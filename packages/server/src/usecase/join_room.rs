//! UseCase: ルーム参加処理
//!
//! 参加の順序保証:
//! 1. 別ルームに参加していた場合、先に旧ルームからの退室イベントを流す
//! 2. リプレイログ全件を参加した接続にだけ元の順序で配信する
//! 3. ルーム全体へ "joined" system イベントをブロードキャストする
//! 4. 更新されたユーザーリストをブロードキャストする

use std::sync::Arc;

use chanoma_shared::time::get_jst_timestamp;
use tokio::sync::Mutex;

use crate::domain::{
    Broadcaster, ConnectionId, ConnectionRegistry, OutboundEvent, RoomEvent, RoomId,
    RoomRepository, Timestamp, Username, WalletAddress,
};

use super::error::JoinError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 接続レジストリ（共有状態）
    registry: Arc<Mutex<ConnectionRegistry>>,
    /// Broadcaster（イベント配信の抽象化）
    broadcaster: Arc<dyn Broadcaster>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<Mutex<ConnectionRegistry>>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            repository,
            registry,
            broadcaster,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加する接続
    /// * `room_id` - 参加先のルーム ID
    /// * `username` - 表示名（ルーム内で一意、再参加は置換）
    /// * `wallet` - ウォレットアドレス（任意）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        username: Username,
        wallet: Option<WalletAddress>,
    ) -> Result<(), JoinError> {
        // 接続のセッション属性を読む（identity と旧ルーム）
        let (identity, previous_room, previous_username) = {
            let registry = self.registry.lock().await;
            let session = registry.get(connection_id).ok_or(JoinError::NotRegistered)?;
            (
                session.identity,
                session.room.clone(),
                session.username.clone(),
            )
        };

        // 旧ルームからの退室が新ルームへの参加より先（順序保証）
        if let Some(old_room) = previous_room.filter(|old| old != room_id) {
            if let Some(old_username) = previous_username {
                self.depart(&old_room, &old_username).await;
            }
        }

        let outcome = self
            .repository
            .join_room(room_id, username.clone(), wallet.clone(), identity)
            .await
            .map_err(|_| JoinError::RoomNotFound(room_id.as_str().to_string()))?;

        {
            let mut registry = self.registry.lock().await;
            registry.set_room(connection_id, Some(room_id.clone()));
            registry.set_profile(connection_id, username.clone(), wallet);
        }

        // 1. リプレイログ全件を参加者にだけ元の順序で配信
        for event in &outcome.replay {
            self.broadcaster
                .send_to_connection(connection_id, &event.to_outbound(room_id))
                .await;
        }

        // 2. "joined" system イベントをルーム全体へ（リプレイログにも記録）
        let text = format!("{} joined the room", username);
        self.record_and_broadcast_system(room_id, text).await;

        // 3. 更新されたユーザーリストをルーム全体へ
        let users = self
            .repository
            .user_list(room_id)
            .await
            .unwrap_or_default();
        self.broadcaster
            .send_to_room(room_id, &OutboundEvent::UserList {
                room_id: room_id.clone(),
                users,
            }, None)
            .await;

        tracing::info!("'{}' joined room {}", username, room_id);
        Ok(())
    }

    /// 旧ルームからの退室: 参加者削除、退室 system イベント、ユーザーリスト更新
    async fn depart(&self, room_id: &RoomId, username: &Username) {
        if self
            .repository
            .leave_room(room_id, username)
            .await
            .is_none()
        {
            return;
        }
        let text = format!("{} left the room", username);
        self.record_and_broadcast_system(room_id, text).await;

        let users = self
            .repository
            .user_list(room_id)
            .await
            .unwrap_or_default();
        self.broadcaster
            .send_to_room(room_id, &OutboundEvent::UserList {
                room_id: room_id.clone(),
                users,
            }, None)
            .await;
    }

    /// system イベントをリプレイログへ記録してからルーム全体へ配信する
    async fn record_and_broadcast_system(&self, room_id: &RoomId, text: String) {
        let timestamp = Timestamp::new(get_jst_timestamp());
        let event = RoomEvent::System {
            text: text.clone(),
            timestamp,
        };
        if let Err(e) = self.repository.append_event(room_id, event).await {
            tracing::warn!("Failed to record system event for room {}: {}", room_id, e);
        }
        self.broadcaster
            .send_to_room(room_id, &OutboundEvent::System {
                room_id: Some(room_id.clone()),
                text,
                timestamp,
            }, None)
            .await;
    }
}
