//! UseCase: チャット送信処理
//!
//! 受信順にメッセージを両方のログへ追加し、ルーム全体へブロードキャスト
//! します。チャットは送信者にもエコーされます（typing/progress とは異なり
//! 除外なし）。

use std::sync::Arc;

use chanoma_shared::time::get_jst_timestamp;
use tokio::sync::Mutex;

use crate::domain::{
    Broadcaster, ChatMessage, ConnectionId, ConnectionRegistry, MessageContent, OutboundEvent,
    RoomId, RoomRepository, Timestamp,
};

use super::error::ChatError;

/// チャット送信のユースケース
pub struct SendChatUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 接続レジストリ（共有状態）
    registry: Arc<Mutex<ConnectionRegistry>>,
    /// Broadcaster（イベント配信の抽象化）
    broadcaster: Arc<dyn Broadcaster>,
}

impl SendChatUseCase {
    /// 新しい SendChatUseCase を作成
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

    /// チャット送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信元の接続
    /// * `room_id` - 宛先ルーム
    /// * `content` - メッセージ本文
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 追加・配信されたメッセージ
    /// * `Err(ChatError)` - 事前条件を満たさない（ルーム未参加など）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        content: MessageContent,
    ) -> Result<ChatMessage, ChatError> {
        // 事前条件: ルームに参加済みで表示名が設定されていること
        let username = {
            let registry = self.registry.lock().await;
            let session = registry.get(connection_id).ok_or(ChatError::NotJoined)?;
            let username = session.username.clone().ok_or(ChatError::NotJoined)?;
            match &session.room {
                Some(current) if current == room_id => username,
                Some(_) => return Err(ChatError::RoomMismatch),
                None => return Err(ChatError::NotJoined),
            }
        };

        let message = ChatMessage::new(
            room_id.clone(),
            username,
            content,
            Timestamp::new(get_jst_timestamp()),
        );
        self.repository
            .append_chat(room_id, message.clone())
            .await
            .map_err(|_| ChatError::RoomNotFound(room_id.as_str().to_string()))?;

        // 送信者を含むルーム全体へエコー
        self.broadcaster
            .send_to_room(room_id, &OutboundEvent::Chat {
                room_id: room_id.clone(),
                username: message.from.as_str().to_string(),
                text: message.content.as_str().to_string(),
                timestamp: message.timestamp,
            }, None)
            .await;

        Ok(message)
    }
}
