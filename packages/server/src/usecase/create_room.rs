//! UseCase: ルーム作成処理
//!
//! ルームを作成し、更新されたルーム一覧を全接続へブロードキャストし、
//! 作成者には新しいルーム ID を含む system メッセージを返信します。

use std::sync::Arc;

use chanoma_shared::time::get_jst_timestamp;

use crate::domain::{
    Broadcaster, ConnectionId, OutboundEvent, RoomId, RoomMode, RoomRepository, Timestamp,
};

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配信の抽象化）
    broadcaster: Arc<dyn Broadcaster>,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 作成を要求した接続
    /// * `room_name` - 人間向けのルーム名
    /// * `mode` - ルームのモード
    ///
    /// # Returns
    ///
    /// 作成されたルームの ID
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_name: String,
        mode: RoomMode,
    ) -> RoomId {
        let room_id = self.repository.create_room(room_name.clone(), mode).await;
        tracing::info!("Room '{}' ({}) created: {}", room_name, mode, room_id);

        // 更新されたルーム一覧を全接続へ
        let rooms = self.repository.list_rooms().await;
        self.broadcaster
            .send_to_all(&OutboundEvent::RoomList { rooms })
            .await;

        // 作成者には新しいルーム ID を system メッセージで返信
        self.broadcaster
            .send_to_connection(
                connection_id,
                &OutboundEvent::System {
                    room_id: None,
                    text: format!("Room '{}' created. Id: {}", room_name, room_id),
                    timestamp: Timestamp::new(get_jst_timestamp()),
                },
            )
            .await;

        room_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::broadcaster::RecordingBroadcaster;
    use crate::infrastructure::repository::InMemoryRoomRepository;

    fn create_test_usecase() -> (
        CreateRoomUseCase,
        Arc<InMemoryRoomRepository>,
        Arc<RecordingBroadcaster>,
    ) {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let usecase = CreateRoomUseCase::new(repository.clone(), broadcaster.clone());
        (usecase, repository, broadcaster)
    }

    #[tokio::test]
    async fn test_create_room_returns_fresh_id() {
        // テスト項目: ルーム作成ごとに異なる ID が払い出される
        // given (前提条件):
        let (usecase, repository, _broadcaster) = create_test_usecase();
        let connection_id = ConnectionId::generate();

        // when (操作):
        let id1 = usecase
            .execute(&connection_id, "Trip".to_string(), RoomMode::Trip)
            .await;
        let id2 = usecase
            .execute(&connection_id, "Trip".to_string(), RoomMode::Trip)
            .await;

        // then (期待する結果):
        assert_ne!(id1, id2);
        assert_eq!(repository.list_rooms().await.len(), 2);
    }

    #[tokio::test]
    async fn test_create_room_broadcasts_room_list_to_all() {
        // テスト項目: 作成後に room_list が全接続へブロードキャストされる
        // given (前提条件):
        let (usecase, _repository, broadcaster) = create_test_usecase();
        let connection_id = ConnectionId::generate();

        // when (操作):
        usecase
            .execute(&connection_id, "Poker Night".to_string(), RoomMode::Poker)
            .await;

        // then (期待する結果):
        let global = broadcaster.global_events().await;
        assert_eq!(global.len(), 1);
        match &global[0] {
            OutboundEvent::RoomList { rooms } => {
                assert_eq!(rooms.len(), 1);
                assert_eq!(rooms[0].room_name, "Poker Night");
                assert_eq!(rooms[0].mode, RoomMode::Poker);
                assert_eq!(rooms[0].participant_count, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_room_replies_with_system_message_containing_id() {
        // テスト項目: 作成者への system 返信に新しいルーム ID が含まれる
        // given (前提条件):
        let (usecase, _repository, broadcaster) = create_test_usecase();
        let connection_id = ConnectionId::generate();

        // when (操作):
        let room_id = usecase
            .execute(&connection_id, "Casual".to_string(), RoomMode::Casual)
            .await;

        // then (期待する結果):
        let direct = broadcaster.direct_events().await;
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].0, connection_id);
        match &direct[0].1 {
            OutboundEvent::System { text, .. } => {
                assert!(text.contains(room_id.as_str()));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
