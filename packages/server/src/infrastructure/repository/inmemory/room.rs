//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。状態はプロセス生存中のみ
//! 保持され、ルームは一度作成されると削除されません。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chanoma_shared::time::get_jst_timestamp;
use tokio::sync::Mutex;

use crate::domain::{
    CallerIdentity, ChatMessage, JoinOutcome, LeaveOutcome, LedgerCommand, Participant,
    RepositoryError, Room, RoomContext, RoomEvent, RoomId, RoomIdFactory, RoomMode,
    RoomRepository, RoomSummary, Timestamp, UserEntry, Username, WalletAddress,
};

/// インメモリ Room Repository 実装
///
/// ルームのマップを保持し、ドメイン層の RoomRepository trait を実装します
/// （依存性の逆転）。
pub struct InMemoryRoomRepository {
    /// ルーム ID → Room ドメインモデル
    rooms: Arc<Mutex<HashMap<RoomId, Room>>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, name: String, mode: RoomMode) -> RoomId {
        let room_id = RoomIdFactory::generate();
        let room = Room::new(
            room_id.clone(),
            name,
            mode,
            Timestamp::new(get_jst_timestamp()),
        );
        let mut rooms = self.rooms.lock().await;
        rooms.insert(room_id.clone(), room);
        room_id
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        username: Username,
        wallet: Option<WalletAddress>,
        identity: CallerIdentity,
    ) -> Result<JoinOutcome, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        let replaced = room.upsert_participant(Participant::new(username, wallet, identity));
        Ok(JoinOutcome {
            replaced,
            replay: room.replay_log.clone(),
            users: room.user_list(),
        })
    }

    async fn leave_room(&self, room_id: &RoomId, username: &Username) -> Option<LeaveOutcome> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id)?;
        if !room.remove_participant(username) {
            return None;
        }
        Some(LeaveOutcome {
            users: room.user_list(),
        })
    }

    async fn append_chat(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        room.add_chat(message);
        Ok(())
    }

    async fn append_event(
        &self,
        room_id: &RoomId,
        event: RoomEvent,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        room.record_event(event);
        Ok(())
    }

    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.lock().await;
        let mut summaries: Vec<RoomSummary> = rooms.values().map(|room| room.summary()).collect();
        // Sort by room name for consistent ordering
        summaries.sort_by(|a, b| a.room_name.cmp(&b.room_name));
        summaries
    }

    async fn context_window(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        Ok(room.context_window.iter().cloned().collect())
    }

    async fn user_list(&self, room_id: &RoomId) -> Result<Vec<UserEntry>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        Ok(room.user_list())
    }

    async fn room_context(&self, room_id: &RoomId) -> Result<RoomContext, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        Ok(RoomContext {
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            mode: room.mode,
            participants: room.participants.clone(),
            contacts: room
                .contacts
                .iter()
                .map(|(name, wallet)| (name.clone(), wallet.as_str().to_string()))
                .collect(),
            poker: room.poker.clone(),
        })
    }

    async fn execute_ledger(
        &self,
        room_id: &RoomId,
        command: &LedgerCommand,
    ) -> Result<String, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        Ok(room.execute_ledger(command, Timestamp::new(get_jst_timestamp())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageContent;

    fn username(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    async fn create_room(repo: &InMemoryRoomRepository, mode: RoomMode) -> RoomId {
        repo.create_room("Test Room".to_string(), mode).await
    }

    #[tokio::test]
    async fn test_create_room_starts_empty() {
        // テスト項目: 作成直後のルームは参加者・履歴ともに空
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let room_id = create_room(&repo, RoomMode::Casual).await;

        // then (期待する結果):
        assert!(repo.user_list(&room_id).await.unwrap().is_empty());
        assert!(repo.context_window(&room_id).await.unwrap().is_empty());
        let context = repo.room_context(&room_id).await.unwrap();
        assert!(context.poker.is_none());
        assert!(context.contacts.is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_room_returns_not_found() {
        // テスト項目: 存在しないルームへの参加は RoomNotFound になる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let bogus = RoomIdFactory::generate();

        // when (操作):
        let result = repo
            .join_room(&bogus, username("Alice"), None, CallerIdentity::Primary)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_rejoin_replaces_participant_entry() {
        // テスト項目: 同名での再参加は既存エントリを置換する（replaced = true）
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room_id = create_room(&repo, RoomMode::Casual).await;
        repo.join_room(&room_id, username("Alice"), None, CallerIdentity::Primary)
            .await
            .unwrap();

        // when (操作):
        let outcome = repo
            .join_room(
                &room_id,
                username("Alice"),
                Some(WalletAddress::new("0xalice".to_string()).unwrap()),
                CallerIdentity::Primary,
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert!(outcome.replaced);
        assert_eq!(outcome.users.len(), 1);
        assert_eq!(outcome.users[0].wallet.as_deref(), Some("0xalice"));
    }

    #[tokio::test]
    async fn test_leave_room_is_noop_for_absent_participant() {
        // テスト項目: 参加していない参加者の退室は None を返し失敗しない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room_id = create_room(&repo, RoomMode::Casual).await;

        // when (操作):
        let outcome = repo.leave_room(&room_id, &username("Ghost")).await;

        // then (期待する結果):
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_join_snapshot_excludes_subsequent_events() {
        // テスト項目: 参加時のリプレイスナップショットにはその後のイベントが含まれない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room_id = create_room(&repo, RoomMode::Casual).await;
        repo.append_event(&room_id, RoomEvent::System {
            text: "before".to_string(),
            timestamp: Timestamp::new(1),
        })
        .await
        .unwrap();

        // when (操作):
        let outcome = repo
            .join_room(&room_id, username("Alice"), None, CallerIdentity::Primary)
            .await
            .unwrap();
        repo.append_event(&room_id, RoomEvent::System {
            text: "after".to_string(),
            timestamp: Timestamp::new(2),
        })
        .await
        .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.replay.len(), 1);
        assert!(matches!(
            &outcome.replay[0],
            RoomEvent::System { text, .. } if text == "before"
        ));
    }

    #[tokio::test]
    async fn test_append_chat_feeds_context_window() {
        // テスト項目: チャット追加が有界ウィンドウに反映される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room_id = create_room(&repo, RoomMode::Casual).await;

        // when (操作):
        let message = ChatMessage::new(
            room_id.clone(),
            username("Alice"),
            MessageContent::new("Hello".to_string()).unwrap(),
            Timestamp::new(1),
        );
        repo.append_chat(&room_id, message).await.unwrap();

        // then (期待する結果):
        let window = repo.context_window(&room_id).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content.as_str(), "Hello");
    }

    #[tokio::test]
    async fn test_list_rooms_reports_participant_counts() {
        // テスト項目: ルーム一覧に参加者数が反映される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room_id = repo.create_room("Alpha".to_string(), RoomMode::Poker).await;
        repo.join_room(&room_id, username("Alice"), None, CallerIdentity::Primary)
            .await
            .unwrap();
        repo.create_room("Beta".to_string(), RoomMode::Trip).await;

        // when (操作):
        let rooms = repo.list_rooms().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].room_name, "Alpha");
        assert_eq!(rooms[0].participant_count, 1);
        assert_eq!(rooms[1].room_name, "Beta");
        assert_eq!(rooms[1].participant_count, 0);
    }

    #[tokio::test]
    async fn test_execute_ledger_routes_to_room_session() {
        // テスト項目: 台帳コマンドがルームのセッションに対して実行される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room_id = create_room(&repo, RoomMode::Poker).await;

        // when (操作):
        let text = repo
            .execute_ledger(&room_id, &LedgerCommand::BuyIn {
                player: "Alice".to_string(),
                amount: 100,
            })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(text, "Alice bought in for $100. Pot total: $100");
        let context = repo.room_context(&room_id).await.unwrap();
        assert_eq!(context.poker.unwrap().host, "Alice");
    }
}
