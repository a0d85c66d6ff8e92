//! Repository trait 定義
//!
//! ドメイン層が必要とするルームストアへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::entity::ChatMessage;
use super::error::RepositoryError;
use super::event::{RoomEvent, RoomSummary, UserEntry};
use super::poker::LedgerCommand;
use super::value_object::{CallerIdentity, RoomId, RoomMode, Username, WalletAddress};

/// 参加処理の結果
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// 同名の既存エントリを置き換えた場合は true（冪等な再参加）
    pub replaced: bool,
    /// 参加した接続にのみ直接配信するリプレイログ（元の順序）
    pub replay: Vec<RoomEvent>,
    /// 更新後のユーザーリスト
    pub users: Vec<UserEntry>,
}

/// 退室処理の結果
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// 更新後のユーザーリスト
    pub users: Vec<UserEntry>,
}

/// Room Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には
/// 依存しない。ルームはプロセス生存中は削除されない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを作成し、衝突しない ID を返す
    async fn create_room(&self, name: String, mode: RoomMode) -> RoomId;

    /// ルームへ参加する
    ///
    /// 同名での再参加は既存の参加者エントリを置換する（冪等）。
    async fn join_room(
        &self,
        room_id: &RoomId,
        username: Username,
        wallet: Option<WalletAddress>,
        identity: CallerIdentity,
    ) -> Result<JoinOutcome, RepositoryError>;

    /// ルームから退室する
    ///
    /// 参加していなかった場合でも失敗しない（None を返す）。
    async fn leave_room(&self, room_id: &RoomId, username: &Username) -> Option<LeaveOutcome>;

    /// チャットメッセージを両方のログへ追加する
    async fn append_chat(&self, room_id: &RoomId, message: ChatMessage)
        -> Result<(), RepositoryError>;

    /// チャット以外のサーバー発イベントをリプレイログへ記録する
    async fn append_event(&self, room_id: &RoomId, event: RoomEvent)
        -> Result<(), RepositoryError>;

    /// ルーム一覧のスナップショット
    async fn list_rooms(&self) -> Vec<RoomSummary>;

    /// エージェントコンテキスト用の有界ウィンドウ（直近 50 件）
    async fn context_window(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// 現在のユーザーリスト
    async fn user_list(&self, room_id: &RoomId) -> Result<Vec<UserEntry>, RepositoryError>;

    /// エージェントに渡すルームコンテキストのスナップショット
    async fn room_context(&self, room_id: &RoomId)
        -> Result<super::agent::RoomContext, RepositoryError>;

    /// 台帳コマンドを実行し、ユーザー向け結果テキストを返す
    async fn execute_ledger(
        &self,
        room_id: &RoomId,
        command: &LedgerCommand,
    ) -> Result<String, RepositoryError>;
}
