//! MessagePusher trait 定義
//!
//! クライアントへのメッセージ送信（push_to, broadcast）を抽象化します。
//! WebSocket の生成は UI 層、sender の管理と送信は Infrastructure 層の
//! 実装が担います。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::ConnectionId;

/// クライアントへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ送信の抽象化
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの sender を登録する
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// クライアントの sender を登録解除する
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定のクライアントへ送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントへ送信する
    ///
    /// 閉じた接続への送信失敗は警告ログに留め、呼び出し元には伝播しない。
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
