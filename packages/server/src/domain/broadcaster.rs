//! Broadcaster trait 定義
//!
//! ドメインイベントをルーム単位でファンアウトする抽象化です。
//! ワイヤ形式への変換（一度だけのシリアライズ）と宛先解決は
//! Infrastructure 層の実装が担います。

use async_trait::async_trait;

use super::event::OutboundEvent;
use super::value_object::{ConnectionId, RoomId};

/// ルーム単位のイベント配信
///
/// 閉じた接続・エラー中の接続への配信は黙ってスキップされ、
/// 呼び出し元にエラーとして伝播することはない。
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// ルームの全参加接続へ配信する（exclude を除く）
    ///
    /// チャットは送信者にもエコーされる（exclude なしで呼ぶ）。
    async fn send_to_room(
        &self,
        room_id: &RoomId,
        event: &OutboundEvent,
        exclude: Option<&ConnectionId>,
    );

    /// 特定の接続にのみ配信する（リプレイログ配信など）
    async fn send_to_connection(&self, connection_id: &ConnectionId, event: &OutboundEvent);

    /// 全ての接続へ配信する（room_list 更新など）
    async fn send_to_all(&self, event: &OutboundEvent);
}
