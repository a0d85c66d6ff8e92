//! 外部の会話エージェントとの境界定義
//!
//! コアはエージェントの推論やツール選択には関与しません。この trait を
//! 介して呼び出し、進捗イベントのチャンネルと最終応答にのみ反応します。
//! 進捗はコールバックのネストではなくイベントのチャンネルとしてモデル化
//! しています。

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::entity::{ChatMessage, Participant};
use super::error::AgentError;
use super::poker::{LedgerCommand, PokerSession};
use super::value_object::{CallerIdentity, RoomId, RoomMode};

/// エージェントに渡すルームコンテキストのスナップショット
#[derive(Debug, Clone, Serialize)]
pub struct RoomContext {
    pub room_id: RoomId,
    pub room_name: String,
    pub mode: RoomMode,
    /// 参加者リスト
    pub participants: Vec<Participant>,
    /// 連絡帳: 表示名 → ウォレットアドレス
    pub contacts: HashMap<String, String>,
    /// ポーカーセッションのスナップショット
    pub poker: Option<PokerSession>,
}

/// エージェント呼び出し 1 回分のリクエスト
#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest {
    /// 呼び出し元の identity タグ（資格情報の選択に使う）
    pub identity: CallerIdentity,
    /// トリガーとなったチャットテキスト
    pub text: String,
    /// 有界のコンテキストウィンドウ（直近 50 件）
    pub history: Vec<ChatMessage>,
    /// ルームコンテキスト
    pub context: RoomContext,
}

/// エージェントからの進捗イベント（ツール実行の通知）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProgress {
    /// 実行中のツール名
    pub tool_name: String,
}

/// エージェントの最終応答
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentReply {
    /// 応答テキスト（散文ディレクティブを含むことがある）
    pub text: String,
    /// この呼び出しで使われたツール名
    #[serde(default)]
    pub tool_uses: Vec<String>,
    /// 構造化された台帳コマンド（散文ディレクティブより優先される経路）
    #[serde(default)]
    pub commands: Vec<LedgerCommand>,
}

/// 外部の会話エージェント
///
/// 実装は進捗イベントを `progress` チャンネルへ流し、最終応答を返す。
/// 呼び出しの single-flight とタイムアウトは Dispatcher 側の責務。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationalAgent: Send + Sync {
    async fn process_message(
        &self,
        request: AgentRequest,
        progress: mpsc::UnboundedSender<AgentProgress>,
    ) -> Result<AgentReply, AgentError>;
}
