//! ルームイベントとブロードキャストイベントのドメイン表現
//!
//! `RoomEvent` はリプレイログに永続化される会話の記録、`OutboundEvent` は
//! ブロードキャスト経路に流れるサーバー発イベントの全集合です。
//! ワイヤ形式（DTO）への変換は infrastructure 層が行います。

use serde::{Deserialize, Serialize};

use super::value_object::{RoomId, RoomMode, Timestamp};

/// ルームのリプレイログに記録されるイベント
///
/// 新規参加者には全件が元の順序で配信されます。`user_list` や
/// `agent_typing` のような一時的イベントは記録しません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomEvent {
    System {
        text: String,
        timestamp: Timestamp,
    },
    Chat {
        username: String,
        text: String,
        timestamp: Timestamp,
    },
    Agent {
        text: String,
        tool_uses: Vec<String>,
        timestamp: Timestamp,
    },
}

impl RoomEvent {
    /// リプレイ配信用に OutboundEvent へ変換する
    pub fn to_outbound(&self, room_id: &RoomId) -> OutboundEvent {
        match self {
            Self::System { text, timestamp } => OutboundEvent::System {
                room_id: Some(room_id.clone()),
                text: text.clone(),
                timestamp: *timestamp,
            },
            Self::Chat {
                username,
                text,
                timestamp,
            } => OutboundEvent::Chat {
                room_id: room_id.clone(),
                username: username.clone(),
                text: text.clone(),
                timestamp: *timestamp,
            },
            Self::Agent {
                text,
                tool_uses,
                timestamp,
            } => OutboundEvent::Agent {
                room_id: room_id.clone(),
                text: text.clone(),
                tool_uses: tool_uses.clone(),
                timestamp: *timestamp,
            },
        }
    }
}

/// ルームのユーザーリストの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub wallet: Option<String>,
}

/// ルーム一覧の 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub room_name: String,
    pub mode: RoomMode,
    pub participant_count: usize,
}

/// サーバーからクライアントへ流れるイベントの全集合
///
/// ワイヤ上の `ServerEvent` のドメイン表現。DTO 変換は
/// `infrastructure::dto` が担います。
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    System {
        room_id: Option<RoomId>,
        text: String,
        timestamp: Timestamp,
    },
    Chat {
        room_id: RoomId,
        username: String,
        text: String,
        timestamp: Timestamp,
    },
    Agent {
        room_id: RoomId,
        text: String,
        tool_uses: Vec<String>,
        timestamp: Timestamp,
    },
    AgentProgress {
        room_id: RoomId,
        text: String,
        tool_name: String,
        elapsed_time: f64,
    },
    AgentTyping {
        room_id: RoomId,
        is_typing: bool,
    },
    UserList {
        room_id: RoomId,
        users: Vec<UserEntry>,
    },
    RoomList {
        rooms: Vec<RoomSummary>,
    },
}
