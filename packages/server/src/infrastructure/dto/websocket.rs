//! WebSocket ワイヤプロトコルの DTO 定義
//!
//! 受信（client → server）は `type` タグ付きの単一 enum でデコードし、
//! 送信（server → client）は `r#type` ディスクリミネータを持つ
//! メッセージごとの struct で表現します。フィールド名は元のプロトコルを
//! そのまま保ちます（`roomId` と `tool_name` の混在を含む）。

use serde::{Deserialize, Serialize};

/// 受信メッセージ（client → server）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 呼び出し元 identity の選択
    Connect {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
    /// ルーム作成
    CreateRoom {
        #[serde(rename = "roomName")]
        room_name: String,
        mode: RoomModeDto,
    },
    /// ルーム参加
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
        username: String,
        #[serde(default)]
        wallet: Option<String>,
    },
    /// チャット送信
    Chat {
        #[serde(rename = "roomId")]
        room_id: String,
        text: String,
    },
}

/// ルームモードのワイヤ表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomModeDto {
    Casual,
    Poker,
    Trip,
}

/// 送信メッセージの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    RoomList,
    UserList,
    System,
    Chat,
    Agent,
    AgentProgress,
    AgentTyping,
}

/// ルーム一覧の 1 エントリ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummaryDto {
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(rename = "roomName")]
    pub room_name: String,
    pub mode: RoomModeDto,
    #[serde(rename = "participantCount")]
    pub participant_count: usize,
}

/// ルーム一覧メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomListMessage {
    pub r#type: MessageType,
    pub rooms: Vec<RoomSummaryDto>,
}

/// ユーザーリストの 1 エントリ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserEntryDto {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
}

/// ユーザーリストメッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserListMessage {
    pub r#type: MessageType,
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub users: Vec<UserEntryDto>,
}

/// system メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMessage {
    pub r#type: MessageType,
    #[serde(rename = "roomId", skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub text: String,
    pub timestamp: i64,
}

/// チャット配信メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatBroadcastMessage {
    pub r#type: MessageType,
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub text: String,
    pub username: String,
    pub timestamp: i64,
}

/// エージェント応答メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentMessage {
    pub r#type: MessageType,
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub text: String,
    pub timestamp: i64,
    pub tool_uses: Vec<String>,
}

/// エージェント進捗メッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentProgressMessage {
    pub r#type: MessageType,
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub text: String,
    pub tool_name: String,
    pub elapsed_time: f64,
}

/// typing インジケータメッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentTypingMessage {
    pub r#type: MessageType,
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(rename = "isTyping")]
    pub is_typing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_connect_decodes() {
        // テスト項目: connect メッセージが apiKey フィールドからデコードされる
        // given (前提条件):
        let json = r#"{"type":"connect","apiKey":"key-primary"}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(message, ClientMessage::Connect {
            api_key: "key-primary".to_string()
        });
    }

    #[test]
    fn test_client_message_create_room_decodes_mode() {
        // テスト項目: create_room の mode が閉じた集合としてデコードされる
        // given (前提条件):
        let json = r#"{"type":"create_room","roomName":"Poker Night","mode":"poker"}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(message, ClientMessage::CreateRoom {
            room_name: "Poker Night".to_string(),
            mode: RoomModeDto::Poker,
        });
    }

    #[test]
    fn test_client_message_join_room_wallet_is_optional() {
        // テスト項目: join_room の wallet フィールドは省略できる
        // given (前提条件):
        let json = r#"{"type":"join_room","roomId":"r-1","username":"Alice"}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(message, ClientMessage::JoinRoom {
            room_id: "r-1".to_string(),
            username: "Alice".to_string(),
            wallet: None,
        });
    }

    #[test]
    fn test_unknown_message_type_fails_to_decode() {
        // テスト項目: 未知の type はデコードエラーになる（MalformedInput）
        // given (前提条件):
        let json = r#"{"type":"fly_to_the_moon"}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientMessage>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_agent_typing_message_uses_camel_case_flag() {
        // テスト項目: typing メッセージが isTyping フィールドで出力される
        // given (前提条件):
        let message = AgentTypingMessage {
            r#type: MessageType::AgentTyping,
            room_id: "r-1".to_string(),
            is_typing: true,
        };

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"type":"agent_typing","roomId":"r-1","isTyping":true}"#
        );
    }

    #[test]
    fn test_system_message_omits_room_id_when_global() {
        // テスト項目: ルーム外の system メッセージでは roomId が省略される
        // given (前提条件):
        let message = SystemMessage {
            r#type: MessageType::System,
            room_id: None,
            text: "Room created".to_string(),
            timestamp: 1000,
        };

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();

        // then (期待する結果):
        assert!(!json.contains("roomId"));
        assert!(json.contains(r#""type":"system""#));
    }
}
