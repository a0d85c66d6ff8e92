//! Conversion logic between DTOs and domain entities.

use crate::domain::{OutboundEvent, RoomMode, RoomSummary, UserEntry};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Model → DTO
// ========================================

impl From<RoomMode> for dto::RoomModeDto {
    fn from(mode: RoomMode) -> Self {
        match mode {
            RoomMode::Casual => Self::Casual,
            RoomMode::Poker => Self::Poker,
            RoomMode::Trip => Self::Trip,
        }
    }
}

impl From<dto::RoomModeDto> for RoomMode {
    fn from(mode: dto::RoomModeDto) -> Self {
        match mode {
            dto::RoomModeDto::Casual => Self::Casual,
            dto::RoomModeDto::Poker => Self::Poker,
            dto::RoomModeDto::Trip => Self::Trip,
        }
    }
}

impl From<RoomSummary> for dto::RoomSummaryDto {
    fn from(summary: RoomSummary) -> Self {
        Self {
            room_id: summary.room_id.into_string(),
            room_name: summary.room_name,
            mode: summary.mode.into(),
            participant_count: summary.participant_count,
        }
    }
}

impl From<UserEntry> for dto::UserEntryDto {
    fn from(entry: UserEntry) -> Self {
        Self {
            username: entry.username,
            wallet: entry.wallet,
        }
    }
}

/// ドメインイベントをワイヤ JSON に一度だけシリアライズする
pub fn encode_event(event: &OutboundEvent) -> serde_json::Result<String> {
    match event {
        OutboundEvent::RoomList { rooms } => serde_json::to_string(&dto::RoomListMessage {
            r#type: dto::MessageType::RoomList,
            rooms: rooms.iter().cloned().map(Into::into).collect(),
        }),
        OutboundEvent::UserList { room_id, users } => {
            serde_json::to_string(&dto::UserListMessage {
                r#type: dto::MessageType::UserList,
                room_id: room_id.as_str().to_string(),
                users: users.iter().cloned().map(Into::into).collect(),
            })
        }
        OutboundEvent::System {
            room_id,
            text,
            timestamp,
        } => serde_json::to_string(&dto::SystemMessage {
            r#type: dto::MessageType::System,
            room_id: room_id.as_ref().map(|id| id.as_str().to_string()),
            text: text.clone(),
            timestamp: timestamp.value(),
        }),
        OutboundEvent::Chat {
            room_id,
            username,
            text,
            timestamp,
        } => serde_json::to_string(&dto::ChatBroadcastMessage {
            r#type: dto::MessageType::Chat,
            room_id: room_id.as_str().to_string(),
            text: text.clone(),
            username: username.clone(),
            timestamp: timestamp.value(),
        }),
        OutboundEvent::Agent {
            room_id,
            text,
            tool_uses,
            timestamp,
        } => serde_json::to_string(&dto::AgentMessage {
            r#type: dto::MessageType::Agent,
            room_id: room_id.as_str().to_string(),
            text: text.clone(),
            timestamp: timestamp.value(),
            tool_uses: tool_uses.clone(),
        }),
        OutboundEvent::AgentProgress {
            room_id,
            text,
            tool_name,
            elapsed_time,
        } => serde_json::to_string(&dto::AgentProgressMessage {
            r#type: dto::MessageType::AgentProgress,
            room_id: room_id.as_str().to_string(),
            text: text.clone(),
            tool_name: tool_name.clone(),
            elapsed_time: *elapsed_time,
        }),
        OutboundEvent::AgentTyping { room_id, is_typing } => {
            serde_json::to_string(&dto::AgentTypingMessage {
                r#type: dto::MessageType::AgentTyping,
                room_id: room_id.as_str().to_string(),
                is_typing: *is_typing,
            })
        }
    }
}
