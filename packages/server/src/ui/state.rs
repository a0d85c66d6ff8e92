//! Server state and connection management.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Broadcaster, ConnectionRegistry, MessagePusher};
use crate::usecase::{
    AgentDispatcher, ConnectCallerUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
    JoinRoomUseCase, SendChatUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectCallerUseCase（identity 選択のユースケース）
    pub connect_caller_usecase: Arc<ConnectCallerUseCase>,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    pub send_chat_usecase: Arc<SendChatUseCase>,
    /// DisconnectParticipantUseCase（切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// AgentDispatcher（エージェント起動）
    pub agent_dispatcher: Arc<AgentDispatcher>,
    /// Broadcaster（Router からの直接返信用）
    pub broadcaster: Arc<dyn Broadcaster>,
    /// MessagePusher（sender の登録用）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// 接続レジストリ（共有状態）
    pub registry: Arc<Mutex<ConnectionRegistry>>,
    /// エージェント起動のトリガーとなるメンショントークン
    pub agent_mention: String,
}
