//! UseCase 層
//!
//! Router（UI 層）から呼ばれるアプリケーションの操作単位です。
//! 各ユースケースは Repository / Broadcaster などドメイン層の trait に
//! 依存し、Infrastructure 層の具体的な実装には依存しません。

mod connect_caller;
mod create_room;
mod disconnect_participant;
mod dispatch_agent;
mod error;
mod join_room;
mod send_chat;

pub use connect_caller::ConnectCallerUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use dispatch_agent::{
    AgentDispatcher, DEFAULT_AGENT_DEADLINE, DEFAULT_AGENT_MENTION,
};
pub use error::{ChatError, JoinError};
pub use join_room::JoinRoomUseCase;
pub use send_chat::SendChatUseCase;
