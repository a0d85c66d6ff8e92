//! ドメイン層
//!
//! 値オブジェクト、エンティティ、ドメインイベント、ポーカー台帳、
//! 接続レジストリ、そして Infrastructure 層が実装する trait 群
//! （Repository / MessagePusher / Broadcaster / ConversationalAgent）を
//! 定義します。

pub mod agent;
pub mod broadcaster;
pub mod entity;
pub mod error;
pub mod event;
pub mod poker;
pub mod pusher;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use agent::{AgentProgress, AgentReply, AgentRequest, ConversationalAgent, RoomContext};
pub use broadcaster::Broadcaster;
pub use entity::{CONTEXT_WINDOW_CAPACITY, ChatMessage, Participant, Room};
pub use error::{
    AgentError, DispatchError, LedgerError, MessagePushError, RepositoryError, ValidationError,
};
pub use event::{OutboundEvent, RoomEvent, RoomSummary, UserEntry};
pub use poker::{Directive, LedgerCommand, LedgerEntry, Payment, PokerSession, Settlement,
    parse_directives};
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::{ConnectionRegistry, ConnectionSession};
pub use repository::{JoinOutcome, LeaveOutcome, RoomRepository};
pub use value_object::{
    CallerIdentity, ConnectionId, MessageContent, RoomId, RoomIdFactory, RoomMode, Timestamp,
    Username, WalletAddress,
};

#[cfg(test)]
pub use agent::MockConversationalAgent;
