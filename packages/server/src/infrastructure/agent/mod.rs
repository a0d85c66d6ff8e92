//! 外部エージェントとの接続実装

mod http;

pub use http::{AgentEndpoint, HttpConversationalAgent};
