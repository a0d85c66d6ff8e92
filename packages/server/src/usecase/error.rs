//! UseCase 層のエラー型定義

use thiserror::Error;

/// ルーム参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// 指定されたルームが存在しない
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    /// 接続が登録されていない
    #[error("Connection is not registered")]
    NotRegistered,
}

/// チャット送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// ルームに参加していない、または表示名が未設定
    #[error("Join a room and choose a username before chatting")]
    NotJoined,

    /// 指定されたルームが存在しない
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    /// 参加中のルームと宛先ルームが一致しない
    #[error("Message addressed to a room this connection has not joined")]
    RoomMismatch,
}
