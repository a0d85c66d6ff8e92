//! ドメイン層の値オブジェクト定義
//!
//! 文字列やタイムスタンプをそのまま引き回さず、バリデーション済みの
//! 値オブジェクトとして扱います。生成は `new`（検証あり）経由のみ。

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// ユーザー名の最大長
const USERNAME_MAX_LEN: usize = 64;

/// チャットメッセージ本文の最大長
const MESSAGE_CONTENT_MAX_LEN: usize = 4096;

/// ルーム ID（衝突しない不透明トークン）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// 既存の ID 文字列から RoomId を作成
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Empty("room id"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RoomId のファクトリ
///
/// uuid v4（122 bit のランダム値）で衝突の無視できる ID を生成します。
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// 新しい RoomId を生成
    pub fn generate() -> RoomId {
        RoomId(uuid::Uuid::new_v4().to_string())
    }
}

/// 接続 ID（ソケット 1 本ごとに払い出される不透明トークン）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// 新しい ConnectionId を生成
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 表示名（ルーム内で一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty("username"));
        }
        if trimmed.chars().count() > USERNAME_MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: USERNAME_MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// チャットメッセージ本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty("message content"));
        }
        if value.chars().count() > MESSAGE_CONTENT_MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "message content",
                max: MESSAGE_CONTENT_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ウォレットアドレス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty("wallet address"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix タイムスタンプ（JST、ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 呼び出し元の identity タグ（既知の呼び出し元の閉じた集合）
///
/// どのエージェント／ウォレットがこの接続を裏付けるかを表します。
/// エージェント呼び出しの single-flight はこのタグ単位で直列化されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerIdentity {
    /// 主要な呼び出し元（デフォルトのエージェント資格情報）
    Primary,
    /// 副次的な呼び出し元
    Secondary,
    /// 未認証・フォールバックの呼び出し元
    Guest,
}

impl CallerIdentity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Guest => "guest",
        }
    }

    /// 設定ファイル上の名前から identity を解決
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "primary" => Some(Self::Primary),
            "secondary" => Some(Self::Secondary),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ルームのモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    Casual,
    Poker,
    Trip,
}

impl RoomMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Poker => "poker",
            Self::Trip => "trip",
        }
    }
}

impl std::fmt::Display for RoomMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
