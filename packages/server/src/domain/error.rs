//! ドメイン層のエラー型定義
//!
//! 各関心事ごとに thiserror のエラー enum を定義します。
//! 台帳系のエラー（LedgerError）は想定内のユーザー向け結果であり、
//! 最終的にはテキストとしてルームに返されます（§ エラーハンドリング方針）。

use thiserror::Error;

/// 値オブジェクトのバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 空文字列は許可されない
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// 長すぎる値
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 指定されたルームが存在しない
    #[error("Room '{0}' not found")]
    RoomNotFound(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// クライアントが見つからない
    #[error("Connection '{0}' not found")]
    ClientNotFound(String),

    /// 送信に失敗した
    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// ポーカー台帳の事前条件エラー
///
/// これらは例外ではなく想定内の結果であり、ユーザー向けテキストに
/// 変換されてルームへ返されます。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// バイインが一度も記録されていない
    #[error("No poker session is active in this room yet")]
    NoActiveSession,

    /// 精算を要求したプレイヤーがホストではない
    #[error("Only the host ({host}) can settle the ledger")]
    NotHost { host: String },

    /// バイイン合計とキャッシュアウト合計が一致しない
    ///
    /// `difference` は sum(buy-ins) - sum(cash-outs) の符号付きの値。
    #[error("Ledger does not balance: buy-ins minus cash-outs is ${difference:+}")]
    Unbalanced { difference: i64 },
}

/// 外部エージェント呼び出しのエラー
///
/// 内部詳細はログにのみ残し、ルームには汎用メッセージだけを流します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// エージェントのバックエンドが設定されていない
    #[error("No agent backend is configured for identity '{0}'")]
    NotConfigured(String),

    /// 上流のエージェント呼び出しが失敗した
    #[error("Agent backend failure: {0}")]
    Backend(String),
}

/// エージェント起動（dispatch）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// 同じ identity で既に処理中の呼び出しがある
    #[error("Agent is already processing a request for identity '{0}'")]
    AlreadyProcessing(String),
}
