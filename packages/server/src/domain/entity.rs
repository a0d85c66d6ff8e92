//! ドメイン層のエンティティ定義
//!
//! Room はこのサーバーの中心的な集約です。参加者、連絡帳、
//! 有界のコンテキストウィンドウ、無制限のリプレイログ、そして
//! 任意のポーカーセッションを保持します。

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::event::{RoomEvent, RoomSummary, UserEntry};
use super::poker::{LedgerCommand, PokerSession};
use super::value_object::{
    CallerIdentity, MessageContent, RoomId, RoomMode, Timestamp, Username, WalletAddress,
};

/// エージェントのコンテキスト構築に使う有界ウィンドウの容量
pub const CONTEXT_WINDOW_CAPACITY: usize = 50;

/// ルームの参加者
///
/// 不変条件: 表示名はルーム内で一意。同名での再参加は既存エントリを置換する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// 表示名
    pub username: Username,
    /// ウォレットアドレス（任意）
    pub wallet: Option<WalletAddress>,
    /// この参加者を所有する接続の identity タグ
    pub identity: CallerIdentity,
}

impl Participant {
    pub fn new(username: Username, wallet: Option<WalletAddress>, identity: CallerIdentity) -> Self {
        Self {
            username,
            wallet,
            identity,
        }
    }
}

/// チャットメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub from: Username,
    pub content: MessageContent,
    /// サーバーが割り当てるタイムスタンプ
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(room_id: RoomId, from: Username, content: MessageContent, timestamp: Timestamp) -> Self {
        Self {
            room_id,
            from,
            content,
            timestamp,
        }
    }
}

/// チャット／コンテキストのスコープとなるルーム
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// ルーム ID（不透明トークン）
    pub id: RoomId,
    /// 人間向けの名前
    pub name: String,
    /// ルームのモード
    pub mode: RoomMode,
    /// 参加者（表示名で一意）
    pub participants: Vec<Participant>,
    /// 連絡帳: 表示名 → ウォレットアドレス（上書き以外は追記のみ）
    pub contacts: HashMap<String, WalletAddress>,
    /// ポーカー台帳（最初のバイインで遅延生成）
    pub poker: Option<PokerSession>,
    /// エージェントのコンテキスト構築にのみ使う有界ウィンドウ（直近 50 件）
    pub context_window: VecDeque<ChatMessage>,
    /// 新規参加者へ全件配信される無制限のリプレイログ
    pub replay_log: Vec<RoomEvent>,
    /// 作成時刻
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, name: String, mode: RoomMode, created_at: Timestamp) -> Self {
        Self {
            id,
            name,
            mode,
            participants: Vec::new(),
            contacts: HashMap::new(),
            poker: None,
            context_window: VecDeque::new(),
            replay_log: Vec::new(),
            created_at,
        }
    }

    /// 参加者を追加する（同名の既存エントリは置換）
    ///
    /// # Returns
    ///
    /// 既存エントリを置き換えた場合は `true`
    pub fn upsert_participant(&mut self, participant: Participant) -> bool {
        if let Some(wallet) = &participant.wallet {
            self.contacts
                .insert(participant.username.as_str().to_string(), wallet.clone());
        }
        let existing = self
            .participants
            .iter()
            .position(|p| p.username == participant.username);
        match existing {
            Some(index) => {
                self.participants[index] = participant;
                true
            }
            None => {
                self.participants.push(participant);
                false
            }
        }
    }

    /// 参加者を削除する（存在しなければ no-op）
    ///
    /// # Returns
    ///
    /// 削除した場合は `true`
    pub fn remove_participant(&mut self, username: &Username) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| &p.username != username);
        self.participants.len() != before
    }

    /// チャットメッセージを両方のログへ追加する
    ///
    /// 有界ウィンドウは容量超過時に最古のものから追い出す。
    /// リプレイログは追記のみ。
    pub fn add_chat(&mut self, message: ChatMessage) {
        self.replay_log.push(RoomEvent::Chat {
            username: message.from.as_str().to_string(),
            text: message.content.as_str().to_string(),
            timestamp: message.timestamp,
        });
        self.context_window.push_back(message);
        while self.context_window.len() > CONTEXT_WINDOW_CAPACITY {
            self.context_window.pop_front();
        }
    }

    /// チャット以外のサーバー発イベントをリプレイログに記録する
    pub fn record_event(&mut self, event: RoomEvent) {
        self.replay_log.push(event);
    }

    /// 現在のユーザーリストのスナップショット
    pub fn user_list(&self) -> Vec<UserEntry> {
        self.participants
            .iter()
            .map(|p| UserEntry {
                username: p.username.as_str().to_string(),
                wallet: p.wallet.as_ref().map(|w| w.as_str().to_string()),
            })
            .collect()
    }

    /// ルーム一覧用のスナップショット
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            room_name: self.name.clone(),
            mode: self.mode,
            participant_count: self.participants.len(),
        }
    }

    /// プレイヤー名から既知のウォレットアドレスを解決する
    ///
    /// 参加者レコードを優先し、連絡帳にフォールバックする。
    pub fn resolve_wallet(&self, player: &str) -> Option<&WalletAddress> {
        self.participants
            .iter()
            .find(|p| p.username.as_str() == player)
            .and_then(|p| p.wallet.as_ref())
            .or_else(|| self.contacts.get(player))
    }

    /// 台帳コマンドを実行し、ユーザー向けの結果テキストを返す
    ///
    /// 事前条件エラー（NoActiveSession / NotHost / Unbalanced）は想定内の
    /// 結果であり、同じくテキストとして返される。
    pub fn execute_ledger(&mut self, command: &LedgerCommand, now: Timestamp) -> String {
        match command {
            LedgerCommand::BuyIn { player, amount } => {
                let session = self
                    .poker
                    .get_or_insert_with(|| PokerSession::new(player.clone()));
                session.record_buy_in(player, *amount, now)
            }
            LedgerCommand::CashOut { player, amount } => match &mut self.poker {
                Some(session) => session.record_cash_out(player, *amount, now),
                None => super::error::LedgerError::NoActiveSession.to_string(),
            },
            LedgerCommand::Summary => match &self.poker {
                Some(session) => session.summary(),
                None => super::error::LedgerError::NoActiveSession.to_string(),
            },
            LedgerCommand::Settle { player } => match &self.poker {
                Some(session) => match session.settle(player) {
                    Ok(settlement) => {
                        let mut lines = vec!["Ledger settled. Payments:".to_string()];
                        for payment in &settlement.payments {
                            let payee = self
                                .resolve_wallet(&payment.to)
                                .map(|w| w.as_str().to_string())
                                .unwrap_or_else(|| payment.to.clone());
                            lines.push(format!("  Pay {}: ${}", payee, payment.amount));
                        }
                        lines.join("\n")
                    }
                    Err(e) => e.to_string(),
                },
                None => super::error::LedgerError::NoActiveSession.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::RoomIdFactory;

    fn test_room() -> Room {
        Room::new(
            RoomIdFactory::generate(),
            "Poker Night".to_string(),
            RoomMode::Poker,
            Timestamp::new(1000),
        )
    }

    fn participant(name: &str, wallet: Option<&str>) -> Participant {
        Participant::new(
            Username::new(name.to_string()).unwrap(),
            wallet.map(|w| WalletAddress::new(w.to_string()).unwrap()),
            CallerIdentity::Primary,
        )
    }

    fn chat(room: &Room, from: &str, text: &str, millis: i64) -> ChatMessage {
        ChatMessage::new(
            room.id.clone(),
            Username::new(from.to_string()).unwrap(),
            MessageContent::new(text.to_string()).unwrap(),
            Timestamp::new(millis),
        )
    }

    #[test]
    fn test_rejoin_with_same_username_is_idempotent() {
        // テスト項目: 同名での再参加後も参加者エントリは 1 つだけ
        // given (前提条件):
        let mut room = test_room();
        room.upsert_participant(participant("Alice", None));

        // when (操作): 同名でウォレットつきの再参加
        let replaced = room.upsert_participant(participant("Alice", Some("0xabc")));

        // then (期待する結果):
        assert!(replaced);
        assert_eq!(room.participants.len(), 1);
        assert_eq!(
            room.participants[0].wallet.as_ref().unwrap().as_str(),
            "0xabc"
        );
    }

    #[test]
    fn test_join_with_wallet_updates_contact_book() {
        // テスト項目: ウォレットつきの参加で連絡帳が更新される
        // given (前提条件):
        let mut room = test_room();

        // when (操作):
        room.upsert_participant(participant("Bob", Some("0xbob")));

        // then (期待する結果):
        assert_eq!(room.contacts.get("Bob").unwrap().as_str(), "0xbob");
    }

    #[test]
    fn test_remove_participant_is_noop_when_absent() {
        // テスト項目: 存在しない参加者の削除は no-op になる
        // given (前提条件):
        let mut room = test_room();

        // when (操作):
        let removed = room.remove_participant(&Username::new("Ghost".to_string()).unwrap());

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(room.participants.len(), 0);
    }

    #[test]
    fn test_context_window_never_exceeds_capacity() {
        // テスト項目: 有界ウィンドウが 50 件を超えない
        // given (前提条件):
        let mut room = test_room();

        // when (操作): 60 件のメッセージを追加
        for i in 0..60 {
            let message = chat(&room, "Alice", &format!("message {}", i), i);
            room.add_chat(message);
        }

        // then (期待する結果): ウィンドウは 50 件、最古は message 10
        assert_eq!(room.context_window.len(), CONTEXT_WINDOW_CAPACITY);
        assert_eq!(room.context_window[0].content.as_str(), "message 10");
    }

    #[test]
    fn test_replay_log_is_monotonically_non_decreasing() {
        // テスト項目: リプレイログは追記のみで単調に増加する
        // given (前提条件):
        let mut room = test_room();

        // when (操作):
        for i in 0..60 {
            let message = chat(&room, "Alice", &format!("message {}", i), i);
            room.add_chat(message);
        }
        room.record_event(RoomEvent::System {
            text: "Alice left".to_string(),
            timestamp: Timestamp::new(100),
        });

        // then (期待する結果): 全件が元の順序で残っている
        assert_eq!(room.replay_log.len(), 61);
        assert!(matches!(
            &room.replay_log[0],
            RoomEvent::Chat { text, .. } if text == "message 0"
        ));
    }

    #[test]
    fn test_ledger_session_is_created_lazily_on_first_buy_in() {
        // テスト項目: 最初のバイインでセッションが生成され、host が設定される
        // given (前提条件):
        let mut room = test_room();
        assert!(room.poker.is_none());

        // when (操作):
        let text = room.execute_ledger(
            &LedgerCommand::BuyIn {
                player: "Alice".to_string(),
                amount: 100,
            },
            Timestamp::new(1),
        );

        // then (期待する結果):
        assert_eq!(text, "Alice bought in for $100. Pot total: $100");
        assert_eq!(room.poker.as_ref().unwrap().host, "Alice");
    }

    #[test]
    fn test_cash_out_before_any_buy_in_reports_no_active_session() {
        // テスト項目: バイイン前のキャッシュアウトは NoActiveSession テキストになる
        // given (前提条件):
        let mut room = test_room();

        // when (操作):
        let text = room.execute_ledger(
            &LedgerCommand::CashOut {
                player: "Bob".to_string(),
                amount: 50,
            },
            Timestamp::new(1),
        );

        // then (期待する結果):
        assert!(text.contains("No poker session is active"));
    }

    #[test]
    fn test_settle_resolves_payees_to_known_wallets() {
        // テスト項目: 精算の支払い先が既知のウォレットアドレスに解決される
        // given (前提条件): Bob はウォレットあり、Alice はなし
        let mut room = test_room();
        room.upsert_participant(participant("Alice", None));
        room.upsert_participant(participant("Bob", Some("0xbob")));
        room.execute_ledger(
            &LedgerCommand::BuyIn {
                player: "Alice".to_string(),
                amount: 100,
            },
            Timestamp::new(1),
        );
        room.execute_ledger(
            &LedgerCommand::BuyIn {
                player: "Bob".to_string(),
                amount: 100,
            },
            Timestamp::new(2),
        );
        room.execute_ledger(
            &LedgerCommand::CashOut {
                player: "Bob".to_string(),
                amount: 150,
            },
            Timestamp::new(3),
        );
        room.execute_ledger(
            &LedgerCommand::CashOut {
                player: "Alice".to_string(),
                amount: 50,
            },
            Timestamp::new(4),
        );

        // when (操作): ホストの Alice が精算
        let text = room.execute_ledger(
            &LedgerCommand::Settle {
                player: "Alice".to_string(),
            },
            Timestamp::new(5),
        );

        // then (期待する結果): Bob はウォレット、Alice は名前のまま
        assert!(text.contains("Pay 0xbob: $150"));
        assert!(text.contains("Pay Alice: $50"));
    }
}
