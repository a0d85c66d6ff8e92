//! ポーカー台帳（PokerLedger）のドメインモデル
//!
//! ルームに埋め込まれる小さな状態機械です。バイイン／キャッシュアウトを
//! 記録し、残高を計算し、精算（settle）を行います。
//!
//! 状態遷移: `none` →（最初のバイインで生成）→ `active`。
//! 精算後もレコードは監査証跡として保持され、以降のバイインは同じ
//! セッションに追記されます。

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::value_object::Timestamp;

/// 台帳の 1 エントリ（バイインまたはキャッシュアウト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// プレイヤーの表示名
    pub player: String,
    /// 金額（ドル、整数）
    pub amount: i64,
    /// 記録時刻
    pub timestamp: Timestamp,
}

/// 精算時の支払い指示（キャッシュアウト 1 件につき 1 つ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// 支払い先（ウォレットアドレス、未解決ならプレイヤー名）
    pub to: String,
    /// 金額（ドル）
    pub amount: i64,
}

/// 精算結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub payments: Vec<Payment>,
}

/// ルームごとのポーカーセッション
///
/// 不変条件: host は最初にバイインを記録したプレイヤー。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokerSession {
    /// 精算権限を持つプレイヤーの表示名
    pub host: String,
    /// バイインの記録（記録順）
    pub buy_ins: Vec<LedgerEntry>,
    /// キャッシュアウトの記録（記録順）
    pub cash_outs: Vec<LedgerEntry>,
}

impl PokerSession {
    /// 最初のバイインからセッションを生成（host = 最初のプレイヤー）
    pub fn new(host: String) -> Self {
        Self {
            host,
            buy_ins: Vec::new(),
            cash_outs: Vec::new(),
        }
    }

    /// バイインを記録し、確認テキストを返す
    pub fn record_buy_in(&mut self, player: &str, amount: i64, timestamp: Timestamp) -> String {
        self.buy_ins.push(LedgerEntry {
            player: player.to_string(),
            amount,
            timestamp,
        });
        format!(
            "{} bought in for ${}. Pot total: ${}",
            player,
            amount,
            self.pot_total()
        )
    }

    /// キャッシュアウトを記録し、確認テキストを返す
    pub fn record_cash_out(&mut self, player: &str, amount: i64, timestamp: Timestamp) -> String {
        self.cash_outs.push(LedgerEntry {
            player: player.to_string(),
            amount,
            timestamp,
        });
        format!(
            "{} cashed out ${}. Pot total: ${}",
            player,
            amount,
            self.pot_total()
        )
    }

    /// バイイン合計
    pub fn total_buy_ins(&self) -> i64 {
        self.buy_ins.iter().map(|e| e.amount).sum()
    }

    /// キャッシュアウト合計
    pub fn total_cash_outs(&self) -> i64 {
        self.cash_outs.iter().map(|e| e.amount).sum()
    }

    /// 残高: sum(buy-ins) - sum(cash-outs)
    pub fn balance(&self) -> i64 {
        self.total_buy_ins() - self.total_cash_outs()
    }

    /// 現在のポット（残高と同義、表示用）
    fn pot_total(&self) -> i64 {
        self.balance()
    }

    /// 台帳の整形済みサマリを返す
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Poker ledger (host: {})", self.host));
        lines.push("Buy-ins:".to_string());
        if self.buy_ins.is_empty() {
            lines.push("  (none)".to_string());
        }
        for entry in &self.buy_ins {
            lines.push(format!("  {}: ${}", entry.player, entry.amount));
        }
        lines.push(format!("Total buy-ins: ${}", self.total_buy_ins()));
        lines.push("Cash-outs:".to_string());
        if self.cash_outs.is_empty() {
            lines.push("  (none)".to_string());
        }
        for entry in &self.cash_outs {
            lines.push(format!("  {}: ${}", entry.player, entry.amount));
        }
        lines.push(format!("Total cash-outs: ${}", self.total_cash_outs()));
        let balance = self.balance();
        let verdict = if balance == 0 {
            "Verdict: exactly balanced ($+0)".to_string()
        } else if balance > 0 {
            format!("Verdict: ${:+} remaining in the pot", balance)
        } else {
            format!("Verdict: pot over-paid by ${:+}", balance)
        };
        lines.push(verdict);
        lines.join("\n")
    }

    /// 精算を実行する
    ///
    /// # Arguments
    ///
    /// * `requesting_player` - 精算を要求したプレイヤーの表示名
    ///
    /// # Returns
    ///
    /// * `Ok(Settlement)` - キャッシュアウト 1 件につき 1 つの支払い指示
    /// * `Err(LedgerError::NotHost)` - 要求者がホストではない
    /// * `Err(LedgerError::Unbalanced)` - 合計が一致しない（正確な差額つき）
    pub fn settle(&self, requesting_player: &str) -> Result<Settlement, LedgerError> {
        if requesting_player != self.host {
            return Err(LedgerError::NotHost {
                host: self.host.clone(),
            });
        }
        let difference = self.balance();
        if difference != 0 {
            return Err(LedgerError::Unbalanced { difference });
        }
        let payments = self
            .cash_outs
            .iter()
            .map(|entry| Payment {
                to: entry.player.clone(),
                amount: entry.amount,
            })
            .collect();
        Ok(Settlement { payments })
    }
}

/// 台帳に対する型付きコマンド
///
/// エージェントの応答から構造化された形で受け取るか、散文中の
/// ディレクティブ（`BUY_IN(player, amount)` など）から解析されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LedgerCommand {
    BuyIn { player: String, amount: i64 },
    CashOut { player: String, amount: i64 },
    Summary,
    Settle { player: String },
}

/// 散文テキスト中から見つかったディレクティブ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// 元テキスト内のバイト範囲（置換用）
    pub start: usize,
    pub end: usize,
    pub command: LedgerCommand,
}

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(BUY_IN|CASH_OUT|LEDGER|SETTLE)\(([^)]*)\)").unwrap()
});

/// エージェント応答テキストから台帳ディレクティブを左から右へ抽出する
///
/// 引数の数や金額が解析できないディレクティブはスキップされ、
/// テキスト中にそのまま残ります。
pub fn parse_directives(text: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    for captures in DIRECTIVE_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let name = &captures[1];
        let args: Vec<String> = captures[2]
            .split(',')
            .map(|s| s.trim().trim_start_matches('$').to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let command = match (name, args.as_slice()) {
            ("BUY_IN", [player, amount]) => match amount.parse::<i64>() {
                Ok(amount) => LedgerCommand::BuyIn {
                    player: player.clone(),
                    amount,
                },
                Err(_) => continue,
            },
            ("CASH_OUT", [player, amount]) => match amount.parse::<i64>() {
                Ok(amount) => LedgerCommand::CashOut {
                    player: player.clone(),
                    amount,
                },
                Err(_) => continue,
            },
            ("LEDGER", []) => LedgerCommand::Summary,
            ("SETTLE", [player]) => LedgerCommand::Settle {
                player: player.clone(),
            },
            _ => continue,
        };
        directives.push(Directive {
            start: whole.start(),
            end: whole.end(),
            command,
        });
    }
    directives
}
