//! UseCase: エージェント起動（AgentDispatcher）
//!
//! identity タグごとに busy フラグを 1 つ持ち、同時実行を 1 件に制限します
//! （single-flight、atomic CAS）。進捗イベントはチャンネルで受け取り、
//! typing インジケータの開始／停止は保証された後始末経路で必ず対になります。
//! エージェント呼び出しにはデッドラインがあり、ハングしても identity が
//! 恒久的に塞がることはありません。
//!
//! 同じ identity を共有する複数ルームは、その identity のフラグを通じて
//! 直列化されます（ルーム単位ではなく identity 単位の直列化）。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chanoma_shared::time::get_jst_timestamp;
use tokio::sync::mpsc;

use crate::domain::{
    AgentError, AgentRequest, Broadcaster, CallerIdentity, ConversationalAgent, DispatchError,
    OutboundEvent, RoomEvent, RoomId, RoomRepository, Timestamp, parse_directives,
};

/// エージェント呼び出しのデフォルトデッドライン
pub const DEFAULT_AGENT_DEADLINE: Duration = Duration::from_secs(120);

/// チャットテキストに含まれるとエージェント起動のトリガーになるトークン
pub const DEFAULT_AGENT_MENTION: &str = "@agent";

/// ルームに流す汎用のエージェント失敗メッセージ（内部詳細はログのみ）
const AGENT_FAILURE_TEXT: &str = "The agent could not respond this time. Please try again.";

/// エージェント起動のユースケース
pub struct AgentDispatcher {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Broadcaster（イベント配信の抽象化）
    broadcaster: Arc<dyn Broadcaster>,
    /// 外部の会話エージェント
    agent: Arc<dyn ConversationalAgent>,
    /// identity ごとの busy フラグ（single-flight）
    busy: std::sync::Mutex<HashMap<CallerIdentity, Arc<AtomicBool>>>,
    /// 呼び出し 1 回あたりのデッドライン
    deadline: Duration,
}

impl AgentDispatcher {
    /// 新しい AgentDispatcher を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        broadcaster: Arc<dyn Broadcaster>,
        agent: Arc<dyn ConversationalAgent>,
        deadline: Duration,
    ) -> Self {
        Self {
            repository,
            broadcaster,
            agent,
            busy: std::sync::Mutex::new(HashMap::new()),
            deadline,
        }
    }

    /// エージェント呼び出しを実行
    ///
    /// Router からは fire-and-forget で呼ばれます（spawn したタスク内で
    /// await する）。busy の identity に対しては即座に
    /// `DispatchError::AlreadyProcessing` を返し、呼び出し元が system
    /// メッセージとして通知します。
    ///
    /// # Arguments
    ///
    /// * `identity` - 呼び出し元の identity タグ
    /// * `room_id` - トリガーが発生したルーム
    /// * `text` - トリガーとなったチャットテキスト
    pub async fn dispatch(
        &self,
        identity: CallerIdentity,
        room_id: RoomId,
        text: String,
    ) -> Result<(), DispatchError> {
        let flag = {
            let mut busy = self.busy.lock().expect("busy flag lock poisoned");
            busy.entry(identity).or_default().clone()
        };
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!(
                "Agent dispatch rejected: identity '{}' is already processing",
                identity
            );
            return Err(DispatchError::AlreadyProcessing(
                identity.as_str().to_string(),
            ));
        }

        self.send_typing(&room_id, true).await;
        let result = self.run_invocation(identity, &room_id, &text).await;

        // 保証された後始末経路: typing 停止とフラグ解除は成功・エラー・
        // デッドラインのどの出口でも必ず一度だけ行われる
        self.send_typing(&room_id, false).await;
        flag.store(false, Ordering::Release);

        if let Err(e) = result {
            tracing::warn!("Agent invocation for identity '{}' failed: {}", identity, e);
            self.send_failure_notice(&room_id).await;
        }
        Ok(())
    }

    /// エージェント呼び出しの本体（後始末はしない）
    async fn run_invocation(
        &self,
        identity: CallerIdentity,
        room_id: &RoomId,
        text: &str,
    ) -> Result<(), AgentError> {
        let history = self
            .repository
            .context_window(room_id)
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;
        let context = self
            .repository
            .room_context(room_id)
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;
        let request = AgentRequest {
            identity,
            text: text.to_string(),
            history,
            context,
        };

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let call = self.agent.process_message(request, progress_tx);
        tokio::pin!(call);
        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        // 進捗はツール名で呼び出し内デデュープしてから配信する
        let mut seen_tools: HashSet<String> = HashSet::new();
        let reply = loop {
            tokio::select! {
                Some(progress) = progress_rx.recv() => {
                    if seen_tools.insert(progress.tool_name.clone()) {
                        self.broadcaster
                            .send_to_room(room_id, &OutboundEvent::AgentProgress {
                                room_id: room_id.clone(),
                                text: format!("Using {}...", progress.tool_name),
                                tool_name: progress.tool_name,
                                elapsed_time: started.elapsed().as_secs_f64(),
                            }, None)
                            .await;
                    }
                }
                result = &mut call => break result?,
                _ = &mut deadline => {
                    return Err(AgentError::Backend(format!(
                        "agent call exceeded the {:?} deadline",
                        self.deadline
                    )));
                }
            }
        };

        // 構造化された台帳コマンドを順に実行
        let mut sections = Vec::new();
        for command in &reply.commands {
            let outcome = self
                .repository
                .execute_ledger(room_id, command)
                .await
                .map_err(|e| AgentError::Backend(e.to_string()))?;
            sections.push(outcome);
        }

        // 散文ディレクティブを左から右へ実行し、結果テキストで置換する
        let mut final_text = self.substitute_directives(room_id, &reply.text).await?;
        if !sections.is_empty() {
            if !final_text.is_empty() {
                final_text.push('\n');
            }
            final_text.push_str(&sections.join("\n"));
        }

        let timestamp = Timestamp::new(get_jst_timestamp());
        self.repository
            .append_event(room_id, RoomEvent::Agent {
                text: final_text.clone(),
                tool_uses: reply.tool_uses.clone(),
                timestamp,
            })
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;
        self.broadcaster
            .send_to_room(room_id, &OutboundEvent::Agent {
                room_id: room_id.clone(),
                text: final_text,
                tool_uses: reply.tool_uses,
                timestamp,
            }, None)
            .await;
        Ok(())
    }

    /// 応答テキスト中のディレクティブを実行結果で置換する
    async fn substitute_directives(
        &self,
        room_id: &RoomId,
        text: &str,
    ) -> Result<String, AgentError> {
        let directives = parse_directives(text);
        if directives.is_empty() {
            return Ok(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for directive in directives {
            let outcome = self
                .repository
                .execute_ledger(room_id, &directive.command)
                .await
                .map_err(|e| AgentError::Backend(e.to_string()))?;
            out.push_str(&text[cursor..directive.start]);
            out.push_str(&outcome);
            cursor = directive.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }

    async fn send_typing(&self, room_id: &RoomId, is_typing: bool) {
        self.broadcaster
            .send_to_room(room_id, &OutboundEvent::AgentTyping {
                room_id: room_id.clone(),
                is_typing,
            }, None)
            .await;
    }

    async fn send_failure_notice(&self, room_id: &RoomId) {
        let timestamp = Timestamp::new(get_jst_timestamp());
        if let Err(e) = self
            .repository
            .append_event(room_id, RoomEvent::System {
                text: AGENT_FAILURE_TEXT.to_string(),
                timestamp,
            })
            .await
        {
            tracing::warn!("Failed to record agent failure notice: {}", e);
        }
        self.broadcaster
            .send_to_room(room_id, &OutboundEvent::System {
                room_id: Some(room_id.clone()),
                text: AGENT_FAILURE_TEXT.to_string(),
                timestamp,
            }, None)
            .await;
    }
}
