//! HTTP バックエンドを使った ConversationalAgent 実装
//!
//! identity タグごとに設定されたエンドポイントへリクエストを JSON で
//! POST し、応答（text / tool_uses / commands）を受け取ります。
//! HTTP 経路ではストリーミングを行わないため、進捗チャンネルには
//! イベントを流しません。上流のエラー詳細はこの層で文字列化され、
//! ログにのみ残ります（ルームへは汎用メッセージだけが流れます）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{
    AgentError, AgentProgress, AgentReply, AgentRequest, CallerIdentity, ConversationalAgent,
};

/// identity 1 つ分のエージェント接続先
#[derive(Debug, Clone)]
pub struct AgentEndpoint {
    /// リクエストを POST する URL
    pub url: String,
    /// Bearer トークン（任意）
    pub token: Option<String>,
}

/// HTTP バックエンドを使った ConversationalAgent 実装
pub struct HttpConversationalAgent {
    client: reqwest::Client,
    /// identity タグ → 接続先のマッピング
    endpoints: HashMap<CallerIdentity, AgentEndpoint>,
}

impl HttpConversationalAgent {
    /// 新しい HttpConversationalAgent を作成
    pub fn new(endpoints: HashMap<CallerIdentity, AgentEndpoint>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }
}

#[async_trait]
impl ConversationalAgent for HttpConversationalAgent {
    async fn process_message(
        &self,
        request: AgentRequest,
        _progress: mpsc::UnboundedSender<AgentProgress>,
    ) -> Result<AgentReply, AgentError> {
        let endpoint = self
            .endpoints
            .get(&request.identity)
            .ok_or_else(|| AgentError::NotConfigured(request.identity.as_str().to_string()))?;

        let mut http_request = self.client.post(&endpoint.url).json(&request);
        if let Some(token) = &endpoint.token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        response
            .json::<AgentReply>()
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))
    }
}
