//! サーバー設定の読み込み
//!
//! 設定は identity タグ → 資格情報のフラットなマッピングと、少数の
//! チューニング項目だけを持つ TOML ファイルです。ファイルが無い、
//! あるいは読めない場合は警告してデフォルト設定（Guest のみ、
//! エージェントバックエンドなし）で起動します。
//!
//! ```toml
//! agent_mention = "@agent"
//! agent_deadline_secs = 120
//!
//! [[identities]]
//! name = "primary"
//! api_key = "key-primary"
//! agent_endpoint = "http://localhost:9000/agent"
//! agent_token = "secret"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::CallerIdentity;
use crate::infrastructure::agent::AgentEndpoint;

/// 設定読み込みのエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// identity 1 つ分の資格情報
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityCredential {
    /// identity タグの名前（primary / secondary / guest）
    pub name: String,
    /// この identity を選択するための API キー
    pub api_key: String,
    /// エージェントバックエンドの URL（任意）
    #[serde(default)]
    pub agent_endpoint: Option<String>,
    /// エージェントバックエンドの Bearer トークン（任意）
    #[serde(default)]
    pub agent_token: Option<String>,
}

/// サーバー設定
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// identity → 資格情報のフラットなマッピング
    #[serde(default)]
    pub identities: Vec<IdentityCredential>,
    /// エージェント起動のトリガーとなるメンショントークン
    #[serde(default = "default_agent_mention")]
    pub agent_mention: String,
    /// エージェント呼び出しのデッドライン（秒）
    #[serde(default = "default_agent_deadline_secs")]
    pub agent_deadline_secs: u64,
}

fn default_agent_mention() -> String {
    crate::usecase::DEFAULT_AGENT_MENTION.to_string()
}

fn default_agent_deadline_secs() -> u64 {
    crate::usecase::DEFAULT_AGENT_DEADLINE.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            identities: Vec::new(),
            agent_mention: default_agent_mention(),
            agent_deadline_secs: default_agent_deadline_secs(),
        }
    }
}

impl ServerConfig {
    /// 指定パスから設定を読み込む
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// 設定を読み込む。パス未指定・読み込み失敗時はデフォルトで起動する
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::info!("No config file specified, using defaults");
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load config from {}, using defaults: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// API キー → identity タグのマッピングを構築する
    ///
    /// 未知の identity 名のエントリは警告してスキップする。
    pub fn api_key_map(&self) -> HashMap<String, CallerIdentity> {
        let mut map = HashMap::new();
        for credential in &self.identities {
            match CallerIdentity::from_name(&credential.name) {
                Some(identity) => {
                    map.insert(credential.api_key.clone(), identity);
                }
                None => {
                    tracing::warn!(
                        "Unknown identity name '{}' in config, skipping",
                        credential.name
                    );
                }
            }
        }
        map
    }

    /// identity タグ → エージェント接続先のマッピングを構築する
    pub fn agent_endpoints(&self) -> HashMap<CallerIdentity, AgentEndpoint> {
        let mut map = HashMap::new();
        for credential in &self.identities {
            let (Some(identity), Some(url)) = (
                CallerIdentity::from_name(&credential.name),
                credential.agent_endpoint.clone(),
            ) else {
                continue;
            };
            map.insert(identity, AgentEndpoint {
                url,
                token: credential.agent_token.clone(),
            });
        }
        map
    }

    /// エージェント呼び出しのデッドライン
    pub fn agent_deadline(&self) -> Duration {
        Duration::from_secs(self.agent_deadline_secs)
    }
}
