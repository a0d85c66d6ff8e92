//! UseCase: 呼び出し元の identity 選択処理
//!
//! `connect { apiKey }` を受け、API キーから identity タグを解決して
//! 接続に紐付け、現在のルーム一覧をその接続にだけ返信します。
//! 未知のキーは Guest にフォールバックします（認証は非目標）。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    Broadcaster, CallerIdentity, ConnectionId, ConnectionRegistry, OutboundEvent, RoomRepository,
};

/// 呼び出し元接続のユースケース
pub struct ConnectCallerUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 接続レジストリ（共有状態）
    registry: Arc<Mutex<ConnectionRegistry>>,
    /// Broadcaster（イベント配信の抽象化）
    broadcaster: Arc<dyn Broadcaster>,
    /// API キー → identity タグのマッピング（フラットな設定）
    identities: HashMap<String, CallerIdentity>,
}

impl ConnectCallerUseCase {
    /// 新しい ConnectCallerUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<Mutex<ConnectionRegistry>>,
        broadcaster: Arc<dyn Broadcaster>,
        identities: HashMap<String, CallerIdentity>,
    ) -> Self {
        Self {
            repository,
            registry,
            broadcaster,
            identities,
        }
    }

    /// identity 選択を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 対象の接続
    /// * `api_key` - クライアントが提示した API キー
    ///
    /// # Returns
    ///
    /// 解決された identity タグ（未知のキーは Guest）
    pub async fn execute(&self, connection_id: &ConnectionId, api_key: &str) -> CallerIdentity {
        let identity = self
            .identities
            .get(api_key)
            .copied()
            .unwrap_or(CallerIdentity::Guest);

        {
            let mut registry = self.registry.lock().await;
            registry.set_identity(connection_id, identity);
        }
        tracing::info!(
            "Connection '{}' selected identity '{}'",
            connection_id,
            identity
        );

        // ルーム一覧をこの接続にだけ返信
        let rooms = self.repository.list_rooms().await;
        self.broadcaster
            .send_to_connection(connection_id, &OutboundEvent::RoomList { rooms })
            .await;

        identity
    }
}
