//! 接続レジストリ（ConnectionRegistry）
//!
//! 生きている接続とそのセッション属性（identity タグ、現在のルーム、
//! 表示名、ウォレットタグ）を管理します。レジストリの所有権は共有状態
//! （`Arc<Mutex<_>>`）にあり、ミューテーションは Router からのみ行われます。

use std::collections::HashMap;

use super::value_object::{CallerIdentity, ConnectionId, RoomId, Username, WalletAddress};

/// 接続 1 本のセッション属性
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    /// 呼び出し元の identity タグ（connect までは Guest）
    pub identity: CallerIdentity,
    /// 現在参加しているルーム
    pub room: Option<RoomId>,
    /// 表示名（join するまで None）
    pub username: Option<Username>,
    /// ウォレットタグ
    pub wallet: Option<WalletAddress>,
}

impl ConnectionSession {
    fn new() -> Self {
        Self {
            identity: CallerIdentity::Guest,
            room: None,
            username: None,
            wallet: None,
        }
    }
}

/// 生きている接続のレジストリ
///
/// どの操作もロック取得以外でブロックしない。unregister は冪等
/// （ソケットは error の後に close されることがある）。
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionSession>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// 接続を登録する
    pub fn register(&mut self, connection_id: ConnectionId) {
        self.connections
            .insert(connection_id, ConnectionSession::new());
    }

    /// identity タグを設定する
    pub fn set_identity(&mut self, connection_id: &ConnectionId, identity: CallerIdentity) {
        if let Some(session) = self.connections.get_mut(connection_id) {
            session.identity = identity;
        }
    }

    /// 現在のルームを設定する（None で退室）
    pub fn set_room(&mut self, connection_id: &ConnectionId, room: Option<RoomId>) {
        if let Some(session) = self.connections.get_mut(connection_id) {
            session.room = room;
        }
    }

    /// 表示名とウォレットを設定する
    pub fn set_profile(
        &mut self,
        connection_id: &ConnectionId,
        username: Username,
        wallet: Option<WalletAddress>,
    ) {
        if let Some(session) = self.connections.get_mut(connection_id) {
            session.username = Some(username);
            session.wallet = wallet;
        }
    }

    /// 接続を登録解除する（冪等）
    pub fn unregister(&mut self, connection_id: &ConnectionId) {
        self.connections.remove(connection_id);
    }

    /// セッション属性を取得する
    pub fn get(&self, connection_id: &ConnectionId) -> Option<&ConnectionSession> {
        self.connections.get(connection_id)
    }

    /// 指定ルームに参加中の接続を列挙する
    pub fn list_by_room(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|(_, session)| session.room.as_ref() == Some(room_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// 全ての接続を列挙する（room_list のグローバル配信用）
    pub fn all_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
