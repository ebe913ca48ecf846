// src/storage/session.rs

use crate::storage::store::PortalStore;

pub const TOKEN_KEY: &str = "admin_token";
pub const LAST_CLIENT_ID_KEY: &str = "last_client_id";

/// 登录会话：持有 bearer token 与最近一次使用的 clientId。
/// token 不做过期管理，失效只会在后续请求失败时被发现。
pub struct Session {
    store: Box<dyn PortalStore>,
}

impl Session {
    pub fn new(store: Box<dyn PortalStore>) -> Self {
        Self { store }
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) {
        self.store.set(TOKEN_KEY, token);
    }

    pub fn clear_token(&self) {
        self.store.remove(TOKEN_KEY);
    }

    pub fn last_client_id(&self) -> Option<String> {
        self.store.get(LAST_CLIENT_ID_KEY)
    }

    /// 记住最近一次使用的 clientId，作为后续加载的默认过滤条件
    pub fn remember_client_id(&self, client_id: &str) {
        self.store.set(LAST_CLIENT_ID_KEY, client_id);
    }
}
