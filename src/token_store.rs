//! 令牌存储
//!
//! 持久化两项内容：访问令牌和最近一次的用户快照。
//! 只有 Auth Service 写入；其他组件通过 `AuthService::get_token` 读取。

use crate::storage::KeyValueStore;
use meetolio_shared::{STORAGE_KEY_TOKEN, STORAGE_KEY_USER, User};
use tracing::warn;

pub struct TokenStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> TokenStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn token(&self) -> Option<String> {
        self.storage
            .get(STORAGE_KEY_TOKEN)
            .filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        if !self.storage.set(STORAGE_KEY_TOKEN, token) {
            warn!("failed to persist access token");
        }
    }

    /// 读取用户快照；内容无法解析时视为不存在
    pub fn user(&self) -> Option<User> {
        let raw = self.storage.get(STORAGE_KEY_USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "discarding unreadable user snapshot");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if !self.storage.set(STORAGE_KEY_USER, &raw) {
                    warn!("failed to persist user snapshot");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize user snapshot"),
        }
    }

    /// 同时清除令牌和用户快照；任一项没能从存储中删除时返回 `false`
    pub fn clear(&self) -> bool {
        let token_cleared = self.storage.delete(STORAGE_KEY_TOKEN);
        if !token_cleared {
            warn!("failed to remove token from storage");
        }
        let user_cleared = self.storage.delete(STORAGE_KEY_USER);
        if !user_cleared {
            warn!("failed to remove user snapshot from storage");
        }
        token_cleared && user_cleared
    }
}
