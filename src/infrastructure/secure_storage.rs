//! 安全存储接口
//!
//! 加密落盘格式不在本库范围内，这里只约定按固定槽位读写 JSON 值

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// 钱包密钥记录所在槽位
pub const WALLET_SECRETS_SLOT: &str = "wallet_secrets";

/// 安全存储（原子、持久，按槽位寻址）
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// 读取槽位，不存在时返回 `None`
    async fn load(&self, slot: &str) -> Result<Option<serde_json::Value>>;

    /// 写入槽位
    async fn store(&self, slot: &str, value: serde_json::Value) -> Result<()>;
}

// ============ 内存实现 ============

/// 内存安全存储（测试与无持久化场景）
#[derive(Default, Clone)]
pub struct InMemorySecureStorage {
    slots: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemorySecureStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前槽位内容
    pub async fn snapshot(&self, slot: &str) -> Option<serde_json::Value> {
        self.slots.read().await.get(slot).cloned()
    }
}

#[async_trait]
impl SecureStorage for InMemorySecureStorage {
    async fn load(&self, slot: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.slots.read().await.get(slot).cloned())
    }

    async fn store(&self, slot: &str, value: serde_json::Value) -> Result<()> {
        self.slots.write().await.insert(slot.to_string(), value);
        Ok(())
    }
}
