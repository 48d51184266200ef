//! 账户模型

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::chain_config::VmAddressSpace;

/// 钱包类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    /// 本地助记词
    Mnemonic,
    /// 远程签名器（MPC），账户列表由签名器提供
    Seedless,
    /// Ledger (BIP44)
    Ledger,
    /// Ledger Live 路径
    LedgerLive,
    /// Keystone
    Keystone,
}

impl WalletType {
    /// 是否由远程签名器提供权威的密钥列表
    pub fn has_remote_key_listing(&self) -> bool {
        matches!(self, WalletType::Seedless)
    }

    pub fn is_hardware(&self) -> bool {
        matches!(
            self,
            WalletType::Ledger | WalletType::LedgerLive | WalletType::Keystone
        )
    }
}

/// 账户
///
/// `index` 在钱包内唯一且从 0 开始递增；`addresses` 对每个注册地址空间都有一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub wallet_id: String,
    pub index: u32,
    pub addresses: BTreeMap<VmAddressSpace, String>,
}

impl Account {
    /// 从地址解析结果构建账户
    ///
    /// 未解析出的地址空间填空字符串
    pub fn from_resolution(
        wallet_id: impl Into<String>,
        index: u32,
        resolved: &BTreeMap<VmAddressSpace, String>,
        spaces: &[VmAddressSpace],
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            wallet_id: wallet_id.into(),
            index,
            addresses: Self::fill_addresses(resolved, spaces),
        }
    }

    pub fn address(&self, space: VmAddressSpace) -> Option<&str> {
        self.addresses
            .get(&space)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }

    /// 整体替换地址（重新加载时使用，不做部分更新）
    ///
    /// ID 与索引保持不变
    pub fn replace_addresses(
        &mut self,
        resolved: &BTreeMap<VmAddressSpace, String>,
        spaces: &[VmAddressSpace],
    ) {
        self.addresses = Self::fill_addresses(resolved, spaces);
    }

    fn fill_addresses(
        resolved: &BTreeMap<VmAddressSpace, String>,
        spaces: &[VmAddressSpace],
    ) -> BTreeMap<VmAddressSpace, String> {
        spaces
            .iter()
            .map(|space| (*space, resolved.get(space).cloned().unwrap_or_default()))
            .collect()
    }
}
