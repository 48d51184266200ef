//! 活跃账户扫描
//!
//! 从已知活跃边界开始逐个派生账户的 EVM 地址，查询参考网络上是否有交易记录，
//! 连续不活跃达到阈值即停止。扫描是尽力而为的发现过程：
//! 中途的查询或派生错误只会提前结束扫描，返回已找到的最好结果。
//!
//! 与 `AddressResolver` 相同，同一钱包的扫描与账户创建需由调用方串行化。

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::ScanConfig,
    domain::{
        account::WalletType,
        chain_config::{ChainConfig, CurveType, VmAddressSpace},
        derivation_path::{chain_path, HARDENED_OFFSET},
        secrets::AddressPublicKey,
    },
    error::{KeyResolutionError, KeyResult},
    infrastructure::log_redact::{redact_address, SensitiveRedact},
    service::{
        secret_resolver::SecretResolver,
        vm_modules::{DeriveAddressRequest, VmModuleRegistry},
    },
};

/// 交易历史（只用于判断是否为空）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionHistory {
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
}

/// 链上活动查询
#[async_trait]
pub trait ActivityQuery: Send + Sync {
    async fn get_transaction_history(
        &self,
        network: &ChainConfig,
        address: &str,
    ) -> anyhow::Result<TransactionHistory>;
}

/// 远程签名器（只读其已预置的密钥列表）
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    async fn provisioned_keys(&self, wallet_id: &str) -> anyhow::Result<Vec<AddressPublicKey>>;
}

/// 扫描参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub max_consecutive_inactive: u32,
    pub start_index: u32,
    pub max_scan: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_consecutive_inactive: 2,
            start_index: 1,
            max_scan: 1000,
        }
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            max_consecutive_inactive: config.max_consecutive_inactive,
            start_index: config.start_index,
            max_scan: config.max_scan,
        }
    }
}

/// 活跃账户扫描器
pub struct ActiveAccountScanner {
    secrets: Arc<SecretResolver>,
    modules: VmModuleRegistry,
    activity: Arc<dyn ActivityQuery>,
    remote_signer: Option<Arc<dyn RemoteSigner>>,
    reference_network: ChainConfig,
}

impl ActiveAccountScanner {
    pub fn new(
        secrets: Arc<SecretResolver>,
        modules: VmModuleRegistry,
        activity: Arc<dyn ActivityQuery>,
        reference_network: ChainConfig,
    ) -> Self {
        Self {
            secrets,
            modules,
            activity,
            remote_signer: None,
            reference_network,
        }
    }

    pub fn with_remote_signer(mut self, remote_signer: Arc<dyn RemoteSigner>) -> Self {
        self.remote_signer = Some(remote_signer);
        self
    }

    /// 统计钱包的活跃账户数量
    ///
    /// 账户 0 总是视为活跃。远程签名器钱包直接使用其预置的 EVM 密钥数量。
    pub async fn count_active_accounts(
        &self,
        wallet_id: &str,
        wallet_type: WalletType,
        options: ScanOptions,
    ) -> KeyResult<u32> {
        if wallet_type.has_remote_key_listing() {
            return self.count_provisioned_accounts(wallet_id).await;
        }

        let record = self.secrets.get_secrets(wallet_id).await?;
        debug!(record = %record.redact(), ?options, "Scanning for active accounts");
        let evm_module = self.modules.module_for(VmAddressSpace::Evm).ok_or_else(|| {
            KeyResolutionError::InvalidArgument("no EVM module registered".to_string())
        })?;

        let start = options.start_index.clamp(1, HARDENED_OFFSET);
        let mut last_active = i64::from(start) - 1;
        let mut consecutive_inactive = 0u32;

        for index in (start..HARDENED_OFFSET).take(options.max_scan as usize) {
            let request = DeriveAddressRequest {
                secret_id: record.id().to_string(),
                account_index: u64::from(index),
                network: self.reference_network.clone(),
                derivation_path_type: record.derivation_path_type(),
            };

            let address = match evm_module.derive_address(&request).await {
                Ok(mut addresses) => match addresses.remove(&VmAddressSpace::Evm) {
                    Some(address) => address,
                    None => break,
                },
                Err(e) => {
                    warn!(
                        wallet_id,
                        index,
                        hardware = wallet_type.is_hardware(),
                        error = %format!("{:#}", e),
                        "Scan stopped: address derivation failed"
                    );
                    break;
                }
            };

            let history = match self
                .activity
                .get_transaction_history(&self.reference_network, &address)
                .await
            {
                Ok(history) => history,
                Err(e) => {
                    warn!(wallet_id, index, error = %e, "Scan stopped: activity query failed");
                    break;
                }
            };

            if history.transactions.is_empty() {
                consecutive_inactive += 1;
                debug!(wallet_id, index, address = %redact_address(&address), "Inactive account");
                if consecutive_inactive >= options.max_consecutive_inactive {
                    break;
                }
            } else {
                last_active = i64::from(index);
                consecutive_inactive = 0;
            }
        }

        let count = u32::try_from((last_active + 1).max(0)).unwrap_or(u32::MAX);
        info!(wallet_id, ?wallet_type, count, "Active account scan finished");
        Ok(count)
    }

    /// 远程签名器：按预置的 EVM 密钥计数
    async fn count_provisioned_accounts(&self, wallet_id: &str) -> KeyResult<u32> {
        let signer = self.remote_signer.as_ref().ok_or_else(|| {
            KeyResolutionError::InvalidArgument("no remote signer configured".to_string())
        })?;

        match signer.provisioned_keys(wallet_id).await {
            Ok(keys) => {
                debug!(
                    wallet_id,
                    keys = ?keys.iter().map(SensitiveRedact::redact).collect::<Vec<_>>(),
                    "Provisioned keys listed"
                );
                let count = count_evm_keys(&keys);
                info!(wallet_id, count, "Using provisioned remote signer accounts");
                Ok(count)
            }
            Err(e) => {
                // 账户 0 总是存在
                warn!(wallet_id, error = %e, "Failed to list provisioned keys");
                Ok(1)
            }
        }
    }
}

/// EVM 基础路径 `m/44'/60'/0'/0` 下直接子索引的 secp256k1 密钥数量
///
/// 只统计 `m/44'/60'/0'/0/{i}`，相同索引只计一次，更深的路径不计入
fn count_evm_keys(keys: &[AddressPublicKey]) -> u32 {
    let base = chain_path(VmAddressSpace::Evm, false);

    let indices: BTreeSet<u32> = keys
        .iter()
        .filter(|k| k.curve == CurveType::Secp256k1)
        .filter_map(|k| k.derivation_path.as_ref())
        .filter(|p| p.depth() == base.depth() + 1 && base.is_strict_prefix_of(p))
        .filter_map(|p| p.components().last())
        .filter(|c| !c.is_hardened())
        .map(|c| c.index())
        .collect();

    u32::try_from(indices.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::derivation_path::DerivationPath;

    #[test]
    fn test_scan_options_from_config() {
        let config = ScanConfig {
            max_consecutive_inactive: 5,
            start_index: 3,
            max_scan: 10,
            reference_chain_id: 43114,
        };
        let options = ScanOptions::from(&config);
        assert_eq!(options.max_consecutive_inactive, 5);
        assert_eq!(options.start_index, 3);
        assert_eq!(options.max_scan, 10);
        assert_eq!(ScanOptions::default().max_consecutive_inactive, 2);
    }

    #[test]
    fn test_count_evm_keys() {
        let key = |curve, path: &str| AddressPublicKey {
            curve,
            derivation_path: Some(DerivationPath::parse(path).unwrap()),
            key: "02".into(),
        };
        let keys = vec![
            key(CurveType::Secp256k1, "m/44'/60'/0'/0/0"),
            key(CurveType::Secp256k1, "m/44'/60'/0'/0/1"),
            key(CurveType::Secp256k1, "m/44'/9000'/0'/0/0"),
            key(CurveType::Ed25519, "m/44'/501'/0'/0'"),
        ];
        assert_eq!(count_evm_keys(&keys), 2);
    }

    #[test]
    fn test_count_evm_keys_ignores_duplicates_and_deeper_paths() {
        let key = |path: &str| AddressPublicKey {
            curve: CurveType::Secp256k1,
            derivation_path: Some(DerivationPath::parse(path).unwrap()),
            key: "02".into(),
        };
        let keys = vec![
            key("m/44'/60'/0'/0/0"),
            key("m/44'/60'/0'/0/0"),
            key("m/44'/60'/0'/0/1"),
            key("m/44'/60'/0'/0/1/5"),
            key("m/44'/60'/0'/0/2'"),
            key("m/44'/60'/0'/1/3"),
            key("m/44'/60'/0'/0"),
        ];
        assert_eq!(count_evm_keys(&keys), 2);
    }
}
