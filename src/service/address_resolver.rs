//! 地址解析编排
//!
//! 遍历覆盖当前网络集合所需的去重模块，并发派生，按地址空间合并。
//! 单个模块失败只记录日志，不影响其他模块的结果。
//!
//! 同一钱包的账户创建/派生必须由调用方串行化（互斥或队列），
//! 并发派生会导致账户索引重复或缺失。

use std::{collections::BTreeMap, sync::Arc};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    domain::chain_config::{ChainRegistry, DerivationPathType, VmAddressSpace},
    infrastructure::log_redact::{redact_address, SensitiveRedact},
    service::{
        secret_resolver::SecretResolver,
        vm_modules::{DeriveAddressRequest, VmModuleRegistry},
    },
};

/// 地址解析请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveAddressesRequest {
    pub secret_id: String,
    pub is_testnet: bool,
    /// 缺省为 0
    #[serde(default)]
    pub account_index: Option<u64>,
    /// 缺省取自密钥记录
    #[serde(default)]
    pub derivation_path_type: Option<DerivationPathType>,
}

/// 解析结果（部分失败不是错误）
///
/// 缺失的地址空间表示"不可用"，不会以空字符串出现
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddresses {
    pub addresses: BTreeMap<VmAddressSpace, String>,
    /// 派生失败的模块 ID
    pub failed_modules: Vec<String>,
}

impl ResolvedAddresses {
    pub fn get(&self, space: VmAddressSpace) -> Option<&str> {
        self.addresses.get(&space).map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.failed_modules.is_empty()
    }
}

/// 地址解析器
pub struct AddressResolver {
    secrets: Arc<SecretResolver>,
    modules: VmModuleRegistry,
    chains: Arc<ChainRegistry>,
}

impl AddressResolver {
    pub fn new(
        secrets: Arc<SecretResolver>,
        modules: VmModuleRegistry,
        chains: Arc<ChainRegistry>,
    ) -> Self {
        Self {
            secrets,
            modules,
            chains,
        }
    }

    pub fn modules(&self) -> &VmModuleRegistry {
        &self.modules
    }

    /// 解析账户在各地址空间的地址
    ///
    /// 模块之间并发执行；合并按地址空间键控，结果与完成顺序无关
    pub async fn resolve_addresses(&self, request: &ResolveAddressesRequest) -> ResolvedAddresses {
        let account_index = request.account_index.unwrap_or(0);
        let derivation_path_type = match request.derivation_path_type {
            Some(path_type) => path_type,
            None => self.record_path_type(&request.secret_id).await,
        };

        let networks = self
            .chains
            .networks_for_address_derivation(request.is_testnet);
        let modules = self.modules.distinct_modules_for(networks);

        let tasks = modules.into_iter().map(|(module, network)| {
            let derive_request = DeriveAddressRequest {
                secret_id: request.secret_id.clone(),
                account_index,
                network,
                derivation_path_type,
            };
            async move {
                let result = module.derive_address(&derive_request).await;
                (module, result)
            }
        });

        let mut resolved = ResolvedAddresses::default();
        for (module, result) in join_all(tasks).await {
            match result {
                Ok(addresses) => {
                    // 只接受模块声明的地址空间，空地址视为不可用
                    for (space, address) in addresses {
                        if module.address_spaces().contains(&space) && !address.is_empty() {
                            resolved.addresses.insert(space, address);
                        }
                    }
                }
                Err(e) => {
                    error!(
                        module = module.id(),
                        secret_id = %request.secret_id,
                        account_index,
                        error = %format!("{:#}", e),
                        "Failed to derive addresses for module"
                    );
                    resolved.failed_modules.push(module.id().to_string());
                }
            }
        }

        info!(
            secret_id = %request.secret_id,
            account_index,
            resolved = resolved.addresses.len(),
            failed = resolved.failed_modules.len(),
            evm = %resolved
                .get(VmAddressSpace::Evm)
                .map(redact_address)
                .unwrap_or_default(),
            "Addresses resolved"
        );

        resolved
    }

    /// 请求未指定路径类型时使用密钥记录上的类型
    ///
    /// 记录读取失败时退回默认值，各模块随后会报告同样的错误
    async fn record_path_type(&self, secret_id: &str) -> DerivationPathType {
        match self.secrets.get_secrets_by_id(secret_id).await {
            Ok(record) => {
                debug!(record = %record.redact(), "Using record derivation path type");
                record.derivation_path_type()
            }
            Err(e) => {
                warn!(secret_id, error = %e, "Secret lookup failed, using default derivation path type");
                DerivationPathType::default()
            }
        }
    }
}
