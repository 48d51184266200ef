//! VM 地址模块
//!
//! 每个模块负责一个链族：构建自己的派生路径，并基于已解析的密钥记录派生地址。
//! 注册表在启动时组装，按地址空间枚举键控。

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        chain_config::{ChainConfig, DerivationPathType, VmAddressSpace},
        derivation_path::DerivationPath,
    },
    error::KeyResult,
    service::secret_resolver::SecretResolver,
};

pub mod avalanche;
pub mod btc;
pub mod evm;
pub mod solana;

pub use avalanche::{AvalancheChain, AvalancheModule};
pub use btc::BitcoinModule;
pub use evm::EvmModule;
pub use solana::SolanaModule;

/// 地址派生请求
///
/// 只携带密钥记录 ID，模块通过 `SecretResolver` 取公钥，从不接触原始密钥
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriveAddressRequest {
    pub secret_id: String,
    pub account_index: u64,
    /// 触发该模块的网络（决定主网/测试网编码）
    pub network: ChainConfig,
    #[serde(default)]
    pub derivation_path_type: DerivationPathType,
}

/// VM 地址模块
#[async_trait]
pub trait VmModule: Send + Sync {
    /// 模块标识（去重依据）
    fn id(&self) -> &'static str;

    /// 覆盖的地址空间
    fn address_spaces(&self) -> &'static [VmAddressSpace];

    /// 各地址空间在给定账户下的派生路径
    fn build_derivation_path(
        &self,
        account_index: u64,
        path_type: DerivationPathType,
    ) -> KeyResult<BTreeMap<VmAddressSpace, DerivationPath>>;

    /// 派生各地址空间的地址
    async fn derive_address(
        &self,
        request: &DeriveAddressRequest,
    ) -> anyhow::Result<BTreeMap<VmAddressSpace, String>>;
}

/// 模块注册表
#[derive(Default, Clone)]
pub struct VmModuleRegistry {
    modules: BTreeMap<VmAddressSpace, Arc<dyn VmModule>>,
}

impl VmModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置模块：EVM、Bitcoin、Avalanche (X/P/CoreEth)、Solana
    pub fn with_default_modules(resolver: Arc<SecretResolver>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EvmModule::new(Arc::clone(&resolver))));
        registry.register(Arc::new(BitcoinModule::new(Arc::clone(&resolver))));
        registry.register(Arc::new(AvalancheModule::new(Arc::clone(&resolver))));
        registry.register(Arc::new(SolanaModule::new(resolver)));
        registry
    }

    /// 注册模块（覆盖其声明的全部地址空间）
    pub fn register(&mut self, module: Arc<dyn VmModule>) {
        for space in module.address_spaces() {
            self.modules.insert(*space, Arc::clone(&module));
        }
    }

    pub fn module_for(&self, space: VmAddressSpace) -> Option<Arc<dyn VmModule>> {
        self.modules.get(&space).cloned()
    }

    /// 已注册的地址空间
    pub fn address_spaces(&self) -> Vec<VmAddressSpace> {
        self.modules.keys().copied().collect()
    }

    /// 覆盖给定网络集合所需的去重模块，按网络顺序，附带首个触发网络
    pub fn distinct_modules_for<'a, I>(&self, networks: I) -> Vec<(Arc<dyn VmModule>, ChainConfig)>
    where
        I: IntoIterator<Item = &'a ChainConfig>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for network in networks {
            if let Some(module) = self.modules.get(&network.vm) {
                if seen.insert(module.id()) {
                    out.push((Arc::clone(module), network.clone()));
                }
            }
        }
        out
    }
}
