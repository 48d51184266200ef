//! Domain 模块
//!
//! 密钥材料、派生路径、网络配置等领域模型与纯函数派生逻辑

pub mod account;
pub mod alternate_addresses;
pub mod chain_config;
pub mod derivation;
pub mod derivation_path;
pub mod extended_key;
pub mod secrets;

// 重新导出常用类型
pub use account::{Account, WalletType};
pub use alternate_addresses::{
    merge_alternate_addresses, strip_address_prefix, AlternateAddressView,
    QueriedAlternateAddresses,
};
pub use chain_config::{ChainConfig, ChainRegistry, CurveType, DerivationPathType, VmAddressSpace};
pub use derivation_path::{build_path, ChildIndex, DerivationPath};
pub use secrets::{AddressPublicKey, ExtendedPublicKey, WalletSecretRecord};
