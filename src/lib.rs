//! IronCore Keyring - 多链地址派生与密钥解析
//!
//! 从钱包密钥材料（助记词、扩展公钥、远程签名器预置公钥）派生各 VM 地址空间的
//! 账户地址。只处理公钥，私钥与助记词从不离开 `SecretResolver`。

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{KeyResolutionError, KeyResult};

pub mod prelude {
    pub use crate::{
        config::Config,
        domain::{
            Account, ChainConfig, ChainRegistry, CurveType, DerivationPath, DerivationPathType,
            VmAddressSpace, WalletSecretRecord, WalletType,
        },
        error::{KeyResolutionError, KeyResult},
        infrastructure::secure_storage::{InMemorySecureStorage, SecureStorage},
        service::{
            ActiveAccountScanner, ActivityQuery, AddressResolver, ResolveAddressesRequest,
            ScanOptions, SecretResolver, VmModuleRegistry,
        },
    };
}
