//! 钱包密钥记录
//!
//! 三种后端共用一个带标签的枚举：
//! - 助记词（唯一持有私密材料的变体）
//! - 硬件钱包扩展公钥（Ledger / Keystone）
//! - 远程签名器（MPC / 托管），只有预取的公钥

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::{
    chain_config::{CurveType, DerivationPathType},
    derivation_path::DerivationPath,
};

/// 扩展公钥（在 `derivation_path` 祖先节点导出）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedPublicKey {
    pub curve: CurveType,
    pub derivation_path: DerivationPath,
    /// base58 编码的扩展公钥
    pub key: String,
}

impl ExtendedPublicKey {
    pub fn secp256k1(derivation_path: DerivationPath, key: impl Into<String>) -> Self {
        Self {
            curve: CurveType::Secp256k1,
            derivation_path,
            key: key.into(),
        }
    }
}

/// 缓存的地址公钥
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPublicKey {
    pub curve: CurveType,
    /// `None` 仅用于与地址空间相关而非路径相关的密钥
    pub derivation_path: Option<DerivationPath>,
    /// hex 编码的原始公钥
    pub key: String,
}

impl AddressPublicKey {
    pub fn new(curve: CurveType, derivation_path: DerivationPath, key: impl Into<String>) -> Self {
        Self {
            curve,
            derivation_path: Some(derivation_path),
            key: key.into(),
        }
    }

    /// `path` 为 `None` 时只匹配同样没有路径的密钥
    pub fn matches(&self, curve: CurveType, path: Option<&DerivationPath>) -> bool {
        self.curve == curve && self.derivation_path.as_ref() == path
    }
}

/// 在缓存列表中按 (曲线, 路径) 查找公钥
pub fn find_cached_public_key<'a>(
    public_keys: &'a [AddressPublicKey],
    curve: CurveType,
    path: Option<&DerivationPath>,
) -> Option<&'a AddressPublicKey> {
    public_keys.iter().find(|pk| pk.matches(curve, path))
}

/// 助记词记录
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SeedPhraseRecord {
    #[zeroize(skip)]
    pub id: String,
    #[zeroize(skip)]
    pub wallet_id: String,
    pub mnemonic: String,
    #[zeroize(skip)]
    #[serde(default)]
    pub derivation_path_type: DerivationPathType,
    #[zeroize(skip)]
    #[serde(default)]
    pub extended_public_keys: Vec<ExtendedPublicKey>,
    #[zeroize(skip)]
    #[serde(default)]
    pub public_keys: Vec<AddressPublicKey>,
}

impl fmt::Debug for SeedPhraseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedPhraseRecord")
            .field("id", &self.id)
            .field("wallet_id", &self.wallet_id)
            .field("mnemonic", &"[REDACTED]")
            .field("derivation_path_type", &self.derivation_path_type)
            .field("extended_public_keys", &self.extended_public_keys.len())
            .field("public_keys", &self.public_keys.len())
            .finish()
    }
}

/// 硬件钱包记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedKeyRecord {
    pub id: String,
    pub wallet_id: String,
    #[serde(default)]
    pub derivation_path_type: DerivationPathType,
    pub extended_public_keys: Vec<ExtendedPublicKey>,
    #[serde(default)]
    pub public_keys: Vec<AddressPublicKey>,
}

/// 远程签名器记录（无本地私密材料）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSignerRecord {
    pub id: String,
    pub wallet_id: String,
    #[serde(default)]
    pub derivation_path_type: DerivationPathType,
    pub public_keys: Vec<AddressPublicKey>,
}

/// 钱包密钥记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletSecretRecord {
    SeedPhrase(SeedPhraseRecord),
    ExtendedPublicKey(ExtendedKeyRecord),
    RemoteSigner(RemoteSignerRecord),
}

impl WalletSecretRecord {
    pub fn id(&self) -> &str {
        match self {
            WalletSecretRecord::SeedPhrase(r) => &r.id,
            WalletSecretRecord::ExtendedPublicKey(r) => &r.id,
            WalletSecretRecord::RemoteSigner(r) => &r.id,
        }
    }

    pub fn wallet_id(&self) -> &str {
        match self {
            WalletSecretRecord::SeedPhrase(r) => &r.wallet_id,
            WalletSecretRecord::ExtendedPublicKey(r) => &r.wallet_id,
            WalletSecretRecord::RemoteSigner(r) => &r.wallet_id,
        }
    }

    pub fn derivation_path_type(&self) -> DerivationPathType {
        match self {
            WalletSecretRecord::SeedPhrase(r) => r.derivation_path_type,
            WalletSecretRecord::ExtendedPublicKey(r) => r.derivation_path_type,
            WalletSecretRecord::RemoteSigner(r) => r.derivation_path_type,
        }
    }

    pub fn public_keys(&self) -> &[AddressPublicKey] {
        match self {
            WalletSecretRecord::SeedPhrase(r) => &r.public_keys,
            WalletSecretRecord::ExtendedPublicKey(r) => &r.public_keys,
            WalletSecretRecord::RemoteSigner(r) => &r.public_keys,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WalletSecretRecord::SeedPhrase(_) => "seed_phrase",
            WalletSecretRecord::ExtendedPublicKey(_) => "extended_public_key",
            WalletSecretRecord::RemoteSigner(_) => "remote_signer",
        }
    }
}
