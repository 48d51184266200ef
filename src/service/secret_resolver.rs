//! 钱包密钥解析服务
//!
//! 唯一持有解密后密钥记录的组件：
//! - 首次读取时从安全存储懒加载全部记录，并在进程内缓存
//! - `update` 在持久化之前清空缓存
//! - 公钥派生按记录变体分派，调用方只拿到公钥

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    domain::{
        chain_config::{CurveType, DerivationPathType, VmAddressSpace},
        derivation::{derive_from_seed, mnemonic_to_seed},
        derivation_path::{build_path, DerivationPath},
        extended_key::derive_via_ancestor,
        secrets::{find_cached_public_key, WalletSecretRecord},
    },
    error::{KeyResolutionError, KeyResult},
    infrastructure::{
        log_redact::redact_hex_string,
        secure_storage::{SecureStorage, WALLET_SECRETS_SLOT},
    },
};

/// 账户级公钥
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPublicKeys {
    /// EVM / Bitcoin / CoreEth 共用的 secp256k1 公钥
    pub evm: String,
    /// Avalanche X/P 共用的 secp256k1 公钥
    pub xp: String,
}

type SecretCache = Option<Arc<Vec<WalletSecretRecord>>>;

/// 密钥解析器
pub struct SecretResolver {
    storage: Arc<dyn SecureStorage>,
    cache: RwLock<SecretCache>,
}

impl SecretResolver {
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self {
            storage,
            cache: RwLock::new(None),
        }
    }

    async fn load_from_storage(&self) -> KeyResult<Vec<WalletSecretRecord>> {
        let raw = self
            .storage
            .load(WALLET_SECRETS_SLOT)
            .await
            .map_err(|e| KeyResolutionError::Storage(format!("{:#}", e)))?;

        match raw {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                KeyResolutionError::Storage(format!("corrupted wallet secrets: {}", e))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// 获取全部记录（缓存未命中时懒加载）
    async fn records(&self) -> KeyResult<Arc<Vec<WalletSecretRecord>>> {
        if let Some(records) = self.cache.read().await.as_ref() {
            return Ok(Arc::clone(records));
        }

        let mut cache = self.cache.write().await;
        // 等待写锁期间可能已被其他调用加载
        if let Some(records) = cache.as_ref() {
            return Ok(Arc::clone(records));
        }

        let records = Arc::new(self.load_from_storage().await?);
        debug!(count = records.len(), "Wallet secrets loaded into cache");
        *cache = Some(Arc::clone(&records));
        Ok(records)
    }

    /// 按钱包 ID 获取密钥记录
    pub async fn get_secrets(&self, wallet_id: &str) -> KeyResult<WalletSecretRecord> {
        self.records()
            .await?
            .iter()
            .find(|r| r.wallet_id() == wallet_id)
            .cloned()
            .ok_or_else(|| KeyResolutionError::SecretsNotFound(format!("wallet {}", wallet_id)))
    }

    /// 按记录 ID 获取密钥记录
    pub async fn get_secrets_by_id(&self, secret_id: &str) -> KeyResult<WalletSecretRecord> {
        self.records()
            .await?
            .iter()
            .find(|r| r.id() == secret_id)
            .cloned()
            .ok_or_else(|| KeyResolutionError::SecretsNotFound(format!("secret {}", secret_id)))
    }

    /// 派生公钥（hex）
    ///
    /// - 助记词：必须给出路径，直接从种子派生
    /// - 扩展公钥：缓存公钥 → 最长前缀扩展公钥派生 → 失败
    /// - 远程签名器：只查缓存公钥，不发起网络请求
    pub async fn derive_public_key(
        &self,
        secret_id: &str,
        curve: CurveType,
        path: Option<&DerivationPath>,
    ) -> KeyResult<String> {
        let record = self.get_secrets_by_id(secret_id).await?;

        let public_key = match &record {
            WalletSecretRecord::SeedPhrase(seed_record) => {
                let path = path.ok_or_else(|| {
                    KeyResolutionError::InvalidArgument(
                        "derivation path is required for seed phrase wallets".to_string(),
                    )
                })?;
                let seed = mnemonic_to_seed(&seed_record.mnemonic)?;
                derive_from_seed(seed.as_ref(), curve, path)?
            }
            WalletSecretRecord::ExtendedPublicKey(xpub_record) => {
                let path = path.ok_or_else(|| {
                    KeyResolutionError::InvalidArgument(
                        "derivation path is required for hardware wallets".to_string(),
                    )
                })?;

                if let Some(cached) =
                    find_cached_public_key(&xpub_record.public_keys, curve, Some(path))
                {
                    cached.key.clone()
                } else if curve == CurveType::Secp256k1 {
                    derive_via_ancestor(&xpub_record.extended_public_keys, path, curve)?
                } else {
                    return Err(not_found(Some(path), curve));
                }
            }
            WalletSecretRecord::RemoteSigner(remote) => {
                find_cached_public_key(&remote.public_keys, curve, path)
                    .map(|pk| pk.key.clone())
                    .ok_or_else(|| not_found(path, curve))?
            }
        };

        debug!(
            secret_id,
            kind = record.kind(),
            %curve,
            public_key = %redact_hex_string(&public_key, 6),
            "Public key resolved"
        );
        Ok(public_key)
    }

    /// 账户的 EVM 与 X/P 公钥
    pub async fn account_public_keys(
        &self,
        secret_id: &str,
        account_index: u64,
        path_type: DerivationPathType,
    ) -> KeyResult<AccountPublicKeys> {
        let evm_path = build_path(
            CurveType::Secp256k1,
            account_index,
            VmAddressSpace::Evm,
            path_type,
        )?;
        let xp_path = build_path(
            CurveType::Secp256k1,
            account_index,
            VmAddressSpace::Avm,
            path_type,
        )?;

        Ok(AccountPublicKeys {
            evm: self
                .derive_public_key(secret_id, CurveType::Secp256k1, Some(&evm_path))
                .await?,
            xp: self
                .derive_public_key(secret_id, CurveType::Secp256k1, Some(&xp_path))
                .await?,
        })
    }

    /// 写入或替换记录（按 ID）
    ///
    /// 持有写锁期间先清空缓存再持久化；持久化失败时缓存保持为空，
    /// 下一次读取会重新从存储加载
    pub async fn update(&self, record: WalletSecretRecord) -> KeyResult<()> {
        let mut cache = self.cache.write().await;
        *cache = None;

        let mut records = self.load_from_storage().await?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }

        let value = serde_json::to_value(&records)
            .map_err(|e| KeyResolutionError::Storage(format!("serialize failed: {}", e)))?;

        self.storage
            .store(WALLET_SECRETS_SLOT, value)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to persist wallet secrets");
                KeyResolutionError::Storage(format!("{:#}", e))
            })?;

        debug!(count = records.len(), "Wallet secrets updated");
        Ok(())
    }

    /// 清空进程内缓存
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    pub async fn is_cached(&self) -> bool {
        self.cache.read().await.is_some()
    }
}

fn not_found(path: Option<&DerivationPath>, curve: CurveType) -> KeyResolutionError {
    KeyResolutionError::PublicKeyNotFound {
        path: path
            .map(|p| p.to_string())
            .unwrap_or_else(|| "null".to_string()),
        curve: curve.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            derivation::export_extended_public_key,
            secrets::{
                AddressPublicKey, ExtendedKeyRecord, ExtendedPublicKey, RemoteSignerRecord,
                SeedPhraseRecord,
            },
        },
        infrastructure::secure_storage::InMemorySecureStorage,
    };

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn path(p: &str) -> DerivationPath {
        DerivationPath::parse(p).unwrap()
    }

    fn seed_record() -> WalletSecretRecord {
        WalletSecretRecord::SeedPhrase(SeedPhraseRecord {
            id: "seed-secret".into(),
            wallet_id: "seed-wallet".into(),
            mnemonic: MNEMONIC.into(),
            derivation_path_type: DerivationPathType::Bip44,
            extended_public_keys: vec![],
            public_keys: vec![],
        })
    }

    fn resolver() -> (SecretResolver, InMemorySecureStorage) {
        let storage = InMemorySecureStorage::new();
        (SecretResolver::new(Arc::new(storage.clone())), storage)
    }

    #[tokio::test]
    async fn test_secrets_not_found() {
        let (resolver, _) = resolver();

        let err = resolver.get_secrets("missing").await.unwrap_err();
        assert!(matches!(err, KeyResolutionError::SecretsNotFound(_)));
        assert!(err.requires_user_action());
    }

    #[tokio::test]
    async fn test_update_then_lookup() {
        let (resolver, _) = resolver();
        resolver.update(seed_record()).await.unwrap();

        assert_eq!(resolver.get_secrets("seed-wallet").await.unwrap().id(), "seed-secret");
        assert_eq!(
            resolver.get_secrets_by_id("seed-secret").await.unwrap().wallet_id(),
            "seed-wallet"
        );
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let (resolver, storage) = resolver();
        resolver.update(seed_record()).await.unwrap();
        resolver.get_secrets("seed-wallet").await.unwrap();
        assert!(resolver.is_cached().await);

        let remote = WalletSecretRecord::RemoteSigner(RemoteSignerRecord {
            id: "remote-secret".into(),
            wallet_id: "remote-wallet".into(),
            derivation_path_type: DerivationPathType::Bip44,
            public_keys: vec![],
        });
        resolver.update(remote).await.unwrap();
        assert!(!resolver.is_cached().await);

        assert!(resolver.get_secrets("remote-wallet").await.is_ok());
        let stored = storage.snapshot(WALLET_SECRETS_SLOT).await.unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_reloads_storage() {
        let (resolver, storage) = resolver();
        resolver.update(seed_record()).await.unwrap();
        resolver.get_secrets("seed-wallet").await.unwrap();

        // 绕过解析器直接清空存储，缓存仍然有效
        storage
            .store(WALLET_SECRETS_SLOT, serde_json::json!([]))
            .await
            .unwrap();
        assert!(resolver.get_secrets("seed-wallet").await.is_ok());

        resolver.invalidate().await;
        assert!(!resolver.is_cached().await);
        let err = resolver.get_secrets("seed-wallet").await.unwrap_err();
        assert!(matches!(err, KeyResolutionError::SecretsNotFound(_)));
    }

    #[tokio::test]
    async fn test_seed_phrase_requires_path() {
        let (resolver, _) = resolver();
        resolver.update(seed_record()).await.unwrap();

        let err = resolver
            .derive_public_key("seed-secret", CurveType::Secp256k1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_remote_signer_lookup() {
        let (resolver, _) = resolver();
        let evm_path = path("m/44'/60'/0'/0/0");
        resolver
            .update(WalletSecretRecord::RemoteSigner(RemoteSignerRecord {
                id: "remote-secret".into(),
                wallet_id: "remote-wallet".into(),
                derivation_path_type: DerivationPathType::Bip44,
                public_keys: vec![AddressPublicKey::new(
                    CurveType::Secp256k1,
                    evm_path.clone(),
                    "02abcd",
                )],
            }))
            .await
            .unwrap();

        let key = resolver
            .derive_public_key("remote-secret", CurveType::Secp256k1, Some(&evm_path))
            .await
            .unwrap();
        assert_eq!(key, "02abcd");

        let err = resolver
            .derive_public_key("remote-secret", CurveType::Ed25519, Some(&evm_path))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No public key found for derivation path m/44'/60'/0'/0/0 and curve ed25519"
        );
    }

    #[tokio::test]
    async fn test_hardware_wallet_policy() {
        let (resolver, _) = resolver();
        let seed = mnemonic_to_seed(MNEMONIC).unwrap();
        let xpub = export_extended_public_key(seed.as_ref(), &path("m/44'/60'/0'")).unwrap();
        let solana_path = path("m/44'/501'/0'/0'");

        resolver
            .update(WalletSecretRecord::ExtendedPublicKey(ExtendedKeyRecord {
                id: "ledger-secret".into(),
                wallet_id: "ledger-wallet".into(),
                derivation_path_type: DerivationPathType::Bip44,
                extended_public_keys: vec![ExtendedPublicKey::secp256k1(
                    path("m/44'/60'/0'"),
                    xpub,
                )],
                public_keys: vec![AddressPublicKey::new(
                    CurveType::Ed25519,
                    solana_path.clone(),
                    "aa".repeat(32),
                )],
            }))
            .await
            .unwrap();

        // 扩展公钥派生与助记词派生一致
        let evm_path = path("m/44'/60'/0'/0/5");
        let via_xpub = resolver
            .derive_public_key("ledger-secret", CurveType::Secp256k1, Some(&evm_path))
            .await
            .unwrap();
        assert_eq!(
            via_xpub,
            derive_from_seed(seed.as_ref(), CurveType::Secp256k1, &evm_path).unwrap()
        );

        // 缓存的 ed25519 公钥
        let solana = resolver
            .derive_public_key("ledger-secret", CurveType::Ed25519, Some(&solana_path))
            .await
            .unwrap();
        assert_eq!(solana, "aa".repeat(32));

        // 没有扩展公钥覆盖 → MissingExtendedPublicKey
        let err = resolver
            .derive_public_key(
                "ledger-secret",
                CurveType::Secp256k1,
                Some(&path("m/44'/9000'/0'/0/0")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::MissingExtendedPublicKey(_)));

        // 非 secp256k1 且未缓存 → PublicKeyNotFound
        let err = resolver
            .derive_public_key(
                "ledger-secret",
                CurveType::Ed25519,
                Some(&path("m/44'/501'/1'/0'")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::PublicKeyNotFound { .. }));
    }

    #[tokio::test]
    async fn test_account_public_keys() {
        let (resolver, _) = resolver();
        resolver.update(seed_record()).await.unwrap();

        let keys = resolver
            .account_public_keys("seed-secret", 0, DerivationPathType::Bip44)
            .await
            .unwrap();
        assert_eq!(keys.evm.len(), 66);
        assert_eq!(keys.xp.len(), 66);
        assert_ne!(keys.evm, keys.xp);

        let err = resolver
            .account_public_keys("seed-secret", 1 << 31, DerivationPathType::Bip44)
            .await
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::InvalidAccountIndex(_)));
    }
}
