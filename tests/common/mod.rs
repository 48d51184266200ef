//! 测试辅助模块
//! 提供内存协作者与预置钱包

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ironcore_keyring::{
    domain::{
        chain_config::{ChainConfig, DerivationPathType, VmAddressSpace},
        derivation_path::DerivationPath,
        secrets::{AddressPublicKey, SeedPhraseRecord, WalletSecretRecord},
    },
    error::KeyResult,
    infrastructure::secure_storage::InMemorySecureStorage,
    service::{
        account_scanner::{ActivityQuery, RemoteSigner, TransactionHistory},
        secret_resolver::SecretResolver,
        vm_modules::{DeriveAddressRequest, VmModule},
    },
};

/// BIP39 标准测试助记词
pub const MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// 该助记词账户 0 的 EVM 地址
pub const EVM_ADDRESS_0: &str = "0x9858EfFD232B4033E47d90003D23EC58E053e11f";

pub fn seed_phrase_record(id: &str, wallet_id: &str) -> WalletSecretRecord {
    WalletSecretRecord::SeedPhrase(SeedPhraseRecord {
        id: id.into(),
        wallet_id: wallet_id.into(),
        mnemonic: MNEMONIC.into(),
        derivation_path_type: DerivationPathType::Bip44,
        extended_public_keys: vec![],
        public_keys: vec![],
    })
}

/// 创建带给定记录的密钥解析器
pub async fn resolver_with(records: Vec<WalletSecretRecord>) -> Arc<SecretResolver> {
    let resolver = Arc::new(SecretResolver::new(Arc::new(InMemorySecureStorage::new())));
    for record in records {
        resolver.update(record).await.expect("seed test record");
    }
    resolver
}

/// 助记词钱包 "w1"，记录 ID "seed"
pub async fn seeded_resolver() -> Arc<SecretResolver> {
    resolver_with(vec![seed_phrase_record("seed", "w1")]).await
}

/// 单次活动查询的脚本化结果
#[derive(Debug, Clone)]
pub enum Activity {
    Active,
    Inactive,
    Fail,
}

/// 按脚本依次返回的活动查询，脚本耗尽后返回不活跃
#[derive(Default)]
pub struct ScriptedActivity {
    script: Mutex<VecDeque<Activity>>,
    queried: Mutex<Vec<String>>,
}

impl ScriptedActivity {
    pub fn new(script: Vec<Activity>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            queried: Mutex::new(Vec::new()),
        }
    }

    /// 已查询的地址（按顺序）
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityQuery for ScriptedActivity {
    async fn get_transaction_history(
        &self,
        _network: &ChainConfig,
        address: &str,
    ) -> anyhow::Result<TransactionHistory> {
        self.queried.lock().unwrap().push(address.to_string());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Activity::Inactive);

        match next {
            Activity::Active => Ok(TransactionHistory {
                transactions: vec![serde_json::json!({ "hash": "0x01" })],
            }),
            Activity::Inactive => Ok(TransactionHistory::default()),
            Activity::Fail => anyhow::bail!("activity indexer unavailable"),
        }
    }
}

/// 返回固定预置密钥的远程签名器
pub struct StaticRemoteSigner {
    pub keys: Vec<AddressPublicKey>,
    pub fail: bool,
}

#[async_trait]
impl RemoteSigner for StaticRemoteSigner {
    async fn provisioned_keys(&self, _wallet_id: &str) -> anyhow::Result<Vec<AddressPublicKey>> {
        if self.fail {
            anyhow::bail!("remote signer session expired");
        }
        Ok(self.keys.clone())
    }
}

/// 总是派生失败的模块（模拟硬件设备断开）
pub struct FailingModule {
    pub spaces: &'static [VmAddressSpace],
}

#[async_trait]
impl VmModule for FailingModule {
    fn id(&self) -> &'static str {
        "failing"
    }

    fn address_spaces(&self) -> &'static [VmAddressSpace] {
        self.spaces
    }

    fn build_derivation_path(
        &self,
        _account_index: u64,
        _path_type: DerivationPathType,
    ) -> KeyResult<BTreeMap<VmAddressSpace, DerivationPath>> {
        Ok(BTreeMap::new())
    }

    async fn derive_address(
        &self,
        _request: &DeriveAddressRequest,
    ) -> anyhow::Result<BTreeMap<VmAddressSpace, String>> {
        anyhow::bail!("device disconnected")
    }
}
