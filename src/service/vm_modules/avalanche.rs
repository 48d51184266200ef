//! Avalanche 模块
//!
//! - X/P: m/44'/9000'/... 公钥，bech32 编码，前缀 X-/P-
//! - CoreEth: EVM 公钥 (m/44'/60'/...) 的 bech32 形式，前缀 C-

use std::{collections::BTreeMap, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DeriveAddressRequest, VmModule};
use crate::{
    domain::{
        chain_config::{CurveType, DerivationPathType, VmAddressSpace},
        derivation_path::{build_path, chain_path, check_account_index, ChildIndex, DerivationPath},
        secrets::WalletSecretRecord,
    },
    error::KeyResult,
    service::secret_resolver::SecretResolver,
    utils::address_codec::prefixed_avalanche_address,
};

/// X/P 链别名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvalancheChain {
    X,
    P,
}

impl AvalancheChain {
    pub fn prefix(&self) -> &'static str {
        match self {
            AvalancheChain::X => "X-",
            AvalancheChain::P => "P-",
        }
    }
}

pub struct AvalancheModule {
    resolver: Arc<SecretResolver>,
}

impl AvalancheModule {
    pub fn new(resolver: Arc<SecretResolver>) -> Self {
        Self { resolver }
    }

    /// 按 HD 索引派生 X/P 地址
    ///
    /// 路径为 `m/44'/9000'/0'/{change}/{index}`。远程签名器钱包没有可用的
    /// 扩展公钥，返回空列表；找零地址只存在于 X 链，P 链找零请求同样返回空列表。
    pub async fn addresses_by_indices(
        &self,
        secret_id: &str,
        indices: &[u32],
        chain: AvalancheChain,
        is_change: bool,
        is_testnet: bool,
    ) -> KeyResult<Vec<String>> {
        if is_change && chain != AvalancheChain::X {
            return Ok(Vec::new());
        }

        let record = self.resolver.get_secrets_by_id(secret_id).await?;
        if matches!(record, WalletSecretRecord::RemoteSigner(_)) {
            debug!(secret_id, "Remote signer wallets have no X/P index derivation");
            return Ok(Vec::new());
        }

        let chain_root = chain_path(VmAddressSpace::Avm, is_change);

        let mut addresses = Vec::with_capacity(indices.len());
        for index in indices {
            let index = check_account_index(u64::from(*index))?;
            let path = chain_root.child(ChildIndex::normal(index)?);

            let public_key = self
                .resolver
                .derive_public_key(secret_id, CurveType::Secp256k1, Some(&path))
                .await?;
            addresses.push(prefixed_avalanche_address(
                chain.prefix(),
                &public_key,
                is_testnet,
            )?);
        }

        Ok(addresses)
    }
}

#[async_trait]
impl VmModule for AvalancheModule {
    fn id(&self) -> &'static str {
        "avalanche"
    }

    fn address_spaces(&self) -> &'static [VmAddressSpace] {
        &[
            VmAddressSpace::Avm,
            VmAddressSpace::Pvm,
            VmAddressSpace::CoreEth,
        ]
    }

    fn build_derivation_path(
        &self,
        account_index: u64,
        path_type: DerivationPathType,
    ) -> KeyResult<BTreeMap<VmAddressSpace, DerivationPath>> {
        self.address_spaces()
            .iter()
            .map(|space| {
                build_path(CurveType::Secp256k1, account_index, *space, path_type)
                    .map(|path| (*space, path))
            })
            .collect()
    }

    async fn derive_address(
        &self,
        request: &DeriveAddressRequest,
    ) -> anyhow::Result<BTreeMap<VmAddressSpace, String>> {
        let paths =
            self.build_derivation_path(request.account_index, request.derivation_path_type)?;
        let xp_path = paths
            .get(&VmAddressSpace::Avm)
            .context("missing Avm derivation path")?;
        let evm_path = paths
            .get(&VmAddressSpace::CoreEth)
            .context("missing CoreEth derivation path")?;
        let is_testnet = request.network.is_testnet;

        // X 与 P 共用同一公钥
        let xp_key = self
            .resolver
            .derive_public_key(&request.secret_id, CurveType::Secp256k1, Some(xp_path))
            .await
            .with_context(|| format!("X/P public key at {}", xp_path))?;
        let evm_key = self
            .resolver
            .derive_public_key(&request.secret_id, CurveType::Secp256k1, Some(evm_path))
            .await
            .with_context(|| format!("CoreEth public key at {}", evm_path))?;

        let mut addresses = BTreeMap::new();
        for space in self.address_spaces() {
            let (key, prefix) = match space {
                VmAddressSpace::CoreEth => (&evm_key, "C-"),
                VmAddressSpace::Avm => (&xp_key, AvalancheChain::X.prefix()),
                _ => (&xp_key, AvalancheChain::P.prefix()),
            };
            addresses.insert(*space, prefixed_avalanche_address(prefix, key, is_testnet)?);
        }

        Ok(addresses)
    }
}
