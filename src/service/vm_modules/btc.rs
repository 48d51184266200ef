//! Bitcoin 模块
//!
//! 复用 EVM 密钥 (m/44'/60'/...)，编码为 P2WPKH

use std::{collections::BTreeMap, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;

use super::{DeriveAddressRequest, VmModule};
use crate::{
    domain::{
        chain_config::{CurveType, DerivationPathType, VmAddressSpace},
        derivation_path::{build_path, DerivationPath},
    },
    error::KeyResult,
    service::secret_resolver::SecretResolver,
    utils::address_codec::bitcoin_address,
};

pub struct BitcoinModule {
    resolver: Arc<SecretResolver>,
}

impl BitcoinModule {
    pub fn new(resolver: Arc<SecretResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl VmModule for BitcoinModule {
    fn id(&self) -> &'static str {
        "bitcoin"
    }

    fn address_spaces(&self) -> &'static [VmAddressSpace] {
        &[VmAddressSpace::Bitcoin]
    }

    fn build_derivation_path(
        &self,
        account_index: u64,
        path_type: DerivationPathType,
    ) -> KeyResult<BTreeMap<VmAddressSpace, DerivationPath>> {
        let path = build_path(
            CurveType::Secp256k1,
            account_index,
            VmAddressSpace::Bitcoin,
            path_type,
        )?;
        Ok(BTreeMap::from([(VmAddressSpace::Bitcoin, path)]))
    }

    async fn derive_address(
        &self,
        request: &DeriveAddressRequest,
    ) -> anyhow::Result<BTreeMap<VmAddressSpace, String>> {
        let paths =
            self.build_derivation_path(request.account_index, request.derivation_path_type)?;
        let path = paths
            .get(&VmAddressSpace::Bitcoin)
            .context("missing Bitcoin derivation path")?;

        let public_key = self
            .resolver
            .derive_public_key(&request.secret_id, CurveType::Secp256k1, Some(path))
            .await
            .with_context(|| format!("Bitcoin public key at {}", path))?;

        Ok(BTreeMap::from([(
            VmAddressSpace::Bitcoin,
            bitcoin_address(&public_key, request.network.is_testnet)?,
        )]))
    }
}
