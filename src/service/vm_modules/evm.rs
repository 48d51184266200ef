//! EVM 模块（C-Chain / Ethereum）

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
    utils::address_codec::evm_address,
};

pub struct EvmModule {
    resolver: Arc<SecretResolver>,
}

impl EvmModule {
    pub fn new(resolver: Arc<SecretResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl VmModule for EvmModule {
    fn id(&self) -> &'static str {
        "evm"
    }

    fn address_spaces(&self) -> &'static [VmAddressSpace] {
        &[VmAddressSpace::Evm]
    }

    fn build_derivation_path(
        &self,
        account_index: u64,
        path_type: DerivationPathType,
    ) -> KeyResult<BTreeMap<VmAddressSpace, DerivationPath>> {
        let path = build_path(
            CurveType::Secp256k1,
            account_index,
            VmAddressSpace::Evm,
            path_type,
        )?;
        Ok(BTreeMap::from([(VmAddressSpace::Evm, path)]))
    }

    async fn derive_address(
        &self,
        request: &DeriveAddressRequest,
    ) -> anyhow::Result<BTreeMap<VmAddressSpace, String>> {
        let paths =
            self.build_derivation_path(request.account_index, request.derivation_path_type)?;
        let path = paths
            .get(&VmAddressSpace::Evm)
            .context("missing Evm derivation path")?;

        let public_key = self
            .resolver
            .derive_public_key(&request.secret_id, CurveType::Secp256k1, Some(path))
            .await
            .with_context(|| format!("EVM public key at {}", path))?;

        Ok(BTreeMap::from([(
            VmAddressSpace::Evm,
            evm_address(&public_key)?,
        )]))
    }
}
