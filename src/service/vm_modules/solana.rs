//! Solana 模块（ed25519, m/44'/501'/{index}'/0'）

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
    utils::address_codec::solana_address,
};

pub struct SolanaModule {
    resolver: Arc<SecretResolver>,
}

impl SolanaModule {
    pub fn new(resolver: Arc<SecretResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl VmModule for SolanaModule {
    fn id(&self) -> &'static str {
        "solana"
    }

    fn address_spaces(&self) -> &'static [VmAddressSpace] {
        &[VmAddressSpace::Svm]
    }

    fn build_derivation_path(
        &self,
        account_index: u64,
        path_type: DerivationPathType,
    ) -> KeyResult<BTreeMap<VmAddressSpace, DerivationPath>> {
        let path = build_path(
            CurveType::Ed25519,
            account_index,
            VmAddressSpace::Svm,
            path_type,
        )?;
        Ok(BTreeMap::from([(VmAddressSpace::Svm, path)]))
    }

    async fn derive_address(
        &self,
        request: &DeriveAddressRequest,
    ) -> anyhow::Result<BTreeMap<VmAddressSpace, String>> {
        let paths =
            self.build_derivation_path(request.account_index, request.derivation_path_type)?;
        let path = paths
            .get(&VmAddressSpace::Svm)
            .context("missing Svm derivation path")?;

        let public_key = self
            .resolver
            .derive_public_key(&request.secret_id, CurveType::Ed25519, Some(path))
            .await
            .with_context(|| format!("Solana public key at {}", path))?;

        Ok(BTreeMap::from([(
            VmAddressSpace::Svm,
            solana_address(&public_key)?,
        )]))
    }
}
