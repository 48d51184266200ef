//! 扩展公钥匹配
//!
//! 在已导出的扩展公钥中为请求路径找到最长的严格前缀祖先，
//! 再用非硬化派生得到目标公钥，无需私钥

use crate::{
    domain::{
        chain_config::CurveType, derivation::derive_from_extended_key,
        derivation_path::DerivationPath, secrets::ExtendedPublicKey,
    },
    error::{KeyResolutionError, KeyResult},
};

/// 查找可派生 `requested` 的最佳祖先扩展公钥
///
/// 只有 secp256k1 扩展公钥可用；其他曲线直接返回 `UnsupportedCurve`
pub fn find_ancestor<'a>(
    xpubs: &'a [ExtendedPublicKey],
    requested: &DerivationPath,
    curve: CurveType,
) -> KeyResult<&'a ExtendedPublicKey> {
    if curve != CurveType::Secp256k1 {
        return Err(KeyResolutionError::UnsupportedCurve(format!(
            "{} keys cannot be derived from an extended public key",
            curve
        )));
    }

    xpubs
        .iter()
        .filter(|x| x.curve == CurveType::Secp256k1)
        .filter(|x| x.derivation_path.is_strict_prefix_of(requested))
        .max_by_key(|x| x.derivation_path.depth())
        .ok_or_else(|| KeyResolutionError::MissingExtendedPublicKey(requested.to_string()))
}

/// 通过最佳祖先扩展公钥派生 `requested` 的压缩公钥（hex）
pub fn derive_via_ancestor(
    xpubs: &[ExtendedPublicKey],
    requested: &DerivationPath,
    curve: CurveType,
) -> KeyResult<String> {
    let ancestor = find_ancestor(xpubs, requested, curve)?;

    let suffix = requested
        .suffix_after(&ancestor.derivation_path)
        .ok_or_else(|| KeyResolutionError::MissingExtendedPublicKey(requested.to_string()))?;

    // 扩展公钥无法派生硬化子节点
    if suffix.has_hardened() {
        return Err(KeyResolutionError::MissingExtendedPublicKey(format!(
            "{} requires hardened derivation below {}",
            requested, ancestor.derivation_path
        )));
    }

    derive_from_extended_key(&ancestor.key, &suffix)
}
