//! 公钥派生
//!
//! - secp256k1: BIP32，输出 33 字节压缩公钥
//! - ed25519: SLIP-0010（仅硬化派生），输出 32 字节公钥
//!
//! 所有函数均为纯函数，不做 I/O

use bip39::{Language, Mnemonic};
use coins_bip32::{
    enc::{MainnetEncoder, XKeyEncoder},
    path::DerivationPath as Bip32Path,
    xkeys::{Parent, XPriv, XPub},
};
use hmac::{Hmac, Mac};
use k256::ecdsa::{SigningKey, VerifyingKey};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::{
    domain::{chain_config::CurveType, derivation_path::DerivationPath},
    error::{KeyResolutionError, KeyResult},
};

type HmacSha512 = Hmac<Sha512>;

/// SLIP-0010 ed25519 主密钥 HMAC key
const ED25519_SEED_KEY: &[u8] = b"ed25519 seed";

/// 助记词 → BIP39 种子（空密码）
pub fn mnemonic_to_seed(mnemonic: &str) -> KeyResult<Zeroizing<[u8; 64]>> {
    let mnemonic = Mnemonic::parse_in(Language::English, mnemonic)
        .map_err(|e| KeyResolutionError::InvalidMnemonic(e.to_string()))?;

    Ok(Zeroizing::new(mnemonic.to_seed("")))
}

/// 从种子派生指定路径的原始公钥（hex）
pub fn derive_from_seed(
    seed: &[u8],
    curve: CurveType,
    path: &DerivationPath,
) -> KeyResult<String> {
    match curve {
        CurveType::Secp256k1 => derive_secp256k1(seed, path).map(hex::encode),
        CurveType::Ed25519 => derive_ed25519(seed, path).map(hex::encode),
        other => Err(KeyResolutionError::UnsupportedCurve(other.to_string())),
    }
}

/// 从扩展公钥派生后缀路径的压缩公钥（hex）
///
/// 后缀只能包含非硬化层级
pub fn derive_from_extended_key(xpub: &str, suffix: &DerivationPath) -> KeyResult<String> {
    let xpub = MainnetEncoder::xpub_from_base58(xpub)
        .map_err(|e| KeyResolutionError::InvalidArgument(format!("invalid xpub: {}", e)))?;

    if suffix.has_hardened() {
        return Err(KeyResolutionError::MissingExtendedPublicKey(format!(
            "suffix {} contains a hardened step",
            suffix
        )));
    }

    let derived: XPub = xpub
        .derive_path(bip32_path(suffix))
        .map_err(|e| KeyResolutionError::InvalidDerivationPath(e.to_string()))?;

    let verifying_key: &VerifyingKey = derived.as_ref();
    Ok(hex::encode(verifying_key.to_encoded_point(true).as_bytes()))
}

/// 导出祖先节点的扩展公钥（base58 `xpub...`）
pub fn export_extended_public_key(seed: &[u8], path: &DerivationPath) -> KeyResult<String> {
    let node = derive_xpriv(seed, path)?;

    MainnetEncoder::xpub_to_base58(&node.verify_key())
        .map_err(|e| KeyResolutionError::InvalidArgument(format!("xpub encoding failed: {}", e)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// secp256k1 (BIP32)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 按已校验的层级构建 BIP32 路径（不经过字符串）
fn bip32_path(path: &DerivationPath) -> Bip32Path {
    Bip32Path::from(path.raw_indices())
}

fn derive_xpriv(seed: &[u8], path: &DerivationPath) -> KeyResult<XPriv> {
    let master_key = XPriv::root_from_seed(seed, None)
        .map_err(|e| KeyResolutionError::InvalidArgument(format!("invalid seed: {}", e)))?;

    master_key
        .derive_path(bip32_path(path))
        .map_err(|e| KeyResolutionError::InvalidDerivationPath(e.to_string()))
}

fn derive_secp256k1(seed: &[u8], path: &DerivationPath) -> KeyResult<Vec<u8>> {
    let derived_key = derive_xpriv(seed, path)?;

    // XPriv 实现 AsRef<SigningKey>
    let signing_key: &SigningKey = derived_key.as_ref();
    let public_key = signing_key.verifying_key().to_encoded_point(true);

    Ok(public_key.as_bytes().to_vec())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ed25519 (SLIP-0010)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> KeyResult<Zeroizing<[u8; 64]>> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| KeyResolutionError::InvalidArgument(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }

    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// SLIP-0010 私钥派生，返回 (key, chain_code)
fn slip10_ed25519_private(
    seed: &[u8],
    path: &DerivationPath,
) -> KeyResult<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>)> {
    let master = hmac_sha512(ED25519_SEED_KEY, &[seed])?;

    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&master[..32]);
    chain_code.copy_from_slice(&master[32..]);

    for component in path.components() {
        // ed25519 只支持硬化派生
        if !component.is_hardened() {
            return Err(KeyResolutionError::InvalidDerivationPath(format!(
                "ed25519 requires hardened steps, got '{}' in {}",
                component, path
            )));
        }

        let index = component.raw().to_be_bytes();
        let child = hmac_sha512(&chain_code[..], &[&[0u8][..], &key[..], &index[..]])?;
        key.copy_from_slice(&child[..32]);
        chain_code.copy_from_slice(&child[32..]);
    }

    Ok((key, chain_code))
}

fn derive_ed25519(seed: &[u8], path: &DerivationPath) -> KeyResult<Vec<u8>> {
    use ed25519_dalek::SigningKey;

    let (key, _) = slip10_ed25519_private(seed, path)?;
    let signing_key = SigningKey::from_bytes(&key);

    Ok(signing_key.verifying_key().to_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn vector1_seed() -> Vec<u8> {
        hex::decode("000102030405060708090a0b0c0d0e0f").unwrap()
    }

    fn path(p: &str) -> DerivationPath {
        DerivationPath::parse(p).unwrap()
    }

    #[test]
    fn test_bip32_vector1() {
        let master = derive_from_seed(&vector1_seed(), CurveType::Secp256k1, &path("m")).unwrap();
        assert_eq!(
            master,
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );

        let child = derive_from_seed(&vector1_seed(), CurveType::Secp256k1, &path("m/0'")).unwrap();
        assert_eq!(
            child,
            "035a784662a4a20a65bf6aab9ae98a6c068a81c52e4b032c0fb5400c706cfccc56"
        );
    }

    #[test]
    fn test_bip32_vector1_extended_keys() {
        assert_eq!(
            export_extended_public_key(&vector1_seed(), &path("m")).unwrap(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
        assert_eq!(
            export_extended_public_key(&vector1_seed(), &path("m/0'")).unwrap(),
            "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw"
        );
    }

    #[test]
    fn test_normal_and_hardened_steps_differ() {
        let seed = mnemonic_to_seed(ABANDON_MNEMONIC).unwrap();

        let normal =
            derive_from_seed(seed.as_ref(), CurveType::Secp256k1, &path("m/44'/9000'/0'/0/0"))
                .unwrap();
        let hardened =
            derive_from_seed(seed.as_ref(), CurveType::Secp256k1, &path("m/44'/9000'/0'/0/0'"))
                .unwrap();
        assert_ne!(normal, hardened);
    }

    #[test]
    fn test_slip10_ed25519_vector1() {
        let master = derive_from_seed(&vector1_seed(), CurveType::Ed25519, &path("m")).unwrap();
        assert_eq!(
            master,
            "a4b2856bfec510abab89753fac1ac0e1112364e7d250545963f135f2a33188ed"
        );

        let child = derive_from_seed(&vector1_seed(), CurveType::Ed25519, &path("m/0'")).unwrap();
        assert_eq!(
            child,
            "8c8a13df77a28f3445213a0f432fde644acaa215fc72dcdf300d5efaa85d350c"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = mnemonic_to_seed(ABANDON_MNEMONIC).unwrap();
        let p = path("m/44'/60'/0'/0/0");

        let first = derive_from_seed(seed.as_ref(), CurveType::Secp256k1, &p).unwrap();
        let second = derive_from_seed(seed.as_ref(), CurveType::Secp256k1, &p).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_curve_separation() {
        let seed = mnemonic_to_seed(ABANDON_MNEMONIC).unwrap();
        let p = path("m/44'/501'/0'/0'");

        let secp = derive_from_seed(seed.as_ref(), CurveType::Secp256k1, &p).unwrap();
        let ed = derive_from_seed(seed.as_ref(), CurveType::Ed25519, &p).unwrap();

        assert_ne!(secp, ed);
        assert_eq!(hex::decode(&secp).unwrap().len(), 33);
        assert_eq!(hex::decode(&ed).unwrap().len(), 32);
    }

    #[test]
    fn test_ed25519_rejects_normal_steps() {
        let err = derive_from_seed(&vector1_seed(), CurveType::Ed25519, &path("m/44'/501'/0/0"))
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::InvalidDerivationPath(_)));
    }

    #[test]
    fn test_unsupported_curves() {
        for curve in [CurveType::Sr25519, CurveType::P256] {
            let err = derive_from_seed(&vector1_seed(), curve, &path("m/0'")).unwrap_err();
            assert!(matches!(err, KeyResolutionError::UnsupportedCurve(_)));
        }
    }

    #[test]
    fn test_invalid_mnemonic() {
        let err = mnemonic_to_seed("not a valid mnemonic").unwrap_err();
        assert!(matches!(err, KeyResolutionError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_extended_key_matches_seed_derivation() {
        let seed = mnemonic_to_seed(ABANDON_MNEMONIC).unwrap();
        let xpub = export_extended_public_key(seed.as_ref(), &path("m/44'/9000'/0'")).unwrap();
        assert!(xpub.starts_with("xpub"));

        let via_xpub =
            derive_from_extended_key(&xpub, &DerivationPath::parse_relative("/0/0").unwrap())
                .unwrap();
        let via_seed =
            derive_from_seed(seed.as_ref(), CurveType::Secp256k1, &path("m/44'/9000'/0'/0/0"))
                .unwrap();

        assert_eq!(via_xpub, via_seed);
    }

    #[test]
    fn test_extended_key_rejects_hardened_suffix() {
        let seed = mnemonic_to_seed(ABANDON_MNEMONIC).unwrap();
        let xpub = export_extended_public_key(seed.as_ref(), &path("m/44'/60'")).unwrap();

        let err = derive_from_extended_key(&xpub, &DerivationPath::parse_relative("0'/0/0").unwrap())
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::MissingExtendedPublicKey(_)));
    }
}
