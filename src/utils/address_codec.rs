//! 地址编码
//!
//! 公钥 (hex) → 各地址空间的地址字符串

use bitcoin::{
    hashes::{hash160, Hash},
    Address, Network, PublicKey as BitcoinPublicKey,
};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use crate::error::{KeyResolutionError, KeyResult};

fn decode_hex_key(public_key_hex: &str, expected_len: usize) -> KeyResult<Vec<u8>> {
    let bytes = hex::decode(public_key_hex.trim_start_matches("0x"))
        .map_err(|e| KeyResolutionError::AddressEncoding(format!("invalid public key hex: {}", e)))?;

    if bytes.len() != expected_len {
        return Err(KeyResolutionError::AddressEncoding(format!(
            "expected {} byte public key, got {}",
            expected_len,
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// EVM 地址（EIP-55 大小写校验）
pub fn evm_address(compressed_hex: &str) -> KeyResult<String> {
    let bytes = decode_hex_key(compressed_hex, 33)?;
    let public_key = k256::PublicKey::from_sec1_bytes(&bytes)
        .map_err(|e| KeyResolutionError::AddressEncoding(format!("invalid secp256k1 key: {}", e)))?;

    let uncompressed = public_key.to_encoded_point(false);
    // 去掉 0x04 前缀后取 Keccak256 的后 20 字节
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);

    Ok(to_checksum_address(&hex::encode(&hash[12..])))
}

/// 小写 hex（不含 0x）→ EIP-55 校验地址
/// https://eips.ethereum.org/EIPS/eip-55
pub fn to_checksum_address(lower_hex: &str) -> String {
    let lower = lower_hex.to_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Bitcoin P2WPKH 地址 (bc1q... / tb1q...)
pub fn bitcoin_address(compressed_hex: &str, is_testnet: bool) -> KeyResult<String> {
    let bytes = decode_hex_key(compressed_hex, 33)?;
    let public_key = BitcoinPublicKey::from_slice(&bytes)
        .map_err(|e| KeyResolutionError::AddressEncoding(format!("invalid secp256k1 key: {}", e)))?;

    let network = if is_testnet {
        Network::Testnet
    } else {
        Network::Bitcoin
    };

    let address = Address::p2wpkh(&public_key, network)
        .map_err(|e| KeyResolutionError::AddressEncoding(format!("p2wpkh failed: {}", e)))?;
    Ok(address.to_string())
}

/// Avalanche bech32 地址（不含链前缀）
///
/// `ripemd160(sha256(compressed))`，HRP 主网 `avax`、测试网 `fuji`
pub fn avalanche_bech32_address(compressed_hex: &str, is_testnet: bool) -> KeyResult<String> {
    let bytes = decode_hex_key(compressed_hex, 33)?;
    let key_hash = hash160::Hash::hash(&bytes).to_byte_array();

    let hrp = bech32::Hrp::parse(if is_testnet { "fuji" } else { "avax" })
        .map_err(|e| KeyResolutionError::AddressEncoding(format!("invalid HRP: {:?}", e)))?;

    bech32::encode::<bech32::Bech32>(hrp, &key_hash)
        .map_err(|e| KeyResolutionError::AddressEncoding(format!("bech32 encoding failed: {}", e)))
}

/// 带链前缀的 Avalanche 地址（X-/P-/C-）
pub fn prefixed_avalanche_address(
    prefix: &str,
    compressed_hex: &str,
    is_testnet: bool,
) -> KeyResult<String> {
    Ok(format!(
        "{}{}",
        prefix,
        avalanche_bech32_address(compressed_hex, is_testnet)?
    ))
}

/// Solana 地址（ed25519 公钥的 Base58）
pub fn solana_address(ed25519_hex: &str) -> KeyResult<String> {
    let bytes = decode_hex_key(ed25519_hex, 32)?;
    Ok(bs58::encode(bytes).into_string())
}
