//! 日志脱敏
//!
//! 地址与公钥只以截断形式出现在日志中

/// 可脱敏trait
pub trait SensitiveRedact {
    fn redact(&self) -> String;
}

/// 脱敏十六进制字符串（显示前缀和后缀）
pub fn redact_hex_string(hex: &str, show_chars: usize) -> String {
    if hex.len() <= show_chars * 2 || !hex.is_ascii() {
        return "*".repeat(hex.chars().count());
    }

    let prefix = &hex[..show_chars];
    let suffix = &hex[hex.len() - show_chars..];
    format!("{}...{}", prefix, suffix)
}

/// 脱敏地址（显示前6位和后4位）
pub fn redact_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return "*".repeat(address.chars().count());
    }

    let prefix = &address[..6];
    let suffix = &address[address.len() - 4..];
    format!("{}...{}", prefix, suffix)
}

impl SensitiveRedact for crate::domain::secrets::AddressPublicKey {
    fn redact(&self) -> String {
        format!(
            "{}:{}:{}",
            self.curve,
            self.derivation_path
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            redact_hex_string(&self.key, 6)
        )
    }
}

impl SensitiveRedact for crate::domain::secrets::WalletSecretRecord {
    fn redact(&self) -> String {
        format!(
            "{}(id={}, wallet_id={}, public_keys={})",
            self.kind(),
            self.id(),
            self.wallet_id(),
            self.public_keys().len()
        )
    }
}
