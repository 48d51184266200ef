//! 密钥解析错误类型
//!
//! 派生、路径和数据可用性错误统一在 `KeyResolutionError` 中，
//! 多模块聚合的部分失败不走错误通道（见 `service::address_resolver::ResolvedAddresses`）。

use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 调用方输入错误，不自动重试
    Input,
    /// 数据不可用（需提示用户重新连接设备或恢复钱包）
    DataAvailability,
    /// 存储或编码等内部错误
    Internal,
}

#[derive(Debug, Error)]
pub enum KeyResolutionError {
    #[error("Invalid account index: {0}")]
    InvalidAccountIndex(u64),

    #[error("Invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("Unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("No extended public key can derive path {0}")]
    MissingExtendedPublicKey(String),

    #[error("No public key found for derivation path {path} and curve {curve}")]
    PublicKeyNotFound { path: String, curve: String },

    #[error("Secrets not found: {0}")]
    SecretsNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Secure storage error: {0}")]
    Storage(String),

    #[error("Address encoding failed: {0}")]
    AddressEncoding(String),
}

pub type KeyResult<T> = std::result::Result<T, KeyResolutionError>;

impl KeyResolutionError {
    /// 稳定的错误码（供应用层映射提示文案）
    pub fn code(&self) -> &'static str {
        match self {
            KeyResolutionError::InvalidAccountIndex(_) => "invalid_account_index",
            KeyResolutionError::InvalidDerivationPath(_) => "invalid_derivation_path",
            KeyResolutionError::UnsupportedCurve(_) => "unsupported_curve",
            KeyResolutionError::MissingExtendedPublicKey(_) => "missing_extended_public_key",
            KeyResolutionError::PublicKeyNotFound { .. } => "public_key_not_found",
            KeyResolutionError::SecretsNotFound(_) => "secrets_not_found",
            KeyResolutionError::InvalidArgument(_) => "invalid_argument",
            KeyResolutionError::InvalidMnemonic(_) => "invalid_mnemonic",
            KeyResolutionError::Storage(_) => "storage_error",
            KeyResolutionError::AddressEncoding(_) => "address_encoding_failed",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            KeyResolutionError::InvalidAccountIndex(_)
            | KeyResolutionError::InvalidDerivationPath(_)
            | KeyResolutionError::UnsupportedCurve(_)
            | KeyResolutionError::InvalidArgument(_)
            | KeyResolutionError::InvalidMnemonic(_) => ErrorCategory::Input,
            KeyResolutionError::MissingExtendedPublicKey(_)
            | KeyResolutionError::PublicKeyNotFound { .. }
            | KeyResolutionError::SecretsNotFound(_) => ErrorCategory::DataAvailability,
            KeyResolutionError::Storage(_) | KeyResolutionError::AddressEncoding(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// 是否应提示用户重新连接硬件设备 / 恢复钱包
    pub fn requires_user_action(&self) -> bool {
        self.category() == ErrorCategory::DataAvailability
    }
}
