//! BIP44 派生路径
//!
//! 路径解析、前缀比较，以及 (曲线, 账户索引, 地址空间) → 路径 的构建

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    domain::chain_config::{CurveType, DerivationPathType, VmAddressSpace},
    error::{KeyResolutionError, KeyResult},
};

/// 硬化派生偏移量
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// 路径中的单个层级
///
/// `index` 总是小于 2^31，硬化与否只由 `hardened` 表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildIndex {
    index: u32,
    hardened: bool,
}

impl ChildIndex {
    pub fn new(index: u32, hardened: bool) -> KeyResult<Self> {
        if index >= HARDENED_OFFSET {
            return Err(KeyResolutionError::InvalidDerivationPath(format!(
                "child index {} must be below 2^31",
                index
            )));
        }
        Ok(Self { index, hardened })
    }

    pub fn normal(index: u32) -> KeyResult<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> KeyResult<Self> {
        Self::new(index, true)
    }

    /// 编译期常量层级（调用方保证 < 2^31）
    const fn fixed(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// BIP32 序列化值（硬化时加上 2^31）
    pub fn raw(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }

    fn parse(component: &str) -> KeyResult<Self> {
        let (digits, hardened) = match component
            .strip_suffix('\'')
            .or_else(|| component.strip_suffix('h'))
            .or_else(|| component.strip_suffix('H'))
        {
            Some(stripped) => (stripped, true),
            None => (component, false),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyResolutionError::InvalidDerivationPath(format!(
                "invalid path component '{}'",
                component
            )));
        }

        let index: u32 = digits.parse().map_err(|_| {
            KeyResolutionError::InvalidDerivationPath(format!(
                "path component '{}' out of range",
                component
            ))
        })?;

        Self::new(index, hardened)
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// 派生路径（绝对路径 `m/...` 或相对后缀）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath {
    components: Vec<ChildIndex>,
}

impl DerivationPath {
    pub fn new(components: Vec<ChildIndex>) -> Self {
        Self { components }
    }

    /// 解析以 `m` 开头的绝对路径
    pub fn parse(path: &str) -> KeyResult<Self> {
        let path = path.trim();
        let rest = match path {
            "m" | "M" => return Ok(Self::default()),
            _ => path
                .strip_prefix("m/")
                .or_else(|| path.strip_prefix("M/"))
                .ok_or_else(|| {
                    KeyResolutionError::InvalidDerivationPath(format!(
                        "'{}' must start with 'm/'",
                        path
                    ))
                })?,
        };

        Self::parse_components(rest)
    }

    /// 解析相对路径后缀，接受 `0/0`、`/0/0` 与 `m/0/0`
    pub fn parse_relative(suffix: &str) -> KeyResult<Self> {
        let suffix = suffix.trim();
        if suffix.starts_with('m') || suffix.starts_with('M') {
            return Self::parse(suffix);
        }

        let rest = suffix.strip_prefix('/').unwrap_or(suffix);
        if rest.is_empty() {
            return Ok(Self::default());
        }
        Self::parse_components(rest)
    }

    fn parse_components(rest: &str) -> KeyResult<Self> {
        let components = rest
            .split('/')
            .map(ChildIndex::parse)
            .collect::<KeyResult<Vec<_>>>()?;
        Ok(Self { components })
    }

    pub fn components(&self) -> &[ChildIndex] {
        &self.components
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// 是否包含硬化层级
    pub fn has_hardened(&self) -> bool {
        self.components.iter().any(|c| c.hardened)
    }

    /// `self` 是否为 `other` 的严格前缀（相等不算）
    pub fn is_strict_prefix_of(&self, other: &DerivationPath) -> bool {
        self.depth() < other.depth() && other.components.starts_with(&self.components)
    }

    /// 去掉 `ancestor` 前缀后的剩余后缀
    pub fn suffix_after(&self, ancestor: &DerivationPath) -> Option<DerivationPath> {
        self.components
            .strip_prefix(ancestor.components.as_slice())
            .map(|rest| DerivationPath::new(rest.to_vec()))
    }

    /// 追加一个层级
    pub fn child(&self, component: ChildIndex) -> DerivationPath {
        let mut components = self.components.clone();
        components.push(component);
        DerivationPath::new(components)
    }

    /// BIP32 序列化值列表
    pub fn raw_indices(&self) -> Vec<u32> {
        self.components.iter().map(ChildIndex::raw).collect()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = KeyResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 路径构建
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 校验账户索引（必须 < 2^31）
pub fn check_account_index(account_index: u64) -> KeyResult<u32> {
    u32::try_from(account_index)
        .ok()
        .filter(|idx| *idx < HARDENED_OFFSET)
        .ok_or(KeyResolutionError::InvalidAccountIndex(account_index))
}

/// 构建指定地址空间在给定账户索引下的派生路径
///
/// - secp256k1 (EVM/Bitcoin/CoreEth: 60, AVM/PVM: 9000)
///   - BIP44: `m/44'/{coin}'/0'/0/{index}`
///   - LedgerLive: `m/44'/{coin}'/{index}'/0/0`
/// - ed25519 (SVM): `m/44'/501'/{index}'/0'`
pub fn build_path(
    curve: CurveType,
    account_index: u64,
    space: VmAddressSpace,
    path_type: DerivationPathType,
) -> KeyResult<DerivationPath> {
    let index = check_account_index(account_index)?;

    if space.curve() != curve {
        return Err(KeyResolutionError::UnsupportedCurve(format!(
            "{} cannot derive {} addresses",
            curve, space
        )));
    }

    let coin = ChildIndex::fixed(space.coin_type(), true);
    let purpose = ChildIndex::fixed(44, true);

    let components = match (curve, path_type) {
        (CurveType::Ed25519, _) => vec![
            purpose,
            coin,
            ChildIndex::hardened(index)?,
            ChildIndex::fixed(0, true),
        ],
        (CurveType::Secp256k1, DerivationPathType::Bip44) => vec![
            purpose,
            coin,
            ChildIndex::fixed(0, true),
            ChildIndex::fixed(0, false),
            ChildIndex::normal(index)?,
        ],
        (CurveType::Secp256k1, DerivationPathType::LedgerLive) => vec![
            purpose,
            coin,
            ChildIndex::hardened(index)?,
            ChildIndex::fixed(0, false),
            ChildIndex::fixed(0, false),
        ],
        (other, _) => return Err(KeyResolutionError::UnsupportedCurve(other.to_string())),
    };

    Ok(DerivationPath::new(components))
}

/// BIP44 路径的便捷形式
pub fn build_bip44_path(
    curve: CurveType,
    account_index: u64,
    space: VmAddressSpace,
) -> KeyResult<DerivationPath> {
    build_path(curve, account_index, space, DerivationPathType::Bip44)
}

/// 账户级 (account-level) 路径：`m/44'/{coin}'/0'`
///
/// 硬件钱包在此层导出扩展公钥
pub fn account_root_path(space: VmAddressSpace) -> DerivationPath {
    DerivationPath::new(vec![
        ChildIndex::fixed(44, true),
        ChildIndex::fixed(space.coin_type(), true),
        ChildIndex::fixed(0, true),
    ])
}

/// BIP44 外部 (change = 0) 或内部 (change = 1) 链路径：`m/44'/{coin}'/0'/{change}`
pub fn chain_path(space: VmAddressSpace, is_change: bool) -> DerivationPath {
    account_root_path(space).child(ChildIndex::fixed(u32::from(is_change), false))
}
