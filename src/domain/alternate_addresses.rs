//! X/P 地址视图合并
//!
//! 把查询得到的（可能缺失或不完整的）X/P 地址集合与账户已知的 P-Chain 地址合并。
//! 地址列表与地址字典各自独立回退，纯函数，无 I/O。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const CHAIN_PREFIXES: [&str; 3] = ["p-", "c-", "x-"];

/// 去掉链别名前缀（P-/C-/X-，不区分大小写）
///
/// 重复前缀也会一并去掉，因此多次调用与一次调用结果相同
pub fn strip_address_prefix(address: &str) -> &str {
    let mut rest = address;
    while rest.len() >= 2
        && rest.is_char_boundary(2)
        && CHAIN_PREFIXES.contains(&rest[..2].to_ascii_lowercase().as_str())
    {
        rest = &rest[2..];
    }
    rest
}

/// 地址所在的 HD 分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressSpaceKind {
    /// 外部（收款）地址，change = 0
    #[serde(rename = "e", alias = "external")]
    External,
    /// 内部（找零）地址，change = 1
    #[serde(rename = "i", alias = "internal")]
    Internal,
}

/// 地址字典条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateAddressEntry {
    pub space: AddressSpaceKind,
    pub index: u32,
    pub has_activity: bool,
}

/// 以去前缀地址为键的字典
pub type AlternateAddressDictionary = BTreeMap<String, AlternateAddressEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueriedAddress {
    pub address: String,
}

/// 索引服务返回的地址集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueriedAlternateAddresses {
    #[serde(default)]
    pub addresses: Option<Vec<QueriedAddress>>,
    #[serde(default)]
    pub dictionary: Option<AlternateAddressDictionary>,
}

/// 合并后的视图
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateAddressView {
    pub addresses: Vec<String>,
    pub dictionary: AlternateAddressDictionary,
}

/// 合并查询结果与回退地址
///
/// - 地址列表：查询结果非空则按原顺序去前缀使用，否则使用回退地址，否则为空
/// - 字典：查询结果存在则原样使用，否则以回退地址合成一条
///   `{ External, 0, false }`，否则为空
pub fn merge_alternate_addresses(
    queried: Option<&QueriedAlternateAddresses>,
    fallback_address: Option<&str>,
) -> AlternateAddressView {
    let fallback = fallback_address
        .map(strip_address_prefix)
        .filter(|a| !a.is_empty());

    let addresses = match queried.and_then(|q| q.addresses.as_ref()) {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(|a| strip_address_prefix(&a.address).to_string())
            .collect(),
        _ => fallback.map(|a| vec![a.to_string()]).unwrap_or_default(),
    };

    let dictionary = match queried.and_then(|q| q.dictionary.as_ref()) {
        Some(dict) => dict.clone(),
        None => fallback
            .map(|a| {
                let mut dict = AlternateAddressDictionary::new();
                dict.insert(
                    a.to_string(),
                    AlternateAddressEntry {
                        space: AddressSpaceKind::External,
                        index: 0,
                        has_activity: false,
                    },
                );
                dict
            })
            .unwrap_or_default(),
    };

    AlternateAddressView {
        addresses,
        dictionary,
    }
}
