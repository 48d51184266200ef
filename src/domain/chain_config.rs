//! 多链配置模块
//!
//! 定义加密曲线、VM 地址空间以及地址派生所用的网络注册表

use std::{collections::HashMap, fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};

/// 加密曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// secp256k1 曲线 (EVM, Bitcoin, Avalanche X/P)
    Secp256k1,
    /// ed25519 曲线 (Solana)
    Ed25519,
    /// sr25519 曲线 (未支持派生)
    Sr25519,
    /// NIST P-256 (未支持派生)
    P256,
}

impl CurveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveType::Secp256k1 => "secp256k1",
            CurveType::Ed25519 => "ed25519",
            CurveType::Sr25519 => "sr25519",
            CurveType::P256 => "p256",
        }
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VM 地址空间
///
/// 每个账户对每个地址空间持有一个地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VmAddressSpace {
    /// 账户模型 EVM (C-Chain / Ethereum)
    #[serde(rename = "EVM")]
    Evm,
    /// UTXO 模型 Bitcoin (P2WPKH)
    #[serde(rename = "BITCOIN")]
    Bitcoin,
    /// Avalanche X-Chain
    #[serde(rename = "AVM")]
    Avm,
    /// Avalanche P-Chain
    #[serde(rename = "PVM")]
    Pvm,
    /// C-Chain 的 bech32 形式 (原子交易使用)
    #[serde(rename = "CoreEth")]
    CoreEth,
    /// Solana
    #[serde(rename = "SVM")]
    Svm,
}

impl VmAddressSpace {
    pub const ALL: [VmAddressSpace; 6] = [
        VmAddressSpace::Evm,
        VmAddressSpace::Bitcoin,
        VmAddressSpace::Avm,
        VmAddressSpace::Pvm,
        VmAddressSpace::CoreEth,
        VmAddressSpace::Svm,
    ];

    /// 派生该地址空间公钥所用的曲线
    pub fn curve(&self) -> CurveType {
        match self {
            VmAddressSpace::Svm => CurveType::Ed25519,
            _ => CurveType::Secp256k1,
        }
    }

    /// SLIP-44 coin type
    ///
    /// Bitcoin 与 CoreEth 复用 EVM 密钥 (coin type 60)
    pub fn coin_type(&self) -> u32 {
        match self {
            VmAddressSpace::Evm | VmAddressSpace::Bitcoin | VmAddressSpace::CoreEth => 60,
            VmAddressSpace::Avm | VmAddressSpace::Pvm => 9000,
            VmAddressSpace::Svm => 501,
        }
    }

    /// 链别名前缀 (X-/P-/C-)
    pub fn chain_prefix(&self) -> Option<&'static str> {
        match self {
            VmAddressSpace::Avm => Some("X-"),
            VmAddressSpace::Pvm => Some("P-"),
            VmAddressSpace::CoreEth => Some("C-"),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VmAddressSpace::Evm => "EVM",
            VmAddressSpace::Bitcoin => "BITCOIN",
            VmAddressSpace::Avm => "AVM",
            VmAddressSpace::Pvm => "PVM",
            VmAddressSpace::CoreEth => "CoreEth",
            VmAddressSpace::Svm => "SVM",
        }
    }
}

impl fmt::Display for VmAddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HD 派生路径类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DerivationPathType {
    /// BIP44: m/44'/coin'/0'/0/{index}
    #[default]
    #[serde(rename = "bip44")]
    Bip44,
    /// Ledger Live: m/44'/coin'/{index}'/0/0
    #[serde(rename = "ledger_live")]
    LedgerLive,
}

/// 网络配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// CAIP-2 标识 (eip155:43114, bip122:..., avax:..., solana:...)
    pub caip2_id: String,
    /// 链 ID (EVM 为 EIP-155，其余为内部编号)
    pub chain_id: i64,
    /// 链名称
    pub name: String,
    /// 链符号
    pub symbol: String,
    /// 地址空间
    pub vm: VmAddressSpace,
    /// 是否为测试网
    pub is_testnet: bool,
}

/// 内置网络表（进程内只构建一次）
static BUILTIN_CHAINS: LazyLock<ChainRegistry> = LazyLock::new(ChainRegistry::new);

/// 网络注册表
pub struct ChainRegistry {
    configs: Vec<ChainConfig>,
    caip2_map: HashMap<String, usize>,
}

impl ChainRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        let mut registry = Self {
            configs: Vec::new(),
            caip2_map: HashMap::new(),
        };

        registry.register_default_chains();
        registry
    }

    /// 共享的内置网络表
    pub fn builtin() -> &'static ChainRegistry {
        &BUILTIN_CHAINS
    }

    /// 空注册表
    pub fn empty() -> Self {
        Self {
            configs: Vec::new(),
            caip2_map: HashMap::new(),
        }
    }

    fn register_default_chains(&mut self) {
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 主网
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        self.register(Self::chain(
            "eip155:43114",
            43114,
            "Avalanche C-Chain",
            "AVAX",
            VmAddressSpace::Evm,
            false,
        ));
        self.register(Self::chain(
            "eip155:1",
            1,
            "Ethereum",
            "ETH",
            VmAddressSpace::Evm,
            false,
        ));
        self.register(Self::chain(
            "bip122:000000000019d6689c085ae165831e93",
            4503599627370475,
            "Bitcoin",
            "BTC",
            VmAddressSpace::Bitcoin,
            false,
        ));
        self.register(Self::chain(
            "avax:imji8papUf2EhV3le337w1vgFauqkJg-",
            4503599627370470,
            "Avalanche X-Chain",
            "AVAX",
            VmAddressSpace::Avm,
            false,
        ));
        self.register(Self::chain(
            "avax:Rr9hnPVPxuUvrdCul-vjEsU1zmqKqRDo",
            4503599627370469,
            "Avalanche P-Chain",
            "AVAX",
            VmAddressSpace::Pvm,
            false,
        ));
        self.register(Self::chain(
            "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
            4503599627369473,
            "Solana",
            "SOL",
            VmAddressSpace::Svm,
            false,
        ));

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 测试网
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        self.register(Self::chain(
            "eip155:43113",
            43113,
            "Avalanche Fuji C-Chain",
            "AVAX",
            VmAddressSpace::Evm,
            true,
        ));
        self.register(Self::chain(
            "eip155:11155111",
            11155111,
            "Ethereum Sepolia",
            "ETH",
            VmAddressSpace::Evm,
            true,
        ));
        self.register(Self::chain(
            "bip122:000000000933ea01ad0ee984209779ba",
            4503599627369476,
            "Bitcoin Testnet",
            "BTC",
            VmAddressSpace::Bitcoin,
            true,
        ));
        self.register(Self::chain(
            "avax:8AJTpRj3SAqv1e80Mtl9em08LhvKEbkl",
            4503599627369471,
            "Avalanche Fuji X-Chain",
            "AVAX",
            VmAddressSpace::Avm,
            true,
        ));
        self.register(Self::chain(
            "avax:Sj7NVE3jXTbJvwFAiu7OEUo_8g8ctXMG",
            4503599627369470,
            "Avalanche Fuji P-Chain",
            "AVAX",
            VmAddressSpace::Pvm,
            true,
        ));
        self.register(Self::chain(
            "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
            4503599627369472,
            "Solana Devnet",
            "SOL",
            VmAddressSpace::Svm,
            true,
        ));
    }

    fn chain(
        caip2_id: &str,
        chain_id: i64,
        name: &str,
        symbol: &str,
        vm: VmAddressSpace,
        is_testnet: bool,
    ) -> ChainConfig {
        ChainConfig {
            caip2_id: caip2_id.to_string(),
            chain_id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            vm,
            is_testnet,
        }
    }

    /// 注册网络（同一 CAIP-2 重复注册时覆盖）
    pub fn register(&mut self, config: ChainConfig) {
        match self.caip2_map.get(&config.caip2_id) {
            Some(&pos) => self.configs[pos] = config,
            None => {
                self.caip2_map
                    .insert(config.caip2_id.clone(), self.configs.len());
                self.configs.push(config);
            }
        }
    }

    /// 通过 CAIP-2 标识获取配置
    pub fn get_by_caip2(&self, caip2_id: &str) -> Option<&ChainConfig> {
        self.caip2_map.get(caip2_id).map(|&pos| &self.configs[pos])
    }

    /// 通过 EVM chain_id 获取配置
    pub fn get_evm_chain(&self, chain_id: i64) -> Option<&ChainConfig> {
        self.get_by_caip2(&format!("eip155:{}", chain_id))
    }

    /// 地址派生需要覆盖的网络（按注册顺序）
    ///
    /// 主网/测试网只改变查询的具体网络，不改变地址空间集合
    pub fn networks_for_address_derivation(&self, is_testnet: bool) -> Vec<&ChainConfig> {
        self.configs
            .iter()
            .filter(|c| c.is_testnet == is_testnet)
            .collect()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}
