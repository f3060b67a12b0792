use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the bridge a transaction is signed or submitted on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Settlement chain
    L1,
    /// Rollup chain
    L2,
}

impl Domain {
    pub fn label(&self) -> &'static str {
        match self {
            Domain::L1 => "L1",
            Domain::L2 => "L2",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Well-known networks the bridge is deployed between
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChainId {
    Ethereum = 1,
    Mantle = 5000,
    MantleSepolia = 5003,
    Sepolia = 11155111,
}

impl ChainId {
    /// Returns chain name
    pub fn name(&self) -> &'static str {
        match self {
            ChainId::Ethereum => "Ethereum",
            ChainId::Mantle => "Mantle",
            ChainId::MantleSepolia => "Mantle Sepolia",
            ChainId::Sepolia => "Sepolia",
        }
    }

    /// Creates ChainId from u64
    pub fn from_u64(id: u64) -> Option<Self> {
        match id {
            1 => Some(ChainId::Ethereum),
            5000 => Some(ChainId::Mantle),
            5003 => Some(ChainId::MantleSepolia),
            11155111 => Some(ChainId::Sepolia),
            _ => None,
        }
    }
}

/// Human-readable label for a configured chain id, known or not
pub fn chain_label(id: u64) -> String {
    match ChainId::from_u64(id) {
        Some(chain) => chain.name().to_string(),
        None => format!("chain {}", id),
    }
}
