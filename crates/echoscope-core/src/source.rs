use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Canonical provider identifiers used in logs and envelope metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    SolanaRpc,
    Birdeye,
    Memory,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SolanaRpc => "solana_rpc",
            Self::Birdeye => "birdeye",
            Self::Memory => "memory",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
