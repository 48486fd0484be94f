//! Network selection.

use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The Alephium network the coordinator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum NetworkId {
    /// The production network.
    #[default]
    Mainnet,
    /// The public test network.
    Testnet,
    /// A local development network.
    Devnet,
}

impl NetworkId {
    /// Returns the default full node REST endpoint for this network.
    pub fn default_node_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://node.mainnet.alephium.org",
            Self::Testnet => "https://node.testnet.alephium.org",
            Self::Devnet => "http://127.0.0.1:22973",
        }
    }

    /// Returns the default explorer backend endpoint for this network.
    pub fn default_explorer_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://backend.mainnet.alephium.org",
            Self::Testnet => "https://backend.testnet.alephium.org",
            Self::Devnet => "http://127.0.0.1:9090",
        }
    }
}
