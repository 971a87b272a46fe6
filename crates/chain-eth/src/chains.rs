/// An EVM network the engine can bake type-2 transactions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmChain {
    pub chain_id: u64,
    pub name: &'static str,
}

const fn chain(chain_id: u64, name: &'static str) -> EvmChain {
    EvmChain { chain_id, name }
}

pub const ETHEREUM: EvmChain = chain(1, "Ethereum");
pub const OPTIMISM: EvmChain = chain(10, "Optimism");
pub const BSC: EvmChain = chain(56, "BNB Smart Chain");
pub const POLYGON: EvmChain = chain(137, "Polygon");
pub const BASE: EvmChain = chain(8453, "Base");
pub const ARBITRUM: EvmChain = chain(42161, "Arbitrum One");
pub const AVALANCHE: EvmChain = chain(43114, "Avalanche C-Chain");
pub const POLYGON_AMOY: EvmChain = chain(80002, "Polygon Amoy");
pub const SEPOLIA: EvmChain = chain(11155111, "Sepolia");

const ALL_CHAINS: &[EvmChain] = &[
    ETHEREUM,
    OPTIMISM,
    BSC,
    POLYGON,
    BASE,
    ARBITRUM,
    AVALANCHE,
    POLYGON_AMOY,
    SEPOLIA,
];

/// Returns the chain definition for a given chain ID, or `None` if unsupported.
pub fn get_chain(chain_id: u64) -> Option<&'static EvmChain> {
    ALL_CHAINS.iter().find(|c| c.chain_id == chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_ethereum() {
        let chain = get_chain(1).expect("Ethereum should be supported");
        assert_eq!(chain.name, "Ethereum");
    }

    #[test]
    fn get_sepolia_testnet() {
        let chain = get_chain(11155111).expect("Sepolia should be supported");
        assert_eq!(chain.name, "Sepolia");
    }

    #[test]
    fn unsupported_chain_returns_none() {
        assert!(get_chain(999999).is_none());
    }

    #[test]
    fn chain_ids_are_unique() {
        for (i, a) in ALL_CHAINS.iter().enumerate() {
            for b in &ALL_CHAINS[i + 1..] {
                assert_ne!(a.chain_id, b.chain_id, "{} and {}", a.name, b.name);
            }
        }
    }
}
