//! Constants used across the aave-borrow workflow

use alloy_primitives::{address, Address, U256};

// ============================================================================
// Ethereum Mainnet Contracts
// ============================================================================

/// Wrapped ether (WETH9)
pub const MAINNET_WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// Aave v2 LendingPoolAddressesProvider
pub const MAINNET_LENDING_POOL_ADDRESSES_PROVIDER: Address =
    address!("B53C1a33016B2DC2fF3653530bfF1848a515c8c5");

/// DAI stablecoin
pub const MAINNET_DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

/// Chainlink DAI/ETH price feed
pub const MAINNET_DAI_ETH_PRICE_FEED: Address =
    address!("773616E4d11A78F511299002da57A0a94577F1f4");

// ============================================================================
// Chain Ids
// ============================================================================

/// Local development node (hardhat / anvil)
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Rinkeby public test network
pub const RINKEBY_CHAIN_ID: u64 = 4;

// ============================================================================
// Workflow Defaults
// ============================================================================

/// Native currency wrapped and deposited as collateral: 0.02 ETH
pub const DEFAULT_WRAP_AMOUNT_WEI: U256 = U256::from_limbs([20_000_000_000_000_000, 0, 0, 0]);

/// Same amount as an ether-denominated decimal string, for configuration files
pub const DEFAULT_WRAP_AMOUNT_ETH: &str = "0.02";

/// Share of available borrowing capacity actually borrowed (percent)
pub const DEFAULT_BORROW_RATIO_PCT: u64 = 95;

/// Percent denominator
pub const PERCENT_DENOMINATOR: u64 = 100;

/// DAI decimals
pub const DAI_DECIMALS: u8 = 18;

/// Ether decimals (oracle answers and account data are wei-denominated)
pub const ETHER_DECIMALS: u8 = 18;

/// Aave v2 referral code (no referrer)
pub const DEFAULT_REFERRAL_CODE: u16 = 0;

/// Confirmations awaited after every submitted transaction
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

// ============================================================================
// Development Accounts
// ============================================================================

/// Well-known development private keys of a local hardhat/anvil node,
/// indexed the same way the node derives them from its default mnemonic.
pub const DEV_PRIVATE_KEYS: [&str; 2] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
];

/// Named account resolved to development key index 0
pub const DEPLOYER_ACCOUNT: &str = "deployer";

/// Named account resolved to development key index 1
pub const PLAYER_ACCOUNT: &str = "player";
