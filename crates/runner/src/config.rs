use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use aave_borrow_sdk::{
    parse_ether_amount, InterestRateMode, LendingError, LendingResult, DEFAULT_BORROW_RATIO_PCT,
    DEFAULT_CONFIRMATIONS, DEFAULT_REFERRAL_CODE, DEFAULT_WRAP_AMOUNT_ETH, DAI_DECIMALS,
    DEPLOYER_ACCOUNT, LOCAL_CHAIN_ID, MAINNET_DAI, MAINNET_DAI_ETH_PRICE_FEED,
    MAINNET_LENDING_POOL_ADDRESSES_PROVIDER, MAINNET_WETH, PERCENT_DENOMINATOR, PLAYER_ACCOUNT,
    RINKEBY_CHAIN_ID,
};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Prefix of environment variables that override configuration keys,
/// e.g. `AAVE_BORROW__DEFAULT_NETWORK=rinkeby`
pub const ENV_PREFIX: &str = "AAVE_BORROW";

/// Runner configuration: defaults, then an optional TOML file, then environment
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Network used when none is given on the command line
    pub default_network: String,

    /// Named accounts and the development key index each resolves to
    pub named_accounts: BTreeMap<String, usize>,

    /// Networks by name
    pub networks: BTreeMap<String, NetworkConfig>,

    /// Amounts and call parameters of the borrow workflow
    pub workflow: WorkflowConfig,
}

/// One network the runner can connect to
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Chain id the node must report
    pub chain_id: u64,

    /// Where the JSON-RPC endpoint comes from
    pub rpc: RpcSource,

    /// Where the signing key comes from
    pub signer: SignerSource,

    /// Contracts deployed on this network; required to run the workflow here
    #[serde(default)]
    pub contracts: Option<ContractAddresses>,
}

/// JSON-RPC endpoint source
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RpcSource {
    /// Fixed URL
    Url { url: String },
    /// URL read from an environment variable
    Env { var: String },
    /// Spawn a local anvil node forking the URL in an environment variable
    Fork {
        fork_url_env: String,
        #[serde(default)]
        block_number: Option<u64>,
    },
}

/// Signing key source
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignerSource {
    /// Hex private key read from an environment variable
    Env { var: String },
    /// Development key of the local node behind a named account
    NamedAccount { name: String },
}

/// External contracts the workflow calls on one network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractAddresses {
    pub weth: Address,
    pub lending_pool_addresses_provider: Address,
    /// Asset borrowed and repaid
    pub borrow_asset: Address,
    /// Price feed of the borrow asset, denominated in ETH
    pub borrow_asset_price_feed: Address,
}

impl ContractAddresses {
    /// Aave v2 market on Ethereum mainnet, borrowing DAI
    pub fn mainnet() -> Self {
        Self {
            weth: MAINNET_WETH,
            lending_pool_addresses_provider: MAINNET_LENDING_POOL_ADDRESSES_PROVIDER,
            borrow_asset: MAINNET_DAI,
            borrow_asset_price_feed: MAINNET_DAI_ETH_PRICE_FEED,
        }
    }
}

/// Workflow parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Native currency to wrap and deposit, in ether ("0.02")
    pub wrap_amount_eth: String,

    /// Share of available borrowing capacity to borrow (percent)
    pub borrow_ratio_pct: u64,

    /// Decimals of the borrow asset
    pub borrow_asset_decimals: u8,

    pub interest_rate_mode: InterestRateMode,

    pub referral_code: u16,

    /// Confirmations to await after every transaction
    pub confirmations: u64,
}

impl RunnerConfig {
    /// Load configuration: built-in defaults, overlaid by the TOML file at
    /// `path` when it exists, overlaid by `AAVE_BORROW__*` environment variables.
    pub fn load(path: &str) -> LendingResult<Self> {
        let defaults = config::Config::try_from(&RunnerConfig::default())
            .map_err(|e| LendingError::invalid_config("defaults", &e.to_string()))?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(Path::new(path)).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| {
                LendingError::invalid_config(path, &format!("failed to read config: {}", e))
            })?;

        let config: RunnerConfig = settings.try_deserialize().map_err(|e| {
            LendingError::invalid_config(path, &format!("failed to parse config: {}", e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> LendingResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            LendingError::invalid_config("toml", &format!("failed to serialize config: {}", e))
        })?;
        fs::write(path, content).map_err(|e| {
            LendingError::invalid_config(path, &format!("failed to write config file: {}", e))
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> LendingResult<()> {
        if !self.networks.contains_key(&self.default_network) {
            return Err(LendingError::invalid_config(
                "default_network",
                &format!("'{}' is not a configured network", self.default_network),
            ));
        }

        for (name, network) in &self.networks {
            network.validate(name, &self.named_accounts)?;
        }

        self.workflow.validate()?;

        Ok(())
    }

    /// Look up a network by name
    pub fn network(&self, name: &str) -> LendingResult<&NetworkConfig> {
        self.networks.get(name).ok_or_else(|| {
            LendingError::missing_config(
                name,
                &format!(
                    "unknown network; configured: {}",
                    self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            )
        })
    }

    /// Contract addresses of a network. Networks without addresses cannot run
    /// the workflow.
    pub fn contracts_for(&self, name: &str) -> LendingResult<ContractAddresses> {
        self.network(name)?.contracts.ok_or_else(|| {
            LendingError::missing_config(name, "no contract addresses configured for this network")
        })
    }

    /// Development key index behind a named account
    pub fn account_index(&self, name: &str) -> LendingResult<usize> {
        self.named_accounts
            .get(name)
            .copied()
            .ok_or_else(|| LendingError::missing_config("named_accounts", &format!("no account named '{}'", name)))
    }
}

impl NetworkConfig {
    fn validate(&self, name: &str, named_accounts: &BTreeMap<String, usize>) -> LendingResult<()> {
        if self.chain_id == 0 {
            return Err(LendingError::invalid_config(name, "chain_id must be greater than 0"));
        }

        match &self.rpc {
            RpcSource::Url { url } if url.trim().is_empty() => {
                return Err(LendingError::invalid_config(name, "rpc url is empty"));
            }
            RpcSource::Env { var } | RpcSource::Fork { fork_url_env: var, .. }
                if var.trim().is_empty() =>
            {
                return Err(LendingError::invalid_config(name, "rpc environment variable name is empty"));
            }
            _ => {}
        }

        match &self.signer {
            SignerSource::Env { var } if var.trim().is_empty() => {
                return Err(LendingError::invalid_config(name, "signer environment variable name is empty"));
            }
            SignerSource::NamedAccount { name: account } if !named_accounts.contains_key(account) => {
                return Err(LendingError::invalid_config(
                    name,
                    &format!("signer refers to unknown named account '{}'", account),
                ));
            }
            _ => {}
        }

        Ok(())
    }
}

impl WorkflowConfig {
    fn validate(&self) -> LendingResult<()> {
        if self.borrow_ratio_pct == 0 || self.borrow_ratio_pct > PERCENT_DENOMINATOR {
            return Err(LendingError::invalid_config(
                "workflow.borrow_ratio_pct",
                &format!("{} not in 1..=100", self.borrow_ratio_pct),
            ));
        }

        if self.confirmations == 0 {
            return Err(LendingError::invalid_config("workflow.confirmations", "must be greater than 0"));
        }

        let amount = parse_ether_amount(&self.wrap_amount_eth)?;
        if amount.is_zero() {
            return Err(LendingError::invalid_config("workflow.wrap_amount_eth", "must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let mut named_accounts = BTreeMap::new();
        named_accounts.insert(DEPLOYER_ACCOUNT.to_string(), 0);
        named_accounts.insert(PLAYER_ACCOUNT.to_string(), 1);

        let mut networks = BTreeMap::new();
        networks.insert(
            "hardhat".to_string(),
            NetworkConfig {
                chain_id: LOCAL_CHAIN_ID,
                rpc: RpcSource::Fork {
                    fork_url_env: "MAINNET_RPC_URL".to_string(),
                    block_number: None,
                },
                signer: SignerSource::NamedAccount {
                    name: DEPLOYER_ACCOUNT.to_string(),
                },
                contracts: Some(ContractAddresses::mainnet()),
            },
        );
        networks.insert(
            "localhost".to_string(),
            NetworkConfig {
                chain_id: LOCAL_CHAIN_ID,
                rpc: RpcSource::Url {
                    url: "http://127.0.0.1:8545".to_string(),
                },
                signer: SignerSource::NamedAccount {
                    name: DEPLOYER_ACCOUNT.to_string(),
                },
                contracts: Some(ContractAddresses::mainnet()),
            },
        );
        // Mainnet addresses are not deployed on rinkeby; running there needs
        // its own [networks.rinkeby.contracts] table.
        networks.insert(
            "rinkeby".to_string(),
            NetworkConfig {
                chain_id: RINKEBY_CHAIN_ID,
                rpc: RpcSource::Env {
                    var: "RINKEBY_RPC_URL".to_string(),
                },
                signer: SignerSource::Env {
                    var: "PRIVATE_KEY".to_string(),
                },
                contracts: None,
            },
        );

        Self {
            default_network: "hardhat".to_string(),
            named_accounts,
            networks,
            workflow: WorkflowConfig::default(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            wrap_amount_eth: DEFAULT_WRAP_AMOUNT_ETH.to_string(),
            borrow_ratio_pct: DEFAULT_BORROW_RATIO_PCT,
            borrow_asset_decimals: DAI_DECIMALS,
            interest_rate_mode: InterestRateMode::Stable,
            referral_code: DEFAULT_REFERRAL_CODE,
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> LendingResult<()> {
    RunnerConfig::default().save(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = RunnerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_network, "hardhat");
        assert_eq!(config.account_index("deployer").unwrap(), 0);
        assert_eq!(config.account_index("player").unwrap(), 1);
        assert_eq!(config.contracts_for("hardhat").unwrap(), ContractAddresses::mainnet());
    }

    #[test]
    fn test_rinkeby_has_no_contracts_by_default() {
        let config = RunnerConfig::default();
        let err = config.contracts_for("rinkeby").unwrap_err();
        assert!(matches!(err, LendingError::MissingConfiguration { .. }));
        assert!(config.network("goerli").is_err());
    }

    #[test]
    fn test_workflow_validation() {
        let mut config = RunnerConfig::default();

        config.workflow.borrow_ratio_pct = 0;
        assert!(config.validate().is_err());
        config.workflow.borrow_ratio_pct = 101;
        assert!(config.validate().is_err());
        config.workflow.borrow_ratio_pct = 95;

        config.workflow.confirmations = 0;
        assert!(config.validate().is_err());
        config.workflow.confirmations = 1;

        config.workflow.wrap_amount_eth = "0".to_string();
        assert!(config.validate().is_err());
        config.workflow.wrap_amount_eth = "lots".to_string();
        assert!(config.validate().is_err());
        config.workflow.wrap_amount_eth = "0.5".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_network_validation() {
        let mut config = RunnerConfig::default();
        config.default_network = "mainnet".to_string();
        assert!(config.validate().is_err());

        let mut config = RunnerConfig::default();
        config.networks.get_mut("hardhat").unwrap().chain_id = 0;
        assert!(config.validate().is_err());

        let mut config = RunnerConfig::default();
        config.networks.get_mut("localhost").unwrap().signer = SignerSource::NamedAccount {
            name: "stranger".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_network_tables_merge_with_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("aave-borrow.toml");
        fs::write(
            &path,
            r#"
[networks.localhost]
rpc = { kind = "url", url = "http://10.0.0.2:8545" }

[networks.rinkeby.contracts]
weth = "0xc778417E063141139Fce010982780140Aa0cD5Ab"
lending_pool_addresses_provider = "0x88757f2f99175387aB4C6a4b3067c77A695b0349"
borrow_asset = "0xFf795577d9AC8bD7D90Ee22b6C1703490b6512FD"
borrow_asset_price_feed = "0x74825DbC8BF76CC4e9494d0ecB210f676Efa001D"
"#,
        )
        .unwrap();

        let config = RunnerConfig::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.networks.len(), 3);
        let localhost = config.network("localhost").unwrap();
        assert_eq!(localhost.chain_id, LOCAL_CHAIN_ID);
        assert_eq!(
            localhost.rpc,
            RpcSource::Url {
                url: "http://10.0.0.2:8545".to_string()
            }
        );
        assert_eq!(config.network("rinkeby").unwrap().chain_id, RINKEBY_CHAIN_ID);
        assert!(config.contracts_for("rinkeby").is_ok());
        assert_eq!(config.contracts_for("hardhat").unwrap(), ContractAddresses::mainnet());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = RunnerConfig::load("/nonexistent/aave-borrow.toml").unwrap();
        assert_eq!(config.networks.len(), 3);
        assert_eq!(config.workflow, WorkflowConfig::default());
    }
}
