//! Network selection: resolve endpoint and signer, start a fork when asked,
//! connect the client.

use aave_borrow_sdk::{
    dev_signer, signer_from_key, AaveClient, LendingError, LendingResult, SdkConfig,
};
use alloy::node_bindings::{Anvil, AnvilInstance};
use alloy::signers::k256::SecretKey;
use alloy::signers::local::PrivateKeySigner;
use tracing::{info, warn};

use crate::config::{NetworkConfig, RpcSource, RunnerConfig, SignerSource};

/// A connected network. Holds the forked node, if any, for as long as the
/// connection lives.
pub struct Connection {
    pub client: AaveClient,
    _fork: Option<AnvilInstance>,
}

/// Connect to the named network
pub async fn connect(config: &RunnerConfig, name: &str) -> LendingResult<Connection> {
    let network = config.network(name)?;

    let (rpc_url, fork) = match &network.rpc {
        RpcSource::Url { url } => (url.clone(), None),
        RpcSource::Env { var } => (read_env(name, var)?, None),
        RpcSource::Fork {
            fork_url_env,
            block_number,
        } => {
            let fork_url = read_env(name, fork_url_env)?;
            let instance = spawn_fork(network, &fork_url, *block_number)?;
            (instance.endpoint(), Some(instance))
        }
    };

    let signer = resolve_signer(config, name, network, fork.as_ref())?;
    let sdk_config = SdkConfig::new(name, &rpc_url, signer)?.with_chain_id(network.chain_id);
    let client = AaveClient::connect(sdk_config).await?;

    Ok(Connection {
        client,
        _fork: fork,
    })
}

fn spawn_fork(
    network: &NetworkConfig,
    fork_url: &str,
    block_number: Option<u64>,
) -> LendingResult<AnvilInstance> {
    let mut anvil = Anvil::new().fork(fork_url).chain_id(network.chain_id);
    if let Some(block) = block_number {
        anvil = anvil.fork_block_number(block);
    }

    let instance = anvil
        .try_spawn()
        .map_err(|e| LendingError::rpc_error("spawn_fork", e))?;

    info!(
        chain_id = network.chain_id,
        endpoint = %instance.endpoint(),
        fork_block = ?block_number,
        "Started forked node"
    );

    Ok(instance)
}

fn resolve_signer(
    config: &RunnerConfig,
    name: &str,
    network: &NetworkConfig,
    fork: Option<&AnvilInstance>,
) -> LendingResult<PrivateKeySigner> {
    match &network.signer {
        SignerSource::Env { var } => signer_from_key(&read_env(name, var)?),
        SignerSource::NamedAccount { name: account } => {
            let index = config.account_index(account)?;
            match fork {
                Some(instance) => fork_account(instance.keys(), index).ok_or_else(|| {
                    LendingError::invalid_config(
                        name,
                        &format!("forked node has no account #{} for '{}'", index, account),
                    )
                }),
                None => dev_signer(index),
            }
        }
    }
}

/// Signer for the forked node's development account at `index`
fn fork_account(keys: &[SecretKey], index: usize) -> Option<PrivateKeySigner> {
    keys.get(index).map(PrivateKeySigner::from)
}

fn read_env(network: &str, var: &str) -> LendingResult<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            warn!(network, var, "Required environment variable is not set");
            Err(LendingError::missing_config(
                network,
                &format!("environment variable {} is not set", var),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_env_is_missing_configuration() {
        let err = read_env("rinkeby", "AAVE_BORROW_TEST_SURELY_UNSET_VAR").unwrap_err();
        assert!(matches!(err, LendingError::MissingConfiguration { .. }));
    }

    #[tokio::test]
    async fn test_rinkeby_without_env_fails_before_connecting() {
        let config = RunnerConfig::default();
        let mut rinkeby = config.networks["rinkeby"].clone();
        rinkeby.rpc = RpcSource::Env {
            var: "AAVE_BORROW_TEST_SURELY_UNSET_RPC".to_string(),
        };
        let mut config = config;
        config.networks.insert("rinkeby".to_string(), rinkeby);

        let err = connect(&config, "rinkeby").await.err().unwrap();
        assert!(matches!(err, LendingError::MissingConfiguration { .. }));
    }

    #[test]
    fn test_named_account_without_fork_uses_dev_keys() {
        let config = RunnerConfig::default();
        let network = &config.networks["localhost"];
        let signer = resolve_signer(&config, "localhost", network, None).unwrap();
        assert_eq!(signer.address(), dev_signer(0).unwrap().address());
    }

    #[test]
    fn test_fork_accounts_match_dev_keys() {
        let keys: Vec<SecretKey> = aave_borrow_sdk::DEV_PRIVATE_KEYS
            .iter()
            .map(|key| SecretKey::from_slice(&alloy::hex::decode(key).unwrap()).unwrap())
            .collect();

        assert_eq!(
            fork_account(&keys, 0).unwrap().address(),
            dev_signer(0).unwrap().address()
        );
        assert_eq!(
            fork_account(&keys, 1).unwrap().address(),
            dev_signer(1).unwrap().address()
        );
        assert!(fork_account(&keys, 2).is_none());
    }

    #[tokio::test]
    async fn test_unknown_network() {
        let err = connect(&RunnerConfig::default(), "goerli").await.err().unwrap();
        assert!(matches!(err, LendingError::MissingConfiguration { .. }));
    }
}
