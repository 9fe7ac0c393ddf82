//! Configuration loading tests

use std::fs;

use aave_borrow_runner::{create_example_config, RpcSource, RunnerConfig, SignerSource};
use aave_borrow_sdk::{LendingError, RINKEBY_CHAIN_ID};
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_example_config_loads_back() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("aave-borrow.toml");
    let path = path.to_str().expect("utf-8 path");

    create_example_config(path)?;
    let loaded = RunnerConfig::load(path)?;

    assert_eq!(loaded, RunnerConfig::default());
    Ok(())
}

#[test]
fn test_file_overlays_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("rinkeby.toml");
    fs::write(
        &path,
        r#"
default_network = "rinkeby"

[networks.rinkeby.contracts]
weth = "0xc778417E063141139Fce010982780140Aa0cD5Ab"
lending_pool_addresses_provider = "0x88757f2f99175387aB4C6a4b3067c77A695b0349"
borrow_asset = "0xFf795577d9AC8bD7D90Ee22b6C1703490b6512FD"
borrow_asset_price_feed = "0x74825DbC8BF76CC4e9494d0ecB210f676Efa001D"

[workflow]
borrow_ratio_pct = 50
"#,
    )?;

    let config = RunnerConfig::load(path.to_str().expect("utf-8 path"))?;

    assert_eq!(config.default_network, "rinkeby");
    assert_eq!(config.workflow.borrow_ratio_pct, 50);
    assert_eq!(config.workflow.wrap_amount_eth, "0.02");

    let rinkeby = config.network("rinkeby")?;
    assert_eq!(rinkeby.chain_id, RINKEBY_CHAIN_ID);
    assert_eq!(
        rinkeby.rpc,
        RpcSource::Env {
            var: "RINKEBY_RPC_URL".to_string()
        }
    );
    assert_eq!(
        rinkeby.signer,
        SignerSource::Env {
            var: "PRIVATE_KEY".to_string()
        }
    );
    assert!(config.contracts_for("rinkeby").is_ok());
    assert!(config.contracts_for("hardhat").is_ok());

    Ok(())
}

#[test]
fn test_invalid_file_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
[workflow]
borrow_ratio_pct = 150
"#,
    )?;

    let err = RunnerConfig::load(path.to_str().expect("utf-8 path")).unwrap_err();
    assert!(matches!(err, LendingError::InvalidConfiguration { .. }));

    Ok(())
}
