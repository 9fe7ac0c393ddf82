//! Environment overlay of the configuration. Kept in its own test binary
//! because it sets process-wide variables.

use std::env;
use std::fs;

use aave_borrow_runner::RunnerConfig;
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_environment_overrides_file_and_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("aave-borrow.toml");
    fs::write(
        &path,
        r#"
[workflow]
borrow_ratio_pct = 80
wrap_amount_eth = "0.1"
"#,
    )?;

    env::set_var("AAVE_BORROW__WORKFLOW__BORROW_RATIO_PCT", "50");
    env::set_var("AAVE_BORROW__DEFAULT_NETWORK", "localhost");
    let loaded = RunnerConfig::load(path.to_str().expect("utf-8 path"));
    env::remove_var("AAVE_BORROW__WORKFLOW__BORROW_RATIO_PCT");
    env::remove_var("AAVE_BORROW__DEFAULT_NETWORK");

    let config = loaded?;
    assert_eq!(config.workflow.borrow_ratio_pct, 50);
    assert_eq!(config.default_network, "localhost");
    // Keys the environment leaves alone keep the file's value
    assert_eq!(config.workflow.wrap_amount_eth, "0.1");
    assert_eq!(config.workflow.confirmations, 1);

    Ok(())
}
