use std::fmt::Display;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use aave_borrow_runner::{
    connect, create_example_config, init_logging, BorrowWorkflow, RunnerConfig, WorkflowPlan,
};

#[derive(Parser, Debug)]
#[command(name = "aave-borrow")]
#[command(about = "Deposit WETH into Aave v2, borrow DAI against it and repay it")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "aave-borrow.toml")]
    config: String,

    /// Network to run on (defaults to the configured default network)
    #[arg(short, long)]
    network: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    write_example: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Wrap, deposit, borrow and repay (default)
    Run,
    /// Only wrap native currency into WETH
    DepositWeth,
    /// Show the account's position in the pool
    Account,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: Args) -> Result<()> {
    if let Some(path) = &args.write_example {
        create_example_config(path)?;
        info!("Example configuration written to {}", path);
        return Ok(());
    }

    if !Path::new(&args.config).exists() {
        warn!("Config file not found, using defaults: {}", args.config);
    }
    let config = RunnerConfig::load(&args.config)?;

    let network = args
        .network
        .clone()
        .unwrap_or_else(|| config.default_network.clone());
    let command = args.command.unwrap_or(Command::Run);

    // Checked before connecting so a misconfigured network never starts a fork
    let contracts = config.contracts_for(&network)?;
    let plan = WorkflowPlan::new(&config.workflow, contracts)?;

    info!(%network, ?command, "Starting aave-borrow");

    let connection = connect(&config, &network)
        .await
        .with_context(|| format!("failed to connect to network '{}'", network))?;
    let workflow = BorrowWorkflow::new(&connection.client, &plan);

    match command {
        Command::Run => emit(&workflow.run().await?, args.json),
        Command::DepositWeth => emit(&workflow.wrap_native().await?, args.json),
        Command::Account => emit(&workflow.account_overview().await?, args.json),
    }
}

/// Reports go to stdout, logs to stderr
fn emit<T: Serialize + Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}
