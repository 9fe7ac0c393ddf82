//! Runner for the Aave v2 borrow workflow: configuration, network selection
//! and the deposit, borrow and repay sequence.

pub mod config;
pub mod logging;
pub mod network;
pub mod workflow;

pub use config::{
    create_example_config, ContractAddresses, NetworkConfig, RpcSource, RunnerConfig,
    SignerSource, WorkflowConfig,
};
pub use logging::{default_directives, init_logging};
pub use network::{connect, Connection};
pub use workflow::{
    AccountReport, BorrowReport, BorrowWorkflow, StepReceipt, WorkflowPlan, WrapReport,
};
