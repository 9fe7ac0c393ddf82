/// aave-borrow SDK
///
/// Client-side access to the Aave v2 lending pool and the contracts around it:
/// - Solidity bindings for WETH, ERC-20, the pool, its addresses provider and
///   a Chainlink feed
/// - The `LendingGateway` trait the workflow is written against
/// - `AaveClient`, the gateway backed by a live node
/// - `MockGateway` (feature `testing`), an in-memory stand-in for tests

pub mod client;
pub mod config;
pub mod contracts;
pub mod gateway;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::AaveClient;
pub use config::{dev_signer, signer_from_key, SdkConfig};
pub use gateway::LendingGateway;

// Re-export the shared types so callers need one import
pub use aave_borrow_types::*;
