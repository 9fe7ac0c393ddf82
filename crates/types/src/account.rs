//! Value types exchanged between the workflow and the lending gateway

use alloy_primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::format_units;
use crate::constants::ETHER_DECIMALS;

// ============================================================================
// Account Data
// ============================================================================

/// Result of `LendingPool.getUserAccountData()`, fetched fresh on every read.
///
/// Values are ETH-denominated wei, as the Aave v2 pool reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub total_collateral_eth: U256,
    pub total_debt_eth: U256,
    pub available_borrows_eth: U256,
    /// Weighted liquidation threshold (basis points)
    pub current_liquidation_threshold: U256,
    /// Weighted loan-to-value (basis points)
    pub ltv: U256,
    /// Health factor in WAD; `U256::MAX` when there is no debt
    pub health_factor: U256,
}

impl fmt::Display for AccountSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "You have {} worth of ETH deposited",
            format_units(self.total_collateral_eth, ETHER_DECIMALS)
        )?;
        writeln!(
            f,
            "You have {} worth of ETH borrowed",
            format_units(self.total_debt_eth, ETHER_DECIMALS)
        )?;
        write!(
            f,
            "You can borrow {} worth of ETH",
            format_units(self.available_borrows_eth, ETHER_DECIMALS)
        )
    }
}

// ============================================================================
// Transaction Intents
// ============================================================================

/// Aave v2 interest rate mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestRateMode {
    Stable,
    Variable,
}

impl InterestRateMode {
    /// Numeric value the pool expects
    pub fn as_u8(self) -> u8 {
        match self {
            InterestRateMode::Stable => 1,
            InterestRateMode::Variable => 2,
        }
    }
}

/// Contract function and arguments of a state-changing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum ContractCall {
    /// `WETH.deposit()` with `amount` attached as value
    WrapNative { amount: U256 },
    /// `ERC20.approve(spender, amount)`
    Approve { spender: Address, amount: U256 },
    /// `LendingPool.deposit(asset, amount, onBehalfOf, referralCode)`
    Deposit {
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
        referral_code: u16,
    },
    /// `LendingPool.borrow(asset, amount, interestRateMode, referralCode, onBehalfOf)`
    Borrow {
        asset: Address,
        amount: U256,
        rate_mode: InterestRateMode,
        referral_code: u16,
        on_behalf_of: Address,
    },
    /// `LendingPool.repay(asset, amount, rateMode, onBehalfOf)`
    Repay {
        asset: Address,
        amount: U256,
        rate_mode: InterestRateMode,
        on_behalf_of: Address,
    },
}

impl ContractCall {
    /// Short operation name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            ContractCall::WrapNative { .. } => "wrap_native",
            ContractCall::Approve { .. } => "approve",
            ContractCall::Deposit { .. } => "deposit",
            ContractCall::Borrow { .. } => "borrow",
            ContractCall::Repay { .. } => "repay",
        }
    }
}

/// A state-changing call: target contract, function, confirmations to await.
/// Built per step and discarded once confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub target: Address,
    pub call: ContractCall,
    pub confirmations: u64,
}

impl TransactionIntent {
    pub fn new(target: Address, call: ContractCall, confirmations: u64) -> Self {
        Self {
            target,
            call,
            confirmations,
        }
    }

    pub fn name(&self) -> &'static str {
        self.call.name()
    }
}

// ============================================================================
// Receipts
// ============================================================================

/// What the workflow keeps from a confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_rate_mode_values() {
        assert_eq!(InterestRateMode::Stable.as_u8(), 1);
        assert_eq!(InterestRateMode::Variable.as_u8(), 2);
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = AccountSnapshot {
            total_collateral_eth: U256::from(20_000_000_000_000_000u64),
            total_debt_eth: U256::ZERO,
            available_borrows_eth: U256::from(16_000_000_000_000_000u64),
            current_liquidation_threshold: U256::from(8250u64),
            ltv: U256::from(8000u64),
            health_factor: U256::MAX,
        };

        let rendered = snapshot.to_string();
        assert!(rendered.contains("You have 0.02 worth of ETH deposited"));
        assert!(rendered.contains("You have 0 worth of ETH borrowed"));
        assert!(rendered.contains("You can borrow 0.016 worth of ETH"));
    }

    #[test]
    fn test_intent_serializes_function_tag() {
        let intent = TransactionIntent::new(
            address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
            ContractCall::Approve {
                spender: Address::ZERO,
                amount: U256::from(5u64),
            },
            1,
        );

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["call"]["function"], "approve");
        assert_eq!(intent.name(), "approve");
    }
}
