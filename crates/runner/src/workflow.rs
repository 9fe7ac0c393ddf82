//! The deposit, borrow and repay sequence
//!
//! Every step waits for its transaction to be confirmed before the next one
//! starts; the first failure ends the run.

use std::fmt;

use aave_borrow_sdk::{
    compute_borrow_amount, format_units, parse_ether_amount, price_from_answer, AccountSnapshot,
    BorrowQuote, ContractCall, InterestRateMode, LendingGateway, LendingResult, ReceiptSummary,
    TransactionIntent, ETHER_DECIMALS,
};
use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ContractAddresses, WorkflowConfig};

/// Resolved inputs of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowPlan {
    pub contracts: ContractAddresses,
    /// Native currency to wrap and deposit (wei)
    pub wrap_amount: U256,
    pub borrow_ratio_pct: u64,
    pub borrow_asset_decimals: u8,
    pub interest_rate_mode: InterestRateMode,
    pub referral_code: u16,
    pub confirmations: u64,
}

impl WorkflowPlan {
    pub fn new(settings: &WorkflowConfig, contracts: ContractAddresses) -> LendingResult<Self> {
        Ok(Self {
            contracts,
            wrap_amount: parse_ether_amount(&settings.wrap_amount_eth)?,
            borrow_ratio_pct: settings.borrow_ratio_pct,
            borrow_asset_decimals: settings.borrow_asset_decimals,
            interest_rate_mode: settings.interest_rate_mode,
            referral_code: settings.referral_code,
            confirmations: settings.confirmations,
        })
    }
}

/// A confirmed transaction and the step that sent it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepReceipt {
    pub step: &'static str,
    #[serde(flatten)]
    pub receipt: ReceiptSummary,
}

/// Outcome of wrapping native currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapReport {
    pub account: Address,
    pub amount: U256,
    /// WETH balance read after confirmation
    pub weth_balance: U256,
    pub receipt: ReceiptSummary,
}

/// Read-only view of the account in the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub account: Address,
    pub lending_pool: Address,
    pub snapshot: AccountSnapshot,
}

/// Outcome of a complete run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowReport {
    pub account: Address,
    pub lending_pool: Address,
    pub weth_balance: U256,
    pub after_deposit: AccountSnapshot,
    /// Oracle price: wei of ETH per whole unit of the borrow asset
    pub price: U256,
    pub quote: BorrowQuote,
    pub after_borrow: AccountSnapshot,
    pub after_repay: AccountSnapshot,
    pub transactions: Vec<StepReceipt>,
}

/// Runs the workflow against any gateway
pub struct BorrowWorkflow<'a, G: LendingGateway + ?Sized> {
    gateway: &'a G,
    plan: &'a WorkflowPlan,
}

impl<'a, G: LendingGateway + ?Sized> BorrowWorkflow<'a, G> {
    pub fn new(gateway: &'a G, plan: &'a WorkflowPlan) -> Self {
        Self { gateway, plan }
    }

    /// Wrap, deposit, borrow and repay, reading the account between steps
    pub async fn run(&self) -> LendingResult<BorrowReport> {
        let account = self.gateway.account();
        let mut transactions = Vec::new();

        info!(%account, amount = %format_units(self.plan.wrap_amount, ETHER_DECIMALS), "Starting borrow workflow");

        let wrap = self.wrap_native().await?;
        transactions.push(StepReceipt {
            step: "wrap",
            receipt: wrap.receipt,
        });

        let pool = self.lending_pool().await?;

        let receipt = self
            .approve(self.plan.contracts.weth, pool, self.plan.wrap_amount)
            .await?;
        transactions.push(StepReceipt {
            step: "approve_collateral",
            receipt,
        });

        let receipt = self.deposit(pool, self.plan.wrap_amount).await?;
        transactions.push(StepReceipt {
            step: "deposit",
            receipt,
        });

        let after_deposit = self.account_snapshot(pool).await?;

        let price = self.borrow_asset_price().await?;
        let quote = compute_borrow_amount(
            after_deposit.available_borrows_eth,
            price,
            self.plan.borrow_ratio_pct,
            self.plan.borrow_asset_decimals,
        )?;
        info!(
            whole_units = %quote.whole_units,
            amount = %quote.amount,
            "You can borrow {} of the borrow asset",
            quote.whole_units
        );

        let receipt = self.borrow(pool, quote.amount).await?;
        transactions.push(StepReceipt {
            step: "borrow",
            receipt,
        });

        let after_borrow = self.account_snapshot(pool).await?;

        let receipt = self
            .approve(self.plan.contracts.borrow_asset, pool, quote.amount)
            .await?;
        transactions.push(StepReceipt {
            step: "approve_repayment",
            receipt,
        });

        let receipt = self.repay(pool, quote.amount).await?;
        transactions.push(StepReceipt {
            step: "repay",
            receipt,
        });

        let after_repay = self.account_snapshot(pool).await?;

        info!(transactions = transactions.len(), "Borrow workflow finished");

        Ok(BorrowReport {
            account,
            lending_pool: pool,
            weth_balance: wrap.weth_balance,
            after_deposit,
            price,
            quote,
            after_borrow,
            after_repay,
            transactions,
        })
    }

    /// Convert the plan's native amount into WETH and report the balance
    pub async fn wrap_native(&self) -> LendingResult<WrapReport> {
        let account = self.gateway.account();
        let receipt = self
            .execute(
                self.plan.contracts.weth,
                ContractCall::WrapNative {
                    amount: self.plan.wrap_amount,
                },
            )
            .await?;

        let weth_balance = self
            .gateway
            .token_balance(self.plan.contracts.weth, account)
            .await?;
        info!("Got {} WETH", format_units(weth_balance, ETHER_DECIMALS));

        Ok(WrapReport {
            account,
            amount: self.plan.wrap_amount,
            weth_balance,
            receipt,
        })
    }

    /// Current pool address from the addresses provider
    pub async fn lending_pool(&self) -> LendingResult<Address> {
        let pool = self
            .gateway
            .lending_pool(self.plan.contracts.lending_pool_addresses_provider)
            .await?;
        info!(%pool, "LendingPool address resolved");
        Ok(pool)
    }

    /// Fresh account data, logged in the three-line summary form
    pub async fn account_snapshot(&self, pool: Address) -> LendingResult<AccountSnapshot> {
        let snapshot = self
            .gateway
            .account_data(pool, self.gateway.account())
            .await?;
        for line in snapshot.to_string().lines() {
            info!("{}", line);
        }
        Ok(snapshot)
    }

    /// Validated oracle price of the borrow asset
    pub async fn borrow_asset_price(&self) -> LendingResult<U256> {
        let answer = self
            .gateway
            .latest_price(self.plan.contracts.borrow_asset_price_feed)
            .await?;
        let price = price_from_answer(answer)?;
        info!(
            feed = %self.plan.contracts.borrow_asset_price_feed,
            "The borrow asset price is {} wei of ETH per unit",
            price
        );
        Ok(price)
    }

    /// Pool address plus a fresh snapshot, without sending anything
    pub async fn account_overview(&self) -> LendingResult<AccountReport> {
        let lending_pool = self.lending_pool().await?;
        let snapshot = self.account_snapshot(lending_pool).await?;
        Ok(AccountReport {
            account: self.gateway.account(),
            lending_pool,
            snapshot,
        })
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> LendingResult<ReceiptSummary> {
        let receipt = self
            .execute(token, ContractCall::Approve { spender, amount })
            .await?;
        info!(%token, %spender, %amount, "Approved!");
        Ok(receipt)
    }

    async fn deposit(&self, pool: Address, amount: U256) -> LendingResult<ReceiptSummary> {
        info!("Depositing...");
        let receipt = self
            .execute(
                pool,
                ContractCall::Deposit {
                    asset: self.plan.contracts.weth,
                    amount,
                    on_behalf_of: self.gateway.account(),
                    referral_code: self.plan.referral_code,
                },
            )
            .await?;
        info!("Deposited!");
        Ok(receipt)
    }

    async fn borrow(&self, pool: Address, amount: U256) -> LendingResult<ReceiptSummary> {
        let receipt = self
            .execute(
                pool,
                ContractCall::Borrow {
                    asset: self.plan.contracts.borrow_asset,
                    amount,
                    rate_mode: self.plan.interest_rate_mode,
                    referral_code: self.plan.referral_code,
                    on_behalf_of: self.gateway.account(),
                },
            )
            .await?;
        info!("You've borrowed!");
        Ok(receipt)
    }

    async fn repay(&self, pool: Address, amount: U256) -> LendingResult<ReceiptSummary> {
        let receipt = self
            .execute(
                pool,
                ContractCall::Repay {
                    asset: self.plan.contracts.borrow_asset,
                    amount,
                    rate_mode: self.plan.interest_rate_mode,
                    on_behalf_of: self.gateway.account(),
                },
            )
            .await?;
        info!("Repaid!");
        Ok(receipt)
    }

    async fn execute(&self, target: Address, call: ContractCall) -> LendingResult<ReceiptSummary> {
        let intent = TransactionIntent::new(target, call, self.plan.confirmations);
        debug!(operation = intent.name(), %target, "Sending transaction");
        self.gateway.execute(&intent).await
    }
}

// ============================================================================
// Human-readable output
// ============================================================================

impl fmt::Display for WrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account: {}", self.account)?;
        writeln!(f, "Wrapped {} ETH", format_units(self.amount, ETHER_DECIMALS))?;
        write!(f, "Got {} WETH", format_units(self.weth_balance, ETHER_DECIMALS))
    }
}

impl fmt::Display for AccountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account: {}", self.account)?;
        writeln!(f, "LendingPool: {}", self.lending_pool)?;
        write!(f, "{}", self.snapshot)
    }
}

impl fmt::Display for BorrowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account: {}", self.account)?;
        writeln!(f, "LendingPool: {}", self.lending_pool)?;
        writeln!(f, "Got {} WETH", format_units(self.weth_balance, ETHER_DECIMALS))?;
        writeln!(f)?;
        writeln!(f, "After deposit:\n{}", self.after_deposit)?;
        writeln!(
            f,
            "The borrow asset price is {} wei of ETH per unit",
            self.price
        )?;
        writeln!(
            f,
            "You can borrow {} units of the borrow asset",
            self.quote.whole_units
        )?;
        writeln!(f)?;
        writeln!(f, "After borrow:\n{}", self.after_borrow)?;
        writeln!(f)?;
        writeln!(f, "After repay:\n{}", self.after_repay)?;
        writeln!(f)?;
        write!(f, "Transactions:")?;
        for tx in &self.transactions {
            write!(f, "\n  {:<18} {}", tx.step, tx.receipt.tx_hash)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aave_borrow_sdk::testing::{Fault, MockGateway};
    use alloy::primitives::address;

    fn account() -> Address {
        address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
    }

    fn plan() -> WorkflowPlan {
        WorkflowPlan::new(&WorkflowConfig::default(), ContractAddresses::mainnet()).unwrap()
    }

    #[test]
    fn test_plan_parses_wrap_amount() {
        let plan = plan();
        assert_eq!(plan.wrap_amount, aave_borrow_sdk::DEFAULT_WRAP_AMOUNT_WEI);
        assert_eq!(plan.interest_rate_mode.as_u8(), 1);
    }

    #[tokio::test]
    async fn test_wrap_only_sends_one_transaction() {
        let gateway = MockGateway::new(account());
        let plan = plan();

        let report = BorrowWorkflow::new(&gateway, &plan).wrap_native().await.unwrap();
        assert!(report.weth_balance >= plan.wrap_amount);
        assert_eq!(gateway.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_account_overview_sends_nothing() {
        let gateway = MockGateway::new(account());
        let plan = plan();

        let report = BorrowWorkflow::new(&gateway, &plan)
            .account_overview()
            .await
            .unwrap();
        assert_eq!(report.lending_pool, gateway.market().pool);
        assert_eq!(report.snapshot.total_collateral_eth, U256::ZERO);
        assert!(gateway.submitted().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_price_read_stops_before_borrow() {
        let gateway = MockGateway::new(account()).with_fault(Fault::FailRead("latestRoundData"));
        let plan = plan();

        let err = BorrowWorkflow::new(&gateway, &plan).run().await.unwrap_err();
        assert!(err.is_remote());

        let names: Vec<_> = gateway
            .submitted()
            .await
            .iter()
            .map(|intent| intent.name())
            .collect();
        assert_eq!(names, vec!["wrap_native", "approve", "deposit"]);
    }

    #[test]
    fn test_report_display() {
        let report = WrapReport {
            account: account(),
            amount: aave_borrow_sdk::DEFAULT_WRAP_AMOUNT_WEI,
            weth_balance: aave_borrow_sdk::DEFAULT_WRAP_AMOUNT_WEI,
            receipt: ReceiptSummary {
                tx_hash: Default::default(),
                block_number: Some(1),
                gas_used: 21_000,
                success: true,
            },
        };
        let rendered = report.to_string();
        assert!(rendered.contains("Wrapped 0.02 ETH"));
        assert!(rendered.ends_with("Got 0.02 WETH"));
    }
}
