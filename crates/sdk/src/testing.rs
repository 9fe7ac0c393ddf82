//! Testing utilities for the borrow workflow
//!
//! `MockGateway` stands in for the WETH, DAI, lending pool, addresses provider
//! and price feed contracts. State changes are applied when a transaction is
//! confirmed, the way a node applies them when the transaction is mined.

use std::collections::HashMap;

use aave_borrow_types::{
    decimals_factor, AccountSnapshot, ContractCall, LendingError, LendingResult, ReceiptSummary,
    TransactionIntent,
};
use alloy::primitives::{address, Address, TxHash, B256, I256, U256};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::gateway::LendingGateway;

/// Basis points denominator
const BPS: u64 = 10_000;

/// Contract addresses and risk parameters of the simulated market
#[derive(Debug, Clone)]
pub struct MockMarket {
    pub weth: Address,
    pub dai: Address,
    pub addresses_provider: Address,
    pub pool: Address,
    pub price_feed: Address,
    /// Oracle answer: wei of ETH per whole DAI
    pub dai_price: I256,
    pub ltv_bps: u64,
    pub liquidation_threshold_bps: u64,
}

impl Default for MockMarket {
    fn default() -> Self {
        Self {
            weth: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            dai: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
            addresses_provider: address!("B53C1a33016B2DC2fF3653530bfF1848a515c8c5"),
            pool: address!("7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9"),
            price_feed: address!("773616E4d11A78F511299002da57A0a94577F1f4"),
            // 0.0005 ETH per DAI
            dai_price: I256::from_raw(U256::from(500_000_000_000_000u64)),
            ltv_bps: 8_000,
            liquidation_threshold_bps: 8_250,
        }
    }
}

/// One observable interaction with the gateway, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    Submitted { tx_hash: TxHash, intent: TransactionIntent },
    Confirmed { tx_hash: TxHash, operation: &'static str, success: bool },
    Read { operation: &'static str },
}

/// Failure injected into the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `submit` of this operation fails as a transport error
    RejectSubmit(&'static str),
    /// This operation is mined but reverts
    Revert(&'static str),
    /// This operation reverts when sent to `target` only
    RevertAt {
        operation: &'static str,
        target: Address,
    },
    /// Every read of this operation fails
    FailRead(&'static str),
}

#[derive(Debug, Default)]
struct MockState {
    native_balance: U256,
    /// (token, owner) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    collateral_eth: U256,
    debt_eth: U256,
    pending: HashMap<TxHash, TransactionIntent>,
    events: Vec<GatewayEvent>,
    nonce: u64,
    block: u64,
}

/// In-memory lending gateway
pub struct MockGateway {
    account: Address,
    market: MockMarket,
    faults: Vec<Fault>,
    state: Mutex<MockState>,
}

impl MockGateway {
    /// Fresh market, `account` holding 10 ETH and nothing else
    pub fn new(account: Address) -> Self {
        Self::with_market(account, MockMarket::default())
    }

    pub fn with_market(account: Address, market: MockMarket) -> Self {
        let state = MockState {
            native_balance: U256::from(10u64) * decimals_factor(18),
            ..MockState::default()
        };
        Self {
            account,
            market,
            faults: Vec::new(),
            state: Mutex::new(state),
        }
    }

    /// Collateral (ETH-denominated wei) the account already has in the pool
    pub fn with_existing_collateral(mut self, collateral_eth: U256) -> Self {
        self.state.get_mut().collateral_eth = collateral_eth;
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn market(&self) -> &MockMarket {
        &self.market
    }

    /// Everything the gateway saw so far
    pub async fn events(&self) -> Vec<GatewayEvent> {
        self.state.lock().await.events.clone()
    }

    /// Every submitted intent, in order
    pub async fn submitted(&self) -> Vec<TransactionIntent> {
        self.state
            .lock()
            .await
            .events
            .iter()
            .filter_map(|event| match event {
                GatewayEvent::Submitted { intent, .. } => Some(intent.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .await
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn read(&self, state: &mut MockState, operation: &'static str) -> LendingResult<()> {
        state.events.push(GatewayEvent::Read { operation });
        if self.has_fault(Fault::FailRead(operation)) {
            return Err(LendingError::rpc_error(operation, "injected read failure"));
        }
        Ok(())
    }

    fn price(&self) -> U256 {
        self.market.dai_price.into_raw()
    }

    fn snapshot(&self, state: &MockState) -> AccountSnapshot {
        let ltv = U256::from(self.market.ltv_bps);
        let threshold = U256::from(self.market.liquidation_threshold_bps);
        let bps = U256::from(BPS);

        let capacity = state.collateral_eth * ltv / bps;
        let health_factor = if state.debt_eth.is_zero() {
            U256::MAX
        } else {
            state.collateral_eth * threshold / bps * decimals_factor(18) / state.debt_eth
        };

        AccountSnapshot {
            total_collateral_eth: state.collateral_eth,
            total_debt_eth: state.debt_eth,
            available_borrows_eth: capacity.saturating_sub(state.debt_eth),
            current_liquidation_threshold: threshold,
            ltv,
            health_factor,
        }
    }

    /// Debt value in ETH of a DAI amount
    fn dai_to_eth(&self, amount: U256) -> U256 {
        amount * self.price() / decimals_factor(18)
    }

    /// Apply a mined intent. Returns false when the contracts would revert.
    fn apply(&self, state: &mut MockState, intent: &TransactionIntent) -> bool {
        let owner = self.account;
        match &intent.call {
            ContractCall::WrapNative { amount } => {
                if intent.target != self.market.weth || state.native_balance < *amount {
                    return false;
                }
                state.native_balance -= *amount;
                *state.balances.entry((self.market.weth, owner)).or_default() += *amount;
                true
            }
            ContractCall::Approve { spender, amount } => {
                state
                    .allowances
                    .insert((intent.target, owner, *spender), *amount);
                true
            }
            ContractCall::Deposit {
                asset,
                amount,
                on_behalf_of,
                ..
            } => {
                if intent.target != self.market.pool
                    || *asset != self.market.weth
                    || *on_behalf_of != owner
                    || !Self::pull(state, *asset, owner, self.market.pool, *amount)
                {
                    return false;
                }
                state.collateral_eth += *amount;
                true
            }
            ContractCall::Borrow {
                asset,
                amount,
                on_behalf_of,
                ..
            } => {
                if intent.target != self.market.pool
                    || *asset != self.market.dai
                    || *on_behalf_of != owner
                {
                    return false;
                }
                let debt = self.dai_to_eth(*amount);
                if debt > self.snapshot(state).available_borrows_eth {
                    return false;
                }
                state.debt_eth += debt;
                *state.balances.entry((*asset, owner)).or_default() += *amount;
                true
            }
            ContractCall::Repay {
                asset,
                amount,
                on_behalf_of,
                ..
            } => {
                if intent.target != self.market.pool
                    || *asset != self.market.dai
                    || *on_behalf_of != owner
                    || !Self::pull(state, *asset, owner, self.market.pool, *amount)
                {
                    return false;
                }
                state.debt_eth = state.debt_eth.saturating_sub(self.dai_to_eth(*amount));
                true
            }
        }
    }

    /// `transferFrom(owner, spender, amount)` semantics: needs balance and allowance
    fn pull(
        state: &mut MockState,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> bool {
        let allowance = state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default();
        let balance = state
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default();
        if allowance < amount || balance < amount {
            return false;
        }
        state
            .allowances
            .insert((token, owner, spender), allowance - amount);
        state.balances.insert((token, owner), balance - amount);
        true
    }
}

#[async_trait]
impl LendingGateway for MockGateway {
    fn account(&self) -> Address {
        self.account
    }

    async fn submit(&self, intent: &TransactionIntent) -> LendingResult<TxHash> {
        if self.has_fault(Fault::RejectSubmit(intent.name())) {
            return Err(LendingError::rpc_error(intent.name(), "injected submit failure"));
        }

        let mut state = self.state.lock().await;
        state.nonce += 1;
        let tx_hash = B256::left_padding_from(&state.nonce.to_be_bytes());
        state.pending.insert(tx_hash, intent.clone());
        state.events.push(GatewayEvent::Submitted {
            tx_hash,
            intent: intent.clone(),
        });
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: TxHash, confirmations: u64) -> LendingResult<ReceiptSummary> {
        let mut state = self.state.lock().await;
        let intent = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| LendingError::rpc_error("confirm", format!("unknown transaction {}", tx_hash)))?;

        let reverts = self.has_fault(Fault::Revert(intent.name()))
            || self.has_fault(Fault::RevertAt {
                operation: intent.name(),
                target: intent.target,
            });
        let success = !reverts && self.apply(&mut state, &intent);
        state.block += confirmations.max(1);
        let block_number = Some(state.block);
        state.events.push(GatewayEvent::Confirmed {
            tx_hash,
            operation: intent.name(),
            success,
        });

        Ok(ReceiptSummary {
            tx_hash,
            block_number,
            gas_used: 21_000,
            success,
        })
    }

    async fn token_balance(&self, token: Address, owner: Address) -> LendingResult<U256> {
        let mut state = self.state.lock().await;
        self.read(&mut state, "balanceOf")?;
        Ok(state
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn lending_pool(&self, addresses_provider: Address) -> LendingResult<Address> {
        let mut state = self.state.lock().await;
        self.read(&mut state, "getLendingPool")?;
        if addresses_provider != self.market.addresses_provider {
            return Err(LendingError::rpc_error("getLendingPool", "no contract at address"));
        }
        Ok(self.market.pool)
    }

    async fn account_data(&self, pool: Address, _user: Address) -> LendingResult<AccountSnapshot> {
        let mut state = self.state.lock().await;
        self.read(&mut state, "getUserAccountData")?;
        if pool != self.market.pool {
            return Err(LendingError::rpc_error("getUserAccountData", "no contract at address"));
        }
        Ok(self.snapshot(&state))
    }

    async fn latest_price(&self, feed: Address) -> LendingResult<I256> {
        let mut state = self.state.lock().await;
        self.read(&mut state, "latestRoundData")?;
        if feed != self.market.price_feed {
            return Err(LendingError::rpc_error("latestRoundData", "no contract at address"));
        }
        Ok(self.market.dai_price)
    }
}
