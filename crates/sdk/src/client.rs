//! Gateway backed by a live node

use aave_borrow_types::{
    AccountSnapshot, ContractCall, LendingError, LendingResult, ReceiptSummary, TransactionIntent,
};
use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, TxHash, I256, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::SdkConfig;
use crate::contracts::{
    AggregatorV3Interface, ILendingPool, ILendingPoolAddressesProvider, IWeth, IERC20,
};
use crate::gateway::LendingGateway;

/// Lending gateway talking to a node over HTTP JSON-RPC with a local wallet
pub struct AaveClient {
    provider: DynProvider,
    account: Address,
}

impl AaveClient {
    /// Build the provider and, when the config names a chain id, check the
    /// node is on that chain.
    pub async fn connect(config: SdkConfig) -> LendingResult<Self> {
        let account = config.signer.address();
        let wallet = EthereumWallet::from(config.signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(config.rpc_url.clone())
            .erased();

        if let Some(expected) = config.chain_id {
            let actual = provider
                .get_chain_id()
                .await
                .map_err(|e| LendingError::rpc_error("eth_chainId", e))?;
            if actual != expected {
                return Err(LendingError::ChainMismatch {
                    network: config.network.clone(),
                    expected,
                    actual,
                });
            }
        }

        info!(
            network = %config.network,
            rpc_url = %config.rpc_url,
            %account,
            "Connected to node"
        );

        Ok(Self { provider, account })
    }
}

#[async_trait]
impl LendingGateway for AaveClient {
    fn account(&self) -> Address {
        self.account
    }

    async fn submit(&self, intent: &TransactionIntent) -> LendingResult<TxHash> {
        let provider = self.provider.clone();
        let pending = match &intent.call {
            ContractCall::WrapNative { amount } => {
                IWeth::new(intent.target, provider)
                    .deposit()
                    .value(*amount)
                    .send()
                    .await
            }
            ContractCall::Approve { spender, amount } => {
                IERC20::new(intent.target, provider)
                    .approve(*spender, *amount)
                    .send()
                    .await
            }
            ContractCall::Deposit {
                asset,
                amount,
                on_behalf_of,
                referral_code,
            } => {
                ILendingPool::new(intent.target, provider)
                    .deposit(*asset, *amount, *on_behalf_of, *referral_code)
                    .send()
                    .await
            }
            ContractCall::Borrow {
                asset,
                amount,
                rate_mode,
                referral_code,
                on_behalf_of,
            } => {
                ILendingPool::new(intent.target, provider)
                    .borrow(
                        *asset,
                        *amount,
                        U256::from(rate_mode.as_u8()),
                        *referral_code,
                        *on_behalf_of,
                    )
                    .send()
                    .await
            }
            ContractCall::Repay {
                asset,
                amount,
                rate_mode,
                on_behalf_of,
            } => {
                ILendingPool::new(intent.target, provider)
                    .repay(*asset, *amount, U256::from(rate_mode.as_u8()), *on_behalf_of)
                    .send()
                    .await
            }
        }
        .map_err(|e| LendingError::rpc_error(intent.name(), e))?;

        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx_hash: TxHash, confirmations: u64) -> LendingResult<ReceiptSummary> {
        debug!(%tx_hash, confirmations, "Waiting for confirmations");
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmations)
            .get_receipt()
            .await
            .map_err(|e| LendingError::rpc_error("confirm", e))?;

        Ok(ReceiptSummary {
            tx_hash,
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            success: receipt.status(),
        })
    }

    async fn token_balance(&self, token: Address, owner: Address) -> LendingResult<U256> {
        IERC20::new(token, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| LendingError::rpc_error("balanceOf", e))
    }

    async fn lending_pool(&self, addresses_provider: Address) -> LendingResult<Address> {
        ILendingPoolAddressesProvider::new(addresses_provider, self.provider.clone())
            .getLendingPool()
            .call()
            .await
            .map_err(|e| LendingError::rpc_error("getLendingPool", e))
    }

    async fn account_data(&self, pool: Address, user: Address) -> LendingResult<AccountSnapshot> {
        let data = ILendingPool::new(pool, self.provider.clone())
            .getUserAccountData(user)
            .call()
            .await
            .map_err(|e| LendingError::rpc_error("getUserAccountData", e))?;

        Ok(AccountSnapshot {
            total_collateral_eth: data.totalCollateralETH,
            total_debt_eth: data.totalDebtETH,
            available_borrows_eth: data.availableBorrowsETH,
            current_liquidation_threshold: data.currentLiquidationThreshold,
            ltv: data.ltv,
            health_factor: data.healthFactor,
        })
    }

    async fn latest_price(&self, feed: Address) -> LendingResult<I256> {
        let round = AggregatorV3Interface::new(feed, self.provider.clone())
            .latestRoundData()
            .call()
            .await
            .map_err(|e| LendingError::rpc_error("latestRoundData", e))?;
        Ok(round.answer)
    }
}
