//! The seam between the workflow and the chain

use aave_borrow_types::{AccountSnapshot, LendingError, LendingResult, ReceiptSummary, TransactionIntent};
use alloy::primitives::{Address, TxHash, I256, U256};
use async_trait::async_trait;

/// Remote operations the borrow workflow needs from the external contracts.
///
/// State-changing calls are split into `submit` and `confirm` so callers
/// decide when to block on confirmation.
#[async_trait]
pub trait LendingGateway: Send + Sync {
    /// Address that signs every submitted transaction
    fn account(&self) -> Address;

    /// Send the intent's transaction and return its hash without waiting
    async fn submit(&self, intent: &TransactionIntent) -> LendingResult<TxHash>;

    /// Wait for `confirmations` blocks on top of the transaction.
    /// A reverted transaction comes back with `success == false`.
    async fn confirm(&self, tx_hash: TxHash, confirmations: u64) -> LendingResult<ReceiptSummary>;

    /// ERC-20 balance of `owner`
    async fn token_balance(&self, token: Address, owner: Address) -> LendingResult<U256>;

    /// Current lending pool address from the addresses provider
    async fn lending_pool(&self, addresses_provider: Address) -> LendingResult<Address>;

    /// `getUserAccountData(user)` on the pool
    async fn account_data(&self, pool: Address, user: Address) -> LendingResult<AccountSnapshot>;

    /// Raw `answer` of the feed's latest round
    async fn latest_price(&self, feed: Address) -> LendingResult<I256>;

    /// Submit and wait for the intent's confirmations. A revert is an error.
    async fn execute(&self, intent: &TransactionIntent) -> LendingResult<ReceiptSummary> {
        let tx_hash = self.submit(intent).await?;
        tracing::debug!(operation = intent.name(), %tx_hash, "Submitted transaction");
        let receipt = self.confirm(tx_hash, intent.confirmations).await?;
        if !receipt.success {
            return Err(LendingError::reverted(intent.name(), tx_hash));
        }
        tracing::debug!(
            operation = intent.name(),
            %tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }
}
