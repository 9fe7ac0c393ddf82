use alloy_primitives::TxHash;
use thiserror::Error;

// ============================================================================
// Main Error Enum
// ============================================================================

/// Error enum for the aave-borrow workflow
///
/// `RpcError` and `TransactionReverted` are the remote-call class: anything the
/// node or the external contracts rejected. Every other variant is raised
/// locally, before a call is made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LendingError {
    // ========================================================================
    // Remote Call Errors
    // ========================================================================

    /// Transport failure or a call rejected by the node
    #[error("Remote call '{operation}' failed: {message}")]
    RpcError { operation: String, message: String },

    /// Transaction was mined but reverted
    #[error("Transaction '{operation}' reverted ({tx_hash})")]
    TransactionReverted { operation: String, tx_hash: TxHash },

    // ========================================================================
    // Math Errors
    // ========================================================================

    /// Oracle answer that cannot be used as a divisor
    #[error("Invalid price from feed: {answer}")]
    InvalidPrice { answer: String },

    /// Division by zero
    #[error("Division by zero in context: {context}")]
    DivisionByZero { context: String },

    /// Arithmetic overflow occurred
    #[error("Math overflow in '{operation}' with values: {values:?}")]
    MathOverflow { operation: String, values: Vec<String> },

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    /// Invalid configuration
    #[error("Invalid configuration for '{component}': {reason}")]
    InvalidConfiguration { component: String, reason: String },

    /// Missing configuration
    #[error("Missing configuration for '{component}': {reason}")]
    MissingConfiguration { component: String, reason: String },

    /// Connected node reports a different chain than configured
    #[error("Chain id mismatch on '{network}': configured {expected}, node reports {actual}")]
    ChainMismatch { network: String, expected: u64, actual: u64 },
}

impl LendingError {
    /// Create an RPC error for the named operation
    pub fn rpc_error(operation: &str, message: impl ToString) -> Self {
        Self::RpcError {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a reverted transaction error
    pub fn reverted(operation: &str, tx_hash: TxHash) -> Self {
        Self::TransactionReverted {
            operation: operation.to_string(),
            tx_hash,
        }
    }

    /// Create a math overflow error with context
    pub fn math_overflow(operation: &str, values: &[&str]) -> Self {
        Self::MathOverflow {
            operation: operation.to_string(),
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn division_by_zero(context: &str) -> Self {
        Self::DivisionByZero {
            context: context.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(component: &str, reason: &str) -> Self {
        Self::InvalidConfiguration {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing configuration error
    pub fn missing_config(component: &str, reason: &str) -> Self {
        Self::MissingConfiguration {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures reported by the node or the external contracts
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RpcError { .. } | Self::TransactionReverted { .. })
    }
}
