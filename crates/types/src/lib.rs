/// Shared types for the aave-borrow workflow
///
/// This crate provides the value types, constants, error enum and borrow
/// arithmetic used by the SDK and the runner.

pub mod account;
pub mod constants;
pub mod errors;
pub mod math;

// Re-export all public types
pub use account::*;
pub use constants::*;
pub use errors::*;
pub use math::*;

/// Result type alias using the shared error type
pub type LendingResult<T> = std::result::Result<T, LendingError>;
