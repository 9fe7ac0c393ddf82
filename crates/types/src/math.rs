//! Borrow arithmetic and unit conversions
//!
//! Everything here is integer-only: divisions truncate, the way the pool and
//! the oracle's wei-denominated values are meant to be combined.

use alloy_primitives::{utils, I256, U256};
use serde::{Deserialize, Serialize};

use crate::constants::PERCENT_DENOMINATOR;
use crate::errors::LendingError;
use crate::LendingResult;

// ============================================================================
// Borrow Quote
// ============================================================================

/// Amount of the borrow asset the workflow will request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowQuote {
    /// Whole tokens, before scaling by the asset's decimals
    pub whole_units: U256,
    /// Same amount in the asset's smallest unit; this is what the pool receives
    pub amount: U256,
}

/// Compute how much of the borrow asset to request.
///
/// `whole_units = available_borrows_eth * ratio_pct / 100 / price`, then scaled
/// by `10^decimals`. `price` is the oracle answer: wei of ETH per whole token.
pub fn compute_borrow_amount(
    available_borrows_eth: U256,
    price: U256,
    ratio_pct: u64,
    decimals: u8,
) -> LendingResult<BorrowQuote> {
    if price.is_zero() {
        return Err(LendingError::division_by_zero("borrow amount: price"));
    }

    let scaled = available_borrows_eth
        .checked_mul(U256::from(ratio_pct))
        .ok_or_else(|| {
            LendingError::math_overflow(
                "borrow ratio",
                &[&available_borrows_eth.to_string(), &ratio_pct.to_string()],
            )
        })?;

    let whole_units = scaled / U256::from(PERCENT_DENOMINATOR) / price;
    let amount = whole_units
        .checked_mul(decimals_factor(decimals))
        .ok_or_else(|| {
            LendingError::math_overflow(
                "borrow scaling",
                &[&whole_units.to_string(), &decimals.to_string()],
            )
        })?;

    Ok(BorrowQuote { whole_units, amount })
}

/// Accept an oracle answer as a divisor. Non-positive answers are rejected.
pub fn price_from_answer(answer: I256) -> LendingResult<U256> {
    if !answer.is_positive() {
        return Err(LendingError::InvalidPrice {
            answer: answer.to_string(),
        });
    }
    Ok(answer.into_raw())
}

/// `10^decimals`
pub fn decimals_factor(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

// ============================================================================
// Unit Formatting
// ============================================================================

/// Render a smallest-unit amount as a decimal string without trailing zeros.
pub fn format_units(amount: U256, decimals: u8) -> String {
    match utils::format_units(amount, decimals) {
        Ok(rendered) => trim_fraction(rendered),
        Err(_) => amount.to_string(),
    }
}

/// Parse an ether-denominated decimal string ("0.02") into wei.
pub fn parse_ether_amount(value: &str) -> LendingResult<U256> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(LendingError::invalid_config(
            "amount",
            &format!("'{}' is negative", value),
        ));
    }
    utils::parse_ether(trimmed).map_err(|e| {
        LendingError::invalid_config("amount", &format!("'{}' is not an ether amount: {}", value, e))
    })
}

fn trim_fraction(rendered: String) -> String {
    if !rendered.contains('.') {
        return rendered;
    }
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ether(whole: u64) -> U256 {
        U256::from(whole) * decimals_factor(18)
    }

    #[test]
    fn test_borrow_amount_dai_scenario() {
        // 10 ETH of capacity, DAI at 0.0005 ETH
        let available = ether(10);
        let price = U256::from(500_000_000_000_000u64);

        let quote = compute_borrow_amount(available, price, 95, 18).unwrap();
        assert_eq!(quote.whole_units, U256::from(19_000u64));
        assert_eq!(quote.amount, ether(19_000));
    }

    #[test]
    fn test_borrow_amount_truncates() {
        // 1 wei * 95 / 100 = 0
        let quote = compute_borrow_amount(U256::from(1u64), U256::from(1u64), 95, 18).unwrap();
        assert_eq!(quote.whole_units, U256::ZERO);
        assert_eq!(quote.amount, U256::ZERO);

        // 1000 * 95 / 100 = 950, / 3 = 316
        let quote = compute_borrow_amount(U256::from(1000u64), U256::from(3u64), 95, 0).unwrap();
        assert_eq!(quote.whole_units, U256::from(316u64));
        assert_eq!(quote.amount, U256::from(316u64));
    }

    #[test]
    fn test_zero_price_rejected() {
        let err = compute_borrow_amount(ether(1), U256::ZERO, 95, 18).unwrap_err();
        assert!(matches!(err, LendingError::DivisionByZero { .. }));
    }

    #[test]
    fn test_overflow_reported() {
        let err = compute_borrow_amount(U256::MAX, U256::from(1u64), 95, 18).unwrap_err();
        assert!(matches!(err, LendingError::MathOverflow { .. }));
    }

    #[test]
    fn test_price_from_answer() {
        assert_eq!(
            price_from_answer(I256::try_from(500_000_000_000_000i64).unwrap()).unwrap(),
            U256::from(500_000_000_000_000u64)
        );
        assert!(price_from_answer(I256::ZERO).is_err());
        assert!(price_from_answer(I256::MINUS_ONE).is_err());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(20_000_000_000_000_000u64), 18), "0.02");
        assert_eq!(format_units(ether(19_000), 18), "19000");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_parse_ether_amount() {
        assert_eq!(
            parse_ether_amount("0.02").unwrap(),
            U256::from(20_000_000_000_000_000u64)
        );
        assert_eq!(parse_ether_amount(" 1 ").unwrap(), ether(1));
        assert!(parse_ether_amount("-1").is_err());
        assert!(parse_ether_amount("two").is_err());
    }

    proptest! {
        #[test]
        fn prop_borrow_amount_is_floor(available in any::<u128>(), price in 1u128..=u128::MAX) {
            let quote = compute_borrow_amount(
                U256::from(available),
                U256::from(price),
                95,
                18,
            ).unwrap();

            let capacity = U256::from(available) * U256::from(95u64) / U256::from(100u64);
            let price = U256::from(price);
            prop_assert!(quote.whole_units * price <= capacity);
            prop_assert!((quote.whole_units + U256::from(1u64)) * price > capacity);
            prop_assert_eq!(quote.amount, quote.whole_units * decimals_factor(18));
        }
    }
}
