//! Integer quantities and prices
//!
//! Sizes, prices and balances are whole units held in `i64`. There is no
//! fractional currency. All products go through checked arithmetic so an
//! overflow fails the operation instead of wrapping.

use crate::errors::EngineError;

/// Number of units of an asset (order size, balance total/usable)
pub type Quantity = i64;

/// Price per unit, denominated in the cash asset
pub type Price = i64;

/// Cash value of `size` units at `price`
///
/// Fails with `ArithmeticOverflow` when the product does not fit in `i64`.
pub fn notional(size: Quantity, price: Price) -> Result<Quantity, EngineError> {
    size.checked_mul(price)
        .ok_or(EngineError::ArithmeticOverflow { operation: "size * price" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_notional() {
        assert_eq!(notional(10, 100), Ok(1_000));
    }

    #[test]
    fn test_notional_overflow() {
        assert!(matches!(
            notional(i64::MAX, 2),
            Err(EngineError::ArithmeticOverflow { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_notional_never_wraps(size in 1i64..=i64::MAX, price in 1i64..=i64::MAX) {
            match notional(size, price) {
                Ok(value) => {
                    prop_assert!(value > 0);
                    prop_assert_eq!(value / price, size);
                }
                Err(err) => {
                    prop_assert!(size.checked_mul(price).is_none());
                    let is_overflow = matches!(err, EngineError::ArithmeticOverflow { .. });
                    prop_assert!(is_overflow);
                }
            }
        }
    }
}
