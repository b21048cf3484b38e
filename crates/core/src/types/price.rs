//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Quantity;

/// Errors that can occur when constructing or combining a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum allowed scale.
        max: u32,
    },
    /// The amount exceeds the largest storable unit price.
    #[error("price must be at most {max}")]
    TooLarge {
        /// Maximum allowed amount.
        max: Decimal,
    },
    /// Arithmetic on prices overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,
}

/// A non-negative monetary amount in the store's single currency.
///
/// Serialized as a decimal string (`"999.99"`) so no precision is lost in
/// transit. Deserialization accepts either a string or a JSON number.
///
/// ```
/// use cartwheel_core::{Price, Quantity};
/// use rust_decimal::Decimal;
///
/// let unit = Price::new(Decimal::new(1000, 2)).unwrap();
/// let line = unit.line_total(Quantity::new(5).unwrap()).unwrap();
/// assert_eq!(line.amount(), Decimal::new(5000, 2));
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Maximum number of decimal places a price may carry.
    pub const MAX_SCALE: u32 = 2;

    /// Largest unit price accepted for a catalog item (`NUMERIC(12, 2)`).
    pub const MAX_UNIT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or has more than two
    /// decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }
        Ok(Self(amount))
    }

    /// Create a catalog unit price, additionally bounded by [`Self::MAX_UNIT`].
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Self::new`], or if the
    /// amount exceeds the storable unit price.
    pub fn unit(amount: Decimal) -> Result<Self, PriceError> {
        let price = Self::new(amount)?;
        if price.0 > Self::MAX_UNIT {
            return Err(PriceError::TooLarge {
                max: Self::MAX_UNIT,
            });
        }
        Ok(price)
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the product does not fit in a decimal.
    pub fn line_total(self, quantity: Quantity) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// Add two prices.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the sum does not fit in a decimal.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// Sum a sequence of prices, starting from zero.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the running total overflows.
    pub fn sum<I>(prices: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = Self>,
    {
        prices
            .into_iter()
            .try_fold(Self::ZERO, |total, price| total.checked_add(price))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
    }

    #[test]
    fn test_zero_is_allowed() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_rejects_sub_cent_amounts() {
        assert!(matches!(
            Price::new(Decimal::new(1999, 3)),
            Err(PriceError::TooPrecise { max: 2 })
        ));
        // Trailing zeros beyond two places are fine.
        assert!(Price::new(Decimal::new(19_990, 3)).is_ok());
    }

    #[test]
    fn test_unit_upper_bound() {
        assert!(Price::unit(Price::MAX_UNIT).is_ok());
        assert!(matches!(
            Price::unit(Price::MAX_UNIT + Decimal::new(1, 2)),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_line_total() {
        let total = price(1000).line_total(Quantity::new(5).unwrap()).unwrap();
        assert_eq!(total, price(5000));
    }

    #[test]
    fn test_sum() {
        let total = Price::sum([price(5000), price(500)]).unwrap();
        assert_eq!(total, price(5500));
        assert_eq!(Price::sum([]).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(price(550).to_string(), "5.50");
        assert_eq!(Price::new(Decimal::new(5, 0)).unwrap().to_string(), "5.00");
    }

    #[test]
    fn test_serializes_as_string() {
        assert_eq!(serde_json::to_string(&price(99_999)).unwrap(), "\"999.99\"");
    }

    #[test]
    fn test_deserializes_string_or_number() {
        let from_str: Price = serde_json::from_str("\"12.50\"").unwrap();
        let from_num: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(from_str, from_num);

        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }
}
