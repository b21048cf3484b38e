//! Line-item quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing or accumulating a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// A stored quantity must be at least one.
    #[error("quantity must be positive, got {0}")]
    NotPositive(i64),
    /// The requested quantity cannot be stored.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i32,
    },
    /// Accumulating two quantities overflowed.
    #[error("accumulated quantity exceeds {max}")]
    Overflow {
        /// Maximum allowed quantity.
        max: i32,
    },
}

/// A strictly positive number of units on a cart or order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Largest storable quantity.
    pub const MAX: i32 = i32::MAX;

    /// Create a quantity from a stored value.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` if `value` is zero or negative.
    pub fn new(value: i32) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive(i64::from(value)));
        }
        Ok(Self(value))
    }

    /// Resolve a quantity supplied by a caller.
    ///
    /// Missing, zero, and negative requests all mean one unit.
    ///
    /// ```
    /// use cartwheel_core::Quantity;
    ///
    /// assert_eq!(Quantity::from_requested(None).unwrap(), Quantity::ONE);
    /// assert_eq!(Quantity::from_requested(Some(-4)).unwrap(), Quantity::ONE);
    /// assert_eq!(Quantity::from_requested(Some(3)).unwrap().get(), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the request exceeds [`Self::MAX`].
    pub fn from_requested(requested: Option<i64>) -> Result<Self, QuantityError> {
        match requested {
            Some(value) if value > 0 => i32::try_from(value)
                .map(Self)
                .map_err(|_| QuantityError::TooLarge { max: Self::MAX }),
            _ => Ok(Self::ONE),
        }
    }

    /// Add another quantity to this one.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Overflow` if the sum exceeds [`Self::MAX`].
    pub fn accumulate(self, other: Self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(QuantityError::Overflow { max: Self::MAX })
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
    }

    #[test]
    fn test_from_requested_defaults_to_one() {
        assert_eq!(Quantity::from_requested(Some(0)).unwrap(), Quantity::ONE);
        assert_eq!(
            Quantity::from_requested(Some(i64::MIN)).unwrap(),
            Quantity::ONE
        );
    }

    #[test]
    fn test_from_requested_too_large() {
        let requested = i64::from(i32::MAX) + 1;
        assert!(matches!(
            Quantity::from_requested(Some(requested)),
            Err(QuantityError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_accumulate() {
        let two = Quantity::new(2).unwrap();
        let three = Quantity::new(3).unwrap();
        assert_eq!(two.accumulate(three).unwrap().get(), 5);
    }

    #[test]
    fn test_accumulate_overflow() {
        let max = Quantity::new(Quantity::MAX).unwrap();
        assert!(matches!(
            max.accumulate(Quantity::ONE),
            Err(QuantityError::Overflow { .. })
        ));
    }

    #[test]
    fn test_deserialize_rejects_non_positive() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }
}
