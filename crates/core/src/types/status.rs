//! Status enums for carts and orders.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a cart.
///
/// A cart starts `Active` and moves to `Ordered` exactly once, at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Accepting item additions.
    #[default]
    Active,
    /// Converted into an order; never modified again.
    Ordered,
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Ordered => write!(f, "ordered"),
        }
    }
}

impl std::str::FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "ordered" => Ok(Self::Ordered),
            _ => Err(format!("invalid cart status: {s}")),
        }
    }
}

/// Order status.
///
/// Orders are final once placed, so `Completed` is the only state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Completed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_status_display_matches_serde() {
        for status in [CartStatus::Active, CartStatus::Ordered] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            assert_eq!(status.to_string().parse::<CartStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_cart_status_from_str_invalid() {
        assert!("pending".parse::<CartStatus>().is_err());
    }

    #[test]
    fn test_order_status_round_trip() {
        assert_eq!(
            "completed".parse::<OrderStatus>().unwrap(),
            OrderStatus::Completed
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
