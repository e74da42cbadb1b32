use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderflow_core::{DomainError, DomainResult, ProductId};

/// A product row in the stock ledger.
///
/// Invariant: `stock >= 0` at all times observable outside a transaction.
/// All stock mutation during fulfillment goes through [`InventoryItem::decrement`]
/// (or the storage backend's equivalent atomic primitive); administrative
/// restocks use [`InventoryItem::adjust`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ProductId,
    pub name: String,
    pub stock: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Create a new item with a fresh identity.
    pub fn new(name: impl Into<String>, stock: i64, price: i64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        if price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(Self {
            id: ProductId::new(),
            name,
            stock,
            price,
            created_at: Utc::now(),
        })
    }

    /// Remove `qty` units of stock.
    ///
    /// Fails without mutating if `qty` is not positive or if fewer than `qty`
    /// units are available. No partial decrement.
    pub fn decrement(&mut self, qty: i64) -> DomainResult<()> {
        if qty <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.stock < qty {
            return Err(DomainError::invariant(format!(
                "insufficient stock: {} available, {} requested",
                self.stock, qty
            )));
        }
        self.stock -= qty;
        Ok(())
    }

    /// Apply a signed stock correction (restock or shrinkage).
    ///
    /// The resulting stock must stay non-negative; a zero delta is rejected.
    pub fn adjust(&mut self, delta: i64) -> DomainResult<()> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }
        let new_stock = self.stock.checked_add(delta).ok_or_else(|| {
            DomainError::invariant("stock adjustment overflows")
        })?;
        if new_stock < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }
        self.stock = new_stock;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item_with_stock(stock: i64) -> InventoryItem {
        InventoryItem::new("widget", stock, 100).unwrap()
    }

    #[test]
    fn new_rejects_negative_stock_and_price() {
        assert!(InventoryItem::new("widget", -1, 100).is_err());
        assert!(InventoryItem::new("widget", 1, -100).is_err());
        assert!(InventoryItem::new("  ", 1, 100).is_err());
    }

    #[test]
    fn decrement_reduces_stock() {
        let mut item = item_with_stock(10);
        item.decrement(3).unwrap();
        assert_eq!(item.stock, 7);
    }

    #[test]
    fn decrement_fails_when_stock_insufficient() {
        let mut item = item_with_stock(2);
        let err = item.decrement(5).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        // No partial decrement.
        assert_eq!(item.stock, 2);
    }

    #[test]
    fn decrement_rejects_non_positive_quantity() {
        let mut item = item_with_stock(10);
        assert!(matches!(item.decrement(0), Err(DomainError::Validation(_))));
        assert!(matches!(item.decrement(-1), Err(DomainError::Validation(_))));
        assert_eq!(item.stock, 10);
    }

    #[test]
    fn adjust_restocks_and_rejects_negative_result() {
        let mut item = item_with_stock(1);
        item.adjust(5).unwrap();
        assert_eq!(item.stock, 6);
        assert!(item.adjust(-7).is_err());
        assert_eq!(item.stock, 6);
        assert!(item.adjust(0).is_err());
    }

    proptest! {
        #[test]
        fn decrement_never_goes_negative(stock in 0i64..10_000, qty in 1i64..10_000) {
            let mut item = item_with_stock(stock);
            let result = item.decrement(qty);
            if stock >= qty {
                prop_assert!(result.is_ok());
                prop_assert_eq!(item.stock, stock - qty);
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(item.stock, stock);
            }
            prop_assert!(item.stock >= 0);
        }

        #[test]
        fn adjust_preserves_non_negative_stock(stock in 0i64..10_000, delta in -10_000i64..10_000) {
            let mut item = item_with_stock(stock);
            let result = item.adjust(delta);
            match result {
                Ok(()) => prop_assert_eq!(item.stock, stock + delta),
                Err(_) => prop_assert_eq!(item.stock, stock),
            }
            prop_assert!(item.stock >= 0);
        }
    }
}
