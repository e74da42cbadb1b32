use uuid::Uuid;

use orderflow_core::ProductId;

use crate::error::FulfillmentError;

/// A "place order" request.
#[derive(Debug, Clone)]
pub struct FulfillmentRequest {
    pub product_id: ProductId,
    pub qty: i64,
    pub customer_id: String,
    pub address: String,
    /// Optional idempotency key. Fulfillment is not naturally idempotent
    /// (every call creates a new order/delivery pair), so callers that retry
    /// after a timeout should supply one to avoid double-fulfilling.
    pub request_id: Option<Uuid>,
}

impl FulfillmentRequest {
    /// Shape validation, performed before any storage access.
    pub fn validate(&self) -> Result<(), FulfillmentError> {
        if self.qty <= 0 {
            return Err(FulfillmentError::Validation(
                "qty must be positive".to_string(),
            ));
        }
        if self.customer_id.trim().is_empty() {
            return Err(FulfillmentError::Validation(
                "customer_id cannot be empty".to_string(),
            ));
        }
        if self.address.trim().is_empty() {
            return Err(FulfillmentError::Validation(
                "address cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(qty: i64, customer_id: &str, address: &str) -> FulfillmentRequest {
        FulfillmentRequest {
            product_id: ProductId::new(),
            qty,
            customer_id: customer_id.to_string(),
            address: address.to_string(),
            request_id: None,
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(request(1, "cust-1", "1 Main St").validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_qty() {
        assert!(matches!(
            request(0, "cust-1", "1 Main St").validate(),
            Err(FulfillmentError::Validation(_))
        ));
        assert!(request(-3, "cust-1", "1 Main St").validate().is_err());
    }

    #[test]
    fn rejects_blank_fields() {
        assert!(request(1, " ", "1 Main St").validate().is_err());
        assert!(request(1, "cust-1", "").validate().is_err());
    }
}
