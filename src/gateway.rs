//! Payment gateway capability.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;

/// Outcome of a successful authorization.
#[derive(Clone, Debug)]
pub struct GatewayReceipt {
    pub reference: String,
}

/// Boundary to the external payment provider. The stub below settles
/// synchronously; a real integration adds request timeouts, retries, and
/// idempotency keys behind this same trait without touching payment state
/// transitions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(
        &self,
        amount: Decimal,
        currency: &str,
        details: &serde_json::Value,
    ) -> Result<GatewayReceipt>;
}

/// Development gateway: approves every authorization.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysApprove;

#[async_trait]
impl PaymentGateway for AlwaysApprove {
    async fn authorize(
        &self,
        _amount: Decimal,
        _currency: &str,
        _details: &serde_json::Value,
    ) -> Result<GatewayReceipt> {
        Ok(GatewayReceipt { reference: format!("SIM-{}", Uuid::new_v4().simple()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_stub_approves() {
        let receipt = AlwaysApprove
            .authorize(dec!(176), "USD", &serde_json::json!({}))
            .await
            .unwrap();
        assert!(receipt.reference.starts_with("SIM-"));
    }
}
