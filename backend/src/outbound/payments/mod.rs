//! Local payment processor adapter.
//!
//! Opens checkout sessions and executes refunds without network access.
//! Session and refund identifiers mimic the processor's test-mode shapes
//! (`cs_test_…`, `re_test_…`) so webhook fixtures look realistic. Completing
//! a payment is driven by posting a signed event to the payment webhook.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::RefundReceipt;
use crate::domain::ports::{
    CheckoutRequest, GatewaySession, PaymentGateway, PaymentGatewayError, RefundRequest,
};

/// Deterministic in-process stand-in for the hosted payment processor.
#[derive(Debug, Clone)]
pub struct LocalPaymentGateway {
    checkout_base_url: String,
}

impl LocalPaymentGateway {
    /// Build a gateway whose hosted pages live under `checkout_base_url`.
    pub fn new(checkout_base_url: impl Into<String>) -> Self {
        let base: String = checkout_base_url.into();
        Self {
            checkout_base_url: base.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl PaymentGateway for LocalPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<GatewaySession, PaymentGatewayError> {
        if request.amount_cents <= 0 {
            return Err(PaymentGatewayError::rejected(format!(
                "amount must be positive, got {}",
                request.amount_cents
            )));
        }
        let session_id = format!("cs_test_{}", Uuid::new_v4().simple());
        debug!(
            %session_id,
            client_reference = %request.client_reference,
            amount_cents = request.amount_cents,
            currency = %request.currency,
            "local checkout session opened"
        );
        Ok(GatewaySession {
            url: format!("{}/pay/{session_id}", self.checkout_base_url),
            session_id,
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundReceipt, PaymentGatewayError> {
        if request.amount_cents <= 0 {
            return Err(PaymentGatewayError::rejected("refund amount must be positive"));
        }
        let refund_id = format!("re_test_{}", Uuid::new_v4().simple());
        debug!(
            %refund_id,
            payment_intent_id = %request.payment_intent_id,
            amount_cents = request.amount_cents,
            "local refund executed"
        );
        Ok(RefundReceipt {
            refund_id,
            amount_cents: request.amount_cents,
            reason: request.reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{Currency, RefundReason};

    fn checkout(amount_cents: i64) -> CheckoutRequest {
        CheckoutRequest {
            course_title: "Compilers".to_owned(),
            amount_cents,
            currency: Currency::default(),
            client_reference: Uuid::new_v4().to_string(),
            success_url: "https://app.example.test/ok".to_owned(),
            cancel_url: "https://app.example.test/cancel".to_owned(),
        }
    }

    #[tokio::test]
    async fn session_url_points_at_hosted_page() {
        let gateway = LocalPaymentGateway::new("https://checkout.example.test/");

        let session = gateway
            .create_checkout_session(checkout(1_999))
            .await
            .expect("session");

        assert!(session.session_id.starts_with("cs_test_"));
        assert_eq!(
            session.url,
            format!("https://checkout.example.test/pay/{}", session.session_id)
        );
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    #[tokio::test]
    async fn non_positive_checkout_is_rejected(#[case] amount: i64) {
        let gateway = LocalPaymentGateway::new("https://checkout.example.test");

        let error = gateway
            .create_checkout_session(checkout(amount))
            .await
            .expect_err("rejected");

        assert!(matches!(error, PaymentGatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn refund_echoes_amount_and_reason() {
        let gateway = LocalPaymentGateway::new("https://checkout.example.test");

        let receipt = gateway
            .refund(RefundRequest {
                payment_intent_id: "pi_123".to_owned(),
                amount_cents: 700,
                reason: RefundReason::Fraudulent,
            })
            .await
            .expect("refund");

        assert!(receipt.refund_id.starts_with("re_test_"));
        assert_eq!(receipt.amount_cents, 700);
        assert_eq!(receipt.reason, RefundReason::Fraudulent);
    }
}
