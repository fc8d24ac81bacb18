//! Port to the external payment processor.
//!
//! The processor opens hosted checkout sessions and executes refunds. The
//! bundled adapter in `outbound::payments` answers deterministically without
//! network access.

use async_trait::async_trait;

use crate::domain::{Currency, RefundReason, RefundReceipt};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment processor adapters.
    pub enum PaymentGatewayError {
        /// Processor could not be reached.
        Unavailable { message: String } as Unavailable => "payment processor unavailable: {message}",
        /// Processor refused the request.
        Rejected { message: String } as Rejected => "payment processor rejected the request: {message}",
    }
}

/// Parameters for a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub course_title: String,
    pub amount_cents: i64,
    pub currency: Currency,
    /// Customer reference echoed back by the processor.
    pub client_reference: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Session opened by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySession {
    pub session_id: String,
    pub url: String,
}

/// Parameters for a refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub payment_intent_id: String,
    pub amount_cents: i64,
    pub reason: RefundReason,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<GatewaySession, PaymentGatewayError>;

    async fn refund(&self, request: RefundRequest) -> Result<RefundReceipt, PaymentGatewayError>;
}
