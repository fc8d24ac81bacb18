//! Driving port for checkout, webhook reconciliation, and refunds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CheckoutSession, Error, Payment, PaymentEvent, RefundReason};

/// Request to open a paid checkout for a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCommand {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub success_url: String,
    pub cancel_url: String,
}

/// Refund options; omitted fields use the full amount and
/// `requested_by_customer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefundCommand {
    pub amount_cents: Option<i64>,
    pub reason: Option<RefundReason>,
}

/// Acknowledgement returned to webhook senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCommand: Send + Sync {
    async fn create_checkout(&self, request: CheckoutCommand) -> Result<CheckoutSession, Error>;

    /// Reconcile a verified processor event. Unknown payments are NotFound;
    /// unrecognised event types are acknowledged.
    async fn handle_event(&self, event: PaymentEvent) -> Result<WebhookAck, Error>;

    async fn refund(&self, payment_id: Uuid, request: RefundCommand) -> Result<Payment, Error>;
}
