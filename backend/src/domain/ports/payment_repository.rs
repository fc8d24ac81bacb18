//! Port for payment persistence and reconciliation.
//!
//! Every method that touches both a payment and its enrollment runs as one
//! unit of work in the adapter, so the two statuses never diverge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Enrollment, Payment, PaymentEvent, PaymentLookup, PaymentRuleError, ReconcileOutcome,
    RefundClaim, RefundReceipt,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment repository adapters.
    pub enum PaymentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } as Unavailable => "payment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } as Failed => "payment repository query failed: {message}",
        /// The enrollment or checkout session already exists.
        Duplicate { message: String } as Duplicate => "{message}",
        /// No payment matches the lookup.
        Missing { message: String } as Missing => "{message}",
        /// The domain refused the change under lock.
        Rejected { message: String } as Rejected => "{message}",
    }
}

impl From<PaymentRuleError> for PaymentRepositoryError {
    fn from(error: PaymentRuleError) -> Self {
        match error {
            PaymentRuleError::RefundInProgress => Self::duplicate(error.to_string()),
            other => Self::rejected(other.to_string()),
        }
    }
}

/// Payment and enrollment as they stand after a reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub payment: Payment,
    pub enrollment: Enrollment,
    pub outcome: ReconcileOutcome,
}

/// Optional filters for payment listings and stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub user_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment) -> bool {
        self.user_id.is_none_or(|id| payment.user_id == id)
            && self.course_id.is_none_or(|id| payment.course_id == id)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, PaymentRepositoryError>;

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Payment>, PaymentRepositoryError>;

    /// Payments matching `filter`, newest first.
    async fn list(&self, filter: PaymentFilter) -> Result<Vec<Payment>, PaymentRepositoryError>;

    /// Insert a PENDING enrollment and its PENDING payment together.
    async fn create_pending_checkout(
        &self,
        enrollment: &Enrollment,
        payment: &Payment,
    ) -> Result<(), PaymentRepositoryError>;

    /// Apply a processor event to the payment found by `lookup` and to its
    /// enrollment.
    async fn reconcile(
        &self,
        lookup: PaymentLookup,
        event: PaymentEvent,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, PaymentRepositoryError>;

    /// Reserve a SUCCEEDED payment for a refund under the payment row lock.
    /// Fails with `Rejected` when the payment is not refundable or another
    /// refund already holds a live claim.
    async fn claim_refund(
        &self,
        id: Uuid,
        amount_cents: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<RefundClaim, PaymentRepositoryError>;

    /// Drop the refund claim on `id`, if any.
    async fn release_refund_claim(&self, id: Uuid) -> Result<(), PaymentRepositoryError>;

    /// Settle an executed refund: payment REFUNDED, enrollment cancelled.
    async fn mark_refunded(
        &self,
        id: Uuid,
        receipt: RefundReceipt,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, PaymentRepositoryError>;
}
