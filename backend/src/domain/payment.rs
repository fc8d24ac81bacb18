//! Course payments and their reconciliation with processor events.
//!
//! A [`Payment`] is opened PENDING when a checkout session is created and
//! then settles through processor events:
//!
//! - PENDING -> SUCCEEDED on checkout completion or intent success.
//! - PENDING -> FAILED on intent failure.
//! - SUCCEEDED -> REFUNDED on an accepted refund.
//!
//! FAILED and REFUNDED are terminal; events that would move a payment out of
//! them are ignored by [`Payment::apply_success`] and
//! [`Payment::apply_failure`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enrollment::Enrollment;
use super::money::{Currency, percentage};

/// Payment rule violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentRuleError {
    #[error("only successful payments can be refunded; payment is {status}")]
    NotRefundable { status: PaymentStatus },
    #[error("payment has no recorded payment intent")]
    MissingPaymentIntent,
    #[error("a refund for this payment is already in progress")]
    RefundInProgress,
    #[error("refund amount must be between 1 and {max}, got {amount}")]
    RefundAmountOutOfRange { amount: i64, max: i64 },
    #[error("payment status must be PENDING, SUCCEEDED, FAILED or REFUNDED")]
    UnknownStatus,
    #[error("refund reason must be requested_by_customer, duplicate or fraudulent")]
    UnknownRefundReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Refunded)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(PaymentRuleError::UnknownStatus),
        }
    }
}

/// Reason passed to the processor with a refund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    #[default]
    RequestedByCustomer,
    Duplicate,
    Fraudulent,
}

impl RefundReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestedByCustomer => "requested_by_customer",
            Self::Duplicate => "duplicate",
            Self::Fraudulent => "fraudulent",
        }
    }
}

impl FromStr for RefundReason {
    type Err = PaymentRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested_by_customer" => Ok(Self::RequestedByCustomer),
            "duplicate" => Ok(Self::Duplicate),
            "fraudulent" => Ok(Self::Fraudulent),
            _ => Err(PaymentRuleError::UnknownRefundReason),
        }
    }
}

/// Payment for one enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount_cents: i64,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub receipt_url: Option<String>,
    pub failure_reason: Option<String>,
    pub refund_id: Option<String>,
    pub refunded_amount_cents: Option<i64>,
    pub refund_reason: Option<RefundReason>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    /// Set while a refund is being executed at the processor.
    #[serde(skip)]
    pub refund_claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How an event affected a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// State changed.
    Applied,
    /// Redelivery that filled in details missing from the first delivery.
    Updated,
    /// Redelivery of an event already reflected in the state.
    AlreadyApplied,
    /// The event would regress a settled payment.
    Ignored,
}

impl ReconcileOutcome {
    /// Whether the payment must be written back.
    pub fn changed(self) -> bool {
        matches!(self, Self::Applied | Self::Updated)
    }
}

/// How long a refund claim blocks other refunds of the same payment. A
/// claim older than this is treated as abandoned.
pub const REFUND_CLAIM_TTL: Duration = Duration::minutes(10);

/// Refund reserved on a payment, ready to be sent to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundClaim {
    pub payment_intent_id: String,
    pub amount_cents: i64,
}

/// Processor receipt for an executed refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundReceipt {
    pub refund_id: String,
    pub amount_cents: i64,
    pub reason: RefundReason,
}

impl Payment {
    /// Open a pending payment for a payment-gated enrollment.
    pub fn pending_checkout(
        enrollment: &Enrollment,
        amount_cents: i64,
        currency: Currency,
        checkout_session_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            enrollment_id: enrollment.id(),
            user_id: enrollment.user_id(),
            course_id: enrollment.course_id(),
            amount_cents,
            currency,
            status: PaymentStatus::Pending,
            checkout_session_id: Some(checkout_session_id.into()),
            payment_intent_id: None,
            receipt_url: None,
            failure_reason: None,
            refund_id: None,
            refunded_amount_cents: None,
            refund_reason: None,
            paid_at: None,
            refunded_at: None,
            refund_claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a successful charge. `paid_at` keeps its first value on
    /// redelivery; missing intent or receipt details are filled in.
    pub fn apply_success(
        &mut self,
        payment_intent_id: Option<String>,
        receipt_url: Option<String>,
        now: DateTime<Utc>,
    ) -> ReconcileOutcome {
        match self.status {
            PaymentStatus::Failed | PaymentStatus::Refunded => ReconcileOutcome::Ignored,
            PaymentStatus::Succeeded => {
                if self.fill_details(payment_intent_id, receipt_url) {
                    self.updated_at = now;
                    ReconcileOutcome::Updated
                } else {
                    ReconcileOutcome::AlreadyApplied
                }
            }
            PaymentStatus::Pending => {
                self.fill_details(payment_intent_id, receipt_url);
                self.status = PaymentStatus::Succeeded;
                self.paid_at = Some(now);
                self.updated_at = now;
                ReconcileOutcome::Applied
            }
        }
    }

    fn fill_details(&mut self, payment_intent_id: Option<String>, receipt_url: Option<String>) -> bool {
        let mut changed = false;
        if self.payment_intent_id.is_none() && payment_intent_id.is_some() {
            self.payment_intent_id = payment_intent_id;
            changed = true;
        }
        if self.receipt_url.is_none() && receipt_url.is_some() {
            self.receipt_url = receipt_url;
            changed = true;
        }
        changed
    }

    /// Record a failed charge.
    pub fn apply_failure(&mut self, reason: Option<String>, now: DateTime<Utc>) -> ReconcileOutcome {
        match self.status {
            PaymentStatus::Failed => ReconcileOutcome::AlreadyApplied,
            PaymentStatus::Succeeded | PaymentStatus::Refunded => ReconcileOutcome::Ignored,
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Failed;
                self.failure_reason = reason;
                self.updated_at = now;
                ReconcileOutcome::Applied
            }
        }
    }

    /// Validate a refund request and return the amount to refund together
    /// with the payment intent it applies to.
    pub fn refund_plan(&self, amount_cents: Option<i64>) -> Result<(String, i64), PaymentRuleError> {
        if self.status != PaymentStatus::Succeeded {
            return Err(PaymentRuleError::NotRefundable {
                status: self.status,
            });
        }
        let intent = self
            .payment_intent_id
            .clone()
            .ok_or(PaymentRuleError::MissingPaymentIntent)?;
        let amount = amount_cents.unwrap_or(self.amount_cents);
        if !(1..=self.amount_cents).contains(&amount) {
            return Err(PaymentRuleError::RefundAmountOutOfRange {
                amount,
                max: self.amount_cents,
            });
        }
        Ok((intent, amount))
    }

    /// Reserve the payment for a refund. Only one live claim may exist per
    /// payment, so concurrent refund requests reach the processor once.
    pub fn claim_refund(
        &mut self,
        amount_cents: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<RefundClaim, PaymentRuleError> {
        let (payment_intent_id, amount_cents) = self.refund_plan(amount_cents)?;
        if self
            .refund_claimed_at
            .is_some_and(|claimed| now - claimed < REFUND_CLAIM_TTL)
        {
            return Err(PaymentRuleError::RefundInProgress);
        }
        self.refund_claimed_at = Some(now);
        Ok(RefundClaim {
            payment_intent_id,
            amount_cents,
        })
    }

    /// Drop a refund claim after the processor refused the refund.
    pub fn release_refund_claim(&mut self) -> bool {
        self.refund_claimed_at.take().is_some()
    }

    /// Settle an executed refund.
    pub fn mark_refunded(&mut self, receipt: RefundReceipt, now: DateTime<Utc>) -> Result<(), PaymentRuleError> {
        if self.status != PaymentStatus::Succeeded {
            return Err(PaymentRuleError::NotRefundable {
                status: self.status,
            });
        }
        self.refund_claimed_at = None;
        self.status = PaymentStatus::Refunded;
        self.refund_id = Some(receipt.refund_id);
        self.refunded_amount_cents = Some(receipt.amount_cents);
        self.refund_reason = Some(receipt.reason);
        self.refunded_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

/// Identifier a processor event uses to point at a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentLookup {
    CheckoutSession(String),
    PaymentIntent(String),
}

impl fmt::Display for PaymentLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckoutSession(id) => write!(f, "checkout session {id}"),
            Self::PaymentIntent(id) => write!(f, "payment intent {id}"),
        }
    }
}

/// Parsed payment-processor webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// `checkout.session.completed`
    CheckoutSessionCompleted {
        session_id: String,
        payment_intent_id: Option<String>,
        receipt_url: Option<String>,
    },
    /// `payment_intent.succeeded`
    PaymentIntentSucceeded {
        payment_intent_id: String,
        receipt_url: Option<String>,
    },
    /// `payment_intent.payment_failed`
    PaymentIntentFailed {
        payment_intent_id: String,
        failure_message: Option<String>,
    },
    /// Any other event type; acknowledged without effect.
    Unrecognised { event_type: String },
}

impl PaymentEvent {
    /// Processor event type string.
    pub fn event_type(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted { .. } => "checkout.session.completed",
            Self::PaymentIntentSucceeded { .. } => "payment_intent.succeeded",
            Self::PaymentIntentFailed { .. } => "payment_intent.payment_failed",
            Self::Unrecognised { event_type } => event_type,
        }
    }

    /// Correlation id used to find the payment, if the event targets one.
    pub fn lookup(&self) -> Option<PaymentLookup> {
        match self {
            Self::CheckoutSessionCompleted { session_id, .. } => {
                Some(PaymentLookup::CheckoutSession(session_id.clone()))
            }
            Self::PaymentIntentSucceeded {
                payment_intent_id, ..
            }
            | Self::PaymentIntentFailed {
                payment_intent_id, ..
            } => Some(PaymentLookup::PaymentIntent(payment_intent_id.clone())),
            Self::Unrecognised { .. } => None,
        }
    }
}

/// Apply a processor event to a payment and its enrollment.
///
/// The enrollment only moves when the payment itself changed: success
/// activates a PENDING enrollment, failure cancels a non-terminal one.
pub fn apply_event(
    payment: &mut Payment,
    enrollment: &mut Enrollment,
    event: PaymentEvent,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let outcome = match event {
        PaymentEvent::CheckoutSessionCompleted {
            payment_intent_id,
            receipt_url,
            ..
        } => payment.apply_success(payment_intent_id, receipt_url, now),
        PaymentEvent::PaymentIntentSucceeded {
            payment_intent_id,
            receipt_url,
        } => payment.apply_success(Some(payment_intent_id), receipt_url, now),
        PaymentEvent::PaymentIntentFailed {
            failure_message, ..
        } => payment.apply_failure(failure_message, now),
        PaymentEvent::Unrecognised { .. } => return ReconcileOutcome::Ignored,
    };
    if outcome == ReconcileOutcome::Applied {
        match payment.status {
            PaymentStatus::Succeeded => {
                enrollment.activate_after_payment(now);
            }
            PaymentStatus::Failed => {
                enrollment.cancel_after_payment(now);
            }
            PaymentStatus::Pending | PaymentStatus::Refunded => {}
        }
    }
    outcome
}

/// Settle an executed refund on a payment and cancel its enrollment.
/// A COMPLETED enrollment is terminal and stays as it is.
pub fn settle_refund(
    payment: &mut Payment,
    enrollment: &mut Enrollment,
    receipt: RefundReceipt,
    now: DateTime<Utc>,
) -> Result<(), PaymentRuleError> {
    payment.mark_refunded(receipt, now)?;
    enrollment.cancel_after_payment(now);
    Ok(())
}

/// Aggregate payment figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_payments: u64,
    pub pending_payments: u64,
    pub successful_payments: u64,
    pub failed_payments: u64,
    pub refunded_payments: u64,
    pub total_revenue_cents: i64,
    pub success_rate: u32,
}

impl PaymentStats {
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Self {
        let mut stats = Self::default();
        for payment in payments {
            stats.total_payments += 1;
            match payment.status {
                PaymentStatus::Pending => stats.pending_payments += 1,
                PaymentStatus::Succeeded => {
                    stats.successful_payments += 1;
                    stats.total_revenue_cents += payment.amount_cents;
                }
                PaymentStatus::Failed => stats.failed_payments += 1,
                PaymentStatus::Refunded => stats.refunded_payments += 1,
            }
        }
        stats.success_rate = percentage(stats.successful_payments, stats.total_payments);
        stats
    }
}

/// Checkout session handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub payment_url: String,
    pub payment_id: Uuid,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::EnrollmentStatus;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn pending(now: DateTime<Utc>) -> Payment {
        let enrollment = Enrollment::new_pending(Uuid::new_v4(), Uuid::new_v4(), now);
        Payment::pending_checkout(&enrollment, 4_900, Currency::default(), "cs_test_1", now)
    }

    #[rstest]
    fn success_keeps_first_paid_at(mut pending: Payment, now: DateTime<Utc>) {
        let first = pending.apply_success(Some("pi_1".to_owned()), None, now);
        let again = pending.apply_success(
            Some("pi_other".to_owned()),
            Some("https://receipts.example.test/1".to_owned()),
            now + Duration::minutes(1),
        );
        assert_eq!(first, ReconcileOutcome::Applied);
        assert_eq!(again, ReconcileOutcome::AlreadyApplied);
        assert_eq!(pending.paid_at, Some(now));
        assert_eq!(pending.payment_intent_id.as_deref(), Some("pi_1"));
        assert!(pending.receipt_url.is_some());
    }

    #[rstest]
    fn redelivery_fills_in_a_missing_intent(mut pending: Payment, now: DateTime<Utc>) {
        let later = now + Duration::minutes(1);
        assert_eq!(pending.apply_success(None, None, now), ReconcileOutcome::Applied);

        let redelivered = pending.apply_success(Some("pi_1".to_owned()), None, later);

        assert_eq!(redelivered, ReconcileOutcome::Updated);
        assert_eq!(pending.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(pending.updated_at, later);
        assert_eq!(pending.paid_at, Some(now));
        assert_eq!(
            pending.apply_success(Some("pi_1".to_owned()), None, later),
            ReconcileOutcome::AlreadyApplied
        );
    }

    #[rstest]
    fn a_live_refund_claim_blocks_a_second_claim(mut pending: Payment, now: DateTime<Utc>) {
        pending.apply_success(Some("pi_1".to_owned()), None, now);

        let claim = pending.claim_refund(Some(1_000), now).expect("first claim");

        assert_eq!(
            claim,
            RefundClaim {
                payment_intent_id: "pi_1".to_owned(),
                amount_cents: 1_000,
            }
        );
        assert_eq!(
            pending.claim_refund(None, now + Duration::seconds(5)),
            Err(PaymentRuleError::RefundInProgress)
        );
        assert!(pending.release_refund_claim());
        assert!(pending.claim_refund(None, now).is_ok());
    }

    #[rstest]
    fn an_abandoned_refund_claim_expires(mut pending: Payment, now: DateTime<Utc>) {
        pending.apply_success(Some("pi_1".to_owned()), None, now);
        pending.claim_refund(None, now).expect("first claim");

        let retry = pending.claim_refund(None, now + REFUND_CLAIM_TTL);

        assert!(retry.is_ok());
        assert_eq!(pending.refund_claimed_at, Some(now + REFUND_CLAIM_TTL));
    }

    #[rstest]
    fn settling_a_refund_clears_the_claim(mut pending: Payment, now: DateTime<Utc>) {
        pending.apply_success(Some("pi_1".to_owned()), None, now);
        pending.claim_refund(None, now).expect("claim");
        pending
            .mark_refunded(
                RefundReceipt {
                    refund_id: "re_1".to_owned(),
                    amount_cents: 4_900,
                    reason: RefundReason::default(),
                },
                now,
            )
            .expect("refund");

        assert_eq!(pending.refund_claimed_at, None);
        assert_eq!(
            pending.claim_refund(None, now),
            Err(PaymentRuleError::NotRefundable {
                status: PaymentStatus::Refunded
            })
        );
    }

    #[rstest]
    fn failure_after_success_is_ignored(mut pending: Payment, now: DateTime<Utc>) {
        pending.apply_success(Some("pi_1".to_owned()), None, now);
        assert_eq!(
            pending.apply_failure(Some("card declined".to_owned()), now),
            ReconcileOutcome::Ignored
        );
        assert_eq!(pending.status, PaymentStatus::Succeeded);
    }

    #[rstest]
    fn refund_rejected_unless_succeeded(pending: Payment) {
        assert_eq!(
            pending.refund_plan(None),
            Err(PaymentRuleError::NotRefundable {
                status: PaymentStatus::Pending
            })
        );
    }

    #[rstest]
    #[case(None, Ok(4_900))]
    #[case(Some(100), Ok(100))]
    #[case(Some(0), Err(PaymentRuleError::RefundAmountOutOfRange { amount: 0, max: 4_900 }))]
    #[case(Some(5_000), Err(PaymentRuleError::RefundAmountOutOfRange { amount: 5_000, max: 4_900 }))]
    fn refund_amount_bounds(
        mut pending: Payment,
        now: DateTime<Utc>,
        #[case] requested: Option<i64>,
        #[case] expected: Result<i64, PaymentRuleError>,
    ) {
        pending.apply_success(Some("pi_1".to_owned()), None, now);
        let plan = pending.refund_plan(requested).map(|(_, amount)| amount);
        assert_eq!(plan, expected);
    }

    #[rstest]
    fn refund_requires_intent(mut pending: Payment, now: DateTime<Utc>) {
        pending.apply_success(None, None, now);
        assert_eq!(
            pending.refund_plan(None),
            Err(PaymentRuleError::MissingPaymentIntent)
        );
    }

    #[rstest]
    fn refunded_payment_cannot_be_refunded_again(mut pending: Payment, now: DateTime<Utc>) {
        pending.apply_success(Some("pi_1".to_owned()), None, now);
        pending
            .mark_refunded(
                RefundReceipt {
                    refund_id: "re_1".to_owned(),
                    amount_cents: 4_900,
                    reason: RefundReason::default(),
                },
                now,
            )
            .expect("refund");
        assert!(matches!(
            pending.refund_plan(None),
            Err(PaymentRuleError::NotRefundable {
                status: PaymentStatus::Refunded
            })
        ));
        assert_eq!(
            pending.apply_success(None, None, now),
            ReconcileOutcome::Ignored
        );
    }

    #[rstest]
    fn checkout_completion_activates_enrollment(now: DateTime<Utc>) {
        let mut enrollment = Enrollment::new_pending(Uuid::new_v4(), Uuid::new_v4(), now);
        let mut payment =
            Payment::pending_checkout(&enrollment, 4_900, Currency::default(), "cs_test_1", now);
        let event = PaymentEvent::CheckoutSessionCompleted {
            session_id: "cs_test_1".to_owned(),
            payment_intent_id: Some("pi_1".to_owned()),
            receipt_url: None,
        };
        let outcome = apply_event(&mut payment, &mut enrollment, event.clone(), now);
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(enrollment.status(), EnrollmentStatus::Active);
        assert_eq!(
            apply_event(&mut payment, &mut enrollment, event, now),
            ReconcileOutcome::AlreadyApplied
        );
    }

    #[rstest]
    fn failure_cancels_pending_enrollment(now: DateTime<Utc>) {
        let mut enrollment = Enrollment::new_pending(Uuid::new_v4(), Uuid::new_v4(), now);
        let mut payment =
            Payment::pending_checkout(&enrollment, 4_900, Currency::default(), "cs_test_1", now);
        payment.payment_intent_id = Some("pi_1".to_owned());
        let outcome = apply_event(
            &mut payment,
            &mut enrollment,
            PaymentEvent::PaymentIntentFailed {
                payment_intent_id: "pi_1".to_owned(),
                failure_message: Some("card declined".to_owned()),
            },
            now,
        );
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(payment.failure_reason.as_deref(), Some("card declined"));
        assert_eq!(enrollment.status(), EnrollmentStatus::Cancelled);
    }

    #[rstest]
    fn stats_sum_only_successful_revenue(mut pending: Payment, now: DateTime<Utc>) {
        let untouched = pending.clone();
        pending.apply_success(Some("pi_1".to_owned()), None, now);
        let stats = PaymentStats::from_payments([&pending, &untouched]);
        assert_eq!(stats.total_revenue_cents, 4_900);
        assert_eq!(stats.success_rate, 50);
        assert_eq!(stats.pending_payments, 1);
    }
}
