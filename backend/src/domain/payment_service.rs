//! Payment service: checkout creation, webhook reconciliation, and refunds.
//!
//! Processor calls go through [`PaymentGateway`]; every write that touches
//! both a payment and its enrollment is a single repository call so the two
//! statuses change in one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::ports::{
    CheckoutCommand, CheckoutRequest, CourseRepository, EnrollmentRepository, PaymentCommand,
    PaymentFilter, PaymentGateway, PaymentQuery, PaymentRepository, RefundCommand, RefundRequest,
    UserRepository, WebhookAck,
};
use crate::domain::{
    CheckoutSession, Enrollment, Error, Payment, PaymentEvent, PaymentStats, ReconcileOutcome,
};

/// Collaborators of [`PaymentService`].
pub struct PaymentServiceDeps<P, E, C, U, G> {
    pub payments: Arc<P>,
    pub enrollments: Arc<E>,
    pub courses: Arc<C>,
    pub users: Arc<U>,
    pub gateway: Arc<G>,
    pub clock: Arc<dyn Clock>,
}

/// Payment service implementing the payment driving ports.
#[derive(Clone)]
pub struct PaymentService<P, E, C, U, G> {
    payments: Arc<P>,
    enrollments: Arc<E>,
    courses: Arc<C>,
    users: Arc<U>,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<P, E, C, U, G> PaymentService<P, E, C, U, G> {
    pub fn new(deps: PaymentServiceDeps<P, E, C, U, G>) -> Self {
        Self {
            payments: deps.payments,
            enrollments: deps.enrollments,
            courses: deps.courses,
            users: deps.users,
            gateway: deps.gateway,
            clock: deps.clock,
        }
    }
}

/// Checkout redirect targets must be absolute http(s) URLs.
fn validate_redirect(field: &str, value: &str) -> Result<(), Error> {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false);
    if valid {
        return Ok(());
    }
    Err(
        Error::invalid_request(format!("{field} must be an absolute http(s) URL")).with_details(
            json!({
                "field": field,
                "value": value,
                "code": "invalid_url",
            }),
        ),
    )
}

impl<P, E, C, U, G> PaymentService<P, E, C, U, G>
where
    P: PaymentRepository,
    E: EnrollmentRepository,
    C: CourseRepository,
    U: UserRepository,
    G: PaymentGateway,
{
    async fn list_matching(&self, filter: PaymentFilter) -> Result<Vec<Payment>, Error> {
        self.payments
            .list(filter)
            .await
            .map_err(Error::from)
    }

    fn log_outcome(
        event_type: &str,
        payment: &Payment,
        enrollment: &Enrollment,
        outcome: ReconcileOutcome,
    ) {
        match outcome {
            ReconcileOutcome::Applied => info!(
                event_type,
                payment_id = %payment.id,
                payment_status = %payment.status,
                enrollment_status = %enrollment.status(),
                "payment event applied"
            ),
            ReconcileOutcome::Updated => info!(
                event_type,
                payment_id = %payment.id,
                "payment details filled in from redelivered event"
            ),
            ReconcileOutcome::AlreadyApplied => debug!(
                event_type,
                payment_id = %payment.id,
                "payment event already applied"
            ),
            ReconcileOutcome::Ignored => warn!(
                event_type,
                payment_id = %payment.id,
                payment_status = %payment.status,
                "payment event ignored for settled payment"
            ),
        }
    }
}

#[async_trait]
impl<P, E, C, U, G> PaymentCommand for PaymentService<P, E, C, U, G>
where
    P: PaymentRepository,
    E: EnrollmentRepository,
    C: CourseRepository,
    U: UserRepository,
    G: PaymentGateway,
{
    async fn create_checkout(&self, request: CheckoutCommand) -> Result<CheckoutSession, Error> {
        validate_redirect("successUrl", &request.success_url)?;
        validate_redirect("cancelUrl", &request.cancel_url)?;

        let course = self
            .courses
            .find_by_id(request.course_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("course {} not found", request.course_id)))?;
        self.users
            .find_by_id(request.user_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("user {} not found", request.user_id)))?;
        if course.is_free() {
            return Err(Error::invalid_request(
                "course is free; enroll directly instead of checking out",
            ));
        }
        let existing = self
            .enrollments
            .find_by_user_and_course(request.user_id, course.id)
            .await
            .map_err(Error::from)?;
        if existing.is_some() {
            return Err(Error::conflict("user is already enrolled in this course"));
        }

        let now = self.clock.utc();
        let enrollment = Enrollment::new_pending(request.user_id, course.id, now);
        let session = self
            .gateway
            .create_checkout_session(CheckoutRequest {
                course_title: course.title.clone(),
                amount_cents: course.price_cents,
                currency: course.currency.clone(),
                client_reference: enrollment.id().to_string(),
                success_url: request.success_url,
                cancel_url: request.cancel_url,
            })
            .await
            .map_err(Error::from)?;

        let payment = Payment::pending_checkout(
            &enrollment,
            course.price_cents,
            course.currency,
            session.session_id.clone(),
            now,
        );
        self.payments
            .create_pending_checkout(&enrollment, &payment)
            .await
            .map_err(Error::from)?;
        info!(
            payment_id = %payment.id,
            enrollment_id = %enrollment.id(),
            session_id = %session.session_id,
            "checkout session created"
        );
        Ok(CheckoutSession {
            session_id: session.session_id,
            payment_url: session.url,
            payment_id: payment.id,
        })
    }

    async fn handle_event(&self, event: PaymentEvent) -> Result<WebhookAck, Error> {
        let Some(lookup) = event.lookup() else {
            info!(event_type = event.event_type(), "unhandled payment event type");
            return Ok(WebhookAck::received());
        };
        let event_type = event.event_type().to_owned();
        let reconciliation = self
            .payments
            .reconcile(lookup, event, self.clock.utc())
            .await
            .map_err(Error::from)?;
        Self::log_outcome(
            &event_type,
            &reconciliation.payment,
            &reconciliation.enrollment,
            reconciliation.outcome,
        );
        Ok(WebhookAck::received())
    }

    async fn refund(&self, payment_id: Uuid, request: RefundCommand) -> Result<Payment, Error> {
        let claim = self
            .payments
            .claim_refund(payment_id, request.amount_cents, self.clock.utc())
            .await
            .map_err(Error::from)?;
        let amount_cents = claim.amount_cents;

        let receipt = match self
            .gateway
            .refund(RefundRequest {
                payment_intent_id: claim.payment_intent_id,
                amount_cents,
                reason: request.reason.unwrap_or_default(),
            })
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                if let Err(release) = self.payments.release_refund_claim(payment_id).await {
                    warn!(%payment_id, error = %release, "refund claim not released");
                }
                return Err(Error::from(err));
            }
        };
        let refund_id = receipt.refund_id.clone();
        let settled = self
            .payments
            .mark_refunded(payment_id, receipt, self.clock.utc())
            .await
            .map_err(Error::from)?;
        info!(
            %payment_id,
            %refund_id,
            amount_cents,
            enrollment_status = %settled.enrollment.status(),
            "payment refunded"
        );
        Ok(settled.payment)
    }
}

#[async_trait]
impl<P, E, C, U, G> PaymentQuery for PaymentService<P, E, C, U, G>
where
    P: PaymentRepository,
    E: EnrollmentRepository,
    C: CourseRepository,
    U: UserRepository,
    G: PaymentGateway,
{
    async fn get(&self, id: Uuid) -> Result<Payment, Error> {
        self.payments
            .find_by_id(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("payment {id} not found")))
    }

    async fn by_session(&self, session_id: String) -> Result<Payment, Error> {
        self.payments
            .find_by_session(&session_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| {
                Error::not_found(format!("no payment for checkout session {session_id}"))
            })
    }

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Payment>, Error> {
        self.list_matching(PaymentFilter {
            user_id: Some(user_id),
            course_id: None,
        })
        .await
    }

    async fn for_course(&self, course_id: Uuid) -> Result<Vec<Payment>, Error> {
        self.list_matching(PaymentFilter {
            user_id: None,
            course_id: Some(course_id),
        })
        .await
    }

    async fn stats(&self, filter: PaymentFilter) -> Result<PaymentStats, Error> {
        let payments = self.list_matching(filter).await?;
        Ok(PaymentStats::from_payments(&payments))
    }
}

#[cfg(test)]
#[path = "payment_service_tests.rs"]
mod tests;
