use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    PaymentFilter, PaymentRepository, PaymentRepositoryError, Reconciliation,
};
use crate::domain::{
    Enrollment, Payment, PaymentEvent, PaymentLookup, ReconcileOutcome, RefundClaim,
    RefundReceipt, apply_event, settle_refund,
};

use super::{MemoryStore, State, newest_first};

fn find_by_lookup<'a>(state: &'a State, lookup: &PaymentLookup) -> Option<&'a Payment> {
    state.payments.values().find(|payment| match lookup {
        PaymentLookup::CheckoutSession(id) => {
            payment.checkout_session_id.as_deref() == Some(id.as_str())
        }
        PaymentLookup::PaymentIntent(id) => {
            payment.payment_intent_id.as_deref() == Some(id.as_str())
        }
    })
}

fn enrollment_of(state: &State, payment: &Payment) -> Result<Enrollment, PaymentRepositoryError> {
    state
        .enrollments
        .get(&payment.enrollment_id)
        .cloned()
        .ok_or_else(|| {
            PaymentRepositoryError::missing(format!(
                "enrollment {} for payment {} not found",
                payment.enrollment_id, payment.id
            ))
        })
}

fn commit(state: &mut State, payment: &Payment, enrollment: &Enrollment) {
    state.payments.insert(payment.id, payment.clone());
    state.enrollments.insert(enrollment.id(), enrollment.clone());
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, PaymentRepositoryError> {
        Ok(self.state.read().await.payments.get(&id).cloned())
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        let state = self.state.read().await;
        let lookup = PaymentLookup::CheckoutSession(session_id.to_owned());
        Ok(find_by_lookup(&state, &lookup).cloned())
    }

    async fn list(&self, filter: PaymentFilter) -> Result<Vec<Payment>, PaymentRepositoryError> {
        let state = self.state.read().await;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|payment| filter.matches(payment))
            .cloned()
            .collect();
        newest_first(&mut payments, |p| (p.created_at, p.id));
        Ok(payments)
    }

    async fn create_pending_checkout(
        &self,
        enrollment: &Enrollment,
        payment: &Payment,
    ) -> Result<(), PaymentRepositoryError> {
        let mut state = self.state.write().await;
        let enrolled = state.enrollments.values().any(|other| {
            other.user_id() == enrollment.user_id() && other.course_id() == enrollment.course_id()
        });
        if enrolled {
            return Err(PaymentRepositoryError::duplicate(
                "user is already enrolled in this course",
            ));
        }
        let session_taken = payment.checkout_session_id.as_deref().is_some_and(|session| {
            state
                .payments
                .values()
                .any(|other| other.checkout_session_id.as_deref() == Some(session))
        });
        if session_taken {
            return Err(PaymentRepositoryError::duplicate(format!(
                "checkout session {:?} is already recorded",
                payment.checkout_session_id
            )));
        }
        commit(&mut state, payment, enrollment);
        Ok(())
    }

    async fn reconcile(
        &self,
        lookup: PaymentLookup,
        event: PaymentEvent,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, PaymentRepositoryError> {
        let mut state = self.state.write().await;
        let mut payment = find_by_lookup(&state, &lookup)
            .cloned()
            .ok_or_else(|| PaymentRepositoryError::missing(format!("no payment for {lookup}")))?;
        let mut enrollment = enrollment_of(&state, &payment)?;
        let outcome = apply_event(&mut payment, &mut enrollment, event, now);
        if outcome.changed() {
            commit(&mut state, &payment, &enrollment);
        }
        Ok(Reconciliation {
            payment,
            enrollment,
            outcome,
        })
    }

    async fn claim_refund(
        &self,
        id: Uuid,
        amount_cents: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<RefundClaim, PaymentRepositoryError> {
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .get_mut(&id)
            .ok_or_else(|| PaymentRepositoryError::missing(format!("payment {id} not found")))?;
        payment
            .claim_refund(amount_cents, now)
            .map_err(PaymentRepositoryError::from)
    }

    async fn release_refund_claim(&self, id: Uuid) -> Result<(), PaymentRepositoryError> {
        if let Some(payment) = self.state.write().await.payments.get_mut(&id) {
            payment.release_refund_claim();
        }
        Ok(())
    }

    async fn mark_refunded(
        &self,
        id: Uuid,
        receipt: RefundReceipt,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, PaymentRepositoryError> {
        let mut state = self.state.write().await;
        let mut payment = state
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| PaymentRepositoryError::missing(format!("payment {id} not found")))?;
        let mut enrollment = enrollment_of(&state, &payment)?;
        settle_refund(&mut payment, &mut enrollment, receipt, now)?;
        commit(&mut state, &payment, &enrollment);
        Ok(Reconciliation {
            payment,
            enrollment,
            outcome: ReconcileOutcome::Applied,
        })
    }
}
