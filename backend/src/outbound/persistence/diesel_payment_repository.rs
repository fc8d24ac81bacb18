//! PostgreSQL-backed `PaymentRepository`.
//!
//! Reconciliation and refunds lock the payment row and then its enrollment,
//! always in that order, so concurrent webhook deliveries serialize instead
//! of deadlocking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    PaymentFilter, PaymentRepository, PaymentRepositoryError, Reconciliation,
};
use crate::domain::{
    Enrollment, Payment, PaymentEvent, PaymentLookup, ReconcileOutcome, RefundClaim,
    RefundReceipt, apply_event, settle_refund,
};

use super::diesel_error_mapping::{DbFailure, classify_diesel_error, collect_rows};
use super::models::{EnrollmentRow, PaymentRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::{
    enrollment_state, new_enrollment_row, payment_record, row_to_enrollment, row_to_payment,
};
use super::schema::{enrollments, payments};

/// Diesel-backed payment ledger.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        query: payments::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PaymentRow> = query
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_payment)
            .transpose()
            .map_err(PaymentRepositoryError::query)
    }
}

fn map_pool_error(error: PoolError) -> PaymentRepositoryError {
    PaymentRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> PaymentRepositoryError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => PaymentRepositoryError::connection(message),
        DbFailure::Duplicate(constraint) if constraint.contains("user_course") => {
            PaymentRepositoryError::duplicate("user is already enrolled in this course")
        }
        DbFailure::Duplicate(constraint) if constraint.contains("checkout_session") => {
            PaymentRepositoryError::duplicate("checkout session is already recorded")
        }
        DbFailure::Duplicate(constraint) => PaymentRepositoryError::duplicate(constraint),
        DbFailure::Query(message) => PaymentRepositoryError::query(message),
    }
}

impl From<diesel::result::Error> for PaymentRepositoryError {
    fn from(error: diesel::result::Error) -> Self {
        map_diesel_error(error)
    }
}

/// Lock the payment a lookup points at. `FOR UPDATE` does not apply to
/// boxed queries, so each lookup builds its own statement.
async fn lock_payment(
    conn: &mut AsyncPgConnection,
    lookup: &PaymentLookup,
) -> Result<Payment, PaymentRepositoryError> {
    let row: Option<PaymentRow> = match lookup {
        PaymentLookup::CheckoutSession(id) => {
            payments::table
                .filter(payments::checkout_session_id.eq(id.as_str()))
                .select(PaymentRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?
        }
        PaymentLookup::PaymentIntent(id) => {
            payments::table
                .filter(payments::payment_intent_id.eq(id.as_str()))
                .order(payments::created_at.desc())
                .select(PaymentRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?
        }
    };
    let row = row.ok_or_else(|| PaymentRepositoryError::missing(format!("no payment for {lookup}")))?;
    row_to_payment(row).map_err(PaymentRepositoryError::query)
}

async fn lock_payment_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Payment, PaymentRepositoryError> {
    let row: Option<PaymentRow> = payments::table
        .filter(payments::id.eq(id))
        .select(PaymentRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let row = row.ok_or_else(|| PaymentRepositoryError::missing(format!("payment {id} not found")))?;
    row_to_payment(row).map_err(PaymentRepositoryError::query)
}

async fn lock_enrollment_of(
    conn: &mut AsyncPgConnection,
    payment: &Payment,
) -> Result<Enrollment, PaymentRepositoryError> {
    let row: Option<EnrollmentRow> = enrollments::table
        .filter(enrollments::id.eq(payment.enrollment_id))
        .select(EnrollmentRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let row = row.ok_or_else(|| {
        PaymentRepositoryError::missing(format!(
            "enrollment {} for payment {} not found",
            payment.enrollment_id, payment.id
        ))
    })?;
    row_to_enrollment(row).map_err(PaymentRepositoryError::query)
}

async fn write_payment(
    conn: &mut AsyncPgConnection,
    payment: &Payment,
) -> Result<(), PaymentRepositoryError> {
    diesel::update(payments::table.filter(payments::id.eq(payment.id)))
        .set(&payment_record(payment))
        .execute(conn)
        .await?;
    Ok(())
}

async fn commit(
    conn: &mut AsyncPgConnection,
    payment: &Payment,
    enrollment: &Enrollment,
) -> Result<(), PaymentRepositoryError> {
    write_payment(conn, payment).await?;
    diesel::update(enrollments::table.filter(enrollments::id.eq(enrollment.id())))
        .set(&enrollment_state(enrollment))
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, PaymentRepositoryError> {
        self.find_one(payments::table.filter(payments::id.eq(id)).into_boxed())
            .await
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        self.find_one(
            payments::table
                .filter(payments::checkout_session_id.eq(session_id.to_owned()))
                .into_boxed(),
        )
        .await
    }

    async fn list(&self, filter: PaymentFilter) -> Result<Vec<Payment>, PaymentRepositoryError> {
        let mut query = payments::table
            .order((payments::created_at.desc(), payments::id.desc()))
            .into_boxed();
        if let Some(user_id) = filter.user_id {
            query = query.filter(payments::user_id.eq(user_id));
        }
        if let Some(course_id) = filter.course_id {
            query = query.filter(payments::course_id.eq(course_id));
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PaymentRow> = query
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_payment), PaymentRepositoryError::query)
    }

    async fn create_pending_checkout(
        &self,
        enrollment: &Enrollment,
        payment: &Payment,
    ) -> Result<(), PaymentRepositoryError> {
        let enrollment_row = new_enrollment_row(enrollment);
        let payment_row = payment_record(payment);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(enrollments::table)
                    .values(&enrollment_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(payments::table)
                    .values(&payment_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn reconcile(
        &self,
        lookup: PaymentLookup,
        event: PaymentEvent,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let mut payment = lock_payment(conn, &lookup).await?;
                let mut enrollment = lock_enrollment_of(conn, &payment).await?;
                let outcome = apply_event(&mut payment, &mut enrollment, event, now);
                if outcome.changed() {
                    commit(conn, &payment, &enrollment).await?;
                }
                Ok(Reconciliation {
                    payment,
                    enrollment,
                    outcome,
                })
            }
            .scope_boxed()
        })
        .await
    }

    async fn claim_refund(
        &self,
        id: Uuid,
        amount_cents: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<RefundClaim, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let mut payment = lock_payment_by_id(conn, id).await?;
                let claim = payment.claim_refund(amount_cents, now)?;
                write_payment(conn, &payment).await?;
                Ok(claim)
            }
            .scope_boxed()
        })
        .await
    }

    async fn release_refund_claim(&self, id: Uuid) -> Result<(), PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(payments::table.filter(payments::id.eq(id)))
            .set(payments::refund_claimed_at.eq(None::<DateTime<Utc>>))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn mark_refunded(
        &self,
        id: Uuid,
        receipt: RefundReceipt,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let mut payment = lock_payment_by_id(conn, id).await?;
                let mut enrollment = lock_enrollment_of(conn, &payment).await?;
                settle_refund(&mut payment, &mut enrollment, receipt, now)?;
                commit(conn, &payment, &enrollment).await?;
                Ok(Reconciliation {
                    payment,
                    enrollment,
                    outcome: ReconcileOutcome::Applied,
                })
            }
            .scope_boxed()
        })
        .await
    }
}
