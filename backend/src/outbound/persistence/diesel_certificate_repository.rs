//! PostgreSQL-backed `CertificateRepository`.
//!
//! Issuance locks the enrollment row, so two requests for the same
//! enrollment serialize and the second one sees the first certificate. The
//! monthly counter is bumped with an upsert whose row lock orders concurrent
//! issuances across enrollments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{CertificateRepository, CertificateRepositoryError};
use crate::domain::{
    Certificate, CertificateNumber, EnrollmentStatus, IssuancePeriod, IssuedCertificate,
    NotCompleted,
};

use super::diesel_error_mapping::{DbFailure, classify_diesel_error};
use super::models::{CertificateRow, EnrollmentRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::{certificate_row, row_to_certificate, row_to_enrollment};
use super::schema::{certificate_sequences, certificates, enrollments};

/// Diesel-backed certificate store.
#[derive(Clone)]
pub struct DieselCertificateRepository {
    pool: DbPool,
}

impl DieselCertificateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        query: certificates::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CertificateRow> = query
            .order((certificates::issued_at.desc(), certificates::id.desc()))
            .select(CertificateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_certificate).collect())
    }

    async fn find_one(
        &self,
        query: certificates::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Option<Certificate>, CertificateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CertificateRow> = query
            .select(CertificateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_certificate))
    }
}

fn map_pool_error(error: PoolError) -> CertificateRepositoryError {
    CertificateRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> CertificateRepositoryError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => CertificateRepositoryError::connection(message),
        DbFailure::Duplicate(constraint) => {
            CertificateRepositoryError::query(format!("unique constraint {constraint} violated"))
        }
        DbFailure::Query(message) => CertificateRepositoryError::query(message),
    }
}

impl From<diesel::result::Error> for CertificateRepositoryError {
    fn from(error: diesel::result::Error) -> Self {
        map_diesel_error(error)
    }
}

/// Increment and return the counter for `period`, starting at 1.
async fn next_sequence(
    conn: &mut AsyncPgConnection,
    period: IssuancePeriod,
) -> Result<u32, CertificateRepositoryError> {
    let value: i32 = diesel::insert_into(certificate_sequences::table)
        .values((
            certificate_sequences::period.eq(period.key()),
            certificate_sequences::last_value.eq(1),
        ))
        .on_conflict(certificate_sequences::period)
        .do_update()
        .set(certificate_sequences::last_value.eq(certificate_sequences::last_value + 1))
        .returning(certificate_sequences::last_value)
        .get_result(conn)
        .await?;
    u32::try_from(value).map_err(|_| {
        CertificateRepositoryError::query(format!("certificate counter out of range: {value}"))
    })
}

#[async_trait]
impl CertificateRepository for DieselCertificateRepository {
    async fn issue(
        &self,
        enrollment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedCertificate, CertificateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let row: Option<EnrollmentRow> = enrollments::table
                    .filter(enrollments::id.eq(enrollment_id))
                    .select(EnrollmentRow::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let row = row.ok_or_else(|| {
                    CertificateRepositoryError::missing(format!(
                        "enrollment {enrollment_id} not found"
                    ))
                })?;
                let enrollment =
                    row_to_enrollment(row).map_err(CertificateRepositoryError::query)?;

                let existing: Option<CertificateRow> = certificates::table
                    .filter(certificates::enrollment_id.eq(enrollment_id))
                    .select(CertificateRow::as_select())
                    .first(conn)
                    .await
                    .optional()?;
                if let Some(existing) = existing {
                    return Ok(IssuedCertificate {
                        certificate: row_to_certificate(existing),
                        newly_issued: false,
                    });
                }
                if enrollment.status() != EnrollmentStatus::Completed {
                    let refusal = NotCompleted {
                        status: enrollment.status(),
                    };
                    return Err(CertificateRepositoryError::rejected(refusal.to_string()));
                }

                let period = IssuancePeriod::containing(now);
                let sequence = next_sequence(conn, period).await?;
                let certificate =
                    Certificate::issue(&enrollment, CertificateNumber::new(period, sequence), now)
                        .map_err(|err| CertificateRepositoryError::rejected(err.to_string()))?;
                diesel::insert_into(certificates::table)
                    .values(&certificate_row(&certificate))
                    .execute(conn)
                    .await?;
                Ok(IssuedCertificate {
                    certificate,
                    newly_issued: true,
                })
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Certificate>, CertificateRepositoryError> {
        self.find_one(certificates::table.filter(certificates::id.eq(id)).into_boxed())
            .await
    }

    async fn find_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Certificate>, CertificateRepositoryError> {
        self.find_one(
            certificates::table
                .filter(certificates::certificate_number.eq(number.to_owned()))
                .into_boxed(),
        )
        .await
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        self.load(
            certificates::table
                .filter(certificates::user_id.eq(user_id))
                .into_boxed(),
        )
        .await
    }

    async fn list_for_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        self.load(
            certificates::table
                .filter(certificates::course_id.eq(course_id))
                .into_boxed(),
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        self.load(certificates::table.into_boxed()).await
    }
}
