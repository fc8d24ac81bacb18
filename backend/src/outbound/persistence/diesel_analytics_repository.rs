//! PostgreSQL-backed `AnalyticsRepository`.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::AnalyticsSnapshot;
use crate::domain::ports::{AnalyticsRepository, AnalyticsRepositoryError};

use super::diesel_error_mapping::{DbFailure, classify_diesel_error, collect_rows, count_from_db};
use super::models::{CertificateRow, CourseRow, EnrollmentRow, PaymentRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::{
    row_to_certificate, row_to_course, row_to_enrollment, row_to_payment, row_to_user,
};
use super::schema::{certificates, courses, enrollments, lessons, payments, users};

/// Loads every table the reports read inside one read-only transaction, so
/// the figures come from a single MVCC snapshot.
#[derive(Clone)]
pub struct DieselAnalyticsRepository {
    pool: DbPool,
}

impl DieselAnalyticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AnalyticsRepositoryError {
    AnalyticsRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> AnalyticsRepositoryError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => AnalyticsRepositoryError::connection(message),
        DbFailure::Duplicate(message) | DbFailure::Query(message) => {
            AnalyticsRepositoryError::query(message)
        }
    }
}

struct SnapshotRows {
    users: Vec<UserRow>,
    courses: Vec<CourseRow>,
    lesson_counts: Vec<(Uuid, i64)>,
    enrollments: Vec<EnrollmentRow>,
    payments: Vec<PaymentRow>,
    certificates: Vec<CertificateRow>,
}

#[async_trait]
impl AnalyticsRepository for DieselAnalyticsRepository {
    async fn load_snapshot(&self) -> Result<AnalyticsSnapshot, AnalyticsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| {
                async move {
                    Ok::<_, diesel::result::Error>(SnapshotRows {
                        users: users::table
                            .select(UserRow::as_select())
                            .load(conn)
                            .await?,
                        courses: courses::table
                            .select(CourseRow::as_select())
                            .load(conn)
                            .await?,
                        lesson_counts: lessons::table
                            .group_by(lessons::course_id)
                            .select((lessons::course_id, count_star()))
                            .load(conn)
                            .await?,
                        enrollments: enrollments::table
                            .select(EnrollmentRow::as_select())
                            .load(conn)
                            .await?,
                        payments: payments::table
                            .select(PaymentRow::as_select())
                            .load(conn)
                            .await?,
                        certificates: certificates::table
                            .select(CertificateRow::as_select())
                            .load(conn)
                            .await?,
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let query = AnalyticsRepositoryError::query;
        Ok(AnalyticsSnapshot {
            users: collect_rows(rows.users.into_iter().map(row_to_user), query)?,
            courses: collect_rows(rows.courses.into_iter().map(row_to_course), query)?,
            lesson_counts: rows
                .lesson_counts
                .into_iter()
                .map(|(course_id, count)| (course_id, count_from_db(count)))
                .collect::<HashMap<_, _>>(),
            enrollments: collect_rows(rows.enrollments.into_iter().map(row_to_enrollment), query)?,
            payments: collect_rows(rows.payments.into_iter().map(row_to_payment), query)?,
            certificates: rows.certificates.into_iter().map(row_to_certificate).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn not_found_maps_to_query_error() {
        let error = map_diesel_error(diesel::result::Error::NotFound);

        assert!(matches!(error, AnalyticsRepositoryError::Query { .. }));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::checkout("refused"));

        assert!(matches!(error, AnalyticsRepositoryError::Connection { .. }));
    }
}
