//! PostgreSQL-backed `EnrollmentRepository`.
//!
//! State changes lock the enrollment row (`SELECT … FOR UPDATE`), apply the
//! domain transition in memory, and write the result back in the same
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    EnrollmentChange, EnrollmentFilter, EnrollmentRepository, EnrollmentRepositoryError,
};
use crate::domain::{
    Enrollment, EnrollmentTransitionError, LessonCompletion, LessonProgress, LessonTally,
    PageRequest, Progress,
};

use super::diesel_error_mapping::{DbFailure, classify_diesel_error, collect_rows, count_from_db};
use super::models::{EnrollmentRow, LessonProgressRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::{
    enrollment_state, lesson_progress_row, new_enrollment_row, row_to_enrollment,
    row_to_lesson_progress,
};
use super::schema::{enrollments, lesson_progress, lessons};

type BoxedEnrollments<'a> = enrollments::BoxedQuery<'a, diesel::pg::Pg>;

/// Diesel-backed enrollment store.
#[derive(Clone)]
pub struct DieselEnrollmentRepository {
    pool: DbPool,
}

impl DieselEnrollmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        query: BoxedEnrollments<'_>,
    ) -> Result<Vec<Enrollment>, EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<EnrollmentRow> = query
            .select(EnrollmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(row_to_enrollment),
            EnrollmentRepositoryError::query,
        )
    }

    async fn find_one(
        &self,
        query: BoxedEnrollments<'_>,
    ) -> Result<Option<Enrollment>, EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<EnrollmentRow> = query
            .select(EnrollmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_enrollment)
            .transpose()
            .map_err(EnrollmentRepositoryError::query)
    }

    /// Lock, transform, and write back one enrollment.
    async fn modify(
        &self,
        id: Uuid,
        transform: impl FnOnce(&mut Enrollment) -> Result<(), EnrollmentTransitionError> + Send,
    ) -> Result<Enrollment, EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let mut enrollment = lock_enrollment(conn, id).await?;
                transform(&mut enrollment).map_err(rejected)?;
                save_enrollment(conn, &enrollment).await?;
                Ok(enrollment)
            }
            .scope_boxed()
        })
        .await
    }
}

fn map_pool_error(error: PoolError) -> EnrollmentRepositoryError {
    EnrollmentRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> EnrollmentRepositoryError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => EnrollmentRepositoryError::connection(message),
        DbFailure::Duplicate(constraint) if constraint.contains("user_course") => {
            EnrollmentRepositoryError::duplicate("user is already enrolled in this course")
        }
        DbFailure::Duplicate(constraint) => EnrollmentRepositoryError::duplicate(constraint),
        DbFailure::Query(message) => EnrollmentRepositoryError::query(message),
    }
}

impl From<diesel::result::Error> for EnrollmentRepositoryError {
    fn from(error: diesel::result::Error) -> Self {
        map_diesel_error(error)
    }
}

fn rejected(error: EnrollmentTransitionError) -> EnrollmentRepositoryError {
    EnrollmentRepositoryError::rejected(error.to_string())
}

async fn lock_enrollment(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Enrollment, EnrollmentRepositoryError> {
    let row: Option<EnrollmentRow> = enrollments::table
        .filter(enrollments::id.eq(id))
        .select(EnrollmentRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let row = row.ok_or_else(|| {
        EnrollmentRepositoryError::missing(format!("enrollment {id} not found"))
    })?;
    row_to_enrollment(row).map_err(EnrollmentRepositoryError::query)
}

async fn save_enrollment(
    conn: &mut AsyncPgConnection,
    enrollment: &Enrollment,
) -> Result<(), diesel::result::Error> {
    diesel::update(enrollments::table.filter(enrollments::id.eq(enrollment.id())))
        .set(&enrollment_state(enrollment))
        .execute(conn)
        .await
        .map(|_| ())
}

/// Completed markers for lessons that belong to the enrollment's course.
async fn tally(
    conn: &mut AsyncPgConnection,
    enrollment: &Enrollment,
) -> Result<LessonTally, diesel::result::Error> {
    let course_lessons = lessons::table
        .filter(lessons::course_id.eq(enrollment.course_id()))
        .select(lessons::id);
    let total: i64 = lessons::table
        .filter(lessons::course_id.eq(enrollment.course_id()))
        .count()
        .get_result(conn)
        .await?;
    let completed: i64 = lesson_progress::table
        .filter(lesson_progress::enrollment_id.eq(enrollment.id()))
        .filter(lesson_progress::completed.eq(true))
        .filter(lesson_progress::lesson_id.eq_any(course_lessons))
        .count()
        .get_result(conn)
        .await?;
    Ok(LessonTally {
        completed: count_from_db(completed),
        total: count_from_db(total),
    })
}

fn filtered(filter: EnrollmentFilter) -> BoxedEnrollments<'static> {
    let mut query = enrollments::table
        .order((enrollments::enrolled_at.desc(), enrollments::id.desc()))
        .into_boxed();
    if let Some(user_id) = filter.user_id {
        query = query.filter(enrollments::user_id.eq(user_id));
    }
    if let Some(course_id) = filter.course_id {
        query = query.filter(enrollments::course_id.eq(course_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(enrollments::status.eq(status.as_str()));
    }
    query
}

#[async_trait]
impl EnrollmentRepository for DieselEnrollmentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>, EnrollmentRepositoryError> {
        self.find_one(enrollments::table.filter(enrollments::id.eq(id)).into_boxed())
            .await
    }

    async fn find_by_user_and_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, EnrollmentRepositoryError> {
        self.find_one(
            enrollments::table
                .filter(enrollments::user_id.eq(user_id))
                .filter(enrollments::course_id.eq(course_id))
                .into_boxed(),
        )
        .await
    }

    async fn list(
        &self,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Vec<Enrollment>, EnrollmentRepositoryError> {
        let query = filtered(filter)
            .offset(i64::from(page.skip()))
            .limit(i64::from(page.take()));
        self.load(query).await
    }

    async fn list_all(
        &self,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, EnrollmentRepositoryError> {
        self.load(filtered(filter)).await
    }

    async fn insert(&self, enrollment: &Enrollment) -> Result<(), EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(enrollments::table)
            .values(&new_enrollment_row(enrollment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: Progress,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentRepositoryError> {
        self.modify(id, |enrollment| enrollment.apply_progress(progress, now))
            .await
    }

    async fn complete_lesson(
        &self,
        id: Uuid,
        lesson_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<LessonCompletion, EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let mut enrollment = lock_enrollment(conn, id).await?;
                if !enrollment.status().accepts_progress() {
                    return Err(rejected(EnrollmentTransitionError::NotInProgress {
                        status: enrollment.status(),
                    }));
                }

                let existing: Option<LessonProgressRow> = lesson_progress::table
                    .filter(lesson_progress::enrollment_id.eq(id))
                    .filter(lesson_progress::lesson_id.eq(lesson_id))
                    .select(LessonProgressRow::as_select())
                    .first(conn)
                    .await
                    .optional()?;
                let marker = match existing {
                    Some(row) => {
                        let mut marker = row_to_lesson_progress(row);
                        marker.recomplete(now);
                        marker
                    }
                    None => LessonProgress::completed(id, lesson_id, now),
                };
                let row = lesson_progress_row(&marker);
                diesel::insert_into(lesson_progress::table)
                    .values(&row)
                    .on_conflict((lesson_progress::enrollment_id, lesson_progress::lesson_id))
                    .do_update()
                    .set((
                        lesson_progress::completed.eq(row.completed),
                        lesson_progress::completed_at.eq(row.completed_at),
                        lesson_progress::updated_at.eq(row.updated_at),
                    ))
                    .execute(conn)
                    .await?;

                let counts = tally(conn, &enrollment).await?;
                enrollment.apply_lesson_tally(counts, now).map_err(rejected)?;
                save_enrollment(conn, &enrollment).await?;
                Ok(LessonCompletion {
                    lesson_progress: marker,
                    enrollment,
                })
            }
            .scope_boxed()
        })
        .await
    }

    async fn change(
        &self,
        id: Uuid,
        change: EnrollmentChange,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentRepositoryError> {
        self.modify(id, |enrollment| change.apply_to(enrollment, now))
            .await
    }

    async fn lesson_tally(&self, id: Uuid) -> Result<LessonTally, EnrollmentRepositoryError> {
        let Some(enrollment) = self.find_by_id(id).await? else {
            return Err(EnrollmentRepositoryError::missing(format!(
                "enrollment {id} not found"
            )));
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        tally(&mut conn, &enrollment).await.map_err(map_diesel_error)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(enrollments::table.filter(enrollments::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::checkout("timed out"));

        assert!(matches!(error, EnrollmentRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn transition_errors_become_rejections() {
        let error = rejected(EnrollmentTransitionError::ProgressOutOfRange { value: 140 });

        assert_eq!(
            error,
            EnrollmentRepositoryError::rejected("progress must be between 0 and 100, got 140")
        );
    }
}
