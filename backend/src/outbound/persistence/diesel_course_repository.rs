//! PostgreSQL-backed `CourseRepository`, covering courses and their lessons.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{
    CourseFilter, CourseRepository, CourseRepositoryError, CourseWithEnrollments,
};
use crate::domain::{Course, CourseStatus, Lesson, PageRequest};

use super::diesel_error_mapping::{
    DbFailure, classify_diesel_error, collect_rows, contains_pattern, count_from_db, limit_for_db,
};
use super::models::{CourseRow, LessonRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::{course_record, lesson_record, row_to_course, row_to_lesson};
use super::schema::{courses, enrollments, lesson_progress, lessons};

type BoxedCourses<'a> = courses::BoxedQuery<'a, diesel::pg::Pg>;

/// Diesel-backed course catalogue.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_courses(
        &self,
        query: BoxedCourses<'_>,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CourseRow> = query
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_course), CourseRepositoryError::query)
    }

    async fn find_course(
        &self,
        query: BoxedCourses<'_>,
    ) -> Result<Option<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CourseRow> = query
            .select(CourseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_course)
            .transpose()
            .map_err(CourseRepositoryError::query)
    }
}

fn map_pool_error(error: PoolError) -> CourseRepositoryError {
    CourseRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> CourseRepositoryError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => CourseRepositoryError::connection(message),
        DbFailure::Duplicate(constraint) if constraint.contains("slug") => {
            CourseRepositoryError::duplicate("slug is already taken")
        }
        DbFailure::Duplicate(constraint) => CourseRepositoryError::duplicate(constraint),
        DbFailure::Query(message) => CourseRepositoryError::query(message),
    }
}

fn newest_first(query: BoxedCourses<'_>) -> BoxedCourses<'_> {
    query.order((courses::created_at.desc(), courses::id.desc()))
}

fn filtered(filter: CourseFilter) -> BoxedCourses<'static> {
    let mut query = courses::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(courses::status.eq(status.as_str()));
    }
    if let Some(instructor_id) = filter.instructor_id {
        query = query.filter(courses::instructor_id.eq(instructor_id));
    }
    query
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, CourseRepositoryError> {
        self.find_course(courses::table.filter(courses::id.eq(id)).into_boxed())
            .await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, CourseRepositoryError> {
        self.find_course(
            courses::table
                .filter(courses::slug.eq(slug.to_owned()))
                .into_boxed(),
        )
        .await
    }

    async fn list(
        &self,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let query = newest_first(filtered(filter))
            .offset(i64::from(page.skip()))
            .limit(i64::from(page.take()));
        self.load_courses(query).await
    }

    async fn list_by_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let filter = CourseFilter {
            status: None,
            instructor_id: Some(instructor_id),
        };
        self.load_courses(newest_first(filtered(filter))).await
    }

    async fn search_published(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let needle = query.trim().to_lowercase();
        let pattern = contains_pattern(&needle);
        let text_hit = courses::title
            .ilike(pattern.clone())
            .or(courses::description.ilike(pattern.clone()))
            .nullable()
            .or(courses::short_description.ilike(pattern))
            .or(courses::keywords.contains(vec![needle]).nullable());
        let search = courses::table
            .filter(courses::status.eq(CourseStatus::Published.as_str()))
            .filter(text_hit)
            .into_boxed();
        self.load_courses(newest_first(search).limit(limit_for_db(limit)))
            .await
    }

    async fn popular_published(
        &self,
        limit: usize,
    ) -> Result<Vec<CourseWithEnrollments>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (rows, counts) = conn
            .transaction(|conn| {
                async move {
                    let rows: Vec<CourseRow> = courses::table
                        .filter(courses::status.eq(CourseStatus::Published.as_str()))
                        .select(CourseRow::as_select())
                        .load(conn)
                        .await?;
                    let counts: Vec<(Uuid, i64)> = enrollments::table
                        .group_by(enrollments::course_id)
                        .select((enrollments::course_id, count_star()))
                        .load(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((rows, counts))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let counts: HashMap<Uuid, i64> = counts.into_iter().collect();
        let published = collect_rows(
            rows.into_iter().map(row_to_course),
            CourseRepositoryError::query,
        )?;
        let mut ranked: Vec<CourseWithEnrollments> = published
            .into_iter()
            .map(|course| CourseWithEnrollments {
                enrollments: count_from_db(counts.get(&course.id).copied().unwrap_or_default()),
                course,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.enrollments
                .cmp(&a.enrollments)
                .then_with(|| a.course.title.cmp(&b.course.title))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn insert(&self, course: &Course) -> Result<(), CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(courses::table)
            .values(&course_record(course))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, course: &Course) -> Result<bool, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(courses::table.filter(courses::id.eq(course.id)))
            .set(&course_record(course))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(courses::table.filter(courses::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_lesson(&self, id: Uuid) -> Result<Option<Lesson>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LessonRow> = lessons::table
            .filter(lessons::id.eq(id))
            .select(LessonRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_lesson))
    }

    async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LessonRow> = lessons::table
            .filter(lessons::course_id.eq(course_id))
            .order((lessons::position.asc(), lessons::created_at.asc(), lessons::id.asc()))
            .select(LessonRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_lesson).collect())
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(lessons::table)
            .values(&lesson_record(lesson))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<bool, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(lessons::table.filter(lessons::id.eq(lesson.id)))
            .set(&lesson_record(lesson))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_lesson(&self, id: Uuid) -> Result<bool, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(lesson_progress::table.filter(lesson_progress::lesson_id.eq(id)))
                    .execute(conn)
                    .await?;
                let deleted = diesel::delete(lessons::table.filter(lessons::id.eq(id)))
                    .execute(conn)
                    .await?;
                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::build("bad url"));

        assert!(matches!(error, CourseRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn query_builder_error_maps_to_query() {
        let error = map_diesel_error(diesel::result::Error::QueryBuilderError(
            "empty changeset".into(),
        ));

        assert!(matches!(error, CourseRepositoryError::Query { .. }));
    }
}
