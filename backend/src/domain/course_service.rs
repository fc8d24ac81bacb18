//! Course catalogue service: courses, lessons, search, and per-course stats.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    CourseCommand, CourseFilter, CourseQuery, CourseRepository, CourseStats,
    CourseWithEnrollments, EnrollmentFilter, EnrollmentRepository, POPULAR_DEFAULT_LIMIT,
    POPULAR_MAX_LIMIT, SEARCH_LIMIT, UserRepository,
};
use crate::domain::{
    Course, CourseDetail, CourseUpdate, CourseValidationError, EnrollmentStats, Error, Lesson,
    LessonUpdate, NewCourse, NewLesson, PageRequest,
};

fn invalid_course(err: CourseValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

/// Course service implementing the catalogue driving ports.
#[derive(Clone)]
pub struct CourseService<C, E, U> {
    courses: Arc<C>,
    enrollments: Arc<E>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<C, E, U> CourseService<C, E, U> {
    pub fn new(
        courses: Arc<C>,
        enrollments: Arc<E>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            courses,
            enrollments,
            users,
            clock,
        }
    }
}

impl<C, E, U> CourseService<C, E, U>
where
    C: CourseRepository,
    E: EnrollmentRepository,
    U: UserRepository,
{
    async fn find_course(&self, id: Uuid) -> Result<Course, Error> {
        self.courses
            .find_by_id(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("course {id} not found")))
    }

    async fn find_lesson(&self, id: Uuid) -> Result<Lesson, Error> {
        self.courses
            .find_lesson(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("lesson {id} not found")))
    }

    async fn detail(&self, course: Course) -> Result<CourseDetail, Error> {
        let lessons = self
            .courses
            .list_lessons(course.id)
            .await
            .map_err(Error::from)?;
        Ok(CourseDetail::new(course, lessons))
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<Uuid>) -> Result<(), Error> {
        let taken = self
            .courses
            .find_by_slug(slug)
            .await
            .map_err(Error::from)?;
        match taken {
            Some(existing) if Some(existing.id) != owner => Err(Error::conflict(format!(
                "a course with slug {slug:?} already exists"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<C, E, U> CourseCommand for CourseService<C, E, U>
where
    C: CourseRepository,
    E: EnrollmentRepository,
    U: UserRepository,
{
    async fn create(&self, input: NewCourse) -> Result<Course, Error> {
        let instructor_id = input.instructor_id;
        let course = Course::create(input, self.clock.utc()).map_err(invalid_course)?;
        self.users
            .find_by_id(instructor_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("instructor {instructor_id} not found")))?;
        self.ensure_slug_free(&course.slug, None).await?;
        self.courses
            .insert(&course)
            .await
            .map_err(Error::from)?;
        info!(course_id = %course.id, slug = %course.slug, "course created");
        Ok(course)
    }

    async fn update(&self, id: Uuid, update: CourseUpdate) -> Result<Course, Error> {
        let mut course = self.find_course(id).await?;
        if let Some(slug) = update.slug.as_deref() {
            self.ensure_slug_free(slug, Some(id)).await?;
        }
        course
            .apply_update(update, self.clock.utc())
            .map_err(invalid_course)?;
        let updated = self
            .courses
            .update(&course)
            .await
            .map_err(Error::from)?;
        if !updated {
            return Err(Error::not_found(format!("course {id} not found")));
        }
        Ok(course)
    }

    async fn remove(&self, id: Uuid) -> Result<(), Error> {
        self.find_course(id).await?;
        let enrolled = self
            .enrollments
            .list_all(EnrollmentFilter::for_course(id))
            .await
            .map_err(Error::from)?;
        if !enrolled.is_empty() {
            return Err(Error::invalid_request(format!(
                "course has {} enrollments and cannot be deleted",
                enrolled.len()
            )));
        }
        let deleted = self
            .courses
            .delete(id)
            .await
            .map_err(Error::from)?;
        if !deleted {
            return Err(Error::not_found(format!("course {id} not found")));
        }
        info!(course_id = %id, "course removed");
        Ok(())
    }

    async fn create_lesson(&self, course_id: Uuid, input: NewLesson) -> Result<Lesson, Error> {
        self.find_course(course_id).await?;
        let lesson =
            Lesson::create(course_id, input, self.clock.utc()).map_err(invalid_course)?;
        self.courses
            .insert_lesson(&lesson)
            .await
            .map_err(Error::from)?;
        Ok(lesson)
    }

    async fn update_lesson(&self, id: Uuid, update: LessonUpdate) -> Result<Lesson, Error> {
        let mut lesson = self.find_lesson(id).await?;
        lesson
            .apply_update(update, self.clock.utc())
            .map_err(invalid_course)?;
        let updated = self
            .courses
            .update_lesson(&lesson)
            .await
            .map_err(Error::from)?;
        if !updated {
            return Err(Error::not_found(format!("lesson {id} not found")));
        }
        Ok(lesson)
    }

    async fn delete_lesson(&self, id: Uuid) -> Result<(), Error> {
        let deleted = self
            .courses
            .delete_lesson(id)
            .await
            .map_err(Error::from)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(format!("lesson {id} not found")))
        }
    }
}

#[async_trait]
impl<C, E, U> CourseQuery for CourseService<C, E, U>
where
    C: CourseRepository,
    E: EnrollmentRepository,
    U: UserRepository,
{
    async fn list(&self, filter: CourseFilter, page: PageRequest) -> Result<Vec<Course>, Error> {
        self.courses
            .list(filter, page)
            .await
            .map_err(Error::from)
    }

    async fn get(&self, id: Uuid) -> Result<CourseDetail, Error> {
        let course = self.find_course(id).await?;
        self.detail(course).await
    }

    async fn by_slug(&self, slug: String) -> Result<CourseDetail, Error> {
        let course = self
            .courses
            .find_by_slug(&slug)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("course with slug {slug:?} not found")))?;
        self.detail(course).await
    }

    async fn search(&self, query: String) -> Result<Vec<Course>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_request("search query must not be empty"));
        }
        self.courses
            .search_published(query, SEARCH_LIMIT)
            .await
            .map_err(Error::from)
    }

    async fn popular(&self, limit: Option<usize>) -> Result<Vec<CourseWithEnrollments>, Error> {
        let limit = limit
            .unwrap_or(POPULAR_DEFAULT_LIMIT)
            .clamp(1, POPULAR_MAX_LIMIT);
        self.courses
            .popular_published(limit)
            .await
            .map_err(Error::from)
    }

    async fn by_instructor(&self, instructor_id: Uuid) -> Result<Vec<Course>, Error> {
        self.courses
            .list_by_instructor(instructor_id)
            .await
            .map_err(Error::from)
    }

    async fn stats(&self, id: Uuid) -> Result<CourseStats, Error> {
        self.find_course(id).await?;
        let enrollments = self
            .enrollments
            .list_all(EnrollmentFilter::for_course(id))
            .await
            .map_err(Error::from)?;
        let lessons = self
            .courses
            .list_lessons(id)
            .await
            .map_err(Error::from)?;
        let summary = EnrollmentStats::from_enrollments(&enrollments);
        Ok(CourseStats {
            total_enrollments: summary.total,
            active_enrollments: summary.active,
            completed_enrollments: summary.completed,
            total_lessons: u64::try_from(lessons.len()).unwrap_or(u64::MAX),
            completion_rate: summary.completion_rate,
        })
    }
}

#[cfg(test)]
#[path = "course_service_tests.rs"]
mod tests;
