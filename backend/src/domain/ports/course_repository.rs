//! Port for the course catalogue: courses and their lessons.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Course, CourseStatus, Lesson, PageRequest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by course repository adapters.
    pub enum CourseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } as Unavailable => "course repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } as Failed => "course repository query failed: {message}",
        /// Slug is already taken.
        Duplicate { message: String } as Duplicate => "{message}",
    }
}

/// Optional filters for course listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub status: Option<CourseStatus>,
    pub instructor_id: Option<Uuid>,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        self.status.is_none_or(|status| course.status == status)
            && self
                .instructor_id
                .is_none_or(|instructor| course.instructor_id == instructor)
    }
}

/// A course paired with how many enrollments it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithEnrollments {
    #[serde(flatten)]
    pub course: Course,
    pub enrollments: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, CourseRepositoryError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, CourseRepositoryError>;

    /// Filtered page of courses, newest first.
    async fn list(
        &self,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Every course taught by `instructor_id`, newest first.
    async fn list_by_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Published courses matching the query text or a keyword.
    async fn search_published(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Published courses ordered by enrollment count, most first.
    async fn popular_published(
        &self,
        limit: usize,
    ) -> Result<Vec<CourseWithEnrollments>, CourseRepositoryError>;

    async fn insert(&self, course: &Course) -> Result<(), CourseRepositoryError>;

    /// Returns `false` when the course is absent.
    async fn update(&self, course: &Course) -> Result<bool, CourseRepositoryError>;

    /// Delete a course and its lessons; returns `false` when absent.
    async fn delete(&self, id: Uuid) -> Result<bool, CourseRepositoryError>;

    async fn find_lesson(&self, id: Uuid) -> Result<Option<Lesson>, CourseRepositoryError>;

    /// Lessons of a course ordered by position.
    async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>, CourseRepositoryError>;

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), CourseRepositoryError>;

    /// Returns `false` when the lesson is absent.
    async fn update_lesson(&self, lesson: &Lesson) -> Result<bool, CourseRepositoryError>;

    /// Delete a lesson and its progress markers; returns `false` when absent.
    async fn delete_lesson(&self, id: Uuid) -> Result<bool, CourseRepositoryError>;
}
