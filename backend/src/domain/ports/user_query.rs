//! Driving port for user directory reads.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Course, CourseProgressSummary, Enrollment, Error, PageRequest, User};

/// User search returns at most this many matches.
pub const USER_SEARCH_LIMIT: usize = 10;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserQuery: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, Error>;

    async fn get(&self, id: Uuid) -> Result<User, Error>;

    async fn by_email(&self, email: String) -> Result<User, Error>;

    async fn enrollments(&self, id: Uuid) -> Result<Vec<Enrollment>, Error>;

    /// Courses the user teaches.
    async fn courses_created(&self, id: Uuid) -> Result<Vec<Course>, Error>;

    /// Lesson completion per enrollment, optionally narrowed to one course.
    async fn progress(
        &self,
        id: Uuid,
        course_id: Option<Uuid>,
    ) -> Result<Vec<CourseProgressSummary>, Error>;

    async fn search(&self, query: String) -> Result<Vec<User>, Error>;
}
