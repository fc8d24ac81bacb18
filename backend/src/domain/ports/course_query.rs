//! Driving port for catalogue reads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Course, CourseDetail, Error, PageRequest};

use super::{CourseFilter, CourseWithEnrollments};

/// Search results are capped at this many courses.
pub const SEARCH_LIMIT: usize = 20;
/// Default size of the popular list.
pub const POPULAR_DEFAULT_LIMIT: usize = 10;

/// Enrollment and lesson figures for one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub total_enrollments: u64,
    pub active_enrollments: u64,
    pub completed_enrollments: u64,
    pub total_lessons: u64,
    pub completion_rate: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseQuery: Send + Sync {
    async fn list(&self, filter: CourseFilter, page: PageRequest) -> Result<Vec<Course>, Error>;

    /// Course with lessons ordered by position.
    async fn get(&self, id: Uuid) -> Result<CourseDetail, Error>;

    async fn by_slug(&self, slug: String) -> Result<CourseDetail, Error>;

    /// Published courses matching `query`; at most [`SEARCH_LIMIT`].
    async fn search(&self, query: String) -> Result<Vec<Course>, Error>;

    async fn popular(&self, limit: Option<usize>) -> Result<Vec<CourseWithEnrollments>, Error>;

    async fn by_instructor(&self, instructor_id: Uuid) -> Result<Vec<Course>, Error>;

    async fn stats(&self, id: Uuid) -> Result<CourseStats, Error>;
}
