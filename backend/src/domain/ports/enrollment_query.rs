//! Driving port for enrollment reads.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Enrollment, EnrollmentStats, EnrollmentStatus, Error, PageRequest};

use super::EnrollmentFilter;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentQuery: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Enrollment, Error>;

    async fn list(
        &self,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Vec<Enrollment>, Error>;

    async fn for_user(
        &self,
        user_id: Uuid,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<Enrollment>, Error>;

    async fn for_course(&self, course_id: Uuid) -> Result<Vec<Enrollment>, Error>;

    /// Status counts, average progress, and completion rate, optionally
    /// narrowed to a course and/or user.
    async fn stats(
        &self,
        course_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<EnrollmentStats, Error>;
}
