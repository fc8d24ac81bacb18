//! Driving port for enrollment lifecycle changes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Enrollment, EnrollmentStatus, Error, LessonCompletion};

/// Administrative update; at least one field should be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateEnrollmentRequest {
    pub status: Option<EnrollmentStatus>,
    /// Raw percentage, validated by the service.
    pub progress: Option<i64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentCommand: Send + Sync {
    /// Enroll a user directly (no payment); the enrollment starts ACTIVE.
    async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> Result<Enrollment, Error>;

    /// Set progress explicitly; 100 completes the enrollment.
    async fn update_progress(&self, id: Uuid, progress: i64) -> Result<Enrollment, Error>;

    /// Mark a lesson complete and recompute progress.
    async fn complete_lesson(
        &self,
        id: Uuid,
        lesson_id: Uuid,
    ) -> Result<LessonCompletion, Error>;

    async fn update(
        &self,
        id: Uuid,
        request: UpdateEnrollmentRequest,
    ) -> Result<Enrollment, Error>;

    async fn remove(&self, id: Uuid) -> Result<(), Error>;
}
