//! Port for enrollment persistence.
//!
//! Read-modify-write operations (`update_progress`, `complete_lesson`,
//! `change`) are single calls so adapters can run each one as one
//! unit of work: lock the enrollment, apply the domain transition, write,
//! and commit or roll back together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Enrollment, EnrollmentStatus, EnrollmentTransitionError, LessonCompletion, LessonTally,
    PageRequest, Progress,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by enrollment repository adapters.
    pub enum EnrollmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } as Unavailable => "enrollment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } as Failed => "enrollment repository query failed: {message}",
        /// The user is already enrolled in the course.
        Duplicate { message: String } as Duplicate => "{message}",
        /// A referenced row vanished inside the unit of work.
        Missing { message: String } as Missing => "{message}",
        /// The domain refused the transition under lock.
        Rejected { message: String } as Rejected => "{message}",
    }
}

/// Optional filters for enrollment listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrollmentFilter {
    pub user_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub status: Option<EnrollmentStatus>,
}

impl EnrollmentFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn for_course(course_id: Uuid) -> Self {
        Self {
            course_id: Some(course_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        self.user_id.is_none_or(|id| enrollment.user_id() == id)
            && self.course_id.is_none_or(|id| enrollment.course_id() == id)
            && self.status.is_none_or(|status| enrollment.status() == status)
    }
}

/// Administrative change requested through the update route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrollmentChange {
    pub status: Option<EnrollmentStatus>,
    pub progress: Option<Progress>,
}

impl EnrollmentChange {
    /// Apply the status edge first, then the explicit progress value.
    /// Completing an enrollment at less than full progress is refused.
    pub fn apply_to(
        self,
        enrollment: &mut Enrollment,
        now: DateTime<Utc>,
    ) -> Result<(), EnrollmentTransitionError> {
        if let (Some(EnrollmentStatus::Completed), Some(progress)) = (self.status, self.progress) {
            if !progress.is_complete() {
                return Err(EnrollmentTransitionError::CompletedBelowFullProgress {
                    value: progress.value(),
                });
            }
        }
        if let Some(status) = self.status {
            enrollment.transition_to(status, now)?;
        }
        if let Some(progress) = self.progress {
            enrollment.apply_progress(progress, now)?;
        }
        Ok(())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>, EnrollmentRepositoryError>;

    async fn find_by_user_and_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, EnrollmentRepositoryError>;

    /// Filtered page, most recently enrolled first.
    async fn list(
        &self,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Vec<Enrollment>, EnrollmentRepositoryError>;

    /// Every enrollment matching `filter`, most recently enrolled first.
    async fn list_all(
        &self,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, EnrollmentRepositoryError>;

    /// Insert a new enrollment. A second enrollment for the same user and
    /// course fails with `Duplicate`.
    async fn insert(&self, enrollment: &Enrollment) -> Result<(), EnrollmentRepositoryError>;

    /// Atomically apply an explicit progress value.
    async fn update_progress(
        &self,
        id: Uuid,
        progress: Progress,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentRepositoryError>;

    /// Atomically mark a lesson complete and recompute progress from the
    /// course's lesson counts.
    async fn complete_lesson(
        &self,
        id: Uuid,
        lesson_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<LessonCompletion, EnrollmentRepositoryError>;

    /// Atomically apply an administrative status and/or progress change.
    async fn change(
        &self,
        id: Uuid,
        change: EnrollmentChange,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentRepositoryError>;

    /// Completed versus total lessons for an enrollment's course.
    async fn lesson_tally(&self, id: Uuid) -> Result<LessonTally, EnrollmentRepositoryError>;

    /// Delete an enrollment with its lesson progress; `false` when absent.
    async fn delete(&self, id: Uuid) -> Result<bool, EnrollmentRepositoryError>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn filter_combines_fields() {
        let enrollment = Enrollment::new_active(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        let mut filter = EnrollmentFilter::for_user(enrollment.user_id());
        assert!(filter.matches(&enrollment));
        filter.status = Some(EnrollmentStatus::Pending);
        assert!(!filter.matches(&enrollment));
        assert!(!EnrollmentFilter::for_course(Uuid::new_v4()).matches(&enrollment));
    }

    #[rstest]
    fn change_completes_then_rejects_progress_on_cancelled() {
        let now = Utc::now();
        let mut enrollment = Enrollment::new_active(Uuid::new_v4(), Uuid::new_v4(), now);
        EnrollmentChange {
            status: Some(EnrollmentStatus::Completed),
            progress: None,
        }
        .apply_to(&mut enrollment, now)
        .expect("active to completed");
        assert_eq!(enrollment.progress(), Progress::COMPLETE);
        assert_eq!(enrollment.completed_at(), Some(now));

        let mut pending = Enrollment::new_pending(Uuid::new_v4(), Uuid::new_v4(), now);
        let error = EnrollmentChange {
            status: Some(EnrollmentStatus::Cancelled),
            progress: Some(Progress::ZERO),
        }
        .apply_to(&mut pending, now)
        .expect_err("cancelled enrollments take no progress");
        assert!(matches!(error, EnrollmentTransitionError::NotInProgress { .. }));
    }

    #[rstest]
    #[case(40, false)]
    #[case(100, true)]
    fn completion_with_explicit_progress_requires_full_progress(
        #[case] value: i64,
        #[case] accepted: bool,
    ) {
        let now = Utc::now();
        let mut enrollment = Enrollment::new_active(Uuid::new_v4(), Uuid::new_v4(), now);
        let untouched = enrollment.clone();

        let result = EnrollmentChange {
            status: Some(EnrollmentStatus::Completed),
            progress: Some(Progress::new(value).expect("valid progress")),
        }
        .apply_to(&mut enrollment, now);

        if accepted {
            assert_eq!(result, Ok(()));
            assert_eq!(enrollment.status(), EnrollmentStatus::Completed);
            assert_eq!(enrollment.progress(), Progress::COMPLETE);
        } else {
            assert_eq!(
                result,
                Err(EnrollmentTransitionError::CompletedBelowFullProgress { value: 40 })
            );
            assert_eq!(enrollment, untouched);
        }
    }
}
