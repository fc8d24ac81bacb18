use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    EnrollmentChange, EnrollmentFilter, EnrollmentRepository, EnrollmentRepositoryError,
};
use crate::domain::{
    Enrollment, EnrollmentTransitionError, LessonCompletion, LessonProgress, LessonTally,
    PageRequest, Progress,
};

use super::{MemoryStore, State, newest_first};

fn missing(id: Uuid) -> EnrollmentRepositoryError {
    EnrollmentRepositoryError::missing(format!("enrollment {id} not found"))
}

fn rejected(error: EnrollmentTransitionError) -> EnrollmentRepositoryError {
    EnrollmentRepositoryError::rejected(error.to_string())
}

fn matching(state: &State, filter: EnrollmentFilter) -> Vec<Enrollment> {
    let mut enrollments: Vec<Enrollment> = state
        .enrollments
        .values()
        .filter(|enrollment| filter.matches(enrollment))
        .cloned()
        .collect();
    newest_first(&mut enrollments, |e| (e.enrolled_at(), e.id()));
    enrollments
}

impl MemoryStore {
    /// Read, transform, and write back one enrollment under the write guard.
    async fn modify_enrollment(
        &self,
        id: Uuid,
        transform: impl FnOnce(&mut Enrollment) -> Result<(), EnrollmentTransitionError> + Send,
    ) -> Result<Enrollment, EnrollmentRepositoryError> {
        let mut state = self.state.write().await;
        let stored = state.enrollments.get_mut(&id).ok_or_else(|| missing(id))?;
        let mut next = stored.clone();
        transform(&mut next).map_err(rejected)?;
        *stored = next.clone();
        Ok(next)
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>, EnrollmentRepositoryError> {
        Ok(self.state.read().await.enrollments.get(&id).cloned())
    }

    async fn find_by_user_and_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, EnrollmentRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .enrollments
            .values()
            .find(|e| e.user_id() == user_id && e.course_id() == course_id)
            .cloned())
    }

    async fn list(
        &self,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Vec<Enrollment>, EnrollmentRepositoryError> {
        let state = self.state.read().await;
        Ok(page.apply(matching(&state, filter)))
    }

    async fn list_all(
        &self,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, EnrollmentRepositoryError> {
        let state = self.state.read().await;
        Ok(matching(&state, filter))
    }

    async fn insert(&self, enrollment: &Enrollment) -> Result<(), EnrollmentRepositoryError> {
        let mut state = self.state.write().await;
        let exists = state.enrollments.values().any(|other| {
            other.user_id() == enrollment.user_id() && other.course_id() == enrollment.course_id()
        });
        if exists {
            return Err(EnrollmentRepositoryError::duplicate(format!(
                "user {} is already enrolled in course {}",
                enrollment.user_id(),
                enrollment.course_id()
            )));
        }
        state.enrollments.insert(enrollment.id(), enrollment.clone());
        Ok(())
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: Progress,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentRepositoryError> {
        self.modify_enrollment(id, |enrollment| enrollment.apply_progress(progress, now))
            .await
    }

    async fn complete_lesson(
        &self,
        id: Uuid,
        lesson_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<LessonCompletion, EnrollmentRepositoryError> {
        let mut state = self.state.write().await;
        let mut enrollment = state.enrollments.get(&id).cloned().ok_or_else(|| missing(id))?;
        if !enrollment.status().accepts_progress() {
            return Err(rejected(EnrollmentTransitionError::NotInProgress {
                status: enrollment.status(),
            }));
        }
        let marker = match state.lesson_progress.get(&(id, lesson_id)) {
            Some(existing) => {
                let mut marker = existing.clone();
                marker.recomplete(now);
                marker
            }
            None => LessonProgress::completed(id, lesson_id, now),
        };
        state.lesson_progress.insert((id, lesson_id), marker.clone());
        let tally = state.tally(&enrollment);
        enrollment.apply_lesson_tally(tally, now).map_err(rejected)?;
        state.enrollments.insert(id, enrollment.clone());
        Ok(LessonCompletion {
            lesson_progress: marker,
            enrollment,
        })
    }

    async fn change(
        &self,
        id: Uuid,
        change: EnrollmentChange,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentRepositoryError> {
        self.modify_enrollment(id, |enrollment| change.apply_to(enrollment, now))
            .await
    }

    async fn lesson_tally(&self, id: Uuid) -> Result<LessonTally, EnrollmentRepositoryError> {
        let state = self.state.read().await;
        let enrollment = state.enrollments.get(&id).ok_or_else(|| missing(id))?;
        Ok(state.tally(enrollment))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, EnrollmentRepositoryError> {
        Ok(self.state.write().await.purge_enrollment(id))
    }
}
