//! Enrollment lifecycle service implementing the enrollment driving ports.
//!
//! Read-modify-write steps (progress, lesson completion, administrative
//! changes) are delegated to single repository calls so the adapter can run
//! each one under a row lock inside one transaction. This service validates
//! inputs, checks referenced rows exist, and maps port failures.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    CourseRepository, EnrollmentChange, EnrollmentCommand, EnrollmentFilter, EnrollmentQuery,
    EnrollmentRepository, UpdateEnrollmentRequest, UserRepository,
};
use crate::domain::{
    Enrollment, EnrollmentStats, EnrollmentStatus, Error, LessonCompletion, PageRequest, Progress,
};

/// Enrollment service backed by enrollment, course, and user repositories.
#[derive(Clone)]
pub struct EnrollmentService<E, C, U> {
    enrollments: Arc<E>,
    courses: Arc<C>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<E, C, U> EnrollmentService<E, C, U> {
    pub fn new(
        enrollments: Arc<E>,
        courses: Arc<C>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            enrollments,
            courses,
            users,
            clock,
        }
    }
}

fn checked_progress(value: i64) -> Result<Progress, Error> {
    Progress::new(value).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(serde_json::json!({
            "field": "progress",
            "value": value,
            "code": "progress_out_of_range",
        }))
    })
}

impl<E, C, U> EnrollmentService<E, C, U>
where
    E: EnrollmentRepository,
    C: CourseRepository,
    U: UserRepository,
{
    async fn ensure_course_exists(&self, course_id: Uuid) -> Result<(), Error> {
        self.courses
            .find_by_id(course_id)
            .await
            .map_err(Error::from)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("course {course_id} not found")))
    }

    async fn ensure_user_exists(&self, user_id: Uuid) -> Result<(), Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Error::from)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }

    async fn list_matching(&self, filter: EnrollmentFilter) -> Result<Vec<Enrollment>, Error> {
        self.enrollments
            .list_all(filter)
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl<E, C, U> EnrollmentCommand for EnrollmentService<E, C, U>
where
    E: EnrollmentRepository,
    C: CourseRepository,
    U: UserRepository,
{
    async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> Result<Enrollment, Error> {
        let existing = self
            .enrollments
            .find_by_user_and_course(user_id, course_id)
            .await
            .map_err(Error::from)?;
        if existing.is_some() {
            return Err(Error::conflict("user is already enrolled in this course"));
        }
        self.ensure_course_exists(course_id).await?;
        self.ensure_user_exists(user_id).await?;

        let enrollment = Enrollment::new_active(user_id, course_id, self.clock.utc());
        self.enrollments
            .insert(&enrollment)
            .await
            .map_err(Error::from)?;
        info!(
            enrollment_id = %enrollment.id(),
            %user_id,
            %course_id,
            "user enrolled"
        );
        Ok(enrollment)
    }

    async fn update_progress(&self, id: Uuid, progress: i64) -> Result<Enrollment, Error> {
        let progress = checked_progress(progress)?;
        let enrollment = self
            .enrollments
            .update_progress(id, progress, self.clock.utc())
            .await
            .map_err(Error::from)?;
        if enrollment.status() == EnrollmentStatus::Completed && progress.is_complete() {
            info!(enrollment_id = %id, "enrollment completed");
        }
        Ok(enrollment)
    }

    async fn complete_lesson(
        &self,
        id: Uuid,
        lesson_id: Uuid,
    ) -> Result<LessonCompletion, Error> {
        let completion = self
            .enrollments
            .complete_lesson(id, lesson_id, self.clock.utc())
            .await
            .map_err(Error::from)?;
        info!(
            enrollment_id = %id,
            %lesson_id,
            progress = completion.enrollment.progress().value(),
            status = %completion.enrollment.status(),
            "lesson completed"
        );
        Ok(completion)
    }

    async fn update(
        &self,
        id: Uuid,
        request: UpdateEnrollmentRequest,
    ) -> Result<Enrollment, Error> {
        if request.status.is_none() && request.progress.is_none() {
            return Err(Error::invalid_request(
                "at least one of status or progress must be provided",
            ));
        }
        let change = EnrollmentChange {
            status: request.status,
            progress: request.progress.map(checked_progress).transpose()?,
        };
        self.enrollments
            .change(id, change, self.clock.utc())
            .await
            .map_err(Error::from)
    }

    async fn remove(&self, id: Uuid) -> Result<(), Error> {
        let deleted = self
            .enrollments
            .delete(id)
            .await
            .map_err(Error::from)?;
        if !deleted {
            return Err(Error::not_found(format!("enrollment {id} not found")));
        }
        info!(enrollment_id = %id, "enrollment removed");
        Ok(())
    }
}

#[async_trait]
impl<E, C, U> EnrollmentQuery for EnrollmentService<E, C, U>
where
    E: EnrollmentRepository,
    C: CourseRepository,
    U: UserRepository,
{
    async fn get(&self, id: Uuid) -> Result<Enrollment, Error> {
        self.enrollments
            .find_by_id(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("enrollment {id} not found")))
    }

    async fn list(
        &self,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Vec<Enrollment>, Error> {
        self.enrollments
            .list(filter, page)
            .await
            .map_err(Error::from)
    }

    async fn for_user(
        &self,
        user_id: Uuid,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<Enrollment>, Error> {
        self.list_matching(EnrollmentFilter {
            status,
            ..EnrollmentFilter::for_user(user_id)
        })
        .await
    }

    async fn for_course(&self, course_id: Uuid) -> Result<Vec<Enrollment>, Error> {
        self.list_matching(EnrollmentFilter::for_course(course_id))
            .await
    }

    async fn stats(
        &self,
        course_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<EnrollmentStats, Error> {
        let enrollments = self
            .list_matching(EnrollmentFilter {
                user_id,
                course_id,
                status: None,
            })
            .await?;
        Ok(EnrollmentStats::from_enrollments(&enrollments))
    }
}

#[cfg(test)]
#[path = "enrollment_service_tests.rs"]
mod tests;
