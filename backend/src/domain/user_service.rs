//! User directory service and identity-provider synchronisation.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    CourseRepository, EnrollmentFilter, EnrollmentRepository, IdentityEvent, USER_SEARCH_LIMIT,
    UserCommand, UserQuery, UserRepository, WebhookAck,
};
use crate::domain::{
    Course, CourseProgressSummary, EmailAddress, Enrollment, EnrollmentStatus, Error,
    IdentityProfile, PageRequest, User, UserUpdate,
};

/// User service implementing the directory driving ports.
#[derive(Clone)]
pub struct UserService<U, E, C> {
    users: Arc<U>,
    enrollments: Arc<E>,
    courses: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<U, E, C> UserService<U, E, C> {
    pub fn new(
        users: Arc<U>,
        enrollments: Arc<E>,
        courses: Arc<C>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            enrollments,
            courses,
            clock,
        }
    }
}

impl<U, E, C> UserService<U, E, C>
where
    U: UserRepository,
    E: EnrollmentRepository,
    C: CourseRepository,
{
    async fn find(&self, id: Uuid) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn enrollments_of(&self, filter: EnrollmentFilter) -> Result<Vec<Enrollment>, Error> {
        self.enrollments
            .list_all(filter)
            .await
            .map_err(Error::from)
    }

    async fn upsert_profile(&self, profile: IdentityProfile) -> Result<User, Error> {
        let now = self.clock.utc();
        let existing = self
            .users
            .find_by_external_id(&profile.external_id)
            .await
            .map_err(Error::from)?;
        if let Some(mut user) = existing {
            user.apply_profile(profile, now);
            self.users
                .update(&user)
                .await
                .map_err(Error::from)?;
            return Ok(user);
        }
        let user = User::register(profile, now)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.users
            .insert(&user)
            .await
            .map_err(Error::from)?;
        Ok(user)
    }

    async fn summarise(&self, enrollment: &Enrollment) -> Result<CourseProgressSummary, Error> {
        let course_title = self
            .courses
            .find_by_id(enrollment.course_id())
            .await
            .map_err(Error::from)?
            .map(|course| course.title)
            .unwrap_or_default();
        let tally = self
            .enrollments
            .lesson_tally(enrollment.id())
            .await
            .map_err(Error::from)?;
        Ok(CourseProgressSummary {
            enrollment_id: enrollment.id(),
            course_id: enrollment.course_id(),
            course_title,
            status: enrollment.status(),
            progress: enrollment.progress(),
            completed_lessons: tally.completed,
            total_lessons: tally.total,
            progress_percentage: tally.progress(),
        })
    }
}

#[async_trait]
impl<U, E, C> UserCommand for UserService<U, E, C>
where
    U: UserRepository,
    E: EnrollmentRepository,
    C: CourseRepository,
{
    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, Error> {
        let mut user = self.find(id).await?;
        user.apply_update(update, self.clock.utc());
        let updated = self
            .users
            .update(&user)
            .await
            .map_err(Error::from)?;
        if !updated {
            return Err(Error::not_found(format!("user {id} not found")));
        }
        Ok(user)
    }

    async fn remove(&self, id: Uuid) -> Result<(), Error> {
        self.find(id).await?;
        let active = self
            .enrollments_of(EnrollmentFilter {
                status: Some(EnrollmentStatus::Active),
                ..EnrollmentFilter::for_user(id)
            })
            .await?;
        if !active.is_empty() {
            return Err(Error::invalid_request(
                "user has active enrollments and cannot be deleted",
            ));
        }
        let taught = self
            .courses
            .list_by_instructor(id)
            .await
            .map_err(Error::from)?;
        if !taught.is_empty() {
            return Err(Error::invalid_request(format!(
                "user instructs {} courses and cannot be deleted",
                taught.len()
            )));
        }
        let deleted = self
            .users
            .delete(id)
            .await
            .map_err(Error::from)?;
        if !deleted {
            return Err(Error::not_found(format!("user {id} not found")));
        }
        info!(user_id = %id, "user removed");
        Ok(())
    }

    async fn sync_identity(&self, event: IdentityEvent) -> Result<WebhookAck, Error> {
        match event {
            IdentityEvent::Upsert {
                event_type,
                profile,
            } => {
                let user = self.upsert_profile(profile).await?;
                info!(%event_type, user_id = %user.id, "identity profile synchronised");
            }
            IdentityEvent::Deleted { external_id } => {
                let existing = self
                    .users
                    .find_by_external_id(&external_id)
                    .await
                    .map_err(Error::from)?;
                match existing {
                    Some(user) => {
                        self.users
                            .delete(user.id)
                            .await
                            .map_err(Error::from)?;
                        info!(user_id = %user.id, "user deleted by identity provider");
                    }
                    None => warn!(%external_id, "identity deletion for unknown user"),
                }
            }
            IdentityEvent::Unrecognised { event_type } => {
                info!(%event_type, "unhandled identity event type");
            }
        }
        Ok(WebhookAck::received())
    }
}

#[async_trait]
impl<U, E, C> UserQuery for UserService<U, E, C>
where
    U: UserRepository,
    E: EnrollmentRepository,
    C: CourseRepository,
{
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, Error> {
        self.users
            .list(page)
            .await
            .map_err(Error::from)
    }

    async fn get(&self, id: Uuid) -> Result<User, Error> {
        self.find(id).await
    }

    async fn by_email(&self, email: String) -> Result<User, Error> {
        let address =
            EmailAddress::new(&email).map_err(|err| Error::invalid_request(err.to_string()))?;
        self.users
            .find_by_email(&address)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("no user with email {address}")))
    }

    async fn enrollments(&self, id: Uuid) -> Result<Vec<Enrollment>, Error> {
        self.find(id).await?;
        self.enrollments_of(EnrollmentFilter::for_user(id)).await
    }

    async fn courses_created(&self, id: Uuid) -> Result<Vec<Course>, Error> {
        self.find(id).await?;
        self.courses
            .list_by_instructor(id)
            .await
            .map_err(Error::from)
    }

    async fn progress(
        &self,
        id: Uuid,
        course_id: Option<Uuid>,
    ) -> Result<Vec<CourseProgressSummary>, Error> {
        self.find(id).await?;
        let enrollments = self
            .enrollments_of(EnrollmentFilter {
                course_id,
                ..EnrollmentFilter::for_user(id)
            })
            .await?;
        let mut summaries = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            summaries.push(self.summarise(enrollment).await?);
        }
        Ok(summaries)
    }

    async fn search(&self, query: String) -> Result<Vec<User>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_request("search query must not be empty"));
        }
        self.users
            .search(query, USER_SEARCH_LIMIT)
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
