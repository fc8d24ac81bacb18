//! Reporting service: loads a snapshot and hands it to the pure report builders.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::analytics::{
    self, CourseAnalytics, Dashboard, PopularCourse, RevenueReport, UserAnalytics,
};
use crate::domain::ports::{
    AnalyticsQuery, AnalyticsRepository, POPULAR_DEFAULT_LIMIT, POPULAR_MAX_LIMIT,
};
use crate::domain::{AnalyticsSnapshot, Error, RevenuePeriod};

#[derive(Clone)]
pub struct AnalyticsService<A> {
    repo: Arc<A>,
    clock: Arc<dyn Clock>,
}

impl<A> AnalyticsService<A> {
    pub fn new(repo: Arc<A>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<A> AnalyticsService<A>
where
    A: AnalyticsRepository,
{
    async fn snapshot(&self) -> Result<AnalyticsSnapshot, Error> {
        let snapshot = self
            .repo
            .load_snapshot()
            .await
            .map_err(Error::from)?;
        debug!(
            users = snapshot.users.len(),
            courses = snapshot.courses.len(),
            enrollments = snapshot.enrollments.len(),
            payments = snapshot.payments.len(),
            "analytics snapshot loaded"
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl<A> AnalyticsQuery for AnalyticsService<A>
where
    A: AnalyticsRepository,
{
    async fn dashboard(&self) -> Result<Dashboard, Error> {
        let snapshot = self.snapshot().await?;
        Ok(analytics::dashboard(&snapshot, self.clock.utc()))
    }

    async fn course(&self, course_id: Uuid) -> Result<CourseAnalytics, Error> {
        let snapshot = self.snapshot().await?;
        analytics::course_analytics(&snapshot, course_id)
            .ok_or_else(|| Error::not_found(format!("course {course_id} not found")))
    }

    async fn user(&self, user_id: Uuid) -> Result<UserAnalytics, Error> {
        let snapshot = self.snapshot().await?;
        analytics::user_analytics(&snapshot, user_id)
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }

    async fn popular_courses(&self, limit: Option<usize>) -> Result<Vec<PopularCourse>, Error> {
        let limit = limit
            .unwrap_or(POPULAR_DEFAULT_LIMIT)
            .clamp(1, POPULAR_MAX_LIMIT);
        let snapshot = self.snapshot().await?;
        Ok(analytics::popular_courses(&snapshot, limit))
    }

    async fn revenue(&self, period: RevenuePeriod) -> Result<RevenueReport, Error> {
        let snapshot = self.snapshot().await?;
        Ok(analytics::revenue_report(&snapshot, period, self.clock.utc()))
    }
}

#[cfg(test)]
#[path = "analytics_service_tests.rs"]
mod tests;
