//! Driving port for read-only reporting.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::analytics::{
    CourseAnalytics, Dashboard, PopularCourse, RevenueReport, UserAnalytics,
};
use crate::domain::{Error, RevenuePeriod};

/// Upper bound on the popular-courses limit.
pub const POPULAR_MAX_LIMIT: usize = 100;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsQuery: Send + Sync {
    async fn dashboard(&self) -> Result<Dashboard, Error>;

    async fn course(&self, course_id: Uuid) -> Result<CourseAnalytics, Error>;

    async fn user(&self, user_id: Uuid) -> Result<UserAnalytics, Error>;

    async fn popular_courses(&self, limit: Option<usize>) -> Result<Vec<PopularCourse>, Error>;

    async fn revenue(&self, period: RevenuePeriod) -> Result<RevenueReport, Error>;
}
