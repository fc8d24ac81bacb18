//! Port loading the read model behind analytics reports.

use async_trait::async_trait;

use crate::domain::AnalyticsSnapshot;

use super::define_port_error;

define_port_error! {
    /// Errors raised while loading analytics data.
    pub enum AnalyticsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } as Unavailable => "analytics repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } as Failed => "analytics repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Load every entity the reports read.
    async fn load_snapshot(&self) -> Result<AnalyticsSnapshot, AnalyticsRepositoryError>;
}
