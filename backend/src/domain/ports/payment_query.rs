//! Driving port for payment reads.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, Payment, PaymentStats};

use super::PaymentFilter;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentQuery: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Payment, Error>;

    async fn by_session(&self, session_id: String) -> Result<Payment, Error>;

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Payment>, Error>;

    async fn for_course(&self, course_id: Uuid) -> Result<Vec<Payment>, Error>;

    async fn stats(&self, filter: PaymentFilter) -> Result<PaymentStats, Error>;
}
