//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{EmailAddress, PageRequest, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } as Unavailable => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } as Failed => "user repository query failed: {message}",
        /// Email or external id already belongs to another user.
        Duplicate { message: String } as Duplicate => "{message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError>;

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by identity-provider id.
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Page through users, newest first.
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, UserRepositoryError>;

    /// Case-insensitive search over names and email.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<User>, UserRepositoryError>;

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Overwrite mutable fields; returns `false` when the user is absent.
    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError>;

    /// Delete a user; returns `false` when the user is absent.
    async fn delete(&self, id: Uuid) -> Result<bool, UserRepositoryError>;
}
