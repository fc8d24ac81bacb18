//! Driving port for user directory changes and identity-provider sync.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, IdentityProfile, User, UserUpdate};

use super::WebhookAck;

/// Verified identity-provider event, already reduced to what the directory
/// needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// `user.created` or `user.updated`.
    Upsert {
        event_type: String,
        profile: IdentityProfile,
    },
    /// `user.deleted`.
    Deleted { external_id: String },
    Unrecognised { event_type: String },
}

impl IdentityEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::Upsert { event_type, .. } | Self::Unrecognised { event_type } => event_type,
            Self::Deleted { .. } => "user.deleted",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserCommand: Send + Sync {
    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, Error>;

    /// Delete a user without ACTIVE enrollments.
    async fn remove(&self, id: Uuid) -> Result<(), Error>;

    /// Apply an identity-provider event. Deleting an absent user succeeds.
    async fn sync_identity(&self, event: IdentityEvent) -> Result<WebhookAck, Error>;
}
