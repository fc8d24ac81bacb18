use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{EmailAddress, PageRequest, User};

use super::{MemoryStore, State, newest_first};

fn ensure_unique(state: &State, user: &User) -> Result<(), UserRepositoryError> {
    for other in state.users.values().filter(|other| other.id != user.id) {
        if other.email == user.email {
            return Err(UserRepositoryError::duplicate(format!(
                "email {} is already registered",
                user.email
            )));
        }
        if other.external_id == user.external_id {
            return Err(UserRepositoryError::duplicate(format!(
                "external id {} is already linked",
                user.external_id
            )));
        }
    }
    Ok(())
}

fn by_creation(user: &User) -> (DateTime<Utc>, Uuid) {
    (user.created_at, user.id)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|user| user.email == *email).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|user| user.external_id == external_id)
            .cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        newest_first(&mut users, by_creation);
        Ok(page.apply(users))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| user.matches(query))
            .cloned()
            .collect();
        newest_first(&mut users, by_creation);
        users.truncate(limit);
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Err(UserRepositoryError::duplicate(format!("user {}", user.id)));
        }
        ensure_unique(&state, user)?;
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Ok(false);
        }
        ensure_unique(&state, user)?;
        state.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, UserRepositoryError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.purge_enrollments_where(|enrollment| enrollment.user_id() == id);
        Ok(true)
    }
}
