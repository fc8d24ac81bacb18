//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{EmailAddress, PageRequest, User};

use super::diesel_error_mapping::{
    DbFailure, classify_diesel_error, collect_rows, contains_pattern, limit_for_db,
};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::row_mapping::{row_to_user, user_record};
use super::schema::users;

/// Diesel-backed user store. Deleting a user cascades to their enrollments
/// through foreign keys.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        query: users::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = query
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user)
            .transpose()
            .map_err(UserRepositoryError::query)
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    match classify_diesel_error(error) {
        DbFailure::Connection(message) => UserRepositoryError::connection(message),
        DbFailure::Duplicate(constraint) if constraint.contains("email") => {
            UserRepositoryError::duplicate("email address is already registered")
        }
        DbFailure::Duplicate(constraint) if constraint.contains("external_id") => {
            UserRepositoryError::duplicate("identity is already linked to a user")
        }
        DbFailure::Duplicate(constraint) => UserRepositoryError::duplicate(constraint),
        DbFailure::Query(message) => UserRepositoryError::query(message),
    }
}

fn newest_first(
    query: users::BoxedQuery<'_, diesel::pg::Pg>,
) -> users::BoxedQuery<'_, diesel::pg::Pg> {
    query.order((users::created_at.desc(), users::id.desc()))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        self.find_one(users::table.filter(users::id.eq(id)).into_boxed())
            .await
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        self.find_one(
            users::table
                .filter(users::email.eq(email.as_str().to_owned()))
                .into_boxed(),
        )
        .await
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        self.find_one(
            users::table
                .filter(users::external_id.eq(external_id.to_owned()))
                .into_boxed(),
        )
        .await
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = newest_first(users::table.into_boxed())
            .offset(i64::from(page.skip()))
            .limit(i64::from(page.take()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_user), UserRepositoryError::query)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pattern = contains_pattern(query);
        let rows: Vec<UserRow> = newest_first(
            users::table
                .filter(
                    users::first_name
                        .ilike(pattern.clone())
                        .or(users::last_name.ilike(pattern.clone()))
                        .or(users::email.ilike(pattern).nullable()),
                )
                .into_boxed(),
        )
        .limit(limit_for_db(limit))
        .select(UserRow::as_select())
        .load(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_user), UserRepositoryError::query)
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&user_record(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.filter(users::id.eq(user.id)))
            .set(&user_record(user))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.filter(users::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
