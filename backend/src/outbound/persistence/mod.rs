//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories implement the domain's driven ports on top of `diesel-async`
//! connections pooled by `bb8`. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay private; `row_mapping.rs` converts between
//! them and domain entities, and every database failure is translated into the
//! port's own error enum.
//!
//! Multi-step operations (lesson completion, reconciliation, refunds,
//! certificate issuance) run inside one `AsyncConnection::transaction` and
//! lock the rows they change with `SELECT ... FOR UPDATE`.
//!
//! # Example
//!
//! ```ignore
//! use academy_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/academy")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_analytics_repository;
mod diesel_certificate_repository;
mod diesel_course_repository;
mod diesel_enrollment_repository;
pub(crate) mod diesel_error_mapping;
mod diesel_payment_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod row_mapping;
mod schema;

pub use diesel_analytics_repository::DieselAnalyticsRepository;
pub use diesel_certificate_repository::DieselCertificateRepository;
pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_enrollment_repository::DieselEnrollmentRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
