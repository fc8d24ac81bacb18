//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process store implementing the same repository ports
//! - **payments**: deterministic local payment gateway
//! - **pdf**: single-page certificate renderer
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod memory;
pub mod payments;
pub mod pdf;
pub mod persistence;
