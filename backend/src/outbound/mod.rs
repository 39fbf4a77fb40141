//! Outbound adapters implementing the repository ports.
//!
//! - **persistence**: PostgreSQL-backed repository using Diesel ORM.
//! - **memory**: process-local repository with identical semantics, used
//!   where a database is not available.
//!
//! Adapters translate between domain aggregates and storage representations.
//! Aggregate rules live in `domain`.

pub mod memory;
pub mod persistence;
