//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Implements the domain repository ports against PostgreSQL through
//! `diesel-async` with `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapter**: the repository translates between Diesel rows and
//!   domain aggregates; aggregate rules stay in `domain`.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **One transaction per operation**: every read-transform-write runs
//!   inside a single transaction on one pooled connection.
//! - **Strongly typed errors**: Diesel failures become
//!   [`RepositoryError`](crate::domain::ports::RepositoryError) kinds.
//!
//! # Example
//!
//! ```no_run
//! use conduit_backend::outbound::persistence::{DbPool, DieselRepository, PoolConfig};
//!
//! # async fn connect() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/conduit")).await?;
//! let repository = DieselRepository::new(pool);
//! # let _ = repository;
//! # Ok(())
//! # }
//! ```

mod article_listing;
mod diesel_article_repository;
mod diesel_error_mapping;
mod diesel_helpers;
mod diesel_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_repository::DieselRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
