//! Persistence layer for the Conduit social publishing backend.
//!
//! `domain` holds the aggregates and the repository ports; `outbound`
//! provides the PostgreSQL and in-memory adapters; `config` resolves the
//! database settings.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
