//! PostgreSQL-backed repository shared by the user and article adapters.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use super::pool::DbPool;

/// Diesel implementation of [`UserRepository`](crate::domain::ports::UserRepository)
/// and [`ArticleRepository`](crate::domain::ports::ArticleRepository).
///
/// Every operation checks out one pooled connection; operations that write
/// or read more than one table run in a single transaction. Timestamps come
/// from the injected clock.
#[derive(Clone)]
pub struct DieselRepository {
    pub(super) pool: DbPool,
    pub(super) clock: Arc<dyn Clock>,
}

impl DieselRepository {
    /// Create a repository over `pool` using the system clock.
    pub fn new(pool: DbPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }

    /// Create a repository over `pool` stamping rows with `clock`.
    pub fn with_clock(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}
