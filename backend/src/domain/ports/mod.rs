//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Adapters in `outbound` implement these traits; application code depends
//! only on the traits, so the PostgreSQL and in-memory adapters are
//! interchangeable.

mod macros;
pub(crate) use macros::define_port_error;

mod article_repository;
mod repository_error;
mod user_repository;

pub use article_repository::{ArticleRepository, DEFAULT_LIST_LIMIT, ListCriteria};
pub use repository_error::RepositoryError;
pub use user_repository::UserRepository;

/// Every repository operation behind one bound.
pub trait Repository: UserRepository + ArticleRepository {}

impl<T> Repository for T where T: UserRepository + ArticleRepository + ?Sized {}
