//! Port for user and follower-graph persistence.

use async_trait::async_trait;

use crate::domain::{AuthorProfile, Email, Fanboy, User, Username};

use super::RepositoryError;

/// Reads and read-transform-write updates of users.
///
/// `update_*` operations load the user inside a transaction, pass it to
/// `transform`, and persist the result against the row addressed by the
/// original key. A transform error aborts the transaction and is returned
/// unchanged; repository failures reach the caller through
/// `E: From<RepositoryError>`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and its credential atomically.
    ///
    /// Fails with [`RepositoryError::DuplicateUser`] when the email or the
    /// username is taken; neither row is written in that case.
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError>;

    /// Load a user with the emails they follow and the slugs they favorited.
    async fn get_user_by_email(&self, email: &Email) -> Result<Fanboy, RepositoryError>;

    /// Attribution lookup. Storage failures are logged and reported as `None`.
    async fn get_author_by_email(&self, email: &Email) -> Option<AuthorProfile>;

    /// Load a user by username.
    async fn get_user_by_username(&self, username: &Username) -> Result<User, RepositoryError>;

    /// Rewrite the user and credential rows through `transform`.
    ///
    /// Returns the user as re-read under its new email.
    async fn update_user_by_email<F, E>(&self, email: &Email, transform: F) -> Result<User, E>
    where
        F: FnOnce(User) -> Result<User, E> + Send,
        E: From<RepositoryError> + Send;

    /// Replace the follow and favorite edges with the transformed sets.
    ///
    /// The user row itself is never rewritten. Emails and slugs that do not
    /// resolve are dropped.
    async fn update_fanboy_by_email<F, E>(&self, email: &Email, transform: F) -> Result<(), E>
    where
        F: FnOnce(Fanboy) -> Result<Fanboy, E> + Send,
        E: From<RepositoryError> + Send;
}
