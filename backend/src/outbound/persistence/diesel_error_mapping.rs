//! Translation of pool and Diesel failures into [`RepositoryError`].
//!
//! Unique violations are recognised by constraint name so that only the
//! three natural-key constraints become duplicate kinds. Everything else
//! keeps the database's message.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

const USERS_EMAIL_KEY: &str = "users_email_key";
const USERS_USERNAME_KEY: &str = "users_username_key";
const ARTICLES_SLUG_KEY: &str = "articles_slug_key";
const ARTICLES_AUTHOR_FKEY: &str = "articles_author_id_fkey";
const COMMENTS_AUTHOR_FKEY: &str = "comments_author_id_fkey";

/// Map pool errors to repository connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> RepositoryError {
    RepositoryError::connection(error.message())
}

/// Map Diesel errors to repository errors, logging the raw failure.
pub(crate) fn map_diesel_error(error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            map_unique_violation(info.message(), info.constraint_name())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            map_foreign_key_violation(info.message(), info.constraint_name())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            RepositoryError::connection(info.message())
        }
        DieselError::DatabaseError(_, info) => RepositoryError::query(info.message()),
        DieselError::NotFound => RepositoryError::query("record not found"),
        other => RepositoryError::query(other.to_string()),
    }
}

fn map_unique_violation(message: &str, constraint_name: Option<&str>) -> RepositoryError {
    match constraint_name {
        Some(USERS_EMAIL_KEY | USERS_USERNAME_KEY) => RepositoryError::duplicate_user(),
        Some(ARTICLES_SLUG_KEY) => RepositoryError::duplicate_article(),
        _ => RepositoryError::query(message),
    }
}

fn map_foreign_key_violation(message: &str, constraint_name: Option<&str>) -> RepositoryError {
    match constraint_name {
        Some(ARTICLES_AUTHOR_FKEY | COMMENTS_AUTHOR_FKEY) => RepositoryError::no_author(),
        _ => {
            warn!(
                message,
                constraint_name = ?constraint_name,
                "unrecognised foreign key violation"
            );
            RepositoryError::query(message)
        }
    }
}

/// Error carried out of a Diesel transaction closure.
///
/// `transaction` needs an error type it can build from a Diesel error (for
/// `BEGIN`/`COMMIT` failures). `Abort` carries everything else, including
/// caller transform errors, which must reach the caller untouched.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    Diesel(DieselError),
    Abort(E),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(value: DieselError) -> Self {
        Self::Diesel(value)
    }
}

impl From<RepositoryError> for TxError<RepositoryError> {
    fn from(value: RepositoryError) -> Self {
        Self::Abort(value)
    }
}

impl<E> TxError<E>
where
    E: From<RepositoryError>,
{
    /// Collapse into the caller's error type.
    pub(crate) fn into_caller(self) -> E {
        match self {
            Self::Diesel(error) => E::from(map_diesel_error(error)),
            Self::Abort(error) => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(USERS_EMAIL_KEY), RepositoryError::DuplicateUser)]
    #[case(Some(USERS_USERNAME_KEY), RepositoryError::DuplicateUser)]
    #[case(Some(ARTICLES_SLUG_KEY), RepositoryError::DuplicateArticle)]
    #[case(Some("article_tags_pkey"), RepositoryError::query("dup"))]
    #[case(None, RepositoryError::query("dup"))]
    fn unique_violations_map_by_constraint(
        #[case] constraint: Option<&str>,
        #[case] expected: RepositoryError,
    ) {
        assert_eq!(map_unique_violation("dup", constraint), expected);
    }

    #[rstest]
    #[case(Some(ARTICLES_AUTHOR_FKEY), RepositoryError::NoAuthor)]
    #[case(Some(COMMENTS_AUTHOR_FKEY), RepositoryError::NoAuthor)]
    #[case(Some("comments_article_id_fkey"), RepositoryError::query("fk"))]
    fn author_foreign_keys_map_to_no_author(
        #[case] constraint: Option<&str>,
        #[case] expected: RepositoryError,
    ) {
        assert_eq!(map_foreign_key_violation("fk", constraint), expected);
    }

    #[rstest]
    fn not_found_becomes_a_query_error() {
        assert_eq!(
            map_diesel_error(DieselError::NotFound),
            RepositoryError::query("record not found")
        );
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        assert_eq!(
            map_pool_error(PoolError::checkout("timed out")),
            RepositoryError::connection("timed out")
        );
    }

    #[rstest]
    fn aborts_pass_through_and_diesel_errors_are_mapped() {
        let abort: TxError<RepositoryError> = TxError::Abort(RepositoryError::NoAuthor);
        assert_eq!(abort.into_caller(), RepositoryError::NoAuthor);

        let diesel: TxError<RepositoryError> = TxError::from(DieselError::NotFound);
        assert_eq!(
            diesel.into_caller(),
            RepositoryError::query("record not found")
        );
    }
}
