//! Error kinds shared by every repository adapter.

use super::define_port_error;

define_port_error! {
    /// Failures reported by [`UserRepository`](super::UserRepository) and
    /// [`ArticleRepository`](super::ArticleRepository) adapters.
    ///
    /// Storage failures keep the database's own message so operators can
    /// see what went wrong; only the known unique constraints are mapped to
    /// the duplicate kinds.
    pub enum RepositoryError {
        /// No user matches the requested email or username.
        UserNotFound => "user not found",
        /// Another user already owns the email or username.
        DuplicateUser => "user has a duplicate username or email address",
        /// The author email on an article or comment does not resolve to a user.
        NoAuthor => "author not found",
        /// No article matches the requested slug.
        ArticleNotFound => "article not found",
        /// Another article already owns the slug.
        DuplicateArticle => "article has a duplicate slug",
        /// A connection could not be checked out or was lost.
        Connection { message: String } => "repository connection failed: {message}",
        /// Any other storage failure.
        Query { message: String } => "repository query failed: {message}",
    }
}

impl RepositoryError {
    /// Whether this is one of the not-found kinds.
    pub fn is_not_found(&self) -> bool {
        self.is_user_not_found() || self.is_article_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RepositoryError::user_not_found(), true)]
    #[case(RepositoryError::article_not_found(), true)]
    #[case(RepositoryError::no_author(), false)]
    #[case(RepositoryError::query("boom"), false)]
    fn not_found_covers_both_aggregates(#[case] err: RepositoryError, #[case] expected: bool) {
        assert_eq!(err.is_not_found(), expected);
    }

    #[rstest]
    fn storage_errors_keep_the_database_message() {
        let err = RepositoryError::query("relation \"articles\" does not exist");
        assert_eq!(
            err.to_string(),
            "repository query failed: relation \"articles\" does not exist"
        );
    }
}
