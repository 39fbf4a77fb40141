//! Port for articles, their comments, and the listing queries.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{Article, AuthoredArticle, Comment, CommentedArticle, Email, Slug};

use super::RepositoryError;

/// Page size used when a caller does not choose one.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Filters and paging for [`ArticleRepository::latest_articles_by_criteria`].
///
/// All filters combine with AND. Results are ordered newest first by
/// creation time, ties broken by slug ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCriteria {
    /// Exact tag match.
    pub tag: Option<String>,
    /// Restrict to these authors; empty means any author.
    pub author_emails: Vec<Email>,
    /// Restrict to articles favorited by this user. An unknown user yields
    /// an empty page.
    pub favorited_by: Option<Email>,
    /// Maximum number of articles returned.
    pub limit: u32,
    /// Number of matching articles skipped.
    pub offset: u32,
}

impl Default for ListCriteria {
    fn default() -> Self {
        Self {
            tag: None,
            author_emails: Vec::new(),
            favorited_by: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListCriteria {
    /// Only list articles carrying `tag`.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Only list articles written by one of `emails`.
    pub fn authored_by(mut self, emails: impl IntoIterator<Item = Email>) -> Self {
        self.author_emails = emails.into_iter().collect();
        self
    }

    /// Only list articles favorited by `email`.
    pub fn favorited_by(mut self, email: Email) -> Self {
        self.favorited_by = Some(email);
        self
    }

    /// Select the page starting at `offset` holding at most `limit` articles.
    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Reads and read-transform-write updates of articles and comments.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Store a new article stamped with the current time.
    ///
    /// Fails with [`RepositoryError::NoAuthor`] for an unknown author and
    /// [`RepositoryError::DuplicateArticle`] when the slug is taken.
    async fn create_article(&self, article: &Article) -> Result<AuthoredArticle, RepositoryError>;

    /// One page of articles matching `criteria`.
    async fn latest_articles_by_criteria(
        &self,
        criteria: &ListCriteria,
    ) -> Result<Vec<AuthoredArticle>, RepositoryError>;

    /// Load an article with its author and favorite count.
    async fn get_article_by_slug(&self, slug: &Slug) -> Result<AuthoredArticle, RepositoryError>;

    /// Load an article with its comment thread.
    async fn get_comments_by_slug(&self, slug: &Slug) -> Result<CommentedArticle, RepositoryError>;

    /// Rewrite an article through `transform`.
    ///
    /// The slug follows the title and may change; `updated_at` strictly
    /// advances and `created_at` is kept.
    async fn update_article_by_slug<F, E>(
        &self,
        slug: &Slug,
        transform: F,
    ) -> Result<AuthoredArticle, E>
    where
        F: FnOnce(Article) -> Result<Article, E> + Send,
        E: From<RepositoryError> + Send;

    /// Insert queued comments and delete removed ones through `transform`.
    ///
    /// Returns the last inserted comment, else the last removed one, else
    /// `None` when nothing changed.
    async fn update_comments_by_slug<F, E>(
        &self,
        slug: &Slug,
        transform: F,
    ) -> Result<Option<Comment>, E>
    where
        F: FnOnce(CommentedArticle) -> Result<CommentedArticle, E> + Send,
        E: From<RepositoryError> + Send;

    /// Delete `article` with its tags, favorites, and comments.
    ///
    /// `None` and already-deleted articles succeed without effect.
    async fn delete_article(&self, article: Option<&Article>) -> Result<(), RepositoryError>;

    /// Every tag used by any article.
    async fn distinct_tags(&self) -> Result<BTreeSet<String>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_to_the_first_page_of_twenty() {
        let criteria = ListCriteria::default();
        assert_eq!(criteria.limit, DEFAULT_LIST_LIMIT);
        assert_eq!(criteria.offset, 0);
        assert!(criteria.tag.is_none());
        assert!(criteria.author_emails.is_empty());
        assert!(criteria.favorited_by.is_none());
    }

    #[rstest]
    fn builders_combine_filters() {
        let frail = Email::new("author@frail.com").expect("valid email");
        let criteria = ListCriteria::default()
            .tagged("kind one")
            .authored_by([frail.clone()])
            .favorited_by(frail.clone())
            .page(5, 2);

        assert_eq!(criteria.tag.as_deref(), Some("kind one"));
        assert_eq!(criteria.author_emails, vec![frail.clone()]);
        assert_eq!(criteria.favorited_by, Some(frail));
        assert_eq!((criteria.limit, criteria.offset), (5, 2));
    }
}
