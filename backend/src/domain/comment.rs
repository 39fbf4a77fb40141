//! Comments and the commented-article aggregate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Article, Email};

/// Validation errors raised by [`CommentedArticle::add_comment`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentValidationError {
    /// The comment body is blank.
    #[error("comment body must not be empty")]
    EmptyBody,
}

/// Storage-assigned comment identifier. Monotonic and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentId(i64);

impl CommentId {
    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    id: CommentId,
    body: String,
    author_email: Email,
    created_at: DateTime<Utc>,
}

impl Comment {
    pub(crate) fn restore(
        id: CommentId,
        body: String,
        author_email: Email,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            body,
            author_email,
            created_at,
        }
    }

    /// Storage identifier.
    pub fn id(&self) -> CommentId {
        self.id
    }

    /// Comment text.
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Email of the commenting user.
    pub fn author_email(&self) -> &Email {
        &self.author_email
    }

    /// Creation time (UTC).
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A comment queued by [`CommentedArticle::add_comment`] awaiting storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    body: String,
    author_email: Email,
}

impl CommentDraft {
    /// Comment text.
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Email of the commenting user.
    pub fn author_email(&self) -> &Email {
        &self.author_email
    }
}

/// An article with its ordered comment thread.
///
/// Stored comments keep insertion (id) order. New comments are queued as
/// drafts and receive their id and timestamp when the repository persists
/// the aggregate; stored comments missing from the list at that point are
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentedArticle {
    /// The commented article.
    pub article: Article,
    comments: Vec<Comment>,
    pending: Vec<CommentDraft>,
}

impl CommentedArticle {
    pub(crate) fn new(article: Article, comments: Vec<Comment>) -> Self {
        Self {
            article,
            comments,
            pending: Vec::new(),
        }
    }

    /// Stored comments in insertion order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Drafts waiting to be persisted, in the order they were added.
    pub fn pending_comments(&self) -> &[CommentDraft] {
        &self.pending
    }

    /// Queue a new comment by `author_email`.
    ///
    /// The author's existence is checked when the aggregate is persisted.
    pub fn add_comment(
        &mut self,
        body: impl Into<String>,
        author_email: Email,
    ) -> Result<(), CommentValidationError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(CommentValidationError::EmptyBody);
        }
        self.pending.push(CommentDraft { body, author_email });
        Ok(())
    }

    /// Remove the stored comment with `id`. Absent ids are ignored.
    pub fn remove_comment(&mut self, id: CommentId) {
        self.comments.retain(|comment| comment.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn email(raw: &str) -> Email {
        Email::new(raw).expect("valid email")
    }

    #[fixture]
    fn commented() -> CommentedArticle {
        let article = Article::new(
            "Tedious Title",
            "tedious description",
            "tedious body",
            email("author@envious.com"),
            ["tedious one"],
        )
        .expect("valid article");
        let stored = vec![
            Comment::restore(
                CommentId::new(1),
                "first".to_owned(),
                email("user@simplistic.com"),
                DateTime::<Utc>::default(),
            ),
            Comment::restore(
                CommentId::new(2),
                "second".to_owned(),
                email("user@simplistic.com"),
                DateTime::<Utc>::default(),
            ),
        ];
        CommentedArticle::new(article, stored)
    }

    #[rstest]
    fn add_comment_queues_a_draft(mut commented: CommentedArticle) {
        commented
            .add_comment("enchanting body", email("user@simplistic.com"))
            .expect("valid comment");

        assert_eq!(commented.comments().len(), 2);
        let drafts = commented.pending_comments();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].body(), "enchanting body");
    }

    #[rstest]
    fn blank_comments_are_rejected(mut commented: CommentedArticle) {
        assert_eq!(
            commented.add_comment("  ", email("user@simplistic.com")),
            Err(CommentValidationError::EmptyBody)
        );
        assert!(commented.pending_comments().is_empty());
    }

    #[rstest]
    fn remove_comment_is_idempotent(mut commented: CommentedArticle) {
        commented.remove_comment(CommentId::new(1));
        commented.remove_comment(CommentId::new(1));
        commented.remove_comment(CommentId::new(99));

        let ids: Vec<_> = commented.comments().iter().map(Comment::id).collect();
        assert_eq!(ids, vec![CommentId::new(2)]);
    }
}
