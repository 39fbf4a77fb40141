//! Article aggregate and its authored projection.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AuthorProfile, Email, Slug, SlugValidationError};

/// Validation errors raised while building or editing an [`Article`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArticleValidationError {
    /// The title is blank.
    #[error("article title must not be empty")]
    EmptyTitle,
    /// The title cannot be turned into a slug.
    #[error("article title does not produce a slug: {0}")]
    Slug(#[from] SlugValidationError),
}

/// A published article.
///
/// ## Invariants
/// - `slug` is always derived from the current `title`.
/// - `tags` are trimmed, non-empty, and unique; their order carries no meaning.
/// - `created_at` and `updated_at` are assigned by the repository; an article
///   that has never been stored carries the Unix epoch in both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    slug: Slug,
    title: String,
    description: String,
    body: String,
    #[serde(rename = "tagList")]
    tags: BTreeSet<String>,
    author_email: Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Article {
    /// Build an unsaved article, deriving its slug from `title`.
    pub fn new<I, T>(
        title: impl Into<String>,
        description: impl Into<String>,
        body: impl Into<String>,
        author_email: Email,
        tags: I,
    ) -> Result<Self, ArticleValidationError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let title = title.into();
        let slug = slug_for_title(&title)?;
        Ok(Self {
            slug,
            title,
            description: description.into(),
            body: body.into(),
            tags: normalise_tags(tags),
            author_email,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        })
    }

    /// Rebuild a stored article from persisted columns.
    #[expect(clippy::too_many_arguments, reason = "mirrors the articles row")]
    pub(crate) fn restore(
        slug: Slug,
        title: String,
        description: String,
        body: String,
        tags: BTreeSet<String>,
        author_email: Email,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            slug,
            title,
            description,
            body,
            tags,
            author_email,
            created_at,
            updated_at,
        }
    }

    /// Copy of this article carrying storage-assigned timestamps.
    pub(crate) fn with_timestamps(
        mut self,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Natural key.
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    /// Human readable title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Short summary.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Markdown body.
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Tag set in ascending order.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Email of the authoring user.
    pub fn author_email(&self) -> &Email {
        &self.author_email
    }

    /// Creation time (UTC).
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification time (UTC).
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Change the title and re-derive the slug.
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ArticleValidationError> {
        let title = title.into();
        self.slug = slug_for_title(&title)?;
        self.title = title;
        Ok(())
    }

    /// Replace the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Replace the whole tag set.
    pub fn set_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.tags = normalise_tags(tags);
    }

    /// Reassign the article to another author.
    pub fn set_author_email(&mut self, author_email: Email) {
        self.author_email = author_email;
    }
}

fn slug_for_title(title: &str) -> Result<Slug, ArticleValidationError> {
    if title.trim().is_empty() {
        return Err(ArticleValidationError::EmptyTitle);
    }
    Ok(Slug::from_title(title)?)
}

fn normalise_tags<I, T>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Article joined with its author and favorite count, as returned by reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoredArticle {
    /// The article itself.
    #[serde(flatten)]
    pub article: Article,
    /// Resolved author attribution.
    pub author: AuthorProfile,
    /// Number of users who favorited the article.
    #[serde(rename = "favoritesCount")]
    pub favorite_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn article() -> Article {
        Article::new(
            "Hospitable Title",
            "hospitable description",
            "hospitable body",
            Email::new("author@hospitable.com").expect("valid email"),
            ["hospitable one", "hospitable two", " hospitable one ", ""],
        )
        .expect("valid article")
    }

    #[rstest]
    fn slug_follows_the_title(mut article: Article) {
        assert_eq!(article.slug().as_ref(), "hospitable-title");

        article.set_title("Silent Title").expect("valid title");
        assert_eq!(article.slug().as_ref(), "silent-title");
        assert_eq!(article.title(), "Silent Title");
    }

    #[rstest]
    fn tags_are_a_trimmed_set(article: Article) {
        let tags: Vec<_> = article.tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["hospitable one", "hospitable two"]);
    }

    #[rstest]
    fn blank_titles_are_rejected(mut article: Article) {
        assert_eq!(
            article.set_title("   "),
            Err(ArticleValidationError::EmptyTitle)
        );
        assert_eq!(
            article.set_title("???"),
            Err(ArticleValidationError::Slug(SlugValidationError::Empty))
        );
        assert_eq!(article.slug().as_ref(), "hospitable-title");
    }

    #[rstest]
    fn unsaved_articles_carry_epoch_timestamps(article: Article) {
        assert_eq!(article.created_at(), DateTime::<Utc>::default());
        assert_eq!(article.created_at(), article.updated_at());
    }
}
