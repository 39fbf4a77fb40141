//! Article slugs.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, and hyphens. They are derived from article titles and act
//! as the natural key of an article.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors raised while building a [`Slug`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugValidationError {
    /// The slug, or the title it was derived from, produced no characters.
    #[error("slug must not be empty")]
    Empty,
    /// The slug contains characters outside `[a-z0-9-]` or surrounding whitespace.
    #[error("slug may only contain lowercase letters, digits, and hyphens")]
    InvalidCharacters,
}

/// Unique, URL-safe article identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate an existing slug, e.g. one taken from a request path.
    pub fn new(value: impl Into<String>) -> Result<Self, SlugValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SlugValidationError::Empty);
        }
        if !is_valid_slug(&value) {
            return Err(SlugValidationError::InvalidCharacters);
        }
        Ok(Self(value))
    }

    /// Derive the slug for an article title.
    ///
    /// # Examples
    /// ```
    /// use conduit_backend::domain::Slug;
    ///
    /// let slug = Slug::from_title("Hospitable  Title!").expect("title has letters");
    /// assert_eq!(slug.as_ref(), "hospitable-title");
    /// ```
    pub fn from_title(title: &str) -> Result<Self, SlugValidationError> {
        let slug = title
            .split_whitespace()
            .map(|word| {
                word.chars()
                    .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
                    .map(|ch| ch.to_ascii_lowercase())
                    .collect::<String>()
            })
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        Self::new(slug)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Return `true` when `value` is a valid slug.
pub(crate) fn is_valid_slug(value: &str) -> bool {
    is_trimmed_non_empty(value) && has_allowed_slug_chars(value)
}

fn is_trimmed_non_empty(value: &str) -> bool {
    !value.is_empty() && value.trim() == value
}

fn has_allowed_slug_chars(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hospitable title", "hospitable-title")]
    #[case("  Silent   Title ", "silent-title")]
    #[case("C'est la vie", "cest-la-vie")]
    #[case("pre-existing-hyphens ok", "pre-existing-hyphens-ok")]
    fn titles_normalise_to_slugs(#[case] title: &str, #[case] expected: &str) {
        let slug = Slug::from_title(title).expect("title produces a slug");
        assert_eq!(slug.as_ref(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("!!! ???")]
    fn titles_without_slug_characters_are_rejected(#[case] title: &str) {
        assert_eq!(Slug::from_title(title), Err(SlugValidationError::Empty));
    }

    #[rstest]
    #[case("Upper")]
    #[case(" padded")]
    #[case("under_score")]
    fn raw_slugs_must_be_lowercase_ascii(#[case] raw: &str) {
        assert_eq!(Slug::new(raw), Err(SlugValidationError::InvalidCharacters));
    }
}
