//! User data model.
//!
//! A user is both the client currently signed in and, through the [`Author`]
//! capability, the attribution attached to articles and comments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by the user newtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyEmail,
    InvalidEmail,
    EmptyUsername,
    UsernameTooLong { max: usize },
    EmptyPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email is required for users"),
            Self::InvalidEmail => write!(f, "email must look like local@domain"),
            Self::EmptyUsername => write!(f, "username is required for users"),
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::EmptyPasswordHash => write!(f, "password is required to create a user"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Canonical email address; the primary identity of a user.
///
/// Input is trimmed and lowercased so lookups and follow sets agree on a
/// single spelling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = email.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }

        let mut parts = trimmed.split('@');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        );
        if !well_formed || trimmed.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }

        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 64;

/// Public handle of a user; a secondary identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Opaque password hash produced by the authentication layer.
///
/// The hashing scheme is chosen outside this crate; the value is stored and
/// returned verbatim and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a non-empty hash.
    pub fn new(hash: impl Into<String>) -> Result<Self, UserValidationError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        Ok(Self(hash))
    }

    /// Expose the stored hash for verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Read-only attribution capability.
///
/// Satisfied by [`User`] and by the joined [`AuthorProfile`] projection, so
/// code that only needs attribution never holds a mutable user.
pub trait Author {
    /// Email address identifying the author.
    fn email(&self) -> &Email;
    /// Optional blurb the author wrote about themselves.
    fn bio(&self) -> &str;
    /// Optional href to the author's profile picture.
    fn image(&self) -> &str;
}

/// Application user.
///
/// ## Invariants
/// - `email` and `username` are validated and globally unique in storage.
/// - `password` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    email: Email,
    username: Username,
    bio: String,
    image: String,
    password: PasswordHash,
}

impl User {
    /// Build a new [`User`] with an empty bio and image.
    pub fn new(email: Email, username: Username, password: PasswordHash) -> Self {
        Self {
            email,
            username,
            bio: String::new(),
            image: String::new(),
            password,
        }
    }

    /// Fallible constructor from raw strings.
    ///
    /// # Examples
    /// ```
    /// use conduit_backend::domain::User;
    ///
    /// let user = User::try_from_strings("Ada@Example.com", "ada", "hash").expect("valid user");
    /// assert_eq!(user.email().as_ref(), "ada@example.com");
    /// ```
    pub fn try_from_strings(
        email: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self::new(
            Email::new(email)?,
            Username::new(username)?,
            PasswordHash::new(password)?,
        ))
    }

    /// Set the bio while building a user.
    #[must_use]
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    /// Set the image while building a user.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Primary identity.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Display handle and secondary identity.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Optional self description.
    pub fn bio(&self) -> &str {
        self.bio.as_str()
    }

    /// Optional profile picture href.
    pub fn image(&self) -> &str {
        self.image.as_str()
    }

    /// Stored password hash.
    pub fn password(&self) -> &PasswordHash {
        &self.password
    }

    /// Change the primary identity.
    pub fn set_email(&mut self, email: Email) {
        self.email = email;
    }

    /// Change the display handle.
    pub fn set_username(&mut self, username: Username) {
        self.username = username;
    }

    /// Replace the bio.
    pub fn set_bio(&mut self, bio: impl Into<String>) {
        self.bio = bio.into();
    }

    /// Replace the image href.
    pub fn set_image(&mut self, image: impl Into<String>) {
        self.image = image.into();
    }

    /// Replace the password hash.
    pub fn set_password(&mut self, password: PasswordHash) {
        self.password = password;
    }

    /// Public projection used for attribution.
    pub fn profile(&self) -> AuthorProfile {
        AuthorProfile {
            email: self.email.clone(),
            username: self.username.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
        }
    }
}

impl Author for User {
    fn email(&self) -> &Email {
        &self.email
    }

    fn bio(&self) -> &str {
        self.bio.as_str()
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }
}

/// Author attribution joined onto articles and returned by author lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
    /// Author identity.
    pub email: Email,
    /// Display handle.
    pub username: Username,
    /// Optional self description.
    pub bio: String,
    /// Optional profile picture href.
    pub image: String,
}

impl Author for AuthorProfile {
    fn email(&self) -> &Email {
        &self.email
    }

    fn bio(&self) -> &str {
        self.bio.as_str()
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }
}

#[cfg(test)]
mod tests;
