//! Domain primitives and aggregates.
//!
//! Purpose: define the strongly typed aggregates the repositories load,
//! hand to caller transforms, and persist. Invariants live on each type;
//! storage-assigned data (ids, timestamps) is only constructible from
//! inside the crate.
//!
//! Public surface:
//! - User, Fanboy, Author, AuthorProfile: identities and the follower graph.
//! - Article, AuthoredArticle: articles and their joined read projection.
//! - CommentedArticle, Comment: comment threads.
//! - Email, Username, PasswordHash, Slug, CommentId, KeySet: validated keys.
//! - mutation: the load-transform-persist protocol.
//! - ports: repository traits and their error type.

pub mod article;
pub mod comment;
pub mod fanboy;
pub mod key_set;
pub mod mutation;
pub mod ports;
pub mod slug;
pub(crate) mod timestamps;
pub mod user;

pub use self::article::{Article, ArticleValidationError, AuthoredArticle};
pub use self::comment::{
    Comment, CommentDraft, CommentId, CommentValidationError, CommentedArticle,
};
pub use self::fanboy::Fanboy;
pub use self::key_set::KeySet;
pub use self::mutation::{MutationTarget, apply_mutation};
pub use self::slug::{Slug, SlugValidationError};
pub use self::user::{
    Author, AuthorProfile, Email, PasswordHash, USERNAME_MAX, User, UserValidationError, Username,
};
