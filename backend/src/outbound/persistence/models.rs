//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{
    article_tags, articles, comments, favorited_articles, followed_users, user_passwords, users,
};

// ---------------------------------------------------------------------------
// User models
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub bio: String,
    pub image: String,
}

/// Insertable and changeset struct for the mutable user columns.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserValues<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub bio: &'a str,
    pub image: &'a str,
}

/// Insertable struct for a user's credential.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_passwords)]
pub(crate) struct NewPasswordRow<'a> {
    pub id: i64,
    pub hash: &'a str,
}

/// Insertable struct for a follow edge.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = followed_users)]
pub(crate) struct NewFollowRow {
    pub follower_id: i64,
    pub followed_id: i64,
}

// ---------------------------------------------------------------------------
// Article models
// ---------------------------------------------------------------------------

/// Row struct for reading from the articles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = articles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ArticleRow {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating article records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = articles)]
pub(crate) struct NewArticleRow<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub body: &'a str,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for rewriting an article; `created_at` is never touched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = articles)]
pub(crate) struct ArticleUpdate<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub body: &'a str,
    pub author_id: i64,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for one tag of an article.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = article_tags)]
pub(crate) struct NewArticleTagRow<'a> {
    pub article_id: i64,
    pub tag: &'a str,
}

/// Insertable struct for a favorite edge.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = favorited_articles)]
pub(crate) struct NewFavoriteRow {
    pub user_id: i64,
    pub article_id: i64,
}

// ---------------------------------------------------------------------------
// Comment models
// ---------------------------------------------------------------------------

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating comment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub article_id: i64,
    pub author_id: i64,
    pub body: &'a str,
    pub created_at: DateTime<Utc>,
}
