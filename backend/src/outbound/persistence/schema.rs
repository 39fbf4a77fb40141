//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. They drive
//! Diesel's compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When a migration changes the schema, regenerate this file with
//! `diesel print-schema` against a migrated database or update it by hand.

diesel::table! {
    /// Registered users.
    ///
    /// `email` and `username` are each unique (`users_email_key`,
    /// `users_username_key`).
    users (id) {
        /// Surrogate key.
        id -> Int8,
        /// Lowercase primary identity.
        email -> Text,
        /// Display handle.
        username -> Text,
        /// Free-form self description; empty when unset.
        bio -> Text,
        /// Profile picture href; empty when unset.
        image -> Text,
    }
}

diesel::table! {
    /// Opaque password hashes, one per user.
    user_passwords (id) {
        /// Same value as `users.id`.
        id -> Int8,
        /// Hash produced by the authentication layer.
        hash -> Text,
    }
}

diesel::table! {
    /// Directed follow edges.
    followed_users (follower_id, followed_id) {
        /// User doing the following.
        follower_id -> Int8,
        /// User being followed.
        followed_id -> Int8,
    }
}

diesel::table! {
    /// Published articles. `slug` is unique (`articles_slug_key`).
    articles (id) {
        id -> Int8,
        slug -> Text,
        title -> Text,
        description -> Text,
        body -> Text,
        author_id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tag set of each article.
    article_tags (article_id, tag) {
        article_id -> Int8,
        tag -> Text,
    }
}

diesel::table! {
    /// Favorite edges between users and articles.
    favorited_articles (user_id, article_id) {
        user_id -> Int8,
        article_id -> Int8,
    }
}

diesel::table! {
    /// Article comments; `id` order is insertion order.
    comments (id) {
        id -> Int8,
        article_id -> Int8,
        author_id -> Int8,
        body -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(user_passwords -> users (id));
diesel::joinable!(articles -> users (author_id));
diesel::joinable!(article_tags -> articles (article_id));
diesel::joinable!(favorited_articles -> articles (article_id));
diesel::joinable!(comments -> articles (article_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_passwords,
    followed_users,
    articles,
    article_tags,
    favorited_articles,
    comments,
);
