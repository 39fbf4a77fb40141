//! Shared queries and row conversions for the Diesel repository.
//!
//! Every helper takes an explicit connection so callers decide whether it
//! runs inside a transaction. Diesel failures are mapped to
//! [`RepositoryError`] here; callers only deal with domain kinds.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Article, AuthorProfile, AuthoredArticle, Comment, CommentId, Email, Fanboy, PasswordHash,
    Slug, User, Username,
};

use super::diesel_error_mapping::map_diesel_error;
use super::models::{ArticleRow, CommentRow, NewArticleTagRow, UserRow};
use super::schema::{
    article_tags, articles, comments, favorited_articles, followed_users, user_passwords, users,
};

fn corrupt_row(field: &str, error: impl fmt::Display) -> RepositoryError {
    RepositoryError::query(format!("stored {field} is invalid: {error}"))
}

fn stored_email(raw: String) -> Result<Email, RepositoryError> {
    Email::new(raw).map_err(|err| corrupt_row("email", err))
}

/// Rebuild a domain user from its row and credential.
pub(crate) fn user_from_row(row: UserRow, hash: String) -> Result<User, RepositoryError> {
    let email = stored_email(row.email)?;
    let username = Username::new(row.username).map_err(|err| corrupt_row("username", err))?;
    let password = PasswordHash::new(hash).map_err(|err| corrupt_row("password hash", err))?;
    Ok(User::new(email, username, password)
        .with_bio(row.bio)
        .with_image(row.image))
}

/// Rebuild the public author projection from a user row.
pub(crate) fn profile_from_row(row: UserRow) -> Result<AuthorProfile, RepositoryError> {
    Ok(AuthorProfile {
        email: stored_email(row.email)?,
        username: Username::new(row.username).map_err(|err| corrupt_row("username", err))?,
        bio: row.bio,
        image: row.image,
    })
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user row joined with its credential.
pub(crate) async fn find_user_by_email(
    conn: &mut AsyncPgConnection,
    email: &Email,
) -> Result<Option<(UserRow, String)>, RepositoryError> {
    users::table
        .inner_join(user_passwords::table)
        .filter(users::email.eq(email.as_ref()))
        .select((UserRow::as_select(), user_passwords::hash))
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)
}

/// A user row joined with its credential, looked up by username.
pub(crate) async fn find_user_by_username(
    conn: &mut AsyncPgConnection,
    username: &Username,
) -> Result<Option<(UserRow, String)>, RepositoryError> {
    users::table
        .inner_join(user_passwords::table)
        .filter(users::username.eq(username.as_ref()))
        .select((UserRow::as_select(), user_passwords::hash))
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)
}

/// Surrogate id of the user with `email`.
pub(crate) async fn find_user_id(
    conn: &mut AsyncPgConnection,
    email: &Email,
) -> Result<Option<i64>, RepositoryError> {
    users::table
        .filter(users::email.eq(email.as_ref()))
        .select(users::id)
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)
}

/// Surrogate id of an author, failing with `NoAuthor` when unknown.
pub(crate) async fn require_author_id(
    conn: &mut AsyncPgConnection,
    email: &Email,
) -> Result<i64, RepositoryError> {
    find_user_id(conn, email)
        .await?
        .ok_or_else(RepositoryError::no_author)
}

/// Load a user with the emails they follow and the slugs they favorited.
///
/// Returns the user's surrogate id alongside the aggregate.
pub(crate) async fn load_fanboy(
    conn: &mut AsyncPgConnection,
    email: &Email,
) -> Result<Option<(i64, Fanboy)>, RepositoryError> {
    let Some((row, hash)) = find_user_by_email(conn, email).await? else {
        return Ok(None);
    };
    let user_id = row.id;

    let following: Vec<String> = followed_users::table
        .inner_join(users::table.on(users::id.eq(followed_users::followed_id)))
        .filter(followed_users::follower_id.eq(user_id))
        .select(users::email)
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let favorites: Vec<String> = favorited_articles::table
        .inner_join(articles::table)
        .filter(favorited_articles::user_id.eq(user_id))
        .select(articles::slug)
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut fanboy = Fanboy::new(user_from_row(row, hash)?);
    fanboy.following.replace(following);
    fanboy.favorites.replace(favorites);
    Ok(Some((user_id, fanboy)))
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// An article row joined with its author row.
pub(crate) type ArticleWithAuthor = (ArticleRow, UserRow);

/// A stored article together with its surrogate id and author.
pub(crate) struct StoredArticle {
    pub id: i64,
    pub article: Article,
    pub author: AuthorProfile,
}

/// Article and author rows for `slug`.
pub(crate) async fn find_article_rows(
    conn: &mut AsyncPgConnection,
    slug: &Slug,
) -> Result<Option<ArticleWithAuthor>, RepositoryError> {
    articles::table
        .inner_join(users::table)
        .filter(articles::slug.eq(slug.as_ref()))
        .select((ArticleRow::as_select(), UserRow::as_select()))
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)
}

/// Load the article with `slug`, its tags, and its author.
pub(crate) async fn find_article(
    conn: &mut AsyncPgConnection,
    slug: &Slug,
) -> Result<Option<StoredArticle>, RepositoryError> {
    let Some(rows) = find_article_rows(conn, slug).await? else {
        return Ok(None);
    };
    let mut tags = load_tags(conn, &[rows.0.id]).await?;
    stored_article(rows, &mut tags).map(Some)
}

fn stored_article(
    (row, author): ArticleWithAuthor,
    tags: &mut BTreeMap<i64, BTreeSet<String>>,
) -> Result<StoredArticle, RepositoryError> {
    let author = profile_from_row(author)?;
    let slug = Slug::new(row.slug).map_err(|err| corrupt_row("slug", err))?;
    let article = Article::restore(
        slug,
        row.title,
        row.description,
        row.body,
        tags.remove(&row.id).unwrap_or_default(),
        author.email.clone(),
        row.created_at,
        row.updated_at,
    );
    Ok(StoredArticle {
        id: row.id,
        article,
        author,
    })
}

/// Turn joined rows into read projections, batching the tag and favorite
/// lookups. Input order is preserved.
pub(crate) async fn assemble_authored(
    conn: &mut AsyncPgConnection,
    rows: Vec<ArticleWithAuthor>,
) -> Result<Vec<AuthoredArticle>, RepositoryError> {
    let ids: Vec<i64> = rows.iter().map(|(article, _)| article.id).collect();
    let mut tags = load_tags(conn, &ids).await?;
    let counts = load_favorite_counts(conn, &ids).await?;

    rows.into_iter()
        .map(|rows| {
            let stored = stored_article(rows, &mut tags)?;
            Ok(AuthoredArticle {
                favorite_count: counts.get(&stored.id).copied().unwrap_or(0),
                article: stored.article,
                author: stored.author,
            })
        })
        .collect()
}

/// Tag sets keyed by article id.
pub(crate) async fn load_tags(
    conn: &mut AsyncPgConnection,
    article_ids: &[i64],
) -> Result<BTreeMap<i64, BTreeSet<String>>, RepositoryError> {
    if article_ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let rows: Vec<(i64, String)> = article_tags::table
        .filter(article_tags::article_id.eq_any(article_ids))
        .select((article_tags::article_id, article_tags::tag))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut tags: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
    for (article_id, tag) in rows {
        tags.entry(article_id).or_default().insert(tag);
    }
    Ok(tags)
}

/// Favorite counts keyed by article id; articles nobody favorited are absent.
pub(crate) async fn load_favorite_counts(
    conn: &mut AsyncPgConnection,
    article_ids: &[i64],
) -> Result<BTreeMap<i64, u64>, RepositoryError> {
    if article_ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let rows: Vec<(i64, i64)> = favorited_articles::table
        .filter(favorited_articles::article_id.eq_any(article_ids))
        .group_by(favorited_articles::article_id)
        .select((
            favorited_articles::article_id,
            diesel::dsl::count_star(),
        ))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    Ok(rows
        .into_iter()
        .map(|(article_id, count)| (article_id, count.unsigned_abs()))
        .collect())
}

/// Replace the stored tag set of an article.
pub(crate) async fn replace_tags(
    conn: &mut AsyncPgConnection,
    article_id: i64,
    tags: &BTreeSet<String>,
) -> Result<(), RepositoryError> {
    diesel::delete(article_tags::table.filter(article_tags::article_id.eq(article_id)))
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;

    if tags.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewArticleTagRow<'_>> = tags
        .iter()
        .map(|tag| NewArticleTagRow {
            article_id,
            tag: tag.as_str(),
        })
        .collect();
    diesel::insert_into(article_tags::table)
        .values(&rows)
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// Comments of an article in insertion order.
pub(crate) async fn load_comments(
    conn: &mut AsyncPgConnection,
    article_id: i64,
) -> Result<Vec<Comment>, RepositoryError> {
    let rows: Vec<(CommentRow, String)> = comments::table
        .inner_join(users::table.on(users::id.eq(comments::author_id)))
        .filter(comments::article_id.eq(article_id))
        .order(comments::id.asc())
        .select((CommentRow::as_select(), users::email))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    rows.into_iter()
        .map(|(row, email)| comment_from_row(row, email))
        .collect()
}

/// Rebuild a domain comment from its row and its author's email.
pub(crate) fn comment_from_row(row: CommentRow, email: String) -> Result<Comment, RepositoryError> {
    Ok(Comment::restore(
        CommentId::new(row.id),
        row.body,
        stored_email(email)?,
        row.created_at,
    ))
}
