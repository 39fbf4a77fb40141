//! Filtered, paginated article listings and the tag vocabulary.

use std::collections::BTreeSet;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::AuthoredArticle;
use crate::domain::ports::{ListCriteria, RepositoryError};

use super::diesel_error_mapping::map_diesel_error;
use super::diesel_helpers::{ArticleWithAuthor, assemble_authored, find_user_id};
use super::models::{ArticleRow, UserRow};
use super::schema::{article_tags, articles, favorited_articles, users};

/// One page of articles matching `criteria`, newest first, ties by slug.
pub(crate) async fn latest_articles(
    conn: &mut AsyncPgConnection,
    criteria: &ListCriteria,
) -> Result<Vec<AuthoredArticle>, RepositoryError> {
    if criteria.limit == 0 {
        return Ok(Vec::new());
    }

    let favoriting_user = match &criteria.favorited_by {
        Some(email) => match find_user_id(conn, email).await? {
            Some(user_id) => Some(user_id),
            None => return Ok(Vec::new()),
        },
        None => None,
    };

    let mut query = articles::table
        .inner_join(users::table)
        .select((ArticleRow::as_select(), UserRow::as_select()))
        .into_boxed();

    if let Some(tag) = &criteria.tag {
        query = query.filter(
            articles::id.eq_any(
                article_tags::table
                    .filter(article_tags::tag.eq(tag.as_str()))
                    .select(article_tags::article_id),
            ),
        );
    }

    if !criteria.author_emails.is_empty() {
        let emails: Vec<&str> = criteria.author_emails.iter().map(AsRef::as_ref).collect();
        query = query.filter(users::email.eq_any(emails));
    }

    if let Some(user_id) = favoriting_user {
        query = query.filter(
            articles::id.eq_any(
                favorited_articles::table
                    .filter(favorited_articles::user_id.eq(user_id))
                    .select(favorited_articles::article_id),
            ),
        );
    }

    let rows: Vec<ArticleWithAuthor> = query
        .order((articles::created_at.desc(), articles::slug.asc()))
        .limit(i64::from(criteria.limit))
        .offset(i64::from(criteria.offset))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    assemble_authored(conn, rows).await
}

/// Every tag attached to at least one article.
pub(crate) async fn distinct_tags(
    conn: &mut AsyncPgConnection,
) -> Result<BTreeSet<String>, RepositoryError> {
    let tags: Vec<String> = article_tags::table
        .select(article_tags::tag)
        .distinct()
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(tags.into_iter().collect())
}
