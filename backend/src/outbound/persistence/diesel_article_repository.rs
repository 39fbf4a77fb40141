//! `ArticleRepository` implementation for [`DieselRepository`].

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use mockable::Clock;
use tracing::{debug, instrument};

use crate::domain::ports::{ArticleRepository, ListCriteria, RepositoryError};
use crate::domain::timestamps::{next_updated_at, storage_now};
use crate::domain::{
    Article, AuthoredArticle, Comment, CommentedArticle, MutationTarget, Slug, apply_mutation,
};

use super::article_listing;
use super::diesel_error_mapping::{TxError, map_diesel_error, map_pool_error};
use super::diesel_helpers::{
    assemble_authored, comment_from_row, find_article, find_article_rows, load_comments,
    replace_tags, require_author_id,
};
use super::diesel_repository::DieselRepository;
use super::models::{ArticleUpdate, CommentRow, NewArticleRow, NewCommentRow};
use super::schema::{articles, comments};

async fn reload_authored(
    conn: &mut AsyncPgConnection,
    slug: &Slug,
) -> Result<AuthoredArticle, RepositoryError> {
    let rows = find_article_rows(conn, slug)
        .await?
        .ok_or_else(RepositoryError::article_not_found)?;
    assemble_authored(conn, vec![rows])
        .await?
        .pop()
        .ok_or_else(RepositoryError::article_not_found)
}

/// Rewrites the article row addressed by the original slug.
struct ArticleTarget<'c> {
    conn: &'c mut AsyncPgConnection,
    slug: &'c Slug,
    clock: &'c dyn Clock,
}

#[async_trait]
impl<'c> MutationTarget<Article> for ArticleTarget<'c> {
    /// `updated_at` as loaded.
    type Handle = DateTime<Utc>;

    async fn load(&mut self) -> Result<(DateTime<Utc>, Article), RepositoryError> {
        let stored = find_article(self.conn, self.slug)
            .await?
            .ok_or_else(RepositoryError::article_not_found)?;
        Ok((stored.article.updated_at(), stored.article))
    }

    async fn persist(
        &mut self,
        previous_updated_at: DateTime<Utc>,
        article: &Article,
    ) -> Result<(), RepositoryError> {
        let author_id = require_author_id(self.conn, article.author_email()).await?;
        let updated_at = next_updated_at(previous_updated_at, storage_now(self.clock));

        let article_id: i64 =
            diesel::update(articles::table.filter(articles::slug.eq(self.slug.as_ref())))
                .set(ArticleUpdate {
                    slug: article.slug().as_ref(),
                    title: article.title(),
                    description: article.description(),
                    body: article.body(),
                    author_id,
                    updated_at,
                })
                .returning(articles::id)
                .get_result(&mut *self.conn)
                .await
                .map_err(map_diesel_error)?;

        replace_tags(self.conn, article_id, article.tags()).await
    }
}

/// What the comments target needs from load to persist.
struct CommentsHandle {
    article_id: i64,
    stored: Vec<Comment>,
}

/// Inserts queued comments and deletes removed ones.
struct CommentsTarget<'c> {
    conn: &'c mut AsyncPgConnection,
    slug: &'c Slug,
    clock: &'c dyn Clock,
    last_affected: Option<Comment>,
}

#[async_trait]
impl<'c> MutationTarget<CommentedArticle> for CommentsTarget<'c> {
    type Handle = CommentsHandle;

    async fn load(&mut self) -> Result<(CommentsHandle, CommentedArticle), RepositoryError> {
        let stored = find_article(self.conn, self.slug)
            .await?
            .ok_or_else(RepositoryError::article_not_found)?;
        let comments = load_comments(self.conn, stored.id).await?;
        let handle = CommentsHandle {
            article_id: stored.id,
            stored: comments.clone(),
        };
        Ok((handle, CommentedArticle::new(stored.article, comments)))
    }

    async fn persist(
        &mut self,
        handle: CommentsHandle,
        commented: &CommentedArticle,
    ) -> Result<(), RepositoryError> {
        let kept: BTreeSet<_> = commented.comments().iter().map(Comment::id).collect();
        let removed: Vec<Comment> = handle
            .stored
            .into_iter()
            .filter(|comment| !kept.contains(&comment.id()))
            .collect();

        if !removed.is_empty() {
            let ids: Vec<i64> = removed.iter().map(|comment| comment.id().get()).collect();
            diesel::delete(
                comments::table
                    .filter(comments::article_id.eq(handle.article_id))
                    .filter(comments::id.eq_any(&ids)),
            )
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
            self.last_affected = removed.last().cloned();
        }

        for draft in commented.pending_comments() {
            let author_id = require_author_id(self.conn, draft.author_email()).await?;
            let row: CommentRow = diesel::insert_into(comments::table)
                .values(NewCommentRow {
                    article_id: handle.article_id,
                    author_id,
                    body: draft.body(),
                    created_at: storage_now(self.clock),
                })
                .returning(CommentRow::as_returning())
                .get_result(&mut *self.conn)
                .await
                .map_err(map_diesel_error)?;
            self.last_affected = Some(comment_from_row(row, draft.author_email().to_string())?);
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for DieselRepository {
    #[instrument(level = "debug", skip_all, fields(slug = %article.slug()))]
    async fn create_article(&self, article: &Article) -> Result<AuthoredArticle, RepositoryError> {
        let clock = self.clock.as_ref();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<RepositoryError>, _>(|conn| {
            async move {
                let author_id = require_author_id(conn, article.author_email()).await?;
                let now = storage_now(clock);

                let article_id: i64 = diesel::insert_into(articles::table)
                    .values(NewArticleRow {
                        slug: article.slug().as_ref(),
                        title: article.title(),
                        description: article.description(),
                        body: article.body(),
                        author_id,
                        created_at: now,
                        updated_at: now,
                    })
                    .returning(articles::id)
                    .get_result(conn)
                    .await
                    .map_err(map_diesel_error)?;

                replace_tags(conn, article_id, article.tags()).await?;
                Ok(reload_authored(conn, article.slug()).await?)
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(limit = criteria.limit, offset = criteria.offset))]
    async fn latest_articles_by_criteria(
        &self,
        criteria: &ListCriteria,
    ) -> Result<Vec<AuthoredArticle>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<RepositoryError>, _>(|conn| {
            async move { Ok(article_listing::latest_articles(conn, criteria).await?) }
                .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(slug = %slug))]
    async fn get_article_by_slug(&self, slug: &Slug) -> Result<AuthoredArticle, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<RepositoryError>, _>(|conn| {
            async move { Ok(reload_authored(conn, slug).await?) }.scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(slug = %slug))]
    async fn get_comments_by_slug(&self, slug: &Slug) -> Result<CommentedArticle, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<RepositoryError>, _>(|conn| {
            async move {
                let stored = find_article(conn, slug)
                    .await?
                    .ok_or_else(RepositoryError::article_not_found)?;
                let comments = load_comments(conn, stored.id).await?;
                Ok(CommentedArticle::new(stored.article, comments))
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(slug = %slug))]
    async fn update_article_by_slug<F, E>(
        &self,
        slug: &Slug,
        transform: F,
    ) -> Result<AuthoredArticle, E>
    where
        F: FnOnce(Article) -> Result<Article, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let clock = self.clock.as_ref();
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| E::from(map_pool_error(err)))?;

        conn.transaction::<_, TxError<E>, _>(|conn| {
            async move {
                let mut target = ArticleTarget { conn, slug, clock };
                let article = apply_mutation(&mut target, transform)
                    .await
                    .map_err(TxError::Abort)?;
                reload_authored(target.conn, article.slug())
                    .await
                    .map_err(|err| TxError::Abort(E::from(err)))
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(slug = %slug))]
    async fn update_comments_by_slug<F, E>(
        &self,
        slug: &Slug,
        transform: F,
    ) -> Result<Option<Comment>, E>
    where
        F: FnOnce(CommentedArticle) -> Result<CommentedArticle, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let clock = self.clock.as_ref();
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| E::from(map_pool_error(err)))?;

        conn.transaction::<_, TxError<E>, _>(|conn| {
            async move {
                let mut target = CommentsTarget {
                    conn,
                    slug,
                    clock,
                    last_affected: None,
                };
                apply_mutation(&mut target, transform)
                    .await
                    .map_err(TxError::Abort)?;
                Ok(target.last_affected)
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all)]
    async fn delete_article(&self, article: Option<&Article>) -> Result<(), RepositoryError> {
        let Some(article) = article else {
            return Ok(());
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted =
            diesel::delete(articles::table.filter(articles::slug.eq(article.slug().as_ref())))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        debug!(slug = %article.slug(), deleted, "article delete finished");
        Ok(())
    }

    #[instrument(level = "debug", skip_all)]
    async fn distinct_tags(&self) -> Result<BTreeSet<String>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        article_listing::distinct_tags(&mut conn).await
    }
}
