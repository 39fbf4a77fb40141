//! In-memory repository adapter.
//!
//! Implements the same ports as the PostgreSQL adapter with the same
//! observable semantics: unique natural keys, author resolution, strictly
//! advancing `updated_at`, cascading deletes, and all-or-nothing updates.
//! Operations are serialised behind an async mutex; each one works on a
//! copy of the tables and commits by swapping the copy in, so a failed
//! transform or constraint check leaves no trace.

mod tables;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::ports::{
    ArticleRepository, ListCriteria, RepositoryError, UserRepository,
};
use crate::domain::timestamps::{next_updated_at, storage_now};
use crate::domain::{
    Article, AuthorProfile, AuthoredArticle, Comment, CommentedArticle, Email, Fanboy,
    MutationTarget, Slug, User, Username, apply_mutation,
};

use self::tables::Tables;

/// Deterministic, process-local implementation of the repository ports.
///
/// Clones share state.
#[derive(Clone)]
pub struct InMemoryRepository {
    state: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Empty repository using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Empty repository stamping rows with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        storage_now(self.clock.as_ref())
    }
}

struct UserTarget<'t> {
    tables: &'t mut Tables,
    email: &'t Email,
}

#[async_trait]
impl<'t> MutationTarget<User> for UserTarget<'t> {
    type Handle = i64;

    async fn load(&mut self) -> Result<(i64, User), RepositoryError> {
        let id = self
            .tables
            .user_id_by_email(self.email)
            .ok_or_else(RepositoryError::user_not_found)?;
        let user = self
            .tables
            .user_by_email(self.email)
            .cloned()
            .ok_or_else(RepositoryError::user_not_found)?;
        Ok((id, user))
    }

    async fn persist(&mut self, id: i64, user: &User) -> Result<(), RepositoryError> {
        self.tables.write_user(id, user)
    }
}

struct FanboyTarget<'t> {
    tables: &'t mut Tables,
    email: &'t Email,
}

#[async_trait]
impl<'t> MutationTarget<Fanboy> for FanboyTarget<'t> {
    type Handle = i64;

    async fn load(&mut self) -> Result<(i64, Fanboy), RepositoryError> {
        let id = self
            .tables
            .user_id_by_email(self.email)
            .ok_or_else(RepositoryError::user_not_found)?;
        let fanboy = self
            .tables
            .fanboy(id)
            .ok_or_else(RepositoryError::user_not_found)?;
        Ok((id, fanboy))
    }

    async fn persist(&mut self, id: i64, fanboy: &Fanboy) -> Result<(), RepositoryError> {
        self.tables.replace_edges(id, fanboy);
        Ok(())
    }
}

struct ArticleTarget<'t> {
    tables: &'t mut Tables,
    slug: &'t Slug,
    now: DateTime<Utc>,
}

#[async_trait]
impl<'t> MutationTarget<Article> for ArticleTarget<'t> {
    type Handle = (i64, DateTime<Utc>);

    async fn load(&mut self) -> Result<((i64, DateTime<Utc>), Article), RepositoryError> {
        let id = self
            .tables
            .article_id_by_slug(self.slug)
            .ok_or_else(RepositoryError::article_not_found)?;
        let article = self.tables.article(id)?;
        Ok(((id, article.updated_at()), article))
    }

    async fn persist(
        &mut self,
        (id, previous_updated_at): (i64, DateTime<Utc>),
        article: &Article,
    ) -> Result<(), RepositoryError> {
        let updated_at = next_updated_at(previous_updated_at, self.now);
        self.tables.write_article(id, article, updated_at)
    }
}

struct CommentsTarget<'t> {
    tables: &'t mut Tables,
    slug: &'t Slug,
    now: DateTime<Utc>,
    last_affected: Option<Comment>,
}

#[async_trait]
impl<'t> MutationTarget<CommentedArticle> for CommentsTarget<'t> {
    type Handle = (i64, Vec<Comment>);

    async fn load(&mut self) -> Result<((i64, Vec<Comment>), CommentedArticle), RepositoryError> {
        let id = self
            .tables
            .article_id_by_slug(self.slug)
            .ok_or_else(RepositoryError::article_not_found)?;
        let commented = self.tables.commented(id)?;
        Ok(((id, commented.comments().to_vec()), commented))
    }

    async fn persist(
        &mut self,
        (article_id, stored): (i64, Vec<Comment>),
        commented: &CommentedArticle,
    ) -> Result<(), RepositoryError> {
        let kept: BTreeSet<_> = commented.comments().iter().map(Comment::id).collect();
        let removed: Vec<Comment> = stored
            .into_iter()
            .filter(|comment| !kept.contains(&comment.id()))
            .collect();
        if !removed.is_empty() {
            let ids = removed.iter().map(Comment::id).collect();
            self.tables.delete_comments(article_id, &ids);
            self.last_affected = removed.last().cloned();
        }

        for draft in commented.pending_comments() {
            let comment = self.tables.insert_comment(
                article_id,
                draft.body(),
                draft.author_email(),
                self.now,
            )?;
            self.last_affected = Some(comment);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        let id = state.insert_user(user)?;
        debug!(user_id = id, email = %user.email(), "user created");
        Ok(user.clone())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Fanboy, RepositoryError> {
        let state = self.state.lock().await;
        state
            .user_id_by_email(email)
            .and_then(|id| state.fanboy(id))
            .ok_or_else(RepositoryError::user_not_found)
    }

    async fn get_author_by_email(&self, email: &Email) -> Option<AuthorProfile> {
        let state = self.state.lock().await;
        state.user_by_email(email).map(User::profile)
    }

    async fn get_user_by_username(&self, username: &Username) -> Result<User, RepositoryError> {
        let state = self.state.lock().await;
        state
            .user_by_username(username.as_ref())
            .cloned()
            .ok_or_else(RepositoryError::user_not_found)
    }

    async fn update_user_by_email<F, E>(&self, email: &Email, transform: F) -> Result<User, E>
    where
        F: FnOnce(User) -> Result<User, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let mut state = self.state.lock().await;
        let mut working = state.clone();
        let user = apply_mutation(
            &mut UserTarget {
                tables: &mut working,
                email,
            },
            transform,
        )
        .await?;
        *state = working;
        Ok(user)
    }

    async fn update_fanboy_by_email<F, E>(&self, email: &Email, transform: F) -> Result<(), E>
    where
        F: FnOnce(Fanboy) -> Result<Fanboy, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let mut state = self.state.lock().await;
        let mut working = state.clone();
        apply_mutation(
            &mut FanboyTarget {
                tables: &mut working,
                email,
            },
            transform,
        )
        .await?;
        *state = working;
        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for InMemoryRepository {
    async fn create_article(&self, article: &Article) -> Result<AuthoredArticle, RepositoryError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        let id = state.insert_article(article, now)?;
        state.authored(id)
    }

    async fn latest_articles_by_criteria(
        &self,
        criteria: &ListCriteria,
    ) -> Result<Vec<AuthoredArticle>, RepositoryError> {
        let state = self.state.lock().await;
        state.latest(criteria)
    }

    async fn get_article_by_slug(&self, slug: &Slug) -> Result<AuthoredArticle, RepositoryError> {
        let state = self.state.lock().await;
        let id = state
            .article_id_by_slug(slug)
            .ok_or_else(RepositoryError::article_not_found)?;
        state.authored(id)
    }

    async fn get_comments_by_slug(&self, slug: &Slug) -> Result<CommentedArticle, RepositoryError> {
        let state = self.state.lock().await;
        let id = state
            .article_id_by_slug(slug)
            .ok_or_else(RepositoryError::article_not_found)?;
        state.commented(id)
    }

    async fn update_article_by_slug<F, E>(
        &self,
        slug: &Slug,
        transform: F,
    ) -> Result<AuthoredArticle, E>
    where
        F: FnOnce(Article) -> Result<Article, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let now = self.now();
        let mut state = self.state.lock().await;
        let mut working = state.clone();
        let article = apply_mutation(
            &mut ArticleTarget {
                tables: &mut working,
                slug,
                now,
            },
            transform,
        )
        .await?;
        let id = working
            .article_id_by_slug(article.slug())
            .ok_or_else(RepositoryError::article_not_found)?;
        let authored = working.authored(id)?;
        *state = working;
        Ok(authored)
    }

    async fn update_comments_by_slug<F, E>(
        &self,
        slug: &Slug,
        transform: F,
    ) -> Result<Option<Comment>, E>
    where
        F: FnOnce(CommentedArticle) -> Result<CommentedArticle, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let now = self.now();
        let mut state = self.state.lock().await;
        let mut working = state.clone();
        let mut target = CommentsTarget {
            tables: &mut working,
            slug,
            now,
            last_affected: None,
        };
        apply_mutation(&mut target, transform).await?;
        let last_affected = target.last_affected;
        *state = working;
        Ok(last_affected)
    }

    async fn delete_article(&self, article: Option<&Article>) -> Result<(), RepositoryError> {
        let Some(article) = article else {
            return Ok(());
        };
        let mut state = self.state.lock().await;
        if let Some(id) = state.article_id_by_slug(article.slug()) {
            state.delete_article(id);
        }
        Ok(())
    }

    async fn distinct_tags(&self) -> Result<BTreeSet<String>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.distinct_tags())
    }
}
