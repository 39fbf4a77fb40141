//! Relational state of the in-memory adapter.
//!
//! Mirrors the PostgreSQL schema: surrogate ids, unique natural keys, edge
//! sets for follows and favorites, and cascading article deletes. Articles
//! and comments reference their author by id, so renaming a user's email
//! keeps attribution.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::domain::ports::{ListCriteria, RepositoryError};
use crate::domain::{
    Article, AuthorProfile, AuthoredArticle, Comment, CommentId, CommentedArticle, Email, Fanboy,
    Slug, User,
};

#[derive(Debug, Clone)]
struct ArticleRecord {
    article: Article,
    author_id: i64,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    article_id: i64,
    author_id: i64,
    body: String,
    created_at: DateTime<Utc>,
}

/// Snapshot of every table. Cloned per operation and swapped in on commit.
#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    next_user_id: i64,
    next_article_id: i64,
    next_comment_id: i64,
    users: BTreeMap<i64, User>,
    follows: BTreeSet<(i64, i64)>,
    articles: BTreeMap<i64, ArticleRecord>,
    favorites: BTreeSet<(i64, i64)>,
    comments: BTreeMap<i64, CommentRecord>,
}

fn next_id(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

impl Tables {
    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub(super) fn user_id_by_email(&self, email: &Email) -> Option<i64> {
        self.users
            .iter()
            .find(|(_, user)| user.email() == email)
            .map(|(id, _)| *id)
    }

    pub(super) fn user_by_email(&self, email: &Email) -> Option<&User> {
        self.users.values().find(|user| user.email() == email)
    }

    pub(super) fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users
            .values()
            .find(|user| user.username().as_ref() == username)
    }

    fn ensure_unique_user(&self, user: &User, except: Option<i64>) -> Result<(), RepositoryError> {
        let taken = self.users.iter().any(|(id, existing)| {
            Some(*id) != except
                && (existing.email() == user.email() || existing.username() == user.username())
        });
        if taken {
            return Err(RepositoryError::duplicate_user());
        }
        Ok(())
    }

    pub(super) fn insert_user(&mut self, user: &User) -> Result<i64, RepositoryError> {
        self.ensure_unique_user(user, None)?;
        let id = next_id(&mut self.next_user_id);
        self.users.insert(id, user.clone());
        Ok(id)
    }

    pub(super) fn write_user(&mut self, id: i64, user: &User) -> Result<(), RepositoryError> {
        self.ensure_unique_user(user, Some(id))?;
        self.users.insert(id, user.clone());
        Ok(())
    }

    fn profile(&self, user_id: i64) -> Result<AuthorProfile, RepositoryError> {
        self.users
            .get(&user_id)
            .map(User::profile)
            .ok_or_else(|| RepositoryError::query(format!("dangling user reference {user_id}")))
    }

    pub(super) fn fanboy(&self, user_id: i64) -> Option<Fanboy> {
        let user = self.users.get(&user_id)?;
        let mut fanboy = Fanboy::new(user.clone());
        fanboy.following.replace(
            self.follows
                .iter()
                .filter(|(follower, _)| *follower == user_id)
                .filter_map(|(_, followed)| self.users.get(followed))
                .map(|followed| followed.email().as_ref()),
        );
        fanboy.favorites.replace(
            self.favorites
                .iter()
                .filter(|(fan, _)| *fan == user_id)
                .filter_map(|(_, article_id)| self.articles.get(article_id))
                .map(|record| record.article.slug().as_ref()),
        );
        Some(fanboy)
    }

    /// Full replace of the user's follow and favorite edges.
    pub(super) fn replace_edges(&mut self, user_id: i64, fanboy: &Fanboy) {
        self.follows.retain(|(follower, _)| *follower != user_id);
        self.favorites.retain(|(fan, _)| *fan != user_id);

        let followed: Vec<i64> = self
            .users
            .iter()
            .filter(|(_, user)| fanboy.following.contains(user.email()))
            .map(|(id, _)| *id)
            .collect();
        self.follows
            .extend(followed.into_iter().map(|followed| (user_id, followed)));

        let favorited: Vec<i64> = self
            .articles
            .iter()
            .filter(|(_, record)| fanboy.favorites.contains(record.article.slug()))
            .map(|(id, _)| *id)
            .collect();
        self.favorites
            .extend(favorited.into_iter().map(|article_id| (user_id, article_id)));
    }

    // -----------------------------------------------------------------------
    // Articles
    // -----------------------------------------------------------------------

    pub(super) fn article_id_by_slug(&self, slug: &Slug) -> Option<i64> {
        self.articles
            .iter()
            .find(|(_, record)| record.article.slug() == slug)
            .map(|(id, _)| *id)
    }

    pub(super) fn require_author(&self, email: &Email) -> Result<i64, RepositoryError> {
        self.user_id_by_email(email)
            .ok_or_else(RepositoryError::no_author)
    }

    fn ensure_unique_slug(&self, slug: &Slug, except: Option<i64>) -> Result<(), RepositoryError> {
        let taken = self
            .articles
            .iter()
            .any(|(id, record)| Some(*id) != except && record.article.slug() == slug);
        if taken {
            return Err(RepositoryError::duplicate_article());
        }
        Ok(())
    }

    pub(super) fn insert_article(
        &mut self,
        article: &Article,
        now: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        let author_id = self.require_author(article.author_email())?;
        self.ensure_unique_slug(article.slug(), None)?;
        let id = next_id(&mut self.next_article_id);
        self.articles.insert(
            id,
            ArticleRecord {
                article: article.clone().with_timestamps(now, now),
                author_id,
            },
        );
        Ok(id)
    }

    /// Rewrite an article, keeping its creation time.
    pub(super) fn write_article(
        &mut self,
        id: i64,
        article: &Article,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let author_id = self.require_author(article.author_email())?;
        self.ensure_unique_slug(article.slug(), Some(id))?;
        let record = self
            .articles
            .get_mut(&id)
            .ok_or_else(RepositoryError::article_not_found)?;
        let created_at = record.article.created_at();
        *record = ArticleRecord {
            article: article.clone().with_timestamps(created_at, updated_at),
            author_id,
        };
        Ok(())
    }

    /// The stored article with its author's current email.
    pub(super) fn article(&self, id: i64) -> Result<Article, RepositoryError> {
        let record = self
            .articles
            .get(&id)
            .ok_or_else(RepositoryError::article_not_found)?;
        let author = self.profile(record.author_id)?;
        let mut article = record.article.clone();
        article.set_author_email(author.email);
        Ok(article)
    }

    pub(super) fn authored(&self, id: i64) -> Result<AuthoredArticle, RepositoryError> {
        let record = self
            .articles
            .get(&id)
            .ok_or_else(RepositoryError::article_not_found)?;
        let favorite_count = self
            .favorites
            .iter()
            .filter(|(_, article_id)| *article_id == id)
            .count();
        Ok(AuthoredArticle {
            article: self.article(id)?,
            author: self.profile(record.author_id)?,
            favorite_count: u64::try_from(favorite_count).unwrap_or(u64::MAX),
        })
    }

    /// Remove an article with its favorites and comments.
    pub(super) fn delete_article(&mut self, id: i64) {
        self.articles.remove(&id);
        self.favorites.retain(|(_, article_id)| *article_id != id);
        self.comments.retain(|_, comment| comment.article_id != id);
    }

    pub(super) fn latest(
        &self,
        criteria: &ListCriteria,
    ) -> Result<Vec<AuthoredArticle>, RepositoryError> {
        let favoriting_user = match &criteria.favorited_by {
            Some(email) => match self.user_id_by_email(email) {
                Some(user_id) => Some(user_id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut matching: Vec<(i64, DateTime<Utc>, &Slug)> = self
            .articles
            .iter()
            .filter(|(_, record)| {
                criteria
                    .tag
                    .as_ref()
                    .is_none_or(|tag| record.article.tags().contains(tag))
            })
            .filter(|(_, record)| {
                criteria.author_emails.is_empty()
                    || self.users.get(&record.author_id).is_some_and(|author| {
                        criteria.author_emails.contains(author.email())
                    })
            })
            .filter(|(id, _)| {
                favoriting_user.is_none_or(|user_id| self.favorites.contains(&(user_id, **id)))
            })
            .map(|(id, record)| (*id, record.article.created_at(), record.article.slug()))
            .collect();

        matching.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(b.2)));

        let offset = usize::try_from(criteria.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(criteria.limit).unwrap_or(usize::MAX);
        matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(id, _, _)| self.authored(id))
            .collect()
    }

    pub(super) fn distinct_tags(&self) -> BTreeSet<String> {
        self.articles
            .values()
            .flat_map(|record| record.article.tags().iter().cloned())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    pub(super) fn commented(&self, article_id: i64) -> Result<CommentedArticle, RepositoryError> {
        Ok(CommentedArticle::new(
            self.article(article_id)?,
            self.comments_of(article_id)?,
        ))
    }

    pub(super) fn comments_of(&self, article_id: i64) -> Result<Vec<Comment>, RepositoryError> {
        self.comments
            .iter()
            .filter(|(_, record)| record.article_id == article_id)
            .map(|(id, record)| self.comment(*id, record))
            .collect()
    }

    fn comment(&self, id: i64, record: &CommentRecord) -> Result<Comment, RepositoryError> {
        Ok(Comment::restore(
            CommentId::new(id),
            record.body.clone(),
            self.profile(record.author_id)?.email,
            record.created_at,
        ))
    }

    pub(super) fn insert_comment(
        &mut self,
        article_id: i64,
        body: &str,
        author_email: &Email,
        created_at: DateTime<Utc>,
    ) -> Result<Comment, RepositoryError> {
        let author_id = self.require_author(author_email)?;
        let id = next_id(&mut self.next_comment_id);
        let record = CommentRecord {
            article_id,
            author_id,
            body: body.to_owned(),
            created_at,
        };
        let comment = self.comment(id, &record)?;
        self.comments.insert(id, record);
        Ok(comment)
    }

    pub(super) fn delete_comments(&mut self, article_id: i64, ids: &BTreeSet<CommentId>) {
        self.comments.retain(|id, record| {
            record.article_id != article_id || !ids.contains(&CommentId::new(*id))
        });
    }
}
