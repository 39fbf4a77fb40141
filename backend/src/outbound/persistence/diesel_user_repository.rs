//! `UserRepository` implementation for [`DieselRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::{instrument, warn};

use crate::domain::ports::{RepositoryError, UserRepository};
use crate::domain::{
    AuthorProfile, Email, Fanboy, MutationTarget, User, Username, apply_mutation,
};

use super::diesel_error_mapping::{TxError, map_diesel_error, map_pool_error};
use super::diesel_helpers::{
    find_user_by_email, find_user_by_username, load_fanboy, profile_from_row, user_from_row,
};
use super::diesel_repository::DieselRepository;
use super::models::{NewFavoriteRow, NewFollowRow, NewPasswordRow, UserValues};
use super::schema::{articles, favorited_articles, followed_users, user_passwords, users};

fn user_values(user: &User) -> UserValues<'_> {
    UserValues {
        email: user.email().as_ref(),
        username: user.username().as_ref(),
        bio: user.bio(),
        image: user.image(),
    }
}

async fn reload_user(
    conn: &mut AsyncPgConnection,
    email: &Email,
) -> Result<User, RepositoryError> {
    let (row, hash) = find_user_by_email(conn, email)
        .await?
        .ok_or_else(RepositoryError::user_not_found)?;
    user_from_row(row, hash)
}

/// Rewrites the user and credential rows addressed by the original email.
struct UserTarget<'c> {
    conn: &'c mut AsyncPgConnection,
    email: &'c Email,
}

#[async_trait]
impl<'c> MutationTarget<User> for UserTarget<'c> {
    type Handle = ();

    async fn load(&mut self) -> Result<((), User), RepositoryError> {
        let user = reload_user(self.conn, self.email).await?;
        Ok(((), user))
    }

    async fn persist(&mut self, _handle: (), user: &User) -> Result<(), RepositoryError> {
        let user_id: i64 = diesel::update(users::table.filter(users::email.eq(self.email.as_ref())))
            .set(user_values(user))
            .returning(users::id)
            .get_result(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;

        diesel::update(user_passwords::table.find(user_id))
            .set(user_passwords::hash.eq(user.password().expose()))
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}

/// Replaces the follow and favorite edges of one user.
struct FanboyTarget<'c> {
    conn: &'c mut AsyncPgConnection,
    email: &'c Email,
}

#[async_trait]
impl<'c> MutationTarget<Fanboy> for FanboyTarget<'c> {
    /// Surrogate id of the user.
    type Handle = i64;

    async fn load(&mut self) -> Result<(i64, Fanboy), RepositoryError> {
        load_fanboy(self.conn, self.email)
            .await?
            .ok_or_else(RepositoryError::user_not_found)
    }

    async fn persist(&mut self, user_id: i64, fanboy: &Fanboy) -> Result<(), RepositoryError> {
        diesel::delete(followed_users::table.filter(followed_users::follower_id.eq(user_id)))
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        diesel::delete(favorited_articles::table.filter(favorited_articles::user_id.eq(user_id)))
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;

        let following: Vec<&str> = fanboy.following.iter().map(String::as_str).collect();
        let followed_ids: Vec<i64> = users::table
            .filter(users::email.eq_any(following))
            .select(users::id)
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        if !followed_ids.is_empty() {
            let edges: Vec<NewFollowRow> = followed_ids
                .into_iter()
                .map(|followed_id| NewFollowRow {
                    follower_id: user_id,
                    followed_id,
                })
                .collect();
            diesel::insert_into(followed_users::table)
                .values(&edges)
                .execute(&mut *self.conn)
                .await
                .map_err(map_diesel_error)?;
        }

        let favorites: Vec<&str> = fanboy.favorites.iter().map(String::as_str).collect();
        let article_ids: Vec<i64> = articles::table
            .filter(articles::slug.eq_any(favorites))
            .select(articles::id)
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        if !article_ids.is_empty() {
            let edges: Vec<NewFavoriteRow> = article_ids
                .into_iter()
                .map(|article_id| NewFavoriteRow {
                    user_id,
                    article_id,
                })
                .collect();
            diesel::insert_into(favorited_articles::table)
                .values(&edges)
                .execute(&mut *self.conn)
                .await
                .map_err(map_diesel_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for DieselRepository {
    #[instrument(level = "debug", skip_all, fields(email = %user.email(), username = %user.username()))]
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // The credential row shares the user's id, so both inserts commit
        // or neither does.
        conn.transaction::<_, TxError<RepositoryError>, _>(|conn| {
            async move {
                let user_id: i64 = diesel::insert_into(users::table)
                    .values(user_values(user))
                    .returning(users::id)
                    .get_result(conn)
                    .await
                    .map_err(map_diesel_error)?;

                diesel::insert_into(user_passwords::table)
                    .values(NewPasswordRow {
                        id: user_id,
                        hash: user.password().expose(),
                    })
                    .execute(conn)
                    .await
                    .map_err(map_diesel_error)?;

                Ok(reload_user(conn, user.email()).await?)
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(email = %email))]
    async fn get_user_by_email(&self, email: &Email) -> Result<Fanboy, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // One transaction so the edge joins never observe an older state
        // than the user row.
        conn.transaction::<_, TxError<RepositoryError>, _>(|conn| {
            async move {
                let (_, fanboy) = load_fanboy(conn, email)
                    .await?
                    .ok_or_else(RepositoryError::user_not_found)?;
                Ok(fanboy)
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(email = %email))]
    async fn get_author_by_email(&self, email: &Email) -> Option<AuthorProfile> {
        let lookup = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let found = find_user_by_email(&mut conn, email).await?;
            found.map(|(row, _)| profile_from_row(row)).transpose()
        };

        match lookup.await {
            Ok(author) => author,
            Err(error) => {
                warn!(%error, "author lookup failed; treating author as absent");
                None
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(username = %username))]
    async fn get_user_by_username(&self, username: &Username) -> Result<User, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (row, hash) = find_user_by_username(&mut conn, username)
            .await?
            .ok_or_else(RepositoryError::user_not_found)?;
        user_from_row(row, hash)
    }

    #[instrument(level = "debug", skip_all, fields(email = %email))]
    async fn update_user_by_email<F, E>(&self, email: &Email, transform: F) -> Result<User, E>
    where
        F: FnOnce(User) -> Result<User, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| E::from(map_pool_error(err)))?;

        conn.transaction::<_, TxError<E>, _>(|conn| {
            async move {
                let mut target = UserTarget { conn, email };
                let user = apply_mutation(&mut target, transform)
                    .await
                    .map_err(TxError::Abort)?;
                reload_user(target.conn, user.email())
                    .await
                    .map_err(|err| TxError::Abort(E::from(err)))
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }

    #[instrument(level = "debug", skip_all, fields(email = %email))]
    async fn update_fanboy_by_email<F, E>(&self, email: &Email, transform: F) -> Result<(), E>
    where
        F: FnOnce(Fanboy) -> Result<Fanboy, E> + Send,
        E: From<RepositoryError> + Send,
    {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| E::from(map_pool_error(err)))?;

        conn.transaction::<_, TxError<E>, _>(|conn| {
            async move {
                let mut target = FanboyTarget { conn, email };
                apply_mutation(&mut target, transform)
                    .await
                    .map(|_| ())
                    .map_err(TxError::Abort)
            }
            .scope_boxed()
        })
        .await
        .map_err(TxError::into_caller)
    }
}
