//! A user together with the people they follow and the articles they favor.

use super::{Article, Author, KeySet, Slug, User};

/// User enriched with its social graph.
///
/// `following` holds lowercase emails and `favorites` lowercase slugs. Both
/// are views over the `followed_users` and `favorited_articles` tables; the
/// repository replaces the stored edges with these sets on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fanboy {
    /// The underlying user.
    pub user: User,
    /// Emails of followed users.
    pub following: KeySet,
    /// Slugs of favorited articles.
    pub favorites: KeySet,
}

impl Fanboy {
    /// Wrap a user with no relationships.
    pub fn new(user: User) -> Self {
        Self {
            user,
            following: KeySet::new(),
            favorites: KeySet::new(),
        }
    }

    /// Whether this user follows `author`.
    pub fn is_following(&self, author: &impl Author) -> bool {
        self.following.contains(author.email())
    }

    /// Start following `author`. Idempotent.
    pub fn start_following(&mut self, author: &impl Author) {
        self.following.insert(author.email());
    }

    /// Stop following `author`. Idempotent.
    pub fn stop_following(&mut self, author: &impl Author) {
        self.following.remove(author.email());
    }

    /// Whether this user favorited the article with `slug`.
    pub fn has_favorited(&self, slug: &Slug) -> bool {
        self.favorites.contains(slug)
    }

    /// Favorite `article`. Idempotent.
    pub fn favorite(&mut self, article: &Article) {
        self.favorites.insert(article.slug());
    }

    /// Remove `article` from the favorites. Idempotent.
    pub fn unfavorite(&mut self, article: &Article) {
        self.favorites.remove(article.slug());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn fanboy() -> Fanboy {
        Fanboy::new(User::try_from_strings("user@fan.com", "fan", "hash").expect("valid user"))
    }

    fn author(adj: &str) -> User {
        User::try_from_strings(format!("author@{adj}.com"), adj, "hash").expect("valid author")
    }

    #[rstest]
    fn following_is_idempotent(mut fanboy: Fanboy) {
        let followed = author("frail");
        fanboy.start_following(&followed);
        fanboy.start_following(&followed);

        assert!(fanboy.is_following(&followed));
        assert_eq!(fanboy.following.len(), 1);

        fanboy.stop_following(&followed);
        fanboy.stop_following(&followed);
        assert!(!fanboy.is_following(&followed));
    }

    #[rstest]
    fn favorites_track_slugs(mut fanboy: Fanboy) {
        let article = Article::new(
            "Kind Title",
            "kind description",
            "kind body",
            author("kind").email().clone(),
            Vec::<String>::new(),
        )
        .expect("valid article");

        fanboy.favorite(&article);
        assert!(fanboy.has_favorited(article.slug()));

        fanboy.unfavorite(&article);
        assert!(!fanboy.has_favorited(article.slug()));
    }
}
