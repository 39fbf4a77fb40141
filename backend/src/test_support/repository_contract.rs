//! Behaviour every repository adapter must exhibit.
//!
//! Each case takes a fresh, empty repository and the clock it was built
//! with. Integration suites call every case once per adapter, so the
//! PostgreSQL and in-memory implementations are held to the same
//! observable semantics. Failures panic with a description of the broken
//! expectation.

use std::collections::BTreeSet;

use mockable::Clock;

use crate::domain::ports::{ListCriteria, Repository, RepositoryError};
use crate::domain::{
    Article, ArticleValidationError, Author, CommentId, CommentValidationError, Email, Slug,
    User, Username,
};

use super::clock::MutableClock;

/// Error type for transforms used by the contract cases.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Article(#[from] ArticleValidationError),
    #[error(transparent)]
    Comment(#[from] CommentValidationError),
    #[error("transform rejected: {0}")]
    Rejected(&'static str),
}

pub fn email(raw: &str) -> Email {
    Email::new(raw).unwrap_or_else(|err| panic!("fixture email {raw:?}: {err}"))
}

pub fn slug(raw: &str) -> Slug {
    Slug::new(raw).unwrap_or_else(|err| panic!("fixture slug {raw:?}: {err}"))
}

pub fn username(raw: &str) -> Username {
    Username::new(raw).unwrap_or_else(|err| panic!("fixture username {raw:?}: {err}"))
}

/// `user@{adj}.com`, username `adj`.
pub fn test_user(adj: &str) -> User {
    User::try_from_strings(format!("user@{adj}.com"), adj, format!("{adj}-hash"))
        .unwrap_or_else(|err| panic!("fixture user {adj}: {err}"))
        .with_bio(format!("{adj} bio"))
        .with_image(format!("https://img.test/{adj}.png"))
}

/// `author@{adj}.com`, username `adj`.
pub fn test_author(adj: &str) -> User {
    let mut author = test_user(adj);
    author.set_email(email(&format!("author@{adj}.com")));
    author
}

/// Article titled `"{adj} title"` by `author@{adj}.com` with three tags.
pub fn test_article(adj: &str) -> Article {
    Article::new(
        format!("{adj} title"),
        format!("{adj} description"),
        format!("{adj} body"),
        email(&format!("author@{adj}.com")),
        [
            format!("{adj} one"),
            format!("{adj} two"),
            format!("{adj} three"),
        ],
    )
    .unwrap_or_else(|err| panic!("fixture article {adj}: {err}"))
}

async fn create_user<R: Repository>(repo: &R, user: &User) -> User {
    repo.create_user(user)
        .await
        .unwrap_or_else(|err| panic!("create user {}: {err}", user.email()))
}

async fn create_article<R: Repository>(repo: &R, article: &Article) {
    repo.create_article(article)
        .await
        .unwrap_or_else(|err| panic!("create article {}: {err}", article.slug()));
}

fn slugs(articles: &[crate::domain::AuthoredArticle]) -> Vec<String> {
    articles
        .iter()
        .map(|authored| authored.article.slug().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Email and username are each unique; lookups find what was created.
pub async fn users_are_unique_and_resolvable<R: Repository>(repo: &R, _clock: &MutableClock) {
    let created = create_user(repo, &test_user("tender")).await;
    assert_eq!(created, test_user("tender"));

    let mut same_email = test_user("other");
    same_email.set_email(email("user@tender.com"));
    assert_eq!(
        repo.create_user(&same_email).await,
        Err(RepositoryError::DuplicateUser)
    );

    let mut same_username = test_user("other");
    same_username.set_username(username("tender"));
    assert_eq!(
        repo.create_user(&same_username).await,
        Err(RepositoryError::DuplicateUser)
    );

    create_user(repo, &test_user("other")).await;

    let found = repo
        .get_user_by_username(&username("tender"))
        .await
        .expect("user by username");
    assert_eq!(found.email().as_ref(), "user@tender.com");
    assert_eq!(found.password().expose(), "tender-hash");
    assert_eq!(
        repo.get_user_by_username(&username("absent")).await,
        Err(RepositoryError::UserNotFound)
    );

    let fanboy = repo
        .get_user_by_email(&email("USER@Tender.com"))
        .await
        .expect("user by email");
    assert_eq!(fanboy.user, created);
    assert!(fanboy.following.is_empty());
    assert!(fanboy.favorites.is_empty());
    assert_eq!(
        repo.get_user_by_email(&email("user@absent.com")).await,
        Err(RepositoryError::UserNotFound)
    );

    let author = repo
        .get_author_by_email(&email("user@tender.com"))
        .await
        .expect("author present");
    assert_eq!(author.bio(), "tender bio");
    assert_eq!(author.image(), "https://img.test/tender.png");
    assert!(repo.get_author_by_email(&email("user@absent.com")).await.is_none());
}

/// Updates rewrite the row found by the original email and honour
/// uniqueness.
pub async fn user_updates_follow_the_new_key<R: Repository>(repo: &R, _clock: &MutableClock) {
    create_user(repo, &test_user("lively")).await;
    create_user(repo, &test_user("quiet")).await;

    let updated = repo
        .update_user_by_email(&email("user@lively.com"), |mut user| {
            user.set_email(email("user@renamed.com"));
            user.set_bio("renamed bio");
            Ok::<_, RepositoryError>(user)
        })
        .await
        .expect("rename succeeds");
    assert_eq!(updated.email().as_ref(), "user@renamed.com");
    assert_eq!(updated.bio(), "renamed bio");
    assert_eq!(updated.password().expose(), "lively-hash");

    assert_eq!(
        repo.get_user_by_email(&email("user@lively.com")).await,
        Err(RepositoryError::UserNotFound)
    );

    let clash = repo
        .update_user_by_email(&email("user@renamed.com"), |mut user| {
            user.set_username(username("quiet"));
            user.set_bio("never stored");
            Ok::<_, RepositoryError>(user)
        })
        .await;
    assert_eq!(clash, Err(RepositoryError::DuplicateUser));
    let unchanged = repo
        .get_user_by_email(&email("user@renamed.com"))
        .await
        .expect("user still present");
    assert_eq!(unchanged.user.bio(), "renamed bio");
    assert_eq!(unchanged.user.username().as_ref(), "lively");

    let missing = repo
        .update_user_by_email(&email("user@absent.com"), Ok::<_, RepositoryError>)
        .await;
    assert_eq!(missing, Err(RepositoryError::UserNotFound));
}

/// Follow and favorite sets are replaced wholesale; unknown keys vanish.
pub async fn fanboy_edges_are_fully_replaced<R: Repository>(repo: &R, _clock: &MutableClock) {
    let fan = create_user(repo, &test_user("devoted")).await;
    for adj in ["adoring", "brash", "candid"] {
        create_user(repo, &test_author(adj)).await;
        create_article(repo, &test_article(adj)).await;
    }

    repo.update_fanboy_by_email(fan.email(), |mut fanboy| {
        fanboy.following.replace(["author@adoring.com", "author@brash.com"]);
        fanboy.favorites.replace(["adoring-title", "brash-title"]);
        Ok::<_, RepositoryError>(fanboy)
    })
    .await
    .expect("first replace");

    repo.update_fanboy_by_email(fan.email(), |mut fanboy| {
        fanboy.following.replace([
            "author@brash.com",
            "AUTHOR@candid.com",
            "ghost@nowhere.com",
        ]);
        fanboy.favorites.replace(["candid-title", "missing-title"]);
        Ok::<_, RepositoryError>(fanboy)
    })
    .await
    .expect("second replace");

    let fanboy = repo.get_user_by_email(fan.email()).await.expect("fan");
    assert_eq!(
        fanboy.following.to_vec(),
        vec!["author@brash.com".to_owned(), "author@candid.com".to_owned()]
    );
    assert_eq!(fanboy.favorites.to_vec(), vec!["candid-title".to_owned()]);
    assert!(fanboy.is_following(&test_author("candid")));
    assert!(!fanboy.is_following(&test_author("adoring")));

    let candid = repo
        .get_article_by_slug(&slug("candid-title"))
        .await
        .expect("candid article");
    assert_eq!(candid.favorite_count, 1);
    let adoring = repo
        .get_article_by_slug(&slug("adoring-title"))
        .await
        .expect("adoring article");
    assert_eq!(adoring.favorite_count, 0);

    let favorited = repo
        .latest_articles_by_criteria(&ListCriteria::default().favorited_by(fan.email().clone()))
        .await
        .expect("favorited listing");
    assert_eq!(slugs(&favorited), vec!["candid-title".to_owned()]);

    // The user row is never rewritten by a fanboy update.
    repo.update_fanboy_by_email(fan.email(), |mut fanboy| {
        fanboy.user.set_bio("ignored");
        Ok::<_, RepositoryError>(fanboy)
    })
    .await
    .expect("bio change ignored");
    let fanboy = repo.get_user_by_email(fan.email()).await.expect("fan");
    assert_eq!(fanboy.user.bio(), "devoted bio");

    let missing = repo
        .update_fanboy_by_email(&email("user@absent.com"), Ok::<_, RepositoryError>)
        .await;
    assert_eq!(missing, Err(RepositoryError::UserNotFound));
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// Creation needs an author and a free slug; updates keep `created_at`
/// and attribution survives an author's email change.
pub async fn articles_need_an_author_and_a_unique_slug<R: Repository>(
    repo: &R,
    clock: &MutableClock,
) {
    let article = test_article("hospitable");
    assert_eq!(
        repo.create_article(&article).await,
        Err(RepositoryError::NoAuthor)
    );

    let author = create_user(repo, &test_author("hospitable")).await;

    let before = clock.utc();
    clock.advance_seconds(1);
    let created = repo.create_article(&article).await.expect("article created");
    assert_eq!(created.article.slug(), article.slug());
    assert_eq!(created.article.title(), article.title());
    assert_eq!(created.article.body(), article.body());
    assert_eq!(created.article.tags(), article.tags());
    assert_eq!(created.favorite_count, 0);
    assert_eq!(created.author, author.profile());
    assert!(created.article.created_at() > before);
    assert_eq!(created.article.created_at(), created.article.updated_at());

    assert_eq!(
        repo.create_article(&test_article("hospitable")).await,
        Err(RepositoryError::DuplicateArticle)
    );

    clock.advance_seconds(1);
    let now = clock.utc();
    let mut replacement = test_article("enchanting");
    replacement
        .set_title("hospitable title")
        .expect("valid title");
    replacement.set_author_email(author.email().clone());
    let updated = repo
        .update_article_by_slug(article.slug(), move |_| {
            Ok::<_, RepositoryError>(replacement)
        })
        .await
        .expect("article replaced");
    assert_eq!(updated.article.slug().as_ref(), "hospitable-title");

    let fetched = repo
        .get_article_by_slug(&slug("hospitable-title"))
        .await
        .expect("article present");
    assert_eq!(fetched.article.body(), "enchanting body");
    assert!(fetched.article.tags().contains("enchanting one"));
    assert!(!fetched.article.tags().contains("hospitable one"));
    assert!(fetched.article.created_at() < now);
    assert_eq!(fetched.article.created_at(), created.article.created_at());
    assert!(fetched.article.updated_at() >= now);

    repo.update_user_by_email(author.email(), |mut user| {
        user.set_email(email("author@whole.com"));
        Ok::<_, RepositoryError>(user)
    })
    .await
    .expect("author renamed");
    let fetched = repo
        .get_article_by_slug(&slug("hospitable-title"))
        .await
        .expect("article present");
    assert_eq!(fetched.article.author_email().as_ref(), "author@whole.com");
    assert_eq!(fetched.author.email.as_ref(), "author@whole.com");

    let orphaned = repo
        .update_article_by_slug(&slug("hospitable-title"), |mut article| {
            article.set_author_email(email("author@nobody.com"));
            Ok::<_, RepositoryError>(article)
        })
        .await;
    assert_eq!(orphaned, Err(RepositoryError::NoAuthor));
}

/// Retitling moves the article to a new slug; collisions abort.
pub async fn slugs_follow_title_changes<R: Repository>(repo: &R, clock: &MutableClock) {
    create_user(repo, &test_author("observant")).await;
    clock.advance_seconds(1);
    let created = repo
        .create_article(&test_article("observant"))
        .await
        .expect("article created");

    assert_eq!(
        repo.get_article_by_slug(&slug("befitting-title")).await,
        Err(RepositoryError::ArticleNotFound)
    );

    clock.advance_seconds(1);
    repo.update_article_by_slug(&slug("observant-title"), |mut article| {
        article.set_title("silent title")?;
        Ok::<_, TransformError>(article)
    })
    .await
    .expect("retitled");
    assert_eq!(
        repo.get_article_by_slug(&slug("observant-title")).await,
        Err(RepositoryError::ArticleNotFound)
    );
    let silent = repo
        .get_article_by_slug(&slug("silent-title"))
        .await
        .expect("new slug resolves");
    assert!(silent.article.updated_at() > created.article.created_at());
    assert_eq!(silent.article.created_at(), created.article.created_at());

    create_user(repo, &test_author("modern")).await;
    create_article(repo, &test_article("modern")).await;
    let collision = repo
        .update_article_by_slug(&slug("silent-title"), |mut article| {
            article.set_title("modern title")?;
            article.set_tags(["clashing tag"]);
            Ok::<_, TransformError>(article)
        })
        .await;
    assert_eq!(
        collision,
        Err(TransformError::Repository(RepositoryError::DuplicateArticle))
    );
    let still_silent = repo
        .get_article_by_slug(&slug("silent-title"))
        .await
        .expect("collision rolled back");
    assert_eq!(still_silent.article.title(), "silent title");
    assert_eq!(still_silent.article.tags(), silent.article.tags());
    assert!(!repo.distinct_tags().await.expect("tags").contains("clashing tag"));

    let missing = repo
        .update_article_by_slug(&slug("absent-title"), Ok::<_, RepositoryError>)
        .await;
    assert_eq!(missing, Err(RepositoryError::ArticleNotFound));
}

/// `updated_at` strictly increases even when the clock stands still or
/// steps backwards.
pub async fn updated_at_strictly_advances<R: Repository>(repo: &R, clock: &MutableClock) {
    create_user(repo, &test_author("steady")).await;
    let created = repo
        .create_article(&test_article("steady"))
        .await
        .expect("article created");

    let first = repo
        .update_article_by_slug(created.article.slug(), |mut article| {
            article.set_body("first edit");
            Ok::<_, RepositoryError>(article)
        })
        .await
        .expect("first edit");
    assert!(first.article.updated_at() > created.article.updated_at());

    clock.rewind_seconds(60);
    let second = repo
        .update_article_by_slug(created.article.slug(), |mut article| {
            article.set_body("second edit");
            Ok::<_, RepositoryError>(article)
        })
        .await
        .expect("second edit");
    assert!(second.article.updated_at() > first.article.updated_at());
    assert_eq!(second.article.created_at(), created.article.created_at());
}

/// A failing transform leaves storage untouched and its error intact.
pub async fn transform_errors_roll_back<R: Repository>(repo: &R, _clock: &MutableClock) {
    let fan = create_user(repo, &test_user("wary")).await;
    create_user(repo, &test_author("cautious")).await;
    create_article(repo, &test_article("cautious")).await;

    let rejected = repo
        .update_article_by_slug(&slug("cautious-title"), |mut article| {
            article.set_body("half-applied");
            Err::<Article, _>(TransformError::Rejected("no edits today"))
        })
        .await;
    assert_eq!(rejected, Err(TransformError::Rejected("no edits today")));
    let article = repo
        .get_article_by_slug(&slug("cautious-title"))
        .await
        .expect("article present");
    assert_eq!(article.article.body(), "cautious body");

    repo.update_fanboy_by_email(fan.email(), |mut fanboy| {
        fanboy.following.insert("author@cautious.com");
        Ok::<_, RepositoryError>(fanboy)
    })
    .await
    .expect("follow");
    let rejected = repo
        .update_fanboy_by_email(fan.email(), |mut fanboy| {
            fanboy.following.replace(Vec::<String>::new());
            Err::<crate::domain::Fanboy, _>(TransformError::Rejected("keep following"))
        })
        .await;
    assert_eq!(rejected, Err(TransformError::Rejected("keep following")));
    let fanboy = repo.get_user_by_email(fan.email()).await.expect("fan");
    assert!(fanboy.following.contains("author@cautious.com"));

    let rejected = repo
        .update_user_by_email(fan.email(), |mut user| {
            user.set_bio("half-applied");
            Err::<User, _>(TransformError::Rejected("read only"))
        })
        .await;
    assert_eq!(rejected, Err(TransformError::Rejected("read only")));
    let fanboy = repo.get_user_by_email(fan.email()).await.expect("fan");
    assert_eq!(fanboy.user.bio(), "wary bio");
}

/// Deleting removes the article and everything attached to it.
pub async fn deleted_articles_disappear<R: Repository>(repo: &R, _clock: &MutableClock) {
    let author = create_user(
        repo,
        &User::try_from_strings("a@x.com", "a", "a-hash").expect("valid user"),
    )
    .await;
    let article = Article::new("a title", "", "", author.email().clone(), ["a tag"])
        .expect("valid article");
    let created = repo.create_article(&article).await.expect("article created");
    assert_eq!(created.article.slug().as_ref(), "a-title");

    repo.update_fanboy_by_email(author.email(), |mut fanboy| {
        fanboy.favorites.insert("a-title");
        Ok::<_, RepositoryError>(fanboy)
    })
    .await
    .expect("favorite");
    repo.update_comments_by_slug(&slug("a-title"), |mut commented| {
        commented.add_comment("first", email("a@x.com"))?;
        Ok::<_, TransformError>(commented)
    })
    .await
    .expect("comment");

    repo.delete_article(Some(&created.article))
        .await
        .expect("delete succeeds");
    assert_eq!(
        repo.get_article_by_slug(&slug("a-title")).await,
        Err(RepositoryError::ArticleNotFound)
    );
    assert!(!repo.distinct_tags().await.expect("tags").contains("a tag"));
    let fanboy = repo.get_user_by_email(author.email()).await.expect("author");
    assert!(fanboy.favorites.is_empty());

    repo.delete_article(Some(&created.article))
        .await
        .expect("deleting twice is not an error");
    repo.delete_article(None)
        .await
        .expect("deleting nothing is not an error");

    let recreated = repo
        .create_article(&article)
        .await
        .expect("slug is free again");
    assert_eq!(recreated.favorite_count, 0);
    let commented = repo
        .get_comments_by_slug(&slug("a-title"))
        .await
        .expect("recreated article");
    assert!(commented.comments().is_empty());
}

const LISTING_TAG: &str = "latest-articles";
const LISTING_ADJECTIVES: [&str; 13] = [
    "bright",
    "colorful",
    "sour",
    "fantastic",
    "mellow",
    "splendid",
    "gruesome",
    "madly",
    "kind",
    "organic",
    "public",
    "flagrant",
    "waggish",
];

/// Listings are newest first, stable across calls, and filterable.
pub async fn latest_articles_page_newest_first<R: Repository>(repo: &R, clock: &MutableClock) {
    let authors = [
        test_author("frail"),
        test_author("simple"),
        test_author("reminiscent"),
    ];
    for author in &authors {
        create_user(repo, author).await;
    }

    let mut source = BTreeSet::new();
    for (i, adj) in LISTING_ADJECTIVES.iter().enumerate() {
        let mut article = test_article(adj);
        article.set_author_email(authors[i % 3].email().clone());
        let mut tags: Vec<String> = article.tags().iter().cloned().collect();
        tags.push(LISTING_TAG.to_owned());
        article.set_tags(tags);

        clock.advance_seconds(1);
        create_article(repo, &article).await;
        source.insert(article.slug().to_string());
    }

    let all = repo
        .latest_articles_by_criteria(&ListCriteria::default().tagged(LISTING_TAG).page(13, 0))
        .await
        .expect("all tagged");
    assert_eq!(slugs(&all).into_iter().collect::<BTreeSet<_>>(), source);
    assert_eq!(all.first().map(|a| a.article.slug().as_ref()), Some("waggish-title"));

    let page = ListCriteria::default().tagged(LISTING_TAG).page(5, 2);
    let some = repo
        .latest_articles_by_criteria(&page)
        .await
        .expect("paged");
    assert_eq!(
        slugs(&some),
        vec![
            "public-title",
            "organic-title",
            "kind-title",
            "madly-title",
            "gruesome-title",
        ]
    );
    let again = repo
        .latest_articles_by_criteria(&page)
        .await
        .expect("paged again");
    assert_eq!(slugs(&again), slugs(&some));

    let authored = repo
        .latest_articles_by_criteria(
            &ListCriteria::default()
                .tagged(LISTING_TAG)
                .authored_by([email("author@frail.com"), email("author@simple.com")]),
        )
        .await
        .expect("authored by");
    assert_eq!(authored.len(), 9);
    assert!(
        authored
            .iter()
            .all(|a| a.article.author_email().as_ref() != "author@reminiscent.com")
    );

    let by_default = repo
        .latest_articles_by_criteria(&ListCriteria::default())
        .await
        .expect("default criteria");
    assert_eq!(by_default.len(), 13);

    let single_tag = repo
        .latest_articles_by_criteria(&ListCriteria::default().tagged("kind one"))
        .await
        .expect("single tag");
    assert_eq!(slugs(&single_tag), vec!["kind-title"]);

    let empty_page = repo
        .latest_articles_by_criteria(&ListCriteria::default().page(0, 0))
        .await
        .expect("empty page");
    assert!(empty_page.is_empty());

    let unknown_fan = repo
        .latest_articles_by_criteria(
            &ListCriteria::default().favorited_by(email("user@absent.com")),
        )
        .await
        .expect("unknown favoriting user");
    assert!(unknown_fan.is_empty());
}

/// Articles created at the same instant are ordered by slug.
pub async fn listing_ties_break_by_slug<R: Repository>(repo: &R, _clock: &MutableClock) {
    create_user(repo, &test_author("tied")).await;
    for adj in ["zesty", "airy", "mossy"] {
        let mut article = test_article(adj);
        article.set_author_email(email("author@tied.com"));
        create_article(repo, &article).await;
    }

    let listed = repo
        .latest_articles_by_criteria(&ListCriteria::default())
        .await
        .expect("listing");
    assert_eq!(
        slugs(&listed),
        vec!["airy-title", "mossy-title", "zesty-title"]
    );
}

// ---------------------------------------------------------------------------
// Comments and tags
// ---------------------------------------------------------------------------

/// Drafts are inserted with fresh ids; removed comments are deleted.
pub async fn comments_are_added_and_removed<R: Repository>(repo: &R, clock: &MutableClock) {
    create_user(repo, &test_user("simplistic")).await;
    create_user(repo, &test_author("envious")).await;
    for adj in ["tedious", "polite", "divergent"] {
        let mut article = test_article(adj);
        article.set_author_email(email("author@envious.com"));
        create_article(repo, &article).await;
    }

    let before = clock.utc();
    clock.advance_seconds(1);
    let first = repo
        .update_comments_by_slug(&slug("tedious-title"), |mut commented| {
            commented.add_comment("enchanting body", email("user@simplistic.com"))?;
            Ok::<_, TransformError>(commented)
        })
        .await
        .expect("first comment")
        .expect("inserted comment is returned");
    assert!(first.id().get() > 0);
    assert_eq!(first.body(), "enchanting body");
    assert_eq!(first.author_email().as_ref(), "user@simplistic.com");
    assert!(first.created_at() > before);

    let second = repo
        .update_comments_by_slug(&slug("tedious-title"), |mut commented| {
            commented.add_comment("quirky body", email("user@simplistic.com"))?;
            Ok::<_, TransformError>(commented)
        })
        .await
        .expect("second comment")
        .expect("inserted comment is returned");
    assert!(second.id() > first.id());

    let commented = repo
        .get_comments_by_slug(&slug("tedious-title"))
        .await
        .expect("comments");
    assert_eq!(commented.comments().len(), 2);
    assert_eq!(commented.comments()[0].id(), first.id());
    assert!(commented.pending_comments().is_empty());

    let removed = repo
        .update_comments_by_slug(&slug("tedious-title"), |mut commented| {
            commented.remove_comment(first.id());
            Ok::<_, TransformError>(commented)
        })
        .await
        .expect("remove comment");
    assert_eq!(removed.as_ref().map(|c| c.id()), Some(first.id()));

    let commented = repo
        .get_comments_by_slug(&slug("tedious-title"))
        .await
        .expect("comments");
    let remaining = commented.comments();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].body(), "quirky body");
    assert_eq!(remaining[0].author_email().as_ref(), "user@simplistic.com");
    assert!(remaining[0].created_at() > before);

    let untouched = repo
        .update_comments_by_slug(&slug("tedious-title"), |mut commented| {
            commented.remove_comment(CommentId::new(i64::MAX));
            Ok::<_, TransformError>(commented)
        })
        .await
        .expect("absent id is a no-op");
    assert_eq!(untouched, None);

    let orphan = repo
        .update_comments_by_slug(&slug("polite-title"), |mut commented| {
            commented.add_comment("who wrote this", email("user@absent.com"))?;
            Ok::<_, TransformError>(commented)
        })
        .await;
    assert_eq!(
        orphan,
        Err(TransformError::Repository(RepositoryError::NoAuthor))
    );
    let polite = repo
        .get_comments_by_slug(&slug("polite-title"))
        .await
        .expect("comments");
    assert!(polite.comments().is_empty());

    let blank = repo
        .update_comments_by_slug(&slug("divergent-title"), |mut commented| {
            commented.add_comment("   ", email("user@simplistic.com"))?;
            Ok::<_, TransformError>(commented)
        })
        .await;
    assert_eq!(
        blank,
        Err(TransformError::Comment(CommentValidationError::EmptyBody))
    );

    assert_eq!(
        repo.get_comments_by_slug(&slug("absent-title")).await,
        Err(RepositoryError::ArticleNotFound)
    );
    let missing = repo
        .update_comments_by_slug(&slug("absent-title"), Ok::<_, RepositoryError>)
        .await;
    assert_eq!(missing, Err(RepositoryError::ArticleNotFound));
}

/// The tag vocabulary never repeats a tag.
pub async fn distinct_tags_are_deduplicated<R: Repository>(repo: &R, _clock: &MutableClock) {
    const SHARED: &str = "distinct-tags";

    create_user(repo, &test_author("threatening")).await;
    for adj in ["stimulating", "exultant", "helpless"] {
        let mut article = test_article(adj);
        article.set_author_email(email("author@threatening.com"));
        let mut tags: Vec<String> = article.tags().iter().cloned().collect();
        tags.push(SHARED.to_owned());
        article.set_tags(tags);
        create_article(repo, &article).await;
    }

    let tags = repo.distinct_tags().await.expect("tags");
    assert!(tags.contains("stimulating one"));
    assert!(tags.contains("stimulating two"));
    assert!(tags.contains("helpless three"));
    assert!(tags.contains(SHARED));
    assert_eq!(tags.len(), 10);
}
