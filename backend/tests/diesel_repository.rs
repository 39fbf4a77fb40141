//! Repository contract cases against PostgreSQL.
//!
//! Each test provisions its own database from a migrated template on the
//! shared embedded cluster. Set `SKIP_TEST_CLUSTER=1` where the cluster
//! cannot start.
//!
//! Cases run on a Tokio runtime owned by the test rather than under
//! `#[tokio::test]`, because the cluster bootstrap blocks and must not run
//! inside a runtime.

use std::sync::Arc;
use std::time::Duration;

use conduit_backend::domain::ports::{ArticleRepository, RepositoryError, UserRepository};
use conduit_backend::outbound::persistence::{DbPool, DieselRepository, PoolConfig};
use conduit_backend::test_support::clock::MutableClock;
use conduit_backend::test_support::repository_contract as contract;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod support;

use support::embedded_postgres::{connect, drop_table, execute_sql, migrate_schema};
use support::pg_embed::shared_cluster;
use support::{handle_cluster_setup_failure, provision_template_database};

struct Harness {
    runtime: Runtime,
    repository: DieselRepository,
    clock: Arc<MutableClock>,
    database_url: String,
    _database: TemporaryDatabase,
}

fn setup_harness() -> Result<Harness, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster).map_err(|err| err.to_string())?;
    let database_url = database.url().to_string();

    let config = PoolConfig::new(&database_url)
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    let clock = Arc::new(MutableClock::at_epoch_of_tests());
    Ok(Harness {
        runtime,
        repository: DieselRepository::with_clock(pool, clock.clone()),
        clock,
        database_url,
        _database: database,
    })
}

#[fixture]
fn harness() -> Option<Harness> {
    match setup_harness() {
        Ok(harness) => Some(harness),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

macro_rules! contract_cases {
    ($($case:ident),* $(,)?) => {
        $(
            #[rstest]
            fn $case(harness: Option<Harness>) {
                let Some(harness) = harness else { return };
                harness
                    .runtime
                    .block_on(contract::$case(&harness.repository, &harness.clock));
            }
        )*
    };
}

contract_cases!(
    users_are_unique_and_resolvable,
    user_updates_follow_the_new_key,
    fanboy_edges_are_fully_replaced,
    articles_need_an_author_and_a_unique_slug,
    slugs_follow_title_changes,
    updated_at_strictly_advances,
    transform_errors_roll_back,
    deleted_articles_disappear,
    latest_articles_page_newest_first,
    listing_ties_break_by_slug,
    comments_are_added_and_removed,
    distinct_tags_are_deduplicated,
);

#[rstest]
fn migrating_a_current_schema_applies_nothing(harness: Option<Harness>) {
    let Some(harness) = harness else { return };

    let applied = migrate_schema(&harness.database_url).expect("migrations rerun");
    assert!(applied.is_empty(), "unexpected migrations: {applied:?}");
    let applied = migrate_schema(&harness.database_url).expect("migrations rerun");
    assert!(applied.is_empty(), "unexpected migrations: {applied:?}");
}

#[rstest]
fn storage_failures_surface_as_query_errors(harness: Option<Harness>) {
    let Some(harness) = harness else { return };
    harness.runtime.block_on(async {
        harness
            .repository
            .create_user(&contract::test_author("fragile"))
            .await
            .expect("author created");
    });

    drop_table(&harness.database_url, "article_tags").expect("drop succeeds");

    let result = harness.runtime.block_on(
        harness
            .repository
            .create_article(&contract::test_article("fragile")),
    );
    match result {
        Err(RepositoryError::Query { message }) => {
            assert!(
                message.contains("article_tags"),
                "message should name the missing table: {message}"
            );
        }
        other => panic!("expected a query error, got {other:?}"),
    }

    let missing = harness.runtime.block_on(
        harness
            .repository
            .get_article_by_slug(&contract::slug("fragile-title")),
    );
    assert_eq!(missing, Err(RepositoryError::ArticleNotFound));
}

#[rstest]
fn author_lookup_swallows_storage_failures(harness: Option<Harness>) {
    let Some(harness) = harness else { return };
    drop_table(&harness.database_url, "users").expect("drop succeeds");

    let author = harness.runtime.block_on(
        harness
            .repository
            .get_author_by_email(&contract::email("author@gone.com")),
    );
    assert!(author.is_none());
}

#[rstest]
fn users_without_credentials_are_not_authors(harness: Option<Harness>) {
    let Some(harness) = harness else { return };
    let mut client = connect(&harness.database_url).expect("side connection");
    execute_sql(
        &mut client,
        "INSERT INTO users (email, username, bio, image) VALUES ('ghost@x.com', 'ghost', '', '');",
    )
    .expect("bare user row inserted");

    let ghost = contract::email("ghost@x.com");
    harness.runtime.block_on(async {
        assert_eq!(
            harness.repository.get_user_by_email(&ghost).await.err(),
            Some(RepositoryError::UserNotFound)
        );
        assert!(harness.repository.get_author_by_email(&ghost).await.is_none());
    });
}

#[rstest]
fn cancelled_updates_leave_no_trace(harness: Option<Harness>) {
    let Some(harness) = harness else { return };
    let user = contract::test_user("patient");
    harness.runtime.block_on(async {
        harness
            .repository
            .create_user(&user)
            .await
            .expect("user created");
    });

    let mut locker = connect(&harness.database_url).expect("side connection");
    execute_sql(
        &mut locker,
        "BEGIN; UPDATE users SET bio = bio WHERE email = 'user@patient.com';",
    )
    .expect("row lock taken");

    let cancelled = harness.runtime.block_on(tokio::time::timeout(
        Duration::from_millis(200),
        harness
            .repository
            .update_user_by_email(user.email(), |mut user| {
                user.set_bio("abandoned bio");
                Ok::<_, RepositoryError>(user)
            }),
    ));
    assert!(cancelled.is_err(), "update should still be waiting on the lock");

    execute_sql(&mut locker, "ROLLBACK;").expect("row lock released");

    harness.runtime.block_on(async {
        let stored = harness
            .repository
            .get_user_by_username(user.username())
            .await
            .expect("pool still serves reads");
        assert_eq!(stored.bio(), "patient bio");

        let updated = harness
            .repository
            .update_user_by_email(user.email(), |mut user| {
                user.set_bio("settled bio");
                Ok::<_, RepositoryError>(user)
            })
            .await
            .expect("pool still serves updates");
        assert_eq!(updated.bio(), "settled bio");
    });
}
