//! Per-test databases cloned from a migrated template.
//!
//! The template name carries a hash of `backend/migrations`, so editing a
//! migration provisions a fresh template instead of reusing a stale one.
//! Schema setup goes through the crate's own migration runner.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use conduit_backend::domain::ports::RepositoryError;
use conduit_backend::outbound::persistence::run_migrations;
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

use super::format_postgres_error;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "conduit_template";
const TEMPLATE_PROVISION_RETRIES: usize = 5;
const TEMPLATE_PROVISION_RETRY_DELAY: Duration = Duration::from_millis(500);

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, RepositoryError> {
    let hash = hash_directory(migrations_dir())
        .map_err(|err| RepositoryError::query(format!("hash migrations: {err}")))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, RepositoryError> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| RepositoryError::query(format!("template check: {err:?}")))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| RepositoryError::query(format!("create template: {err:?}")))?;
        migrate_schema(&cluster.connection().database_url(&template_name))?;
    }
    Ok(template_name)
}

fn provision_attempt(
    cluster: &ClusterHandle,
    attempt: usize,
) -> Result<TemporaryDatabase, RepositoryError> {
    let template_name = ensure_template_database(cluster).map_err(|err| {
        RepositoryError::query(format!(
            "template: attempt {attempt}/{TEMPLATE_PROVISION_RETRIES}: {err}"
        ))
    })?;
    let db_name = format!("test_{}", Uuid::new_v4().simple());
    cluster
        .temporary_database_from_template(db_name.as_str(), template_name.as_str())
        .map_err(|err| {
            RepositoryError::query(format!(
                "create database from template: attempt {attempt}/{TEMPLATE_PROVISION_RETRIES}: {err:?}"
            ))
        })
}

/// A temporary database with the current schema, dropped with the handle.
pub fn provision_template_database(
    cluster: &ClusterHandle,
) -> Result<TemporaryDatabase, RepositoryError> {
    let mut last_error = None;
    for attempt in 1..=TEMPLATE_PROVISION_RETRIES {
        match provision_attempt(cluster, attempt) {
            Ok(database) => return Ok(database),
            Err(err) => last_error = Some(err),
        }
        if attempt < TEMPLATE_PROVISION_RETRIES {
            std::thread::sleep(TEMPLATE_PROVISION_RETRY_DELAY);
        }
    }
    Err(last_error
        .unwrap_or_else(|| RepositoryError::query("create database from template: no attempts")))
}

/// Apply all pending migrations to `url`.
pub fn migrate_schema(url: &str) -> Result<Vec<String>, RepositoryError> {
    run_migrations(url).map_err(|err| RepositoryError::query(err.to_string()))
}

/// Open a side connection to `url`, outside the repository's pool.
pub fn connect(url: &str) -> Result<Client, RepositoryError> {
    Client::connect(url, NoTls)
        .map_err(|err| RepositoryError::connection(format_postgres_error(&err)))
}

/// Run `sql` on `client`.
pub fn execute_sql(client: &mut Client, sql: &str) -> Result<(), RepositoryError> {
    client
        .batch_execute(sql)
        .map_err(|err| RepositoryError::query(format_postgres_error(&err)))
}

/// Drop `table` to simulate schema loss.
pub fn drop_table(url: &str, table: &str) -> Result<(), RepositoryError> {
    let mut client = connect(url)?;
    execute_sql(&mut client, &format!("DROP TABLE IF EXISTS {table} CASCADE;"))
}
