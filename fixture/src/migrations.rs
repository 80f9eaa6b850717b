//! Schema migrations applied to every fixture database.
//!
//! The scripts under `fixture/migrations` are embedded at compile time and
//! applied in version order. A runtime directory can replace them through
//! [`SchemaConfig::migrations_dir`].

use config::SchemaConfig;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use tracing::instrument;

/// Migrations embedded from `fixture/migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Versions of the up-migrations known to `migrator`, ascending.
pub fn versions(migrator: &Migrator) -> Vec<i64> {
    let mut versions: Vec<i64> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .collect();
    versions.sort_unstable();
    versions
}

/// Loads the migrations found in `dir` at runtime.
pub async fn from_dir(dir: &std::path::Path) -> Result<Migrator, MigrateError> {
    Migrator::new(dir).await
}

/// Applies every pending migration, embedded or from the configured
/// directory.
#[instrument(skip(pool, schema), fields(dir = ?schema.migrations_dir))]
pub async fn run(pool: &PgPool, schema: &SchemaConfig) -> Result<(), MigrateError> {
    match &schema.migrations_dir {
        Some(dir) => {
            let migrator = from_dir(dir).await?;
            tracing::debug!(
                "Applying {} migrations from {}",
                migrator.iter().count(),
                dir.display()
            );
            migrator.run(pool).await
        }
        None => {
            tracing::debug!("Applying {} embedded migrations", MIGRATOR.iter().count());
            MIGRATOR.run(pool).await
        }
    }
}

/// Versions recorded as successfully applied, ascending.
pub async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_ordered() {
        let versions = versions(&MIGRATOR);
        assert_eq!(
            versions,
            vec![20210301090000, 20210301091500, 20210415120000]
        );
    }

    #[test]
    fn test_embedded_migrations_have_descriptions() {
        for migration in MIGRATOR.iter() {
            assert!(
                !migration.description.is_empty(),
                "migration {} has no description",
                migration.version
            );
        }
    }

    #[tokio::test]
    async fn test_from_dir_orders_by_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2_second.sql"), "SELECT 2;").unwrap();
        std::fs::write(dir.path().join("1_first.sql"), "SELECT 1;").unwrap();

        let migrator = from_dir(dir.path()).await.unwrap();
        assert_eq!(versions(&migrator), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_from_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(from_dir(&missing).await.is_err());
    }
}
