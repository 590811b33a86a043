use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use triage_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Applied to every pooled connection before first use. WAL keeps
/// readers from blocking the writer; the busy timeout rides out seed
/// and migration write bursts.
const CONNECTION_PRAGMAS: &[&str] =
    &["PRAGMA foreign_keys = ON", "PRAGMA journal_mode = WAL", "PRAGMA busy_timeout = 5000"];

/// Open a SQLite pool sized and timed per the `[database]` settings.
pub async fn connect(settings: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(settings.timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                for pragma in CONNECTION_PRAGMAS {
                    sqlx::query(pragma).execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect(&settings.url)
        .await
}

/// Settings for a named shared in-memory database.
#[cfg(test)]
pub(crate) fn memory_settings(name: &str) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite:file:{name}?mode=memory&cache=shared"),
        max_connections: 2,
        timeout_secs: 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{connect, memory_settings};

    #[tokio::test]
    async fn pooled_connections_enforce_foreign_keys() {
        let pool = connect(&memory_settings("connection_pragmas"))
            .await
            .expect("pool should connect");

        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("pragma query");
        assert_eq!(enabled, 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn zero_sized_pools_are_clamped_to_one_connection() {
        let mut settings = memory_settings("connection_clamp");
        settings.max_connections = 0;

        let pool = connect(&settings).await.expect("pool should connect");
        sqlx::query("SELECT 1").execute(&pool).await.expect("query runs");
        pool.close().await;
    }
}
