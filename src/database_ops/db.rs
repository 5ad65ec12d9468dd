use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

use super::schema::SCHEMA;

/// Scoped handle on the pipeline's SQLite store. Cloning shares the pool;
/// each stage receives one explicitly instead of reaching for global state.
#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

/// Row counts of every pipeline table.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableCounts {
    pub tournaments: i64,
    pub player_standings: i64,
    pub cards: i64,
    pub decklist_entries: i64,
    pub matches: i64,
    pub deck_results: i64,
}

impl Db {
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| "invalid sqlite database url")?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("connecting to sqlite")?;
        info!(max_connections, "connected to db");
        Ok(Self { pool })
    }

    /// Private in-memory database on a single pinned connection (tests, dry runs).
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("opening in-memory sqlite")?;
        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Create every pipeline table and index if missing. Idempotent.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .context("creating schema")?;
        Ok(())
    }

    pub async fn table_counts(&self) -> Result<TableCounts> {
        async fn count(db: &Db, table: &str) -> Result<i64> {
            let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&db.pool)
                .await
                .with_context(|| format!("counting {table}"))?;
            Ok(n)
        }
        Ok(TableCounts {
            tournaments: count(self, "tournaments").await?,
            player_standings: count(self, "player_standings").await?,
            cards: count(self, "cards").await?,
            decklist_entries: count(self, "decklist_entries").await?,
            matches: count(self, "matches").await?,
            deck_results: count(self, "deck_results").await?,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
