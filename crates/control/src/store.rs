use chrono::Utc;
use jetbuddy_models::{AnalysisOutput, EngineError, WatchlistItem};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Usage rows older than this are pruned on every insert; only the last minute is read.
const USAGE_RETENTION_SECS: f64 = 3600.0;

fn unix_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// SQLite persistence for the analysis cache, the watchlist and the API usage log.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if needed) the database at `db_url` and applies migrations.
    pub async fn connect(db_url: &str) -> Result<Self, EngineError> {
        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| EngineError::DatabaseError {
                    reason: format!("Cannot create {}: {}", parent.display(), e),
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        // every connection to an in-memory database sees its own database
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;
        Self::new(pool).await
    }

    pub async fn new(pool: SqlitePool) -> Result<Self, EngineError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| EngineError::DatabaseError { reason: e.to_string() })?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Confirms the cache table is reachable.
    pub async fn check_cache(&self) -> Result<(), EngineError> {
        sqlx::query("SELECT COUNT(*) FROM analysis_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, output), fields(symbol = %output.symbol))]
    pub async fn set_cached_analysis(&self, output: &AnalysisOutput) -> Result<(), EngineError> {
        let data = serde_json::to_string(output)?;
        sqlx::query(
            r#"
            INSERT INTO analysis_cache (symbol, data, timestamp) VALUES (?, ?, ?)
            ON CONFLICT (symbol) DO UPDATE SET data = excluded.data, timestamp = excluded.timestamp
            "#,
        )
        .bind(output.symbol.to_uppercase())
        .bind(data)
        .bind(unix_seconds())
        .execute(&self.pool)
        .await?;
        debug!("Cached analysis");
        Ok(())
    }

    pub async fn get_cached_analysis(&self, symbol: &str) -> Result<Option<AnalysisOutput>, EngineError> {
        let row = sqlx::query("SELECT data FROM analysis_cache WHERE symbol = ?")
            .bind(symbol.to_uppercase())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    /// Returns `false` when the (symbol, e-mail) pair was already present.
    #[instrument(skip(self))]
    pub async fn add_to_watchlist(
        &self,
        user_symbol: &str,
        normalized_symbol: &str,
        email: Option<&str>,
    ) -> Result<bool, EngineError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO watchlist (user_symbol, normalized_symbol, email) VALUES (?, ?, ?)",
        )
        .bind(user_symbol)
        .bind(normalized_symbol)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_from_watchlist(&self, id: i64) -> Result<bool, EngineError> {
        let result = sqlx::query("DELETE FROM watchlist WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn full_watchlist(&self) -> Result<Vec<WatchlistItem>, EngineError> {
        let items = sqlx::query_as::<_, WatchlistItem>(
            "SELECT id, user_symbol, normalized_symbol, email FROM watchlist ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn unique_symbols(&self) -> Result<Vec<String>, EngineError> {
        let symbols = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT normalized_symbol FROM watchlist ORDER BY normalized_symbol",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(symbols)
    }

    pub async fn emails_for_symbol(&self, symbol: &str) -> Result<Vec<String>, EngineError> {
        let emails = sqlx::query_scalar::<_, String>(
            r#"
            SELECT email FROM watchlist
            WHERE normalized_symbol = ? AND email IS NOT NULL AND email != ''
            ORDER BY id
            "#,
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    pub async fn log_api_call(&self, provider: &str) -> Result<(), EngineError> {
        let now = unix_seconds();
        sqlx::query("INSERT INTO api_usage_log (api_provider, timestamp) VALUES (?, ?)")
            .bind(provider)
            .bind(now)
            .execute(&self.pool)
            .await?;

        let pruned = sqlx::query("DELETE FROM api_usage_log WHERE timestamp < ?")
            .bind(now - USAGE_RETENTION_SECS)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if pruned > 0 {
            debug!(pruned, "Pruned old API usage rows");
        }
        Ok(())
    }

    pub async fn api_calls_in_last_minute(&self, provider: &str) -> Result<i64, EngineError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM api_usage_log WHERE api_provider = ? AND timestamp > ?",
        )
        .bind(provider)
        .bind(unix_seconds() - 60.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
