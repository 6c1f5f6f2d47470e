use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jiff::Timestamp;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use stubby_core::error::{Result, StorageError};
use stubby_core::repository::{ReadRepository, Repository, ShortenedUrl};
use stubby_core::ShortCode;
use tracing::{debug, trace};

const SCHEMA: &str = include_str!("../ddl/postgres/shortened_urls.sql");

/// PostgreSQL implementation of the repository contract.
///
/// Uniqueness of live short codes is enforced by the `UNIQUE (shortcode)`
/// constraint. Deletes are hard deletes, so a deleted code can be allocated
/// again. Timestamps are stored as `TIMESTAMPTZ` with microsecond precision.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new connection pool.
    ///
    /// `acquire_timeout` bounds how long a caller waits for a pooled connection.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `shortened_urls` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("shortened_urls schema is in place");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_timestamp(value: DateTime<Utc>) -> Result<Timestamp> {
    Timestamp::from_microsecond(value.timestamp_micros()).map_err(|e| {
        StorageError::InvalidData(format!("timestamp '{}' out of range: {e}", value))
    })
}

fn record_from_row(row: &PgRow) -> Result<ShortenedUrl> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let shortcode: String = row.try_get("shortcode").map_err(map_sqlx_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(map_sqlx_error)?;
    let access_count: i64 = row.try_get("access_count").map_err(map_sqlx_error)?;

    let access_count = u64::try_from(access_count).map_err(|_| {
        StorageError::InvalidData(format!(
            "negative access_count {} for '{}'",
            access_count, shortcode
        ))
    })?;

    Ok(ShortenedUrl {
        id,
        original_url,
        shortcode: ShortCode::new_unchecked(shortcode),
        created_at: to_timestamp(created_at)?,
        updated_at: to_timestamp(updated_at)?,
        access_count,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for PostgresRepository {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM shortened_urls
            WHERE shortcode = $1
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn get_by_shortcode(&self, code: &ShortCode) -> Result<ShortenedUrl> {
        let row = sqlx::query(
            r#"
            SELECT id, original_url, shortcode, created_at, updated_at, access_count
            FROM shortened_urls
            WHERE shortcode = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(StorageError::NotFound(code.to_string())),
        }
    }

    async fn list_all(&self) -> Result<Vec<ShortenedUrl>> {
        let rows = sqlx::query(
            r#"
            SELECT id, original_url, shortcode, created_at, updated_at, access_count
            FROM shortened_urls
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shortened_urls")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        u64::try_from(count)
            .map_err(|_| StorageError::InvalidData(format!("negative row count {}", count)))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn insert(&self, original_url: &str, code: &ShortCode) -> Result<ShortenedUrl> {
        let result = sqlx::query(
            r#"
            INSERT INTO shortened_urls (original_url, shortcode, created_at, updated_at, access_count)
            VALUES ($1, $2, now(), now(), 0)
            RETURNING id, original_url, shortcode, created_at, updated_at, access_count
            "#,
        )
        .bind(original_url)
        .bind(code.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                trace!(code = %code, "inserted record");
                record_from_row(&row)
            }
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(code.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn update_url(&self, code: &ShortCode, new_url: &str) -> Result<ShortenedUrl> {
        let row = sqlx::query(
            r#"
            UPDATE shortened_urls
            SET original_url = $1,
                updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')
            WHERE shortcode = $2
            RETURNING id, original_url, shortcode, created_at, updated_at, access_count
            "#,
        )
        .bind(new_url)
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(StorageError::NotFound(code.to_string())),
        }
    }

    async fn increment_access_count(&self, code: &ShortCode) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE shortened_urls
            SET access_count = access_count + 1,
                updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')
            WHERE shortcode = $1
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(code.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM shortened_urls
            WHERE shortcode = $1
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(code.to_string()));
        }
        Ok(())
    }
}
