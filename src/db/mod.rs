//! Schema Introspector (spec §4.1): read-only lookups against the source
//! catalog, exposed as a trait so the graph builder and data-search engine
//! never depend on `sqlx` directly — only [`PgIntrospector`] does. Tests
//! exercise the pure graph/search logic against [`fake::FakeIntrospector`]
//! instead of a live database.

use crate::config::DataSourceConfig;
use crate::error::SliceError;
use crate::schema::{ColumnInfo, FkEdge};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};

// Not gated behind `#[cfg(test)]`: the crate's own integration tests
// (under `tests/`) link against this library as an ordinary dependency,
// where `cfg(test)` does not apply, so the fixture needs to be an
// ordinary public module to be reachable from there too.
pub mod fake;

/// Read-only catalog lookups the graph builder needs (spec §4.1).
///
/// Each method returns the full result for a table; the caller consumes it
/// once and does not expect the introspector to cache or re-order it.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Every FK edge whose parent table is `table` (tables that depend on it).
    async fn children_of(&self, table: &str) -> Result<Vec<FkEdge>, SliceError>;

    /// Every FK edge whose child table is `table` (tables it depends on).
    async fn parents_of(&self, table: &str) -> Result<Vec<FkEdge>, SliceError>;

    /// Ordered (name, info) pairs for every column of `table`.
    async fn columns_of(&self, table: &str) -> Result<Vec<(String, ColumnInfo)>, SliceError>;
}

/// Open a connection pool to the source database named by `cfg`.
///
/// A single connection suffices for this engine's single-threaded,
/// strictly sequential access pattern (spec §5), but a small pool avoids
/// pathological head-of-line blocking if the driver needs a second
/// connection for an internal retry.
pub async fn connect(cfg: &DataSourceConfig) -> Result<PgPool, SliceError> {
    let options = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .database(&cfg.db_name)
        .username(&cfg.username)
        .password(&cfg.password)
        .ssl_mode(if cfg.ssl_enabled {
            sqlx::postgres::PgSslMode::Prefer
        } else {
            sqlx::postgres::PgSslMode::Disable
        });

    PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .map_err(SliceError::from)
}

/// Production [`SchemaIntrospector`] backed by Postgres's `information_schema`.
pub struct PgIntrospector {
    pool: PgPool,
}

impl PgIntrospector {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaIntrospector for PgIntrospector {
    async fn children_of(&self, table: &str) -> Result<Vec<FkEdge>, SliceError> {
        fk_edges_where(&self.pool, "ccu.table_name = $1", table).await
    }

    async fn parents_of(&self, table: &str) -> Result<Vec<FkEdge>, SliceError> {
        fk_edges_where(&self.pool, "tc.table_name = $1", table).await
    }

    async fn columns_of(&self, table: &str) -> Result<Vec<(String, ColumnInfo)>, SliceError> {
        let query = "
            SELECT column_name, is_nullable, data_type
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position";

        let mut rows = sqlx::query(query).bind(table).fetch(&self.pool);
        let mut out = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let name: String = row.try_get("column_name")?;
            let is_nullable: String = row.try_get("is_nullable")?;
            let data_type: String = row.try_get("data_type")?;
            out.push((
                name,
                ColumnInfo {
                    nullable: is_nullable == "YES",
                    data_type: crate::schema::DataType::from_pg_type(&data_type),
                },
            ));
        }

        if out.is_empty() {
            return Err(SliceError::Schema(format!(
                "table '{table}' has no columns (does it exist in the public schema?)"
            )));
        }

        Ok(out)
    }
}

/// Shared query for both traversal directions over
/// `information_schema.table_constraints` / `key_column_usage` /
/// `constraint_column_usage` — the standard ANSI catalog views Postgres
/// exposes for foreign keys, joined the way a manual FK introspection
/// query conventionally is.
async fn fk_edges_where(
    pool: &PgPool,
    filter: &str,
    table: &str,
) -> Result<Vec<FkEdge>, SliceError> {
    let query = format!(
        "
        SELECT
            tc.table_name AS child_table,
            kcu.column_name AS child_column,
            ccu.table_name AS parent_table,
            ccu.column_name AS parent_column
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage ccu
            ON tc.constraint_name = ccu.constraint_name
            AND tc.table_schema = ccu.table_schema
        WHERE tc.constraint_type = 'FOREIGN KEY'
            AND tc.table_schema = 'public'
            AND {filter}"
    );

    let mut rows = sqlx::query(&query).bind(table).fetch(pool);
    let mut out = Vec::new();
    while let Some(row) = rows.try_next().await? {
        out.push(FkEdge {
            child_table: row.try_get("child_table")?,
            child_column: row.try_get("child_column")?,
            parent_table: row.try_get("parent_table")?,
            parent_column: row.try_get("parent_column")?,
        });
    }
    Ok(out)
}
