//! Typed error taxonomy for the slice-extraction pipeline.
//!
//! Mirrors the error kinds called out by the engine's design: config,
//! connectivity, schema, cycle, and invariant failures are all fatal and
//! distinguished here so the CLI can report a precise diagnostic and map
//! to the right exit code. Per-table copy failures are *not* part of this
//! enum — they are reported and swallowed by the bulk-load emitter itself.

use thiserror::Error;

/// Errors that can abort the pipeline before completion.
#[derive(Debug, Error)]
pub enum SliceError {
    /// `dataSource.json` missing or malformed.
    #[error("config error: {0}")]
    Config(String),

    /// Could not reach or authenticate against the source database.
    #[error("connectivity error: {0}")]
    Connectivity(sqlx::Error),

    /// A table or column named by the schema no longer exists at query time.
    #[error("schema error: {0}")]
    Schema(String),

    /// Kahn's algorithm terminated with unresolved nodes.
    #[error("cycle in foreign-key graph: {0} of {1} tables left unordered")]
    Cycle(usize, usize),

    /// A structural invariant the engine relies on did not hold.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Wraps I/O failures writing CSVs or the output directory tree.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Postgres SQLSTATE classes that mean the schema disagreed with what
/// discovery saw, not that the connection itself was unreachable — a
/// table or column dropped out from under a long-running extraction, or
/// the introspected FK graph named something that no longer exists at
/// query time.
const SCHEMA_SQLSTATES: &[&str] = &[
    "42P01", // undefined_table
    "42703", // undefined_column
    "42P02", // undefined_parameter
    "3F000", // invalid_schema_name
];

impl From<sqlx::Error> for SliceError {
    /// Most `sqlx::Error`s surface mid-query and mean the database was
    /// unreachable or the connection dropped; route those to
    /// [`SliceError::Connectivity`]. A `Database` error whose SQLSTATE is
    /// in [`SCHEMA_SQLSTATES`] instead means the query was rejected
    /// because a table or column the graph builder introspected is gone
    /// — that's a [`SliceError::Schema`], not a connectivity failure.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if SCHEMA_SQLSTATES.contains(&code.as_ref()) {
                    return SliceError::Schema(db_err.message().to_string());
                }
            }
        }
        SliceError::Connectivity(err)
    }
}

/// Exit code per §6.6: 0 on clean completion, 1 on any fatal error.
pub fn exit_code(result: &anyhow::Result<()>) -> i32 {
    if result.is_ok() {
        0
    } else {
        1
    }
}
