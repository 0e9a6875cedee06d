//! Bulk-Load Emitter (spec §4.6): one `\copy <T> FROM <path> CSV` command
//! per table, in global topological order (parents first), spawned
//! against the destination database. Grounded on the teacher's
//! `Command::new("dot")` pattern in `src/cmd/graph.rs` — spawn, capture the
//! "binary not found" case distinctly, and don't let one failure abort the
//! run.
//!
//! Per spec §4.5's resolved Open Question, the in-process streaming path
//! in [`crate::search`] is the only extraction mechanism; this module only
//! ever targets the destination side of a slice (loading what was
//! extracted), never the source read.

use crate::config::DataSourceConfig;
use crate::csv_writer::DELIMITER;
use std::path::Path;
use std::process::Command;

/// Outcome of spawning one table's `\copy … FROM` command.
pub struct CopyResult {
    pub table: String,
    pub success: bool,
    pub detail: String,
}

/// Build the `\copy` statement text for loading `table` from `path`.
pub fn copy_statement(table: &str, path: &Path) -> String {
    format!(
        "\\copy \"{table}\" FROM '{}' CSV DELIMITER E'\\x{:02x}'",
        path.display(),
        DELIMITER
    )
}

/// Spawn `copy_bin` (a psql-compatible client) against `cfg`'s destination,
/// running one `\copy … FROM` command. Failure to find or run the binary,
/// or a non-zero exit, is reported in the returned [`CopyResult`] rather
/// than propagated — per spec §7, per-command copy failures do not abort
/// the pipeline.
pub fn run_copy(copy_bin: &str, cfg: &DataSourceConfig, table: &str, path: &Path) -> CopyResult {
    let statement = copy_statement(table, path);

    let output = Command::new(copy_bin)
        .arg("--host")
        .arg(&cfg.host)
        .arg("--port")
        .arg(cfg.port.to_string())
        .arg("--username")
        .arg(&cfg.username)
        .arg("--dbname")
        .arg(&cfg.db_name)
        .arg("-c")
        .arg(&statement)
        .output();

    match output {
        Ok(out) if out.status.success() => CopyResult {
            table: table.to_string(),
            success: true,
            detail: statement,
        },
        Ok(out) => CopyResult {
            table: table.to_string(),
            success: false,
            detail: format!(
                "{statement}\nexit status: {}\nstderr: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr)
            ),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CopyResult {
            table: table.to_string(),
            success: false,
            detail: format!("'{copy_bin}' not found on PATH — install a psql-compatible client or pass --copy-bin"),
        },
        Err(e) => CopyResult {
            table: table.to_string(),
            success: false,
            detail: format!("failed to run {copy_bin}: {e}"),
        },
    }
}
