//! Data Search Engine (spec §4.5): WHERE-clause construction and
//! per-table streaming extraction, the algorithmic core of the pipeline.

use crate::csv_writer::{self, CsvWriter};
use crate::error::SliceError;
use crate::graph::GraphState;
use crate::schema::{DataType, TableId};
use ahash::AHashSet;
use futures_util::TryStreamExt;
use sqlx::{PgPool, Row};
use std::path::{Path, PathBuf};

/// Directory a table's extraction output lives under: `<data_dir>/<table>/data_search/`.
pub fn table_dir(data_dir: &Path, table_name: &str) -> PathBuf {
    data_dir.join(table_name).join("data_search")
}

pub fn raw_path(data_dir: &Path, table_name: &str) -> PathBuf {
    table_dir(data_dir, table_name).join(format!("{table_name}.csv"))
}

pub fn parsed_path(data_dir: &Path, table_name: &str) -> PathBuf {
    table_dir(data_dir, table_name).join(format!("{table_name}_parsed.csv"))
}

/// Outcome of extracting a single table.
#[derive(Debug, Default)]
pub struct ExtractStats {
    pub rows_written: usize,
    pub parsed_rows_written: Option<usize>,
}

/// `WHERE id = <root_id>` (spec §4.5.1). `root_id` is typed as `i64` all
/// the way from the CLI (spec §9) specifically so this can interpolate it
/// without quoting or escaping — a primary-key literal is never taken
/// from an unvalidated string here.
pub fn root_where(root_id: i64) -> String {
    format!("WHERE id = {root_id}")
}

/// Quote a value for inclusion in an `IN (…)` literal list, per the
/// column's declared data type (spec §3.1 DataType; non-numeric/boolean
/// types are single-quoted with embedded quotes doubled).
fn quote(value: &str, data_type: &DataType) -> String {
    if data_type.needs_quoting() {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        value.to_string()
    }
}

fn in_list(values: &[String], data_type: &DataType) -> String {
    values
        .iter()
        .map(|v| quote(v, data_type))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_type(state: &GraphState, table: TableId, column: &str) -> DataType {
    state
        .table_cols
        .get(&table)
        .and_then(|cols| cols.get(column))
        .map(|info| info.data_type.clone())
        .unwrap_or(DataType::Text)
}

/// WHERE clause for a non-root descendant `T` (spec §4.5.1): a disjunction
/// over `T`'s direct-descendant parents, seeded from their parsed CSVs.
pub fn descendant_where(
    state: &GraphState,
    t: TableId,
    direct_descendants: &AHashSet<TableId>,
    data_dir: &Path,
) -> std::io::Result<String> {
    let mut disjuncts = Vec::new();

    if let Some(parents) = state.deps.get(&t) {
        for &parent in parents {
            if !direct_descendants.contains(&parent) {
                continue;
            }
            let child_col = match state.fkeys.get(&t).and_then(|m| m.get(&parent)) {
                Some(c) => c,
                None => continue,
            };
            let parent_col = state
                .fkey_cols
                .get(&parent)
                .and_then(|m| m.get(child_col))
                .cloned()
                .unwrap_or_else(|| child_col.clone());

            let parent_name = state.name_of(parent);
            let values = csv_writer::read_parsed_column(&parsed_path(data_dir, parent_name), &parent_col)?;
            if values.is_empty() {
                continue;
            }
            let data_type = column_type(state, t, child_col);
            disjuncts.push(format!("\"{child_col}\" IN ({})", in_list(&values, &data_type)));
        }
    }

    let mut clause = String::from("WHERE 1 = 2");
    for d in disjuncts {
        clause.push_str(" OR ");
        clause.push_str(&d);
    }
    Ok(clause)
}

/// WHERE clause for an outsider `T` (spec §4.5.1): a disjunction over
/// tables that reference `T`, seeded from their parsed CSVs.
pub fn outsider_where(state: &GraphState, t: TableId, data_dir: &Path) -> std::io::Result<String> {
    let mut disjuncts = Vec::new();

    if let Some(dependants) = state.inv.get(&t) {
        for &dependant in dependants {
            let child_col = match state.inv_fkeys.get(&t).and_then(|m| m.get(&dependant)) {
                Some(c) => c,
                None => continue,
            };
            let col_in_t = state
                .fkey_cols
                .get(&t)
                .and_then(|m| m.get(child_col))
                .cloned()
                .unwrap_or_else(|| child_col.clone());

            let dependant_name = state.name_of(dependant);
            let values =
                csv_writer::read_parsed_column(&parsed_path(data_dir, dependant_name), child_col)?;
            if values.is_empty() {
                continue;
            }
            let data_type = column_type(state, t, &col_in_t);
            disjuncts.push(format!("\"{col_in_t}\" IN ({})", in_list(&values, &data_type)));
        }
    }

    let mut clause = String::from("WHERE 1 = 2");
    for d in disjuncts {
        clause.push_str(" OR ");
        clause.push_str(&d);
    }
    Ok(clause)
}

/// Stream `SELECT <cols>::text FROM <table> <where_clause>` to the raw CSV
/// and, if the table has needed-FK columns and produced ≥1 row, re-read it
/// into the parsed projection CSV (spec §4.5.2).
///
/// Every column is cast to `text` in the query itself so the engine never
/// needs a typed decoder per Postgres type — the column's [`DataType`] only
/// matters for quoting values back out in a later table's WHERE clause.
pub async fn extract_table(
    pool: &PgPool,
    state: &GraphState,
    t: TableId,
    where_clause: &str,
    data_dir: &Path,
) -> Result<ExtractStats, SliceError> {
    let table_name = state.name_of(t).to_string();
    let dir = table_dir(data_dir, &table_name);
    std::fs::create_dir_all(&dir)?;

    let columns: Vec<String> = state
        .table_cols
        .get(&t)
        .map(|cols| cols.keys().cloned().collect())
        .unwrap_or_default();
    let mut columns = columns;
    columns.sort();

    let select_list = columns
        .iter()
        .map(|c| format!("\"{c}\"::text AS \"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT {select_list} FROM \"{table_name}\" {where_clause}");

    let raw = raw_path(data_dir, &table_name);
    let mut writer = CsvWriter::create(&raw)?;

    let mut rows = sqlx::query(&sql).fetch(pool);
    while let Some(row) = rows.try_next().await? {
        let values: Vec<String> = columns
            .iter()
            .map(|c| row.try_get::<Option<String>, _>(c.as_str()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|v| v.unwrap_or_default())
            .collect();
        writer.write_row(values)?;
    }
    let rows_written = writer.finish()?;

    let needed: Vec<String> = state
        .table_fkey_needs
        .get(&t)
        .map(|set| {
            let mut v: Vec<String> = set.iter().cloned().collect();
            v.sort();
            v
        })
        .unwrap_or_default();

    let parsed_rows_written = if rows_written == 0 {
        None
    } else {
        csv_writer::write_parsed_projection(&raw, &parsed_path(data_dir, &table_name), &columns, &needed)?
    };

    Ok(ExtractStats {
        rows_written,
        parsed_rows_written,
    })
}
