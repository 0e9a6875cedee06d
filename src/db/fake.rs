//! In-memory [`SchemaIntrospector`] fixture used by graph/search unit
//! tests so no test in this crate opens a real network connection.

use super::SchemaIntrospector;
use crate::error::SliceError;
use crate::schema::{ColumnInfo, DataType, FkEdge};
use ahash::AHashMap;
use async_trait::async_trait;

/// One table's worth of fixture data: its columns (in order) and the FK
/// constraints it declares (this table is always the child in each entry).
#[derive(Default, Clone)]
pub struct FakeTable {
    pub columns: Vec<(String, ColumnInfo)>,
    /// (child_column, parent_table, parent_column)
    pub foreign_keys: Vec<(String, String, String)>,
}

/// A hand-built schema fixture, keyed by table name.
#[derive(Default)]
pub struct FakeIntrospector {
    tables: AHashMap<String, FakeTable>,
}

impl FakeIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: &str, table: FakeTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }
}

/// Build a plain integer id column, not nullable — the common case for a
/// table's own primary key or a FK column.
pub fn int_col(name: &str) -> (String, ColumnInfo) {
    (
        name.to_string(),
        ColumnInfo {
            nullable: false,
            data_type: DataType::Integer,
        },
    )
}

/// Build a nullable integer column, used for optional FK columns.
pub fn nullable_int_col(name: &str) -> (String, ColumnInfo) {
    (
        name.to_string(),
        ColumnInfo {
            nullable: true,
            data_type: DataType::Integer,
        },
    )
}

#[async_trait]
impl SchemaIntrospector for FakeIntrospector {
    async fn children_of(&self, table: &str) -> Result<Vec<FkEdge>, SliceError> {
        let mut out = Vec::new();
        for (child_name, child) in &self.tables {
            for (child_col, parent_table, parent_col) in &child.foreign_keys {
                if parent_table == table {
                    out.push(FkEdge {
                        child_table: child_name.clone(),
                        child_column: child_col.clone(),
                        parent_table: parent_table.clone(),
                        parent_column: parent_col.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    async fn parents_of(&self, table: &str) -> Result<Vec<FkEdge>, SliceError> {
        let child = self
            .tables
            .get(table)
            .ok_or_else(|| SliceError::Schema(format!("unknown table '{table}'")))?;

        Ok(child
            .foreign_keys
            .iter()
            .map(|(child_col, parent_table, parent_col)| FkEdge {
                child_table: table.to_string(),
                child_column: child_col.clone(),
                parent_table: parent_table.clone(),
                parent_column: parent_col.clone(),
            })
            .collect())
    }

    async fn columns_of(&self, table: &str) -> Result<Vec<(String, ColumnInfo)>, SliceError> {
        self.tables
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| SliceError::Schema(format!("unknown table '{table}'")))
    }
}
