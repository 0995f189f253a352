use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::table::Table;

/// Ordered list of column names defining a table's shape. Names are stored
/// trimmed; comparison is exact and order-sensitive, matching the strict
/// merge behavior the exporter relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema(Vec<String>);

impl ColumnSchema {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self(
            names
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    /// Parses the column-inference response: a bare comma-separated list,
    /// entries trimmed, empties dropped.
    pub fn parse_csv(raw: &str) -> Self {
        Self::new(raw.split(',').map(|name| name.to_string()))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl std::fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// Merges a freshly extracted batch with an optionally pre-loaded dataset.
/// With no existing dataset the fresh table is final. Otherwise the trimmed
/// column sequences must match exactly (same names, same order); on a match
/// the existing rows come first, on a mismatch the whole run fails. No
/// partial merge or per-column alignment is attempted.
pub fn reconcile(existing: Option<Table>, fresh: Table) -> Result<Table> {
    let Some(existing) = existing else {
        return Ok(fresh);
    };
    let existing_schema = ColumnSchema::new(existing.columns.clone());
    let fresh_schema = ColumnSchema::new(fresh.columns.clone());
    if existing_schema != fresh_schema {
        return Err(TableError::SchemaMismatch {
            existing: existing_schema.to_string(),
            fresh: fresh_schema.to_string(),
        });
    }
    let mut merged = Table::new(existing_schema.to_vec());
    merged.rows.extend(existing.rows);
    merged.rows.extend(fresh.rows);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table
                .rows
                .push(row.iter().map(|cell| Cell::decode(cell)).collect());
        }
        table
    }

    #[test]
    fn parse_csv_trims_and_drops_empties() {
        let schema = ColumnSchema::parse_csv(" 이름 , 나이,, 지역 ");
        assert_eq!(schema.names(), &["이름", "나이", "지역"]);
    }

    #[test]
    fn empty_response_parses_to_empty_schema() {
        assert!(ColumnSchema::parse_csv("").is_empty());
        assert!(ColumnSchema::parse_csv(" , ,").is_empty());
    }

    #[test]
    fn reconcile_without_existing_passes_fresh_through() {
        let fresh = table(&["A", "B"], &[&["1", "2"]]);
        let merged = reconcile(None, fresh.clone()).unwrap();
        assert_eq!(merged, fresh);
    }

    #[test]
    fn reconcile_appends_fresh_after_existing() {
        let existing = table(&["A", "B"], &[&["old1", "old2"]]);
        let fresh = table(&[" A ", "B "], &[&["new1", "new2"]]);
        let merged = reconcile(Some(existing), fresh).unwrap();
        assert_eq!(merged.columns, vec!["A", "B"]);
        assert_eq!(merged.rows[0][0], Cell::Text("old1".to_string()));
        assert_eq!(merged.rows[1][0], Cell::Text("new1".to_string()));
    }

    #[test]
    fn reconcile_rejects_reordered_columns() {
        let existing = table(&["A", "B"], &[]);
        let fresh = table(&["B", "A"], &[]);
        let err = reconcile(Some(existing), fresh).unwrap_err();
        assert!(matches!(err, TableError::SchemaMismatch { .. }));
    }

    #[test]
    fn reconcile_rejects_different_column_sets() {
        let existing = table(&["A", "B"], &[]);
        let fresh = table(&["A", "B", "C"], &[]);
        assert!(reconcile(Some(existing), fresh).is_err());
    }
}
