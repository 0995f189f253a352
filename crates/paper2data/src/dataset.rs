use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};

use paper2data_core::{Cell, Table};

/// Header pandas assigns to columns that never had a name. Such columns are
/// spreadsheet artifacts, not data, and are dropped on import.
const PLACEHOLDER_HEADER_PREFIX: &str = "Unnamed";

/// Loads a previously exported dataset for use as the left-hand side of the
/// merge. Placeholder-named and nameless columns are dropped, then columns
/// whose every cell is missing; what remains defines the expected schema.
pub fn load_existing(path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to open existing dataset {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("missing headers in {}", path.display()))?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    let kept: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && !name.starts_with(PLACEHOLDER_HEADER_PREFIX))
        .map(|(idx, _)| idx)
        .collect();
    let mut table = Table::new(kept.iter().map(|&idx| headers[idx].clone()).collect());
    for record in reader.records() {
        let record = record.with_context(|| format!("invalid row in {}", path.display()))?;
        let row = kept
            .iter()
            .map(|&idx| Cell::decode(record.get(idx).unwrap_or("")))
            .collect();
        table.rows.push(row);
    }
    Ok(drop_empty_columns(table))
}

/// Writes the final reconciled record set: one row per record, columns in
/// schema order, missing cells rendered as the sentinel.
pub fn export(table: &Table, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_str()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn drop_empty_columns(table: Table) -> Table {
    let kept: Vec<usize> = (0..table.columns.len())
        .filter(|&idx| table.rows.iter().any(|row| !row[idx].is_missing()))
        .collect();
    if kept.len() == table.columns.len() || table.rows.is_empty() {
        return table;
    }
    let mut trimmed = Table::new(kept.iter().map(|&idx| table.columns[idx].clone()).collect());
    for row in &table.rows {
        trimmed
            .rows
            .push(kept.iter().map(|&idx| row[idx].clone()).collect());
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_drops_placeholder_and_empty_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.csv");
        std::fs::write(
            &path,
            "이름,Unnamed: 1,나이,비고\n김,junk,30,-\n박,junk,25,-\n",
        )
        .unwrap();
        let table = load_existing(&path).unwrap();
        // "Unnamed: 1" is a placeholder, "비고" is entirely missing.
        assert_eq!(table.columns, vec!["이름", "나이"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("김".to_string()));
    }

    #[test]
    fn load_keeps_partially_filled_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.csv");
        std::fs::write(&path, "A,B\n1,\n2,x\n").unwrap();
        let table = load_existing(&path).unwrap();
        assert_eq!(table.columns, vec!["A", "B"]);
        assert!(table.rows[0][1].is_missing());
        assert_eq!(table.rows[1][1], Cell::Text("x".to_string()));
    }

    #[test]
    fn header_only_dataset_keeps_its_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.csv");
        std::fs::write(&path, "A,B\n").unwrap();
        let table = load_existing(&path).unwrap();
        assert_eq!(table.columns, vec!["A", "B"]);
        assert!(table.is_empty());
    }

    #[test]
    fn export_renders_missing_cells_as_the_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut table = Table::new(vec!["A".to_string(), "B".to_string()]);
        table
            .rows
            .push(vec![Cell::Text("1".to_string()), Cell::Missing]);
        export(&table, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "A,B\n1,-\n");
    }

    #[test]
    fn export_then_load_roundtrips_the_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut table = Table::new(vec!["이름".to_string(), "나이".to_string()]);
        table
            .rows
            .push(vec![Cell::Text("김".to_string()), Cell::Text("30".to_string())]);
        export(&table, &path).unwrap();
        let loaded = load_existing(&path).unwrap();
        assert_eq!(loaded, table);
    }
}
