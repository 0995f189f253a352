use std::fmt;

use serde::{Deserialize, Serialize};

/// The placeholder the extraction model is instructed to emit for absent
/// values. A cell whose genuine value is a lone dash is indistinguishable
/// from a missing one; that conflation is part of the wire contract.
pub const MISSING_SENTINEL: &str = "-";

/// One cell of a table. `Missing` is an explicit marker rather than the
/// literal sentinel text, so padding and sentinel cells behave identically
/// everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Missing,
    Text(String),
}

impl Cell {
    /// Decodes a trimmed wire cell: the sentinel (or nothing) means missing.
    pub fn decode(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
            Cell::Missing
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Cell::Missing => MISSING_SENTINEL,
            Cell::Text(text) => text,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rectangular record set: every row is exactly `columns.len()` wide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Flattens a batch of tables into one. Columns are the union in
    /// first-seen order; rows keep table order, then row order within each
    /// table; cells absent from a source table become `Missing`.
    pub fn concat(tables: &[Table]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in tables {
            for name in &table.columns {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        let mut merged = Table::new(columns);
        for table in tables {
            let mapping: Vec<Option<usize>> = merged
                .columns
                .iter()
                .map(|name| table.columns.iter().position(|c| c == name))
                .collect();
            for row in &table.rows {
                let aligned = mapping
                    .iter()
                    .map(|source| match source {
                        Some(idx) => row.get(*idx).cloned().unwrap_or(Cell::Missing),
                        None => Cell::Missing,
                    })
                    .collect();
                merged.rows.push(aligned);
            }
        }
        merged
    }
}

/// What the normalizer did to coerce the model output into a rectangle.
/// Truncation discards data silently at the row level, so the driver logs
/// whenever `truncated_rows` is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub padded_rows: usize,
    pub truncated_rows: usize,
    pub skipped_rows: usize,
}

/// Parses a markdown-style table out of raw model output into a rectangular
/// record set. The grammar is deliberately narrow: line one is the header,
/// line two is the separator and is never inspected, every later line is a
/// candidate data row. Cells are the `|`-separated segments with the first
/// and last boundary segments discarded and the rest trimmed.
///
/// The header's own width is authoritative, whatever column list was
/// requested upstream. Anything that cannot be read as a table yields an
/// empty table, never a partial one.
pub fn normalize_markdown_table(raw: &str) -> (Table, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < 3 {
        return (Table::default(), report);
    }
    let columns = split_cells(lines[0]);
    if columns.is_empty() {
        return (Table::default(), report);
    }
    let width = columns.len();
    let mut table = Table::new(columns);
    for line in &lines[2..] {
        let cells = split_cells(line);
        if cells.is_empty() || cells.iter().all(|cell| cell.is_empty()) {
            report.skipped_rows += 1;
            continue;
        }
        let mut row: Vec<Cell> = cells.iter().map(|cell| Cell::decode(cell)).collect();
        if row.len() < width {
            report.padded_rows += 1;
            row.resize(width, Cell::Missing);
        } else if row.len() > width {
            report.truncated_rows += 1;
            row.truncate(width);
        }
        table.rows.push(row);
    }
    (table, report)
}

/// Splits one table line on `|`, discarding the empty boundary segments that
/// a well-formed row produces before its first and after its last delimiter.
/// Lines with fewer than two delimiters have no interior cells at all.
fn split_cells(line: &str) -> Vec<String> {
    let segments: Vec<&str> = line.trim().split('|').collect();
    if segments.len() < 3 {
        return Vec::new();
    }
    segments[1..segments.len() - 1]
        .iter()
        .map(|segment| segment.trim().to_string())
        .collect()
}
