//! Load seller workbooks into [`Table`]s

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::table::{Cell, ColumnName, Table};

/// One worksheet of an input workbook
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

/// All worksheets of one input file, in workbook order
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Sheet with exactly this name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Read every worksheet of an .xlsx / .xls file
///
/// The first row of each sheet's used range is the header row.
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read sheet: {}", name))?;

        log::debug!(
            "Loaded sheet '{}' from {} ({} x {})",
            name,
            path.display(),
            range.height(),
            range.width()
        );

        sheets.push(Sheet {
            table: range_to_table(&range),
            name,
        });
    }

    Ok(Workbook { sheets })
}

/// Convert a calamine range into a table, using the first row as header
pub fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::default();
    };

    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match header_text(cell) {
            Some(text) => ColumnName::Labeled(text),
            None => ColumnName::Unlabeled(idx),
        })
        .collect();

    let data = rows.map(|row| row.iter().map(to_cell).collect()).collect();
    Table::from_rows(columns, data)
}

fn header_text(cell: &Data) -> Option<String> {
    match to_cell(cell) {
        Cell::Empty => None,
        other => {
            let text = other.render();
            if text.trim().is_empty() { None } else { Some(text) }
        }
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
