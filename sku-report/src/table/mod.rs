//! In-memory tables loaded from spreadsheet sheets
//!
//! A [`Table`] is a header row plus rectangular data rows, independent of
//! calamine.

mod cell;

pub use cell::Cell;

static EMPTY: Cell = Cell::Empty;

/// Column header
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnName {
    /// Header cell with text
    Labeled(String),
    /// Blank header cell at the given 0-based position of its source sheet
    Unlabeled(usize),
}

impl ColumnName {
    pub fn labeled(name: impl Into<String>) -> Self {
        ColumnName::Labeled(name.into())
    }

    /// Header text, if any
    pub fn label(&self) -> Option<&str> {
        match self {
            ColumnName::Labeled(s) => Some(s),
            ColumnName::Unlabeled(_) => None,
        }
    }

    pub fn is_unlabeled(&self) -> bool {
        matches!(self, ColumnName::Unlabeled(_))
    }
}

impl std::fmt::Display for ColumnName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnName::Labeled(s) => write!(f, "{}", s),
            // Blank headers are written back as blank header cells
            ColumnName::Unlabeled(_) => Ok(()),
        }
    }
}

/// A rectangular table: every row has exactly one cell per column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<ColumnName>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given header
    ///
    /// Duplicate labels are disambiguated as `name.1`, `name.2`, ...
    pub fn new(columns: Vec<ColumnName>) -> Self {
        let mut table = Table::default();
        for column in columns {
            let column = table.unique_name(column);
            table.columns.push(column);
        }
        table
    }

    /// Create a table from a header and rows; rows are padded or cut to the header width
    pub fn from_rows(columns: Vec<ColumnName>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding with empty cells or dropping overflow
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Cell at (row, column), `Empty` when out of range
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Iterate over one column's cells
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| row.get(col).unwrap_or(&EMPTY))
    }

    /// Position of the column with the given label
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.label() == Some(label))
    }

    /// Append all rows of `other`, aligning columns by name
    ///
    /// Columns the receiver does not know yet are added on the right and
    /// back-filled with empty cells for the rows already present.
    pub fn append(&mut self, other: &Table) {
        let mut mapping = Vec::with_capacity(other.columns.len());
        for column in &other.columns {
            let idx = match self.columns.iter().position(|c| c == column) {
                Some(idx) => idx,
                None => {
                    self.columns.push(column.clone());
                    for row in &mut self.rows {
                        row.push(Cell::Empty);
                    }
                    self.columns.len() - 1
                }
            };
            mapping.push(idx);
        }

        for source in &other.rows {
            let mut row = vec![Cell::Empty; self.columns.len()];
            for (cell, &idx) in source.iter().zip(&mapping) {
                row[idx] = cell.clone();
            }
            self.rows.push(row);
        }
    }

    /// Insert a column at `index` with one value per row
    ///
    /// If the label already exists, the existing column is renamed the same
    /// way duplicates are on load, so the inserted column keeps its label.
    pub fn insert_column(&mut self, index: usize, name: ColumnName, values: Vec<Cell>) {
        let index = index.min(self.columns.len());
        if let Some(label) = name.label() {
            if let Some(existing) = self.position_of(label) {
                let renamed = self.unique_name(name.clone());
                self.columns[existing] = renamed;
            }
        }
        self.columns.insert(index, name);
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(index, values.next().unwrap_or(Cell::Empty));
        }
    }

    /// Insert a column holding the same value in every row
    pub fn insert_constant_column(&mut self, index: usize, name: ColumnName, value: Cell) {
        let values = vec![value; self.rows.len()];
        self.insert_column(index, name, values);
    }

    /// Remove every column without a header label
    pub fn drop_unlabeled(&mut self) {
        let keep: Vec<bool> = self.columns.iter().map(|c| !c.is_unlabeled()).collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// New table with the same header and only the rows accepted by `keep`
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r.as_slice())).cloned().collect(),
        }
    }

    fn unique_name(&self, name: ColumnName) -> ColumnName {
        let ColumnName::Labeled(label) = &name else {
            return name;
        };
        if !self.columns.iter().any(|c| c.label() == Some(label)) {
            return name;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}.{}", label, n);
            if !self.columns.iter().any(|c| c.label() == Some(candidate.as_str())) {
                return ColumnName::Labeled(candidate);
            }
            n += 1;
        }
    }
}

/// Rows of `table` in which any cell's rendered text contains `needle`,
/// compared case-insensitively
pub fn rows_containing(table: &Table, needle: &str) -> Table {
    let needle = needle.to_lowercase();
    table.filter_rows(|row| {
        row.iter()
            .any(|cell| !cell.is_empty() && cell.render().to_lowercase().contains(&needle))
    })
}
