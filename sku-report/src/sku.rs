//! Per-SKU records accumulated across input files

use std::collections::HashMap;

use serde::Serialize;

use crate::table::{Cell, Table};

/// SKU identifier: the rendered text of the SKU cell
///
/// Numeric SKUs render without a decimal point, so `12345` read as an integer
/// and `12345.0` read as a float are the same SKU.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SkuId(String);

impl SkuId {
    pub fn new(id: impl Into<String>) -> Self {
        SkuId(id.into())
    }

    /// SKU from a cell, `None` for blank cells
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        if cell.is_blank() {
            None
        } else {
            Some(SkuId(cell.render()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SkuId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rows of one reporting year collected for a SKU
#[derive(Debug, Clone, PartialEq)]
pub struct YearBucket {
    pub year: String,
    pub table: Table,
}

/// Everything known about one SKU
#[derive(Debug, Clone, PartialEq)]
pub struct SkuRecord {
    pub sku: SkuId,
    pub product_name: Option<String>,
    /// One bucket per configured year, in configured order
    pub buckets: Vec<YearBucket>,
}

impl SkuRecord {
    pub fn new(sku: SkuId, years: &[String]) -> Self {
        Self {
            sku,
            product_name: None,
            buckets: years
                .iter()
                .map(|year| YearBucket {
                    year: year.clone(),
                    table: Table::default(),
                })
                .collect(),
        }
    }

    pub fn bucket(&self, year: &str) -> Option<&YearBucket> {
        self.buckets.iter().find(|b| b.year == year)
    }

    pub fn bucket_mut(&mut self, year: &str) -> Option<&mut YearBucket> {
        self.buckets.iter_mut().find(|b| b.year == year)
    }

    /// True when at least one year bucket has rows
    pub fn has_data(&self) -> bool {
        self.buckets.iter().any(|b| !b.table.is_empty())
    }

    /// Product name, falling back to the SKU text
    pub fn display_name(&self) -> &str {
        self.product_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.sku.as_str())
    }
}

/// Accumulator of SKU records, ordered by first encounter
///
/// Extraction threads one ledger through every input file and hands it back,
/// instead of mutating shared state.
#[derive(Debug, Clone, Default)]
pub struct SkuLedger {
    years: Vec<String>,
    records: Vec<SkuRecord>,
    index: HashMap<SkuId, usize>,
}

impl SkuLedger {
    pub fn new(years: &[String]) -> Self {
        Self {
            years: years.to_vec(),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, sku: &SkuId) -> Option<&SkuRecord> {
        self.index.get(sku).map(|&idx| &self.records[idx])
    }

    /// Record for `sku`, created on first sight
    pub fn entry(&mut self, sku: &SkuId) -> &mut SkuRecord {
        let idx = match self.index.get(sku) {
            Some(&idx) => idx,
            None => {
                self.records.push(SkuRecord::new(sku.clone(), &self.years));
                self.index.insert(sku.clone(), self.records.len() - 1);
                self.records.len() - 1
            }
        };
        &mut self.records[idx]
    }

    /// Records in first-encounter order
    pub fn records(&self) -> &[SkuRecord] {
        &self.records
    }

    /// Consume the ledger, keeping only SKUs with data in at least one year
    pub fn into_retained(self) -> Vec<SkuRecord> {
        self.records.into_iter().filter(|r| r.has_data()).collect()
    }
}
