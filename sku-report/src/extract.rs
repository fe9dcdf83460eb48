//! Pull per-SKU, per-year rows out of seller workbooks

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::columns;
use crate::error::ReportError;
use crate::excel::{self, Workbook};
use crate::sku::{SkuId, SkuLedger, SkuRecord};
use crate::table::{self, Table};

/// Result of the extraction stage
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// Retained SKUs in first-encounter order
    pub skus: Vec<SkuId>,
    #[serde(skip)]
    pub records: Vec<SkuRecord>,
}

impl Extraction {
    pub fn from_ledger(ledger: SkuLedger) -> Self {
        let records = ledger.into_retained();
        let skus = records.iter().map(|r| r.sku.clone()).collect();
        Self { skus, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Index of the sheet listing SKUs: the performance sheet, else the first
fn listing_sheet(workbook: &Workbook) -> Result<usize> {
    if workbook.sheets.is_empty() {
        anyhow::bail!("Workbook contains no sheets");
    }
    Ok(columns::performance_sheet(&workbook.sheet_names()).unwrap_or(0))
}

/// Distinct non-blank values of `col`, first occurrence first
fn distinct_skus(table: &Table, col: usize) -> Vec<SkuId> {
    let mut seen = std::collections::HashSet::new();
    table
        .column_values(col)
        .filter_map(SkuId::from_cell)
        .filter(|sku| seen.insert(sku.clone()))
        .collect()
}

/// Product name from the first row whose SKU cell renders as `sku`
fn product_name_for(table: &Table, sku_col: usize, name_col: usize, sku: &SkuId) -> Option<String> {
    table
        .rows()
        .iter()
        .find(|row| SkuId::from_cell(&row[sku_col]).as_ref() == Some(sku))
        .map(|row| &row[name_col])
        .filter(|cell| !cell.is_blank())
        .map(|cell| cell.render())
}

/// Fold one workbook into the ledger
///
/// Year sheets are matched by exact name. Rows are appended without any
/// de-duplication, so reading the same file twice doubles its rows.
pub fn extract_workbook(workbook: &Workbook, ledger: &mut SkuLedger) -> Result<usize> {
    let listing_idx = listing_sheet(workbook)?;
    let listing = &workbook.sheets[listing_idx];

    let Some(sku_col) = columns::sku_column(&listing.table) else {
        anyhow::bail!("Sheet '{}' has no columns to read SKUs from", listing.name);
    };
    let name_col = columns::PRODUCT_NAME.find(&listing.table);

    log::debug!(
        "Listing sheet '{}', SKU column {:?}, product column {:?}",
        listing.name,
        listing.table.columns()[sku_col].to_string(),
        name_col.map(|c| listing.table.columns()[c].to_string())
    );

    let skus = distinct_skus(&listing.table, sku_col);
    let years = ledger.years().to_vec();
    let year_sheets: Vec<(&String, &Table)> = years
        .iter()
        .filter_map(|year| workbook.sheet(year).map(|sheet| (year, &sheet.table)))
        .collect();

    if year_sheets.is_empty() {
        log::warn!(
            "No year sheets ({}) found; SKUs are listed but get no rows",
            years.join(", ")
        );
    }

    for sku in &skus {
        let record = ledger.entry(sku);

        if record.product_name.is_none() {
            if let Some(name_col) = name_col {
                record.product_name = product_name_for(&listing.table, sku_col, name_col, sku);
            }
        }

        for (year, sheet) in &year_sheets {
            let matched = table::rows_containing(sheet, sku.as_str());
            if matched.is_empty() {
                continue;
            }
            if let Some(bucket) = record.bucket_mut(year) {
                bucket.table.append(&matched);
            }
        }
    }

    Ok(skus.len())
}

/// Read every input file in order and collect SKU data across all of them
///
/// Any unreadable file aborts the whole extraction.
pub fn extract_files(paths: &[PathBuf], years: &[String]) -> Result<Extraction, ReportError> {
    let mut ledger = SkuLedger::new(years);

    for path in paths {
        let found = read_into(path, &mut ledger).map_err(|e| ReportError::parse(path, e))?;
        log::info!(
            "Read {} SKUs from {} ({} listed so far)",
            found,
            path.display(),
            ledger.len()
        );
    }

    if ledger.is_empty() {
        log::warn!("No SKUs listed in any input file");
    }

    let extraction = Extraction::from_ledger(ledger);
    log::info!("{} SKUs with data after extraction", extraction.skus.len());
    Ok(extraction)
}

fn read_into(path: &Path, ledger: &mut SkuLedger) -> Result<usize> {
    let workbook = excel::read_workbook(path)?;
    extract_workbook(&workbook, ledger)
}
