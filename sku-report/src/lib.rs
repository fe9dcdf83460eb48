//! Turn seller spreadsheet exports into a per-SKU performance workbook
//!
//! Input workbooks list SKUs on a performance sheet and carry per-year detail
//! rows on sheets named after the year. The pipeline groups those rows by SKU,
//! sums quantity, revenue and ad spend per year, derives TACOS (ad spend over
//! revenue), and writes a summary sheet plus one chart-annotated sheet per SKU.

pub mod aggregate;
pub mod chart;
pub mod columns;
pub mod config;
pub mod error;
pub mod excel;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod sku;
pub mod table;
pub mod timeline;

pub use config::Settings;
pub use error::ReportError;
pub use pipeline::{RunSummary, assemble_report, extract, run, validate_inputs};
