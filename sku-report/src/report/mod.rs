//! Report workbook assembly
//!
//! Sheets are planned first (summary, then one per SKU), name collisions are
//! resolved on the plan list, and only then is the workbook written.

mod naming;

pub use naming::{MAX_SHEET_NAME, output_path, report_file_name, sheet_name};

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

use crate::aggregate::{self, Aggregation, YearMetrics};
use crate::chart::{self, ChartImage, ChartRenderer, ChartSize, ChartSpec, SkuChartColumns};
use crate::columns;
use crate::config::Settings;
use crate::excel::SheetWriter;
use crate::sku::{SkuId, SkuRecord};
use crate::table::{Cell, ColumnName, Table};
use crate::timeline;

/// Name of the summary sheet
pub const SUMMARY_SHEET: &str = "TOTAL PERFORMANCE";

/// Label of the year tag column on SKU sheets
pub const YEAR_COLUMN: &str = "Year";

const SAFE_TACOS_COLUMN: &str = "Safe TACOS";

/// Columns between neighbouring blocks on the summary sheet
const BLOCK_GAP: u16 = 2;

/// What a planned sheet contains
#[derive(Debug, Clone)]
enum SheetContent {
    Summary,
    Sku {
        sku: SkuId,
        display_name: String,
        table: Table,
    },
}

#[derive(Debug, Clone)]
struct SheetPlan {
    name: String,
    content: SheetContent,
}

/// Counters reported after the workbook is saved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub sheets: usize,
    pub charts: usize,
    pub skipped_charts: usize,
}

/// Union of a SKU's year buckets as written to its sheet
///
/// Each bucket gets a leading `Year` column, unlabeled month/day columns are
/// folded into `Time` and dropped, and a constant `Safe TACOS` column is added
/// when the data has none.
pub fn sku_sheet_table(record: &SkuRecord, safe_tacos: f64) -> Table {
    let mut combined: Option<Table> = None;

    for bucket in record.buckets.iter().filter(|b| !b.table.is_empty()) {
        let mut tagged = bucket.table.clone();
        tagged.insert_constant_column(0, ColumnName::labeled(YEAR_COLUMN), Cell::text(&bucket.year));
        match combined.as_mut() {
            Some(table) => table.append(&tagged),
            None => combined = Some(tagged),
        }
    }

    let mut table = combined.unwrap_or_default();
    timeline::normalize_time_labels(&mut table, YEAR_COLUMN);
    table.drop_unlabeled();

    if columns::SAFE_TACOS.find(&table).is_none() {
        let end = table.column_count();
        table.insert_constant_column(
            end,
            ColumnName::labeled(SAFE_TACOS_COLUMN),
            Cell::Number(safe_tacos),
        );
    }

    table
}

/// Add a plan; a case-insensitive name clash replaces the earlier plan's
/// content in place
fn push_plan(plans: &mut Vec<SheetPlan>, plan: SheetPlan) {
    let key = plan.name.to_lowercase();
    match plans.iter_mut().find(|p| p.name.to_lowercase() == key) {
        Some(existing) => {
            log::warn!(
                "Sheet name '{}' is used twice; the later sheet replaces the earlier one",
                plan.name
            );
            *existing = plan;
        }
        None => plans.push(plan),
    }
}

fn plan_sheets(records: &[SkuRecord], settings: &Settings) -> Vec<SheetPlan> {
    let mut plans = vec![SheetPlan {
        name: SUMMARY_SHEET.to_string(),
        content: SheetContent::Summary,
    }];

    for record in records {
        let display_name = record.display_name().to_string();
        push_plan(
            &mut plans,
            SheetPlan {
                name: sheet_name(&display_name, record.sku.as_str()),
                content: SheetContent::Sku {
                    sku: record.sku.clone(),
                    display_name,
                    table: sku_sheet_table(record, settings.safe_tacos),
                },
            },
        );
    }

    plans
}

/// Writes the report workbook for one run
pub struct ReportWriter<'a> {
    settings: &'a Settings,
    renderer: &'a dyn ChartRenderer,
    stats: ReportStats,
}

impl<'a> ReportWriter<'a> {
    pub fn new(settings: &'a Settings, renderer: &'a dyn ChartRenderer) -> Self {
        Self {
            settings,
            renderer,
            stats: ReportStats::default(),
        }
    }

    /// Build every sheet and save the workbook to `path`
    pub fn write(
        mut self,
        records: &[SkuRecord],
        aggregation: &Aggregation,
        path: &Path,
    ) -> Result<ReportStats> {
        let mut workbook = Workbook::new();

        for plan in plan_sheets(records, self.settings) {
            let sheet = workbook.add_worksheet();
            sheet
                .set_name(&plan.name)
                .with_context(|| format!("Invalid sheet name: {}", plan.name))?;

            let mut writer = SheetWriter::new(sheet, self.settings.max_column_width);
            match &plan.content {
                SheetContent::Summary => self.write_summary(&mut writer, aggregation)?,
                SheetContent::Sku {
                    sku,
                    display_name,
                    table,
                } => {
                    log::debug!("Writing sheet '{}' for {}", plan.name, sku);
                    self.write_sku_sheet(&mut writer, display_name, table)?;
                }
            }
            writer.finish()?;
            self.stats.sheets += 1;
        }

        workbook
            .save(path)
            .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

        log::info!("Report exported to: {}", path.display());
        Ok(self.stats)
    }

    fn write_summary(&mut self, writer: &mut SheetWriter, aggregation: &Aggregation) -> Result<()> {
        let years = &self.settings.years;

        let mut headers = vec!["SKU".to_string(), "Product".to_string()];
        for year in years {
            headers.push(format!("Quantity {}", year));
            headers.push(format!("Revenue {}", year));
            headers.push(format!("Ad Spend {}", year));
            headers.push(format!("TACOS {}", year));
        }

        let rows: Vec<Vec<Cell>> = aggregation
            .comparison
            .iter()
            .map(|row| {
                let mut cells = vec![
                    Cell::text(row.sku.as_str()),
                    Cell::text(&row.product_name),
                ];
                for m in &row.years {
                    cells.extend(metric_cells(m));
                }
                cells
            })
            .collect();

        writer.write_table(0, 0, &headers, &rows)?;

        if rows.is_empty() {
            return Ok(());
        }

        let latest_first = self.settings.years_latest_first();
        let all_totals = aggregate::year_totals(&aggregation.comparison, years);
        let totals: Vec<YearMetrics> = latest_first
            .iter()
            .filter_map(|year| all_totals.iter().find(|t| &t.year == year).cloned())
            .collect();

        let totals_top = rows.len() as u32 + 4;
        let totals_headers: Vec<String> = ["Year", "Quantity", "Revenue", "Ad Spend", "TACOS"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let totals_rows: Vec<Vec<Cell>> = totals
            .iter()
            .map(|t| {
                let mut cells = vec![Cell::text(&t.year)];
                cells.extend(metric_cells(t));
                cells
            })
            .collect();
        writer.write_table(totals_top, 0, &totals_headers, &totals_rows)?;

        let chart_row = totals_top + totals_rows.len() as u32 + 1 + 2;
        let size = ChartSize {
            width: self.settings.chart.comparison_width,
            height: self.settings.chart.comparison_height,
            dpi: self.settings.chart.dpi,
        };
        let spec = chart::comparison_chart(&totals, size);
        self.place_chart(writer, &spec, chart_row, 0)?;

        self.write_category_tables(writer, aggregation, headers.len() as u16 + BLOCK_GAP)?;
        Ok(())
    }

    /// Per-year category tables side by side, latest year first
    fn write_category_tables(
        &mut self,
        writer: &mut SheetWriter,
        aggregation: &Aggregation,
        mut left: u16,
    ) -> Result<()> {
        let headers: Vec<String> = [
            "SKU", "Product", "Quantity", "Revenue", "Ad Spend", "TACOS", "Category",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();

        let groups = self
            .settings
            .years_latest_first()
            .into_iter()
            .filter_map(|year| aggregation.categories.iter().find(|g| g.year == year));

        for group in groups {
            writer.write_title(0, left, &format!("TACOS categories {}", group.year))?;
            let rows: Vec<Vec<Cell>> = group
                .rows
                .iter()
                .map(|r| {
                    let mut cells = vec![Cell::text(r.sku.as_str()), Cell::text(&r.product_name)];
                    cells.extend(metric_cells(&r.metrics));
                    cells.push(Cell::text(r.category.label()));
                    cells
                })
                .collect();
            writer.write_table(1, left, &headers, &rows)?;
            left += headers.len() as u16 + BLOCK_GAP;
        }
        Ok(())
    }

    fn write_sku_sheet(
        &mut self,
        writer: &mut SheetWriter,
        display_name: &str,
        table: &Table,
    ) -> Result<()> {
        let headers: Vec<String> = table.columns().iter().map(|c| c.to_string()).collect();
        writer.write_table(0, 0, &headers, table.rows())?;

        let Some(cols) = SkuChartColumns::resolve(table) else {
            log::debug!("'{}' lacks year, time or revenue columns, no charts", display_name);
            return Ok(());
        };

        let ncols = table.column_count() as u16;
        let size = ChartSize {
            width: self.settings.chart.sku_width,
            height: self.settings.chart.sku_height,
            dpi: self.settings.chart.dpi,
        };

        for (i, year) in cols.years(table).iter().enumerate() {
            let Some(series) = chart::year_series(table, &cols, year) else {
                continue;
            };
            let row = 1 + self.settings.chart.row_stride * i as u32;

            let revenue = chart::revenue_chart(&series, display_name, size);
            self.place_chart(writer, &revenue, row, ncols + 1)?;

            if let Some(tacos) = chart::tacos_chart(&series, self.settings.safe_tacos, size) {
                self.place_chart(writer, &tacos, row, ncols + 11)?;
            }
        }
        Ok(())
    }

    /// Render and embed one chart; render failures are logged and skipped
    fn place_chart(
        &mut self,
        writer: &mut SheetWriter,
        spec: &ChartSpec,
        row: u32,
        col: u16,
    ) -> Result<()> {
        let image: ChartImage = match self.renderer.render(spec) {
            Ok(image) => image,
            Err(e) if e.is_recoverable() => {
                log::warn!("{}", e);
                self.stats.skipped_charts += 1;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        writer.insert_png(row, col, &image.png, image.width, image.height, &spec.title)?;
        self.stats.charts += 1;
        Ok(())
    }
}

/// Quantity, revenue, ad spend and formatted TACOS
fn metric_cells(m: &YearMetrics) -> [Cell; 4] {
    [
        Cell::Number(m.quantity as f64),
        Cell::Number(m.revenue),
        Cell::Number(m.ad_spend),
        Cell::Text(m.tacos_label()),
    ]
}
