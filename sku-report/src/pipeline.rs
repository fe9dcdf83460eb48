//! Entry points: validate inputs, extract, aggregate, write the report

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::aggregate::{self, Aggregation};
use crate::chart::{ChartRenderer, RasterRenderer};
use crate::config::Settings;
use crate::error::{ReportError, Result};
use crate::excel;
use crate::extract::{self, Extraction};
use crate::report::{self, ReportWriter};
use crate::sku::SkuId;

/// Outcome of a full run, printed as JSON by `analyze --json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub success: bool,
    pub message: String,
    pub skus: Vec<SkuId>,
    pub output_file: String,
}

/// Keep the spreadsheet paths among `paths`
///
/// An empty list, or one without any .xlsx / .xls file, is rejected.
pub fn validate_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        return Err(ReportError::Input("No files provided".to_string()));
    }

    let (accepted, rejected): (Vec<PathBuf>, Vec<PathBuf>) = paths
        .iter()
        .map(|p| p.as_ref().to_path_buf())
        .partition(|p| excel::is_supported(p));

    for path in &rejected {
        log::warn!("Skipping {}: not an .xlsx or .xls file", path.display());
    }

    if accepted.is_empty() {
        return Err(ReportError::Input(
            "No valid Excel files (.xlsx, .xls) provided".to_string(),
        ));
    }

    Ok(accepted)
}

/// Read all inputs into per-SKU records
pub fn extract(paths: &[PathBuf], settings: &Settings) -> Result<Extraction> {
    extract::extract_files(paths, &settings.years)
}

/// Aggregate an extraction with the configured years
pub fn aggregate(extraction: &Extraction, settings: &Settings) -> Aggregation {
    aggregate::aggregate(&extraction.records, &settings.years)
}

/// Aggregate, render charts and save the report; returns the file name
pub fn assemble_report(
    extraction: &Extraction,
    settings: &Settings,
    renderer: &dyn ChartRenderer,
) -> Result<String> {
    let aggregation = aggregate(extraction, settings);

    let now = chrono::Local::now();
    let path = report::output_path(&settings.output_dir, &now)
        .map_err(|e| ReportError::assembly(&settings.output_dir, e))?;

    let stats = ReportWriter::new(settings, renderer)
        .write(&extraction.records, &aggregation, &path)
        .map_err(|e| ReportError::assembly(&path, e))?;

    log::info!(
        "Wrote {} sheets with {} charts ({} skipped)",
        stats.sheets,
        stats.charts,
        stats.skipped_charts
    );

    Ok(path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string()))
}

/// Full run over `paths`
///
/// Inputs without any SKU data still produce a report holding only the
/// summary sheet.
pub fn run<P: AsRef<Path>>(paths: &[P], settings: &Settings) -> Result<RunSummary> {
    let paths = validate_inputs(paths)?;
    let extraction = extract(&paths, settings)?;

    if extraction.is_empty() {
        log::warn!("No SKU rows found in the year sheets");
    }

    let renderer = RasterRenderer::new(settings.font_path.as_deref());
    let output_file = assemble_report(&extraction, settings, &renderer)?;

    Ok(RunSummary {
        success: true,
        message: format!("Processed {} SKUs", extraction.skus.len()),
        skus: extraction.skus,
        output_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, open_workbook_auto};
    use rust_xlsxwriter::Workbook;

    type Row<'a> = Vec<Option<Value<'a>>>;

    enum Value<'a> {
        S(&'a str),
        N(f64),
    }
    use Value::{N, S};

    fn write_input(path: &Path, sheets: &[(&str, Vec<Row>)]) {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    match value {
                        Some(S(s)) => {
                            sheet.write_string(r as u32, c as u16, *s).unwrap();
                        }
                        Some(N(n)) => {
                            sheet.write_number(r as u32, c as u16, *n).unwrap();
                        }
                        None => {}
                    }
                }
            }
        }
        workbook.save(path).unwrap();
    }

    /// One listing sheet and a 2024 sheet with three A1B2 rows
    fn a1b2_input(path: &Path) {
        write_input(
            path,
            &[
                (
                    "Total Performance",
                    vec![
                        vec![Some(S("SKU")), Some(S("Product Name"))],
                        vec![Some(S("A1B2")), Some(S("Garden Hose"))],
                    ],
                ),
                (
                    "2024",
                    vec![
                        vec![None, None, Some(S("SKU")), Some(S("Quantity")), Some(S("Revenue")), Some(S("Ad Spend"))],
                        vec![Some(S("Oct")), None, Some(S("A1B2")), Some(N(1.0)), Some(N(100.0)), Some(N(10.0))],
                        vec![Some(S("Oct")), None, Some(S("A1B2")), Some(N(1.0)), Some(N(150.0)), Some(N(20.0))],
                        vec![Some(S("Oct")), None, Some(S("A1B2")), Some(N(1.0)), Some(N(200.0)), Some(N(30.0))],
                    ],
                ),
            ],
        );
    }

    /// A second export: C3D4 with 2025 rows only, plus A1B2 listed under
    /// another product name but without year rows
    fn c3d4_input(path: &Path) {
        write_input(
            path,
            &[
                (
                    "Total Performance",
                    vec![
                        vec![Some(S("SKU")), Some(S("Product Name"))],
                        vec![Some(S("C3D4")), Some(S("Watering Can"))],
                        vec![Some(S("A1B2")), Some(S("Renamed Product"))],
                    ],
                ),
                (
                    "2025",
                    vec![
                        vec![None, None, Some(S("SKU")), Some(S("Quantity")), Some(S("Revenue")), Some(S("Ad Spend"))],
                        vec![Some(S("Jan")), Some(N(4.0)), Some(S("C3D4")), Some(N(2.0)), Some(N(80.0)), Some(N(40.0))],
                    ],
                ),
            ],
        );
    }

    fn settings_for(dir: &Path) -> Settings {
        Settings {
            output_dir: dir.join("outputs"),
            ..Settings::default()
        }
    }

    fn sheet_rows(path: &Path, name: &str) -> Vec<Vec<Data>> {
        let mut workbook = open_workbook_auto(path).unwrap();
        let range = workbook.worksheet_range(name).unwrap();
        range.rows().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn test_validate_inputs() {
        assert!(matches!(
            validate_inputs::<PathBuf>(&[]),
            Err(ReportError::Input(_))
        ));
        assert!(matches!(
            validate_inputs(&["notes.txt"]),
            Err(ReportError::Input(_))
        ));
        assert_eq!(
            validate_inputs(&["a.xlsx", "b.csv", "c.XLS"]).unwrap(),
            vec![PathBuf::from("a.xlsx"), PathBuf::from("c.XLS")]
        );
    }

    #[test]
    fn test_a1b2_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let second = dir.path().join("second.xlsx");
        a1b2_input(&input);
        c3d4_input(&second);
        let settings = settings_for(dir.path());

        let paths = validate_inputs(&[&input, &second]).unwrap();
        let extraction = extract(&paths, &settings).unwrap();
        assert_eq!(extraction.skus, vec![SkuId::new("A1B2"), SkuId::new("C3D4")]);
        // the second file's listing does not rename A1B2
        assert_eq!(
            extraction.records[0].product_name.as_deref(),
            Some("Garden Hose")
        );

        let aggregation = aggregate(&extraction, &settings);
        let row = &aggregation.comparison[0];
        assert_eq!(row.years[0].quantity, 3);
        assert_eq!(row.years[0].revenue, 450.0);
        assert_eq!(row.years[0].ad_spend, 60.0);
        assert_eq!(row.years[0].tacos_label(), "13.33%");
        assert_eq!(row.years[1].quantity, 0);
        assert_eq!(row.years[1].revenue, 0.0);
        assert_eq!(row.years[1].tacos_label(), "0.00%");

        let other = &aggregation.comparison[1];
        assert_eq!(other.product_name, "Watering Can");
        assert_eq!(other.years[0].quantity, 0);
        assert_eq!(other.years[1].revenue, 80.0);
        assert_eq!(other.years[1].tacos_label(), "50.00%");

        let renderer = RasterRenderer::without_font();
        let name = assemble_report(&extraction, &settings, &renderer).unwrap();
        assert!(name.starts_with("analysis_report_"));
        let output = settings.output_dir.join(&name);

        let summary = sheet_rows(&output, report::SUMMARY_SHEET);
        assert_eq!(summary[0][0], Data::String("SKU".into()));
        assert_eq!(summary[1][0], Data::String("A1B2".into()));
        assert_eq!(summary[1][1], Data::String("Garden Hose".into()));
        assert_eq!(summary[1][5], Data::String("13.33%".into()));
        assert_eq!(summary[2][0], Data::String("C3D4".into()));
        // totals block, latest year first
        assert_eq!(summary[6][0], Data::String("Year".into()));
        assert_eq!(summary[7][0], Data::String("2025".into()));
        assert_eq!(summary[7][2], Data::Float(80.0));
        assert_eq!(summary[8][0], Data::String("2024".into()));
        assert_eq!(summary[8][2], Data::Float(450.0));

        let sku_sheet = sheet_rows(&output, "Garden Hose");
        assert_eq!(sku_sheet[0][0], Data::String("Year".into()));
        assert_eq!(sku_sheet[0][1], Data::String("Time".into()));
        assert_eq!(sku_sheet[1][1], Data::String("Oct - 1st".into()));
        assert_eq!(sku_sheet[3][1], Data::String("Oct - 3rd".into()));
        assert_eq!(sku_sheet.len(), 4);

        let other_sheet = sheet_rows(&output, "Watering Can");
        assert_eq!(other_sheet[1][0], Data::String("2025".into()));
        assert_eq!(other_sheet[1][1], Data::String("Jan - 4".into()));
        assert_eq!(other_sheet.len(), 2);
    }

    #[test]
    fn test_no_sku_rows_still_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        write_input(
            &input,
            &[
                (
                    "Performance",
                    vec![
                        vec![Some(S("SKU")), Some(S("Product Name"))],
                        vec![Some(S("S1")), Some(S("Lonely"))],
                    ],
                ),
                (
                    "2025",
                    vec![
                        vec![Some(S("SKU")), Some(S("Revenue"))],
                        vec![Some(S("OTHER")), Some(N(5.0))],
                    ],
                ),
            ],
        );
        let settings = settings_for(dir.path());

        let summary = run(&[&input], &settings).unwrap();
        assert!(summary.success);
        assert!(summary.skus.is_empty());
        assert_eq!(summary.message, "Processed 0 SKUs");

        let output = settings.output_dir.join(&summary.output_file);
        let workbook = open_workbook_auto(&output).unwrap();
        assert_eq!(workbook.sheet_names(), vec![report::SUMMARY_SHEET.to_string()]);
        let rows = sheet_rows(&output, report::SUMMARY_SHEET);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Data::String("SKU".into()));
    }

    #[test]
    fn test_same_file_twice_duplicates_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        a1b2_input(&input);
        let settings = settings_for(dir.path());

        let extraction = extract(&[input.clone(), input.clone()], &settings).unwrap();
        assert_eq!(extraction.skus.len(), 1);

        let aggregation = aggregate(&extraction, &settings);
        assert_eq!(aggregation.comparison[0].years[0].revenue, 900.0);
        assert_eq!(aggregation.comparison[0].years[0].quantity, 6);
    }

    #[test]
    fn test_sheet_name_collision_keeps_later_data() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        write_input(
            &input,
            &[
                (
                    "Performance",
                    vec![
                        vec![Some(S("SKU")), Some(S("Product Name"))],
                        vec![Some(S("AAA1")), Some(S("Garden Hose"))],
                        vec![Some(S("BBB2")), Some(S("garden hose"))],
                    ],
                ),
                (
                    "2025",
                    vec![
                        vec![Some(S("Item")), Some(S("Revenue"))],
                        vec![Some(S("AAA1")), Some(N(10.0))],
                        vec![Some(S("BBB2")), Some(N(20.0))],
                    ],
                ),
            ],
        );
        let settings = settings_for(dir.path());

        let summary = run(&[&input], &settings).unwrap();
        assert!(summary.success);
        assert_eq!(summary.skus.len(), 2);

        let output = settings.output_dir.join(&summary.output_file);
        let workbook = open_workbook_auto(&output).unwrap();
        let names = workbook.sheet_names();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1], "garden hose");

        let rows = sheet_rows(&output, "garden hose");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], Data::String("BBB2".into()));
    }

    #[test]
    fn test_unreadable_input_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.xlsx");
        std::fs::write(&input, b"not a workbook").unwrap();

        let err = run(&[&input], &settings_for(dir.path())).unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
        assert!(!dir.path().join("outputs").exists());
    }
}
