//! Command definitions and handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;

use sku_report::aggregate::{Category, YearMetrics};
use sku_report::chart::RasterRenderer;
use sku_report::pipeline;
use sku_report::{ReportError, Settings};

/// Build TACOS performance reports from seller spreadsheet exports
#[derive(Parser, Debug)]
#[command(name = "sku-report")]
#[command(about = "Build per-SKU sales and TACOS reports from Excel exports", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a config.toml (default: <config dir>/sku-report/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract, aggregate and write the report workbook
    Analyze(AnalyzeCommand),
    /// Show per-SKU sums and TACOS without writing a report
    Inspect(InspectCommand),
}

#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Input workbooks (.xlsx / .xls)
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Directory for the report (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Input workbooks (.xlsx / .xls)
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    Settings::load(path).context("Failed to load settings")
}

pub fn handle_analyze(cmd: AnalyzeCommand, mut settings: Settings) -> Result<()> {
    if let Some(dir) = cmd.output {
        settings.output_dir = dir;
    }

    match pipeline::run(&cmd.files, &settings) {
        Ok(summary) => {
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("{} {}", "✓".green().bold(), summary.message);
            for sku in &summary.skus {
                println!("  {}", sku.to_string().cyan());
            }
            println!(
                "Report: {}",
                settings
                    .output_dir
                    .join(&summary.output_file)
                    .display()
                    .to_string()
                    .bold()
            );
            Ok(())
        }
        Err(e) => {
            if cmd.json {
                let payload = serde_json::json!({ "error": e.to_string() });
                println!("{}", serde_json::to_string_pretty(&payload)?);
                std::process::exit(exit_code(&e));
            }
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(exit_code(&e));
        }
    }
}

/// 2 for bad requests, 1 for everything else
fn exit_code(err: &ReportError) -> i32 {
    match err {
        ReportError::Input(_) => 2,
        _ => 1,
    }
}

pub fn handle_inspect(cmd: InspectCommand, settings: Settings) -> Result<()> {
    let paths = pipeline::validate_inputs(&cmd.files)?;
    let extraction = pipeline::extract(&paths, &settings)?;
    let aggregation = pipeline::aggregate(&extraction, &settings);

    if extraction.is_empty() {
        println!("{}", "No SKU data found".yellow());
        return Ok(());
    }

    let renderer = RasterRenderer::new(settings.font_path.as_deref());
    if !renderer.has_font() {
        println!(
            "{}",
            "No chart font available; charts would be drawn without labels".yellow()
        );
    }

    println!(
        "{} SKUs across {} file(s)\n",
        extraction.skus.len().to_string().bold(),
        paths.len()
    );

    for (record, row) in extraction.records.iter().zip(&aggregation.comparison) {
        println!("{} {}", row.sku.to_string().cyan().bold(), row.product_name.dimmed());
        for (bucket, metrics) in record.buckets.iter().zip(&row.years) {
            println!(
                "  {}  {:>4} rows  {}",
                bucket.year,
                bucket.table.row_count(),
                describe(metrics)
            );
        }
    }

    Ok(())
}

fn describe(m: &YearMetrics) -> String {
    let category = match m.category() {
        Category::Good => m.category().label().green(),
        Category::Bad => m.category().label().red(),
        Category::Average => m.category().label().yellow(),
    };
    let category = if m.has_activity() {
        category.to_string()
    } else {
        "-".dimmed().to_string()
    };
    format!(
        "qty {:>6}  revenue {:>12.2}  ad spend {:>10.2}  TACOS {:>8}  {}",
        m.quantity,
        m.revenue,
        m.ad_spend,
        m.tacos_label(),
        category
    )
}
