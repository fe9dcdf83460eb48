//! Worksheet and output file names

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rand::Rng;

/// Longest worksheet name Excel accepts
pub const MAX_SHEET_NAME: usize = 31;

const INVALID_SHEET_CHARS: &[char] = &['[', ']', '*', '?', ':', '\\', '/'];

/// Fallback used when neither the product name nor the SKU gives a name
const FALLBACK_SHEET_NAME: &str = "Sheet";

fn clean(raw: &str) -> String {
    let truncated: String = raw.chars().take(MAX_SHEET_NAME).collect();
    let stripped: String = truncated
        .chars()
        .filter(|c| !INVALID_SHEET_CHARS.contains(c))
        .collect();
    stripped.trim_matches('\'').to_string()
}

/// Worksheet name for a SKU sheet
///
/// The preferred name is cut to 31 characters first and then stripped of the
/// characters Excel rejects, so the result may be shorter than 31.
pub fn sheet_name(preferred: &str, sku: &str) -> String {
    [preferred, sku]
        .iter()
        .map(|raw| clean(raw))
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SHEET_NAME.to_string())
}

/// `analysis_report_<YYYYMMDD_HHMMSS>.xlsx`
pub fn report_file_name(now: &DateTime<Local>) -> String {
    format!("analysis_report_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Path for a new report in `dir`, creating the directory if needed
///
/// When a report with the same timestamp exists, a random 4-hex-digit suffix
/// is added.
pub fn output_path(dir: &Path, now: &DateTime<Local>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let path = dir.join(report_file_name(now));
    if !path.exists() {
        return Ok(path);
    }

    let stamp = now.format("%Y%m%d_%H%M%S");
    let mut rng = rand::rng();
    for _ in 0..32 {
        let suffix: u16 = rng.random();
        let candidate = dir.join(format!("analysis_report_{}_{:04x}.xlsx", stamp, suffix));
        if !candidate.exists() {
            log::debug!("{} exists, writing {}", path.display(), candidate.display());
            return Ok(candidate);
        }
    }

    anyhow::bail!("Could not find a free report file name in {}", dir.display())
}
