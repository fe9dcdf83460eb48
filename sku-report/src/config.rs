//! Settings loaded from `config.toml`, `.env` and environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const OUTPUT_DIR_ENV: &str = "SKU_REPORT_OUTPUT_DIR";
pub const FONT_ENV: &str = "SKU_REPORT_FONT";

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the report workbook is written to, created when missing
    pub output_dir: PathBuf,
    /// The two reporting years, earliest first. Year sheets are matched by
    /// exact name.
    pub years: Vec<String>,
    /// Safe TACOS threshold written into every SKU sheet, as a fraction
    pub safe_tacos: f64,
    /// Upper bound for fitted column widths
    pub max_column_width: usize,
    /// TrueType font for chart labels; system fonts are tried when unset
    pub font_path: Option<PathBuf>,
    pub chart: ChartSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            years: vec!["2024".to_string(), "2025".to_string()],
            safe_tacos: 0.30,
            max_column_width: 50,
            font_path: None,
            chart: ChartSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartSettings {
    pub dpi: u32,
    pub sku_width: u32,
    pub sku_height: u32,
    pub comparison_width: u32,
    pub comparison_height: u32,
    /// Rows between the chart pairs of consecutive years on a SKU sheet
    pub row_stride: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            sku_width: 560,
            sku_height: 336,
            comparison_width: 600,
            comparison_height: 400,
            row_stride: 20,
        }
    }
}

impl Settings {
    /// Load settings: explicit path, else the user config file, else defaults.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    log::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(font) = std::env::var(FONT_ENV) {
            if !font.trim().is_empty() {
                self.font_path = Some(PathBuf::from(font));
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.years.len() != 2 {
            anyhow::bail!(
                "Exactly two reporting years are required, got {}",
                self.years.len()
            );
        }
        if self.years[0] == self.years[1] {
            anyhow::bail!("Reporting years must differ, got '{}' twice", self.years[0]);
        }
        if self.max_column_width == 0 {
            anyhow::bail!("max_column_width must be at least 1");
        }
        if self.chart.dpi == 0 {
            anyhow::bail!("chart.dpi must be at least 1");
        }
        Ok(())
    }

    /// Years latest first, the order used by the summary blocks
    pub fn years_latest_first(&self) -> Vec<String> {
        self.years.iter().rev().cloned().collect()
    }
}

/// `<config_dir>/sku-report/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sku-report").join("config.toml"))
}
