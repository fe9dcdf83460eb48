//! Excel I/O: reading seller exports, writing formatted report sheets

mod reader;
mod writer;

pub use reader::{Sheet, Workbook, read_workbook, range_to_table};
pub use writer::{SheetWriter, header_format};

/// Input file extensions accepted by the pipeline
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Is this path a spreadsheet the pipeline can read?
pub fn is_supported(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
