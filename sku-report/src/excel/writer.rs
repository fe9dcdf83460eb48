//! Formatted table writing for report worksheets

use anyhow::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, Image, Worksheet};

use crate::columns;
use crate::table::Cell;

/// Header fill used on every table header row
pub const HEADER_FILL: u32 = 0x4472C4;

const PERCENT_FORMAT: &str = "0.00%";
const CURRENCY_FORMAT: &str = "\"$\"#,##0.00";

/// Bold white text on the header fill, centered
pub fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

/// Number format for data cells under a header, picked by header keywords
fn column_format(header: &str) -> Option<Format> {
    if columns::TACOS.matches(header) {
        Some(Format::new().set_num_format(PERCENT_FORMAT))
    } else if columns::CURRENCY.matches(header) {
        Some(Format::new().set_num_format(CURRENCY_FORMAT))
    } else {
        None
    }
}

/// Writes cells to a worksheet while tracking the widest rendered value per
/// column, so widths can be fitted once everything is on the sheet
pub struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    widths: Vec<usize>,
    max_width: usize,
}

impl<'a> SheetWriter<'a> {
    pub fn new(sheet: &'a mut Worksheet, max_width: usize) -> Self {
        Self {
            sheet,
            widths: Vec::new(),
            max_width,
        }
    }

    /// Write a header row plus data rows with its top-left corner at (top, left)
    ///
    /// Data cells get a percentage format under TACOS headers and a currency
    /// format under money headers.
    pub fn write_table(
        &mut self,
        top: u32,
        left: u16,
        headers: &[String],
        rows: &[Vec<Cell>],
    ) -> Result<()> {
        let header_format = header_format();
        for (offset, header) in headers.iter().enumerate() {
            let col = left + offset as u16;
            self.sheet
                .write_string_with_format(top, col, header, &header_format)?;
            self.track(col, header.chars().count());
        }

        let formats: Vec<Option<Format>> = headers.iter().map(|h| column_format(h)).collect();

        for (row_offset, row) in rows.iter().enumerate() {
            let row_idx = top + 1 + row_offset as u32;
            for (offset, cell) in row.iter().enumerate() {
                let format = formats.get(offset).and_then(|f| f.as_ref());
                self.write_cell(row_idx, left + offset as u16, cell, format)?;
            }
        }

        Ok(())
    }

    /// Write a single cell; empty cells are left untouched
    pub fn write_cell(
        &mut self,
        row: u32,
        col: u16,
        cell: &Cell,
        format: Option<&Format>,
    ) -> Result<()> {
        match (cell, format) {
            (Cell::Empty, _) => return Ok(()),
            (Cell::Text(s), Some(f)) => {
                self.sheet.write_string_with_format(row, col, s, f)?;
            }
            (Cell::Text(s), None) => {
                self.sheet.write_string(row, col, s)?;
            }
            (Cell::Number(n), Some(f)) => {
                self.sheet.write_number_with_format(row, col, *n, f)?;
            }
            (Cell::Number(n), None) => {
                self.sheet.write_number(row, col, *n)?;
            }
            (Cell::Bool(b), Some(f)) => {
                self.sheet.write_boolean_with_format(row, col, *b, f)?;
            }
            (Cell::Bool(b), None) => {
                self.sheet.write_boolean(row, col, *b)?;
            }
        }
        self.track(col, cell.render().chars().count());
        Ok(())
    }

    /// Write a bold label
    pub fn write_title(&mut self, row: u32, col: u16, title: &str) -> Result<()> {
        let bold = Format::new().set_bold();
        self.sheet.write_string_with_format(row, col, title, &bold)?;
        Ok(())
    }

    /// Embed a PNG at (row, col), scaled to the given display size in pixels
    pub fn insert_png(
        &mut self,
        row: u32,
        col: u16,
        png: &[u8],
        width: u32,
        height: u32,
        alt_text: &str,
    ) -> Result<()> {
        let image = Image::new_from_buffer(png)?
            .set_scale_to_size(width, height, false)
            .set_alt_text(alt_text);
        self.sheet.insert_image(row, col, &image)?;
        Ok(())
    }

    /// Apply fitted column widths: longest value + 2, capped at the maximum
    pub fn finish(self) -> Result<()> {
        for (col, len) in self.widths.iter().enumerate() {
            if *len == 0 {
                continue;
            }
            let width = (len + 2).min(self.max_width);
            self.sheet.set_column_width(col as u16, width as f64)?;
        }
        Ok(())
    }

    fn track(&mut self, col: u16, len: usize) {
        let col = col as usize;
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        self.widths[col] = self.widths[col].max(len);
    }
}
