//! Cell values read from spreadsheet exports

/// A single spreadsheet cell, as loaded from an input workbook
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Blank cell (or an Excel error value)
    Empty,
    /// Free text
    Text(String),
    /// Any numeric value (integers included)
    Number(f64),
    /// Boolean
    Bool(bool),
}

impl Cell {
    /// Build a text cell
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Check if this cell carries no value
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Blank for the purpose of time labels and SKU enumeration:
    /// empty, whitespace-only, or a literal "nan" left over from earlier exports
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
            }
            Cell::Number(f) => f.is_nan(),
            Cell::Bool(_) => false,
        }
    }

    /// Render the cell as text
    ///
    /// Whole numbers drop their decimal point so that a numeric SKU `12345`
    /// renders the same whether calamine returned it as an int or a float.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(f) => format_number(*f),
            Cell::Bool(b) => b.to_string(),
        }
    }

    /// Coerce to a number; anything that does not parse is `None`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(f) if !f.is_nan() => Some(*f),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Coerce to a number, treating non-parseable values as zero
    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Number(f)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Number(i as f64)
    }
}

fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_whole_numbers_without_decimal() {
        assert_eq!(Cell::Number(12345.0).render(), "12345");
        assert_eq!(Cell::Number(-3.0).render(), "-3");
        assert_eq!(Cell::Number(2.5).render(), "2.5");
        assert_eq!(Cell::Empty.render(), "");
    }

    #[test]
    fn test_blank_detection() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::text("  ").is_blank());
        assert!(Cell::text("NaN").is_blank());
        assert!(!Cell::text("Oct").is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Cell::text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Cell::text("$12").as_number(), None);
        assert_eq!(Cell::text("n/a").number_or_zero(), 0.0);
        assert_eq!(Cell::Bool(true).number_or_zero(), 1.0);
        assert_eq!(Cell::Empty.number_or_zero(), 0.0);
    }
}
