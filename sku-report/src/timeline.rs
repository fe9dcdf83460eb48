//! Time labels for per-SKU detail sheets
//!
//! Seller exports put the reporting period in two unlabeled leading columns:
//! a month name ("Oct") and a day ("2", "2nd", or nothing at all). These are
//! folded into a single `Time` column such as `"Oct - 2nd"`. When the day is
//! missing, days are numbered per month in row order.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::{Cell, ColumnName, Table};

/// Header of the generated time column
pub const TIME_COLUMN: &str = "Time";

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// English ordinal suffix for an auto-numbered day
///
/// Only 1, 2 and 3 are special, so 11 and 21 come out as `11th` and `21th`.
pub fn ordinal_suffix(n: u32) -> &'static str {
    match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Build time labels from (month, day) cell pairs, auto-numbering missing days
pub fn build_labels<'a, I>(pairs: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a Cell, &'a Cell)>,
{
    let mut counters: HashMap<String, u32> = HashMap::new();

    pairs
        .into_iter()
        .map(|(month, day)| {
            if month.is_blank() && day.is_blank() {
                String::new()
            } else if day.is_blank() {
                let month_text = month.render();
                let counter = counters.entry(month_text.to_lowercase()).or_insert(0);
                *counter += 1;
                format!("{} - {}{}", month_text, counter, ordinal_suffix(*counter))
            } else {
                format!("{} - {}", month.render(), day.render())
            }
        })
        .collect()
}

/// Fold the first two unlabeled columns into a `Time` column
///
/// The column goes right after `year_column` when that column exists, else
/// first. With fewer than two unlabeled columns the table is left as is. The
/// source columns stay in place; callers drop unlabeled columns afterwards.
pub fn normalize_time_labels(table: &mut Table, year_column: &str) {
    let unlabeled: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_unlabeled())
        .map(|(i, _)| i)
        .take(2)
        .collect();

    let [month_col, day_col] = unlabeled[..] else {
        log::debug!("No unlabeled month/day column pair, skipping time labels");
        return;
    };

    let labels = build_labels(
        table
            .rows()
            .iter()
            .map(|row| (&row[month_col], &row[day_col])),
    );

    let position = table
        .position_of(year_column)
        .map(|idx| idx + 1)
        .unwrap_or(0);

    table.insert_column(
        position,
        ColumnName::labeled(TIME_COLUMN),
        labels
            .into_iter()
            .map(|l| if l.is_empty() { Cell::Empty } else { Cell::Text(l) })
            .collect(),
    );
}

/// Month number (1-12) named anywhere in the label, 0 if none
fn month_number(label_lower: &str) -> u32 {
    MONTHS
        .iter()
        .position(|m| label_lower.contains(m))
        .map(|idx| idx as u32 + 1)
        .unwrap_or(0)
}

fn first_number(label: &str) -> Option<u32> {
    FIRST_NUMBER
        .find(label)
        .and_then(|m| m.as_str().parse().ok())
}

/// Chronological sort key `(month, day)` parsed from a time label
///
/// An unknown month sorts first (0); a label without digits counts as day 1.
pub fn sort_key(label: &str) -> (u32, u32) {
    let lower = label.to_lowercase();
    (month_number(&lower), first_number(&lower).unwrap_or(1))
}

/// Short `day/month` axis labels for charts
///
/// `"Oct - 2nd"` becomes `"2/10"`. Labels with a month but no digits get a
/// per-month running day number; labels without a recognisable month are
/// kept verbatim.
pub fn axis_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut counters: HashMap<u32, u32> = HashMap::new();

    labels
        .iter()
        .map(|label| {
            let label = label.as_ref();
            let lower = label.to_lowercase();
            if label.trim().is_empty() || lower.contains("nan") || label.contains("None") {
                return String::new();
            }

            let month = month_number(&lower);
            if month == 0 {
                return label.to_string();
            }

            let day = match first_number(label) {
                Some(day) => day,
                None => {
                    let counter = counters.entry(month).or_insert(0);
                    *counter += 1;
                    *counter
                }
            };
            format!("{}/{}", day, month)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month_day_table(pairs: &[(&str, &str)]) -> Table {
        let cell = |s: &str| if s.is_empty() { Cell::Empty } else { Cell::text(s) };
        Table::from_rows(
            vec![
                ColumnName::labeled("Year"),
                ColumnName::Unlabeled(0),
                ColumnName::Unlabeled(1),
                ColumnName::labeled("Revenue"),
            ],
            pairs
                .iter()
                .map(|(m, d)| vec![Cell::text("2024"), cell(m), cell(d), Cell::Number(1.0)])
                .collect(),
        )
    }

    fn time_column(table: &Table) -> Vec<String> {
        let idx = table.position_of(TIME_COLUMN).expect("time column");
        table.column_values(idx).map(|c| c.render()).collect()
    }

    #[test]
    fn test_missing_days_auto_increment_per_month() {
        let mut table = month_day_table(&[("Oct", ""), ("Oct", ""), ("Oct", ""), ("Oct", "")]);
        normalize_time_labels(&mut table, "Year");
        assert_eq!(
            time_column(&table),
            vec!["Oct - 1st", "Oct - 2nd", "Oct - 3rd", "Oct - 4th"]
        );
    }

    #[test]
    fn test_counters_are_independent_per_month() {
        let mut table = month_day_table(&[("Oct", ""), ("Nov", ""), ("oct", "nan"), ("Nov", "")]);
        normalize_time_labels(&mut table, "Year");
        assert_eq!(
            time_column(&table),
            vec!["Oct - 1st", "Nov - 1st", "oct - 2nd", "Nov - 2nd"]
        );
    }

    #[test]
    fn test_explicit_days_and_blank_rows() {
        let mut table = month_day_table(&[("Oct", "2nd"), ("", ""), ("Nov", "15")]);
        normalize_time_labels(&mut table, "Year");
        assert_eq!(time_column(&table), vec!["Oct - 2nd", "", "Nov - 15"]);
    }

    #[test]
    fn test_blank_month_with_day_keeps_separator() {
        let mut table = month_day_table(&[("", "5"), ("", "2nd")]);
        normalize_time_labels(&mut table, "Year");
        assert_eq!(time_column(&table), vec![" - 5", " - 2nd"]);
    }

    #[test]
    fn test_no_eleventh_special_case() {
        let rows: Vec<(&str, &str)> = std::iter::repeat(("Dec", "")).take(12).collect();
        let mut table = month_day_table(&rows);
        normalize_time_labels(&mut table, "Year");
        assert_eq!(time_column(&table)[10], "Dec - 11th");
        assert_eq!(time_column(&table)[11], "Dec - 12th");
        assert_eq!(ordinal_suffix(21), "th");
    }

    #[test]
    fn test_time_column_follows_year_column() {
        let mut table = month_day_table(&[("Oct", "1")]);
        normalize_time_labels(&mut table, "Year");
        assert_eq!(table.position_of(TIME_COLUMN), Some(1));
    }

    #[test]
    fn test_time_column_first_without_year() {
        let mut table = Table::from_rows(
            vec![ColumnName::Unlabeled(0), ColumnName::Unlabeled(1)],
            vec![vec![Cell::text("Jan"), Cell::Number(3.0)]],
        );
        normalize_time_labels(&mut table, "Year");
        assert_eq!(table.position_of(TIME_COLUMN), Some(0));
        assert_eq!(table.cell(0, 0), &Cell::text("Jan - 3"));
    }

    #[test]
    fn test_single_unlabeled_column_is_left_alone() {
        let mut table = Table::from_rows(
            vec![ColumnName::Unlabeled(0), ColumnName::labeled("Revenue")],
            vec![vec![Cell::text("Jan"), Cell::Number(3.0)]],
        );
        normalize_time_labels(&mut table, "Year");
        assert_eq!(table.position_of(TIME_COLUMN), None);
    }

    #[test]
    fn test_sort_key() {
        assert_eq!(sort_key("Oct - 2nd"), (10, 2));
        assert_eq!(sort_key("Nov - 15"), (11, 15));
        assert_eq!(sort_key("Week 3"), (0, 3));
        assert_eq!(sort_key("Jan"), (1, 1));
    }

    #[test]
    fn test_axis_labels() {
        let labels = ["Oct - 2nd", "", "Dec", "Dec", "Week A"];
        assert_eq!(axis_labels(&labels), vec!["2/10", "", "1/12", "2/12", "Week A"]);
    }
}
