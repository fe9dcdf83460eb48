//! Heuristic column and sheet lookup
//!
//! Exports from the marketplace seller tools are not schema-stable: headers
//! come in English or Vietnamese and drift between report versions. Every
//! semantic field therefore gets one matcher with an ordered keyword list, and
//! all lookups go through [`FieldMatcher::find`]. Matching is a
//! case-insensitive substring test of each header against each keyword;
//! headers are scanned left to right and the first hit wins.

use crate::table::Table;

/// A semantic field and the header keywords that identify it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMatcher {
    pub field: &'static str,
    /// Lower-case keywords
    pub keywords: &'static [&'static str],
}

impl FieldMatcher {
    /// Does this header text identify the field?
    pub fn matches(&self, header: &str) -> bool {
        let header = header.to_lowercase();
        self.keywords.iter().any(|k| header.contains(k))
    }

    /// Position of the first matching column, scanning left to right
    pub fn find(&self, table: &Table) -> Option<usize> {
        find_column(table, self.keywords)
    }
}

/// SKU / ASIN / product code column of the performance sheet
pub const SKU: FieldMatcher = FieldMatcher {
    field: "sku",
    keywords: &["sku", "asin", "product", "code", "sản phẩm", "mã"],
};

pub const PRODUCT_NAME: FieldMatcher = FieldMatcher {
    field: "product name",
    keywords: &["sản phẩm", "product"],
};

pub const QUANTITY: FieldMatcher = FieldMatcher {
    field: "quantity",
    keywords: &["số lượng bán ra", "quantity", "units sold", "sold"],
};

pub const REVENUE: FieldMatcher = FieldMatcher {
    field: "revenue",
    keywords: &["doanh số", "revenue", "tổng doanh", "sales"],
};

pub const AD_SPEND: FieldMatcher = FieldMatcher {
    field: "ad spend",
    keywords: &[
        "chi phí quảng cáo",
        "ad cost",
        "advertising",
        "quảng cáo",
        "ad spent",
        "ad spend",
    ],
};

pub const YEAR: FieldMatcher = FieldMatcher {
    field: "year",
    keywords: &["năm", "year"],
};

pub const TIME: FieldMatcher = FieldMatcher {
    field: "time",
    keywords: &["thời gian", "time", "ngày", "date", "tuần", "week"],
};

pub const TACOS: FieldMatcher = FieldMatcher {
    field: "tacos",
    keywords: &["tacos"],
};

pub const SAFE_TACOS: FieldMatcher = FieldMatcher {
    field: "safe tacos",
    keywords: &["tacos an toàn", "tacos an toan", "safe tacos"],
};

/// Headers whose values are money amounts in the generated report
pub const CURRENCY: FieldMatcher = FieldMatcher {
    field: "currency",
    keywords: &["tổng doanh", "chi phí", "revenue", "ad spend"],
};

/// Sheet-name keywords of the performance (SKU list) sheet
pub const PERFORMANCE_SHEET: FieldMatcher = FieldMatcher {
    field: "performance sheet",
    keywords: &["performance", "tổng"],
};

/// First column whose header contains any of `keywords` (lower-case)
///
/// Unlabeled columns never match. `None` is a normal outcome; callers decide
/// the fallback.
pub fn find_column(table: &Table, keywords: &[&str]) -> Option<usize> {
    table.columns().iter().position(|column| {
        column.label().is_some_and(|label| {
            let label = label.to_lowercase();
            keywords.iter().any(|k| label.contains(k))
        })
    })
}

/// SKU column with the positional fallback: second column, or the first
/// when the sheet only has one
pub fn sku_column(table: &Table) -> Option<usize> {
    SKU.find(table).or(match table.column_count() {
        0 => None,
        1 => Some(0),
        _ => Some(1),
    })
}

/// Index of the performance sheet among `sheet_names`, if one is recognisable
pub fn performance_sheet(sheet_names: &[String]) -> Option<usize> {
    sheet_names
        .iter()
        .position(|name| PERFORMANCE_SHEET.matches(name))
}
