//! Per-SKU, per-year metric sums and TACOS classification

use serde::Serialize;

use crate::columns::{self, FieldMatcher};
use crate::sku::{SkuId, SkuRecord};
use crate::table::Table;

/// TACOS band of a SKU-year
///
/// Up to 30% is "Good", up to 50% is "Bad", above that is "Average".
/// The label strings are consumed as-is by downstream sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Good,
    Bad,
    Average,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Bad => "Bad",
            Category::Average => "Average",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// TACOS in percent: ad spend / revenue * 100, or 0 without revenue
///
/// Not clamped; ad spend above revenue gives values over 100.
pub fn tacos_percent(ad_spend: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        ad_spend / revenue * 100.0
    }
}

/// Classify a TACOS percentage
pub fn categorize(tacos: f64) -> Category {
    if tacos == 0.0 || tacos <= 30.0 {
        Category::Good
    } else if tacos <= 50.0 {
        Category::Bad
    } else {
        Category::Average
    }
}

/// Format a TACOS percentage the way the summary sheet shows it
pub fn format_percent(tacos: f64) -> String {
    format!("{:.2}%", tacos)
}

/// Summed metrics of one SKU (or all SKUs) for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMetrics {
    pub year: String,
    pub quantity: i64,
    pub revenue: f64,
    pub ad_spend: f64,
}

impl YearMetrics {
    pub fn zero(year: &str) -> Self {
        Self {
            year: year.to_string(),
            quantity: 0,
            revenue: 0.0,
            ad_spend: 0.0,
        }
    }

    pub fn tacos(&self) -> f64 {
        tacos_percent(self.ad_spend, self.revenue)
    }

    pub fn tacos_label(&self) -> String {
        format_percent(self.tacos())
    }

    pub fn category(&self) -> Category {
        categorize(self.tacos())
    }

    /// Whether the year shows any sales activity
    pub fn has_activity(&self) -> bool {
        self.quantity != 0 || self.revenue != 0.0
    }
}

fn column_sum(table: &Table, matcher: &FieldMatcher) -> f64 {
    match matcher.find(table) {
        Some(col) => table.column_values(col).map(|c| c.number_or_zero()).sum(),
        None => {
            log::debug!("No {} column found, counting it as 0", matcher.field);
            0.0
        }
    }
}

/// Sum quantity, revenue and ad spend of one year's rows
///
/// Missing columns and non-numeric cells count as zero. Quantity is
/// truncated to a whole number after summing.
pub fn year_metrics(year: &str, table: &Table) -> YearMetrics {
    if table.is_empty() {
        return YearMetrics::zero(year);
    }

    YearMetrics {
        year: year.to_string(),
        quantity: column_sum(table, &columns::QUANTITY) as i64,
        revenue: column_sum(table, &columns::REVENUE),
        ad_spend: column_sum(table, &columns::AD_SPEND),
    }
}

/// One row of the summary sheet: a SKU with every year's metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub sku: SkuId,
    pub product_name: String,
    /// Configured year order
    pub years: Vec<YearMetrics>,
}

/// A SKU-year with sales activity and its TACOS band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub sku: SkuId,
    pub product_name: String,
    pub metrics: YearMetrics,
    pub tacos: String,
    pub category: Category,
}

/// Category rows of one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCategories {
    pub year: String,
    pub rows: Vec<CategoryRow>,
}

/// Everything the report needs from aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub comparison: Vec<ComparisonRow>,
    /// Configured year order
    pub categories: Vec<YearCategories>,
}

/// Placeholder product name for SKUs whose performance sheet had none
pub const UNKNOWN_PRODUCT: &str = "N/A";

/// Aggregate retained SKU records
pub fn aggregate(records: &[SkuRecord], years: &[String]) -> Aggregation {
    let mut comparison = Vec::with_capacity(records.len());
    let mut categories: Vec<YearCategories> = years
        .iter()
        .map(|year| YearCategories {
            year: year.clone(),
            rows: Vec::new(),
        })
        .collect();

    for record in records {
        let product_name = record
            .product_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());

        let metrics: Vec<YearMetrics> = years
            .iter()
            .map(|year| match record.bucket(year) {
                Some(bucket) => year_metrics(year, &bucket.table),
                None => YearMetrics::zero(year),
            })
            .collect();

        for (m, group) in metrics.iter().zip(categories.iter_mut()) {
            if m.has_activity() {
                group.rows.push(CategoryRow {
                    sku: record.sku.clone(),
                    product_name: product_name.clone(),
                    metrics: m.clone(),
                    tacos: m.tacos_label(),
                    category: m.category(),
                });
            }
        }

        log::debug!(
            "Aggregated {}: {}",
            record.sku,
            metrics
                .iter()
                .map(|m| format!("{} rev={:.2} ad={:.2} tacos={}", m.year, m.revenue, m.ad_spend, m.tacos_label()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        comparison.push(ComparisonRow {
            sku: record.sku.clone(),
            product_name,
            years: metrics,
        });
    }

    Aggregation {
        comparison,
        categories,
    }
}

/// Totals across all SKUs per year, in configured year order
pub fn year_totals(rows: &[ComparisonRow], years: &[String]) -> Vec<YearMetrics> {
    years
        .iter()
        .enumerate()
        .map(|(idx, year)| {
            let mut total = YearMetrics::zero(year);
            for row in rows {
                if let Some(m) = row.years.get(idx) {
                    total.quantity += m.quantity;
                    total.revenue += m.revenue;
                    total.ad_spend += m.ad_spend;
                }
            }
            total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, ColumnName};

    fn years() -> Vec<String> {
        vec!["2024".to_string(), "2025".to_string()]
    }

    fn sales_table(rows: &[(f64, f64)]) -> Table {
        Table::from_rows(
            vec![ColumnName::labeled("Revenue"), ColumnName::labeled("Ad Spend")],
            rows.iter()
                .map(|(r, a)| vec![Cell::Number(*r), Cell::Number(*a)])
                .collect(),
        )
    }

    #[test]
    fn test_tacos_zero_revenue() {
        assert_eq!(tacos_percent(50.0, 0.0), 0.0);
        assert_eq!(tacos_percent(0.0, 0.0), 0.0);
        assert_eq!(tacos_percent(60.0, 450.0), 60.0 / 450.0 * 100.0);
        // not clamped
        assert_eq!(tacos_percent(300.0, 100.0), 300.0);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(categorize(0.0), Category::Good);
        assert_eq!(categorize(12.5), Category::Good);
        assert_eq!(categorize(30.0), Category::Good);
        assert_eq!(categorize(30.01), Category::Bad);
        assert_eq!(categorize(50.0), Category::Bad);
        assert_eq!(categorize(50.01), Category::Average);
        assert_eq!(categorize(250.0), Category::Average);
    }

    #[test]
    fn test_year_metrics_coerces_non_numeric_to_zero() {
        let table = Table::from_rows(
            vec![
                ColumnName::labeled("Units Sold"),
                ColumnName::labeled("Revenue"),
                ColumnName::labeled("Ad Spent"),
            ],
            vec![
                vec![Cell::Number(2.0), Cell::text("100"), Cell::Number(10.0)],
                vec![Cell::text("n/a"), Cell::Number(50.0), Cell::Empty],
                vec![Cell::Number(1.5), Cell::text("$20"), Cell::text("5")],
            ],
        );

        let m = year_metrics("2024", &table);
        assert_eq!(m.quantity, 3);
        assert_eq!(m.revenue, 150.0);
        assert_eq!(m.ad_spend, 15.0);
        assert_eq!(m.tacos_label(), "10.00%");
    }

    #[test]
    fn test_missing_columns_count_as_zero() {
        let m = year_metrics("2024", &sales_table(&[(100.0, 10.0)]));
        assert_eq!(m.quantity, 0);
        assert_eq!(m.revenue, 100.0);
    }

    #[test]
    fn test_aggregate_builds_comparison_and_category_rows() {
        let mut record = SkuRecord::new(SkuId::new("A1B2"), &years());
        record.bucket_mut("2024").unwrap().table =
            sales_table(&[(100.0, 10.0), (150.0, 20.0), (200.0, 30.0)]);

        let agg = aggregate(&[record], &years());

        assert_eq!(agg.comparison.len(), 1);
        let row = &agg.comparison[0];
        assert_eq!(row.product_name, UNKNOWN_PRODUCT);
        assert_eq!(row.years[0].revenue, 450.0);
        assert_eq!(row.years[0].ad_spend, 60.0);
        assert_eq!(row.years[0].tacos_label(), "13.33%");
        assert_eq!(row.years[1], YearMetrics::zero("2025"));
        assert_eq!(row.years[1].tacos_label(), "0.00%");

        assert_eq!(agg.categories[0].rows.len(), 1);
        assert_eq!(agg.categories[0].rows[0].category, Category::Good);
        assert!(agg.categories[1].rows.is_empty());
    }

    #[test]
    fn test_year_totals() {
        let rows = vec![
            ComparisonRow {
                sku: SkuId::new("A"),
                product_name: "A".into(),
                years: vec![
                    YearMetrics { year: "2024".into(), quantity: 2, revenue: 100.0, ad_spend: 10.0 },
                    YearMetrics::zero("2025"),
                ],
            },
            ComparisonRow {
                sku: SkuId::new("B"),
                product_name: "B".into(),
                years: vec![
                    YearMetrics { year: "2024".into(), quantity: 1, revenue: 100.0, ad_spend: 30.0 },
                    YearMetrics { year: "2025".into(), quantity: 4, revenue: 80.0, ad_spend: 8.0 },
                ],
            },
        ];

        let totals = year_totals(&rows, &years());
        assert_eq!(totals[0].quantity, 3);
        assert_eq!(totals[0].revenue, 200.0);
        assert_eq!(totals[0].tacos_label(), "20.00%");
        assert_eq!(totals[1].quantity, 4);
        assert_eq!(totals[1].tacos_label(), "10.00%");
    }
}
