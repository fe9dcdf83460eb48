use crate::aggregate::YearMetrics;
use crate::columns;
use crate::table::{Cell, Table};
use crate::timeline;

use super::{AMBER, Axis, BLACK, ChartSize, ChartSpec, NAVY, RED, Series, TickFormat};

/// Columns of a SKU sheet the per-year charts read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkuChartColumns {
    pub year: usize,
    pub time: usize,
    pub revenue: usize,
    pub ad_spend: Option<usize>,
    pub tacos: Option<usize>,
    pub safe_tacos: Option<usize>,
}

impl SkuChartColumns {
    /// Resolve chart columns; `None` when year, time or revenue is missing.
    /// Time falls back to the second column.
    pub fn resolve(table: &Table) -> Option<Self> {
        let year = columns::YEAR.find(table)?;
        let time = columns::TIME
            .find(table)
            .or_else(|| (table.column_count() > 1).then_some(1))?;
        let revenue = columns::REVENUE.find(table)?;

        // "Safe TACOS" also contains "tacos"; the plain TACOS column must not be it
        let safe_tacos = columns::SAFE_TACOS.find(table);
        let tacos = table
            .columns()
            .iter()
            .enumerate()
            .position(|(idx, c)| {
                Some(idx) != safe_tacos && c.label().is_some_and(|l| columns::TACOS.matches(l))
            });

        Some(Self {
            year,
            time,
            revenue,
            ad_spend: columns::AD_SPEND.find(table),
            tacos,
            safe_tacos,
        })
    }

    /// Distinct non-blank years of the sheet, sorted
    pub fn years(&self, table: &Table) -> Vec<String> {
        let mut years: Vec<String> = table
            .column_values(self.year)
            .filter(|c| !c.is_blank())
            .map(Cell::render)
            .collect();
        years.sort();
        years.dedup();
        years
    }
}

/// Chart-ready values of one year on a SKU sheet, in time order
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub year: String,
    pub labels: Vec<String>,
    pub revenue: Vec<f64>,
    pub ad_spend: Option<Vec<f64>>,
    pub tacos: Option<Vec<f64>>,
    pub has_safe_tacos: bool,
}

fn positive(cell: &Cell) -> bool {
    cell.as_number().is_some_and(|n| n > 0.0)
}

/// TACOS cell as a number, accepting a trailing `%`
fn tacos_value(cell: &Cell) -> f64 {
    match cell {
        Cell::Text(s) => s.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0),
        other => other.number_or_zero(),
    }
}

/// Rows of `year` that have revenue or ad spend, sorted by time label
///
/// `None` when nothing is left to plot.
pub fn year_series(table: &Table, cols: &SkuChartColumns, year: &str) -> Option<YearSeries> {
    let mut rows: Vec<&Vec<Cell>> = table
        .rows()
        .iter()
        .filter(|row| row[cols.year].render() == year)
        .filter(|row| {
            positive(&row[cols.revenue]) || cols.ad_spend.is_some_and(|c| positive(&row[c]))
        })
        .collect();

    if rows.is_empty() {
        log::debug!("No plottable rows for {}", year);
        return None;
    }

    rows.sort_by_key(|row| timeline::sort_key(&row[cols.time].render()));

    let raw_labels: Vec<String> = rows.iter().map(|row| row[cols.time].render()).collect();

    let tacos = cols.tacos.map(|c| {
        let values: Vec<f64> = rows.iter().map(|row| tacos_value(&row[c])).collect();
        let max = values.iter().cloned().fold(0.0, f64::max);
        if max > 1.0 {
            values.iter().map(|v| v / 100.0).collect()
        } else {
            values
        }
    });

    Some(YearSeries {
        year: year.to_string(),
        labels: timeline::axis_labels(&raw_labels),
        revenue: rows.iter().map(|row| row[cols.revenue].number_or_zero()).collect(),
        ad_spend: cols
            .ad_spend
            .map(|c| rows.iter().map(|row| row[c].number_or_zero()).collect()),
        tacos,
        has_safe_tacos: cols.safe_tacos.is_some(),
    })
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().cloned().fold(0.0, f64::max)
}

/// Revenue bars with ad spend as a line on a secondary axis
pub fn revenue_chart(series: &YearSeries, display_name: &str, size: ChartSize) -> ChartSpec {
    let max_revenue = max_of(&series.revenue);
    let primary = if max_revenue > 0.0 {
        let top = (max_revenue / 500.0).ceil() * 500.0;
        let ticks = (0..5).map(|i| i as f64 * top / 4.0).collect();
        Axis::new("Revenue ($)", top, ticks, TickFormat::Currency)
    } else {
        Axis::auto("Revenue ($)", 0.0, TickFormat::Currency)
    };

    let mut data = vec![Series::bar("Revenue", NAVY, series.revenue.clone())];
    let mut secondary = None;
    if let Some(ad_spend) = &series.ad_spend {
        secondary = Some(Axis::auto("Ad Spend ($)", max_of(ad_spend), TickFormat::Currency));
        data.push(
            Series::line("Ad Spend", RED, ad_spend.clone())
                .with_markers()
                .on_secondary(),
        );
    }

    ChartSpec {
        title: format!("{} {}", display_name.to_uppercase(), series.year),
        title_color: RED,
        x_labels: series.labels.clone(),
        series: data,
        primary,
        secondary,
        size,
    }
}

/// TACOS bars with the safe threshold as a dashed line
///
/// `None` when the sheet has no TACOS column of its own; the appended
/// `Safe TACOS` column alone does not count, so such a year gets only the
/// revenue chart.
pub fn tacos_chart(series: &YearSeries, safe_tacos: f64, size: ChartSize) -> Option<ChartSpec> {
    let tacos = series.tacos.as_ref()?;

    let top = (max_of(tacos) * 1.1).max(0.6);
    let ticks = (0..7).map(|i| i as f64 * 0.1).collect();

    let mut data = vec![Series::bar("TACOS", NAVY, tacos.clone())];
    if series.has_safe_tacos {
        data.push(
            Series::line(
                format!("Safe TACOS ({:.0}%)", safe_tacos * 100.0),
                RED,
                vec![safe_tacos; tacos.len()],
            )
            .dashed(),
        );
    }

    Some(ChartSpec {
        title: format!("TACOS {}", series.year),
        title_color: RED,
        x_labels: series.labels.clone(),
        series: data,
        primary: Axis::new("TACOS (%)", top, ticks, TickFormat::Percent),
        secondary: None,
        size,
    })
}

/// Grouped quantity / revenue / ad spend bars, one group per year, in the
/// order given
pub fn comparison_chart(totals: &[YearMetrics], size: ChartSize) -> ChartSpec {
    let quantity: Vec<f64> = totals.iter().map(|t| t.quantity as f64).collect();
    let revenue: Vec<f64> = totals.iter().map(|t| t.revenue).collect();
    let ad_spend: Vec<f64> = totals.iter().map(|t| t.ad_spend).collect();

    let top = max_of(&quantity).max(max_of(&revenue)).max(max_of(&ad_spend));

    ChartSpec {
        title: "Quantity, Revenue and Ad Spend".to_string(),
        title_color: BLACK,
        x_labels: totals.iter().map(|t| t.year.clone()).collect(),
        series: vec![
            Series::bar("Quantity", NAVY, quantity),
            Series::bar("Revenue", RED, revenue),
            Series::bar("Ad Spend", AMBER, ad_spend),
        ],
        primary: Axis::auto("Value", top, TickFormat::Thousands),
        secondary: None,
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{AxisSide, SeriesKind};
    use crate::table::ColumnName;

    const SIZE: ChartSize = ChartSize {
        width: 560,
        height: 336,
        dpi: 300,
    };

    fn sku_sheet() -> Table {
        let headers = ["Year", "Time", "Revenue", "Ad Spend", "TACOS", "Safe TACOS"];
        let row = |year: &str, time: &str, rev: f64, ad: f64, tacos: &str| {
            vec![
                Cell::text(year),
                Cell::text(time),
                Cell::Number(rev),
                Cell::Number(ad),
                Cell::text(tacos),
                Cell::Number(0.3),
            ]
        };
        Table::from_rows(
            headers.iter().map(|h| ColumnName::labeled(*h)).collect(),
            vec![
                row("2024", "Oct - 3rd", 200.0, 30.0, "15%"),
                row("2024", "Oct - 1st", 100.0, 10.0, "10%"),
                row("2024", "Sep - 30", 0.0, 0.0, "0%"),
                row("2024", "Oct - 2nd", 0.0, 20.0, "n/a"),
                row("2025", "Jan - 1st", 50.0, 5.0, "10%"),
            ],
        )
    }

    #[test]
    fn test_resolve_separates_tacos_from_safe_tacos() {
        let cols = SkuChartColumns::resolve(&sku_sheet()).unwrap();
        assert_eq!(cols.tacos, Some(4));
        assert_eq!(cols.safe_tacos, Some(5));
        assert_eq!(cols.years(&sku_sheet()), vec!["2024", "2025"]);
    }

    #[test]
    fn test_year_series_filters_and_sorts() {
        let table = sku_sheet();
        let cols = SkuChartColumns::resolve(&table).unwrap();
        let series = year_series(&table, &cols, "2024").unwrap();

        // the all-zero September row is dropped, ad-spend-only row is kept
        assert_eq!(series.labels, vec!["1/10", "2/10", "3/10"]);
        assert_eq!(series.revenue, vec![100.0, 0.0, 200.0]);
        assert_eq!(series.ad_spend, Some(vec![10.0, 20.0, 30.0]));
        // percentages above 1 are scaled down
        assert_eq!(series.tacos, Some(vec![0.10, 0.0, 0.15]));

        assert!(year_series(&table, &cols, "2023").is_none());
    }

    #[test]
    fn test_revenue_chart_axes() {
        let table = sku_sheet();
        let cols = SkuChartColumns::resolve(&table).unwrap();
        let series = year_series(&table, &cols, "2024").unwrap();
        let spec = revenue_chart(&series, "Garden Hose", SIZE);

        assert_eq!(spec.title, "GARDEN HOSE 2024");
        assert_eq!(spec.primary.max, 500.0);
        assert_eq!(spec.primary.ticks, vec![0.0, 125.0, 250.0, 375.0, 500.0]);
        assert_eq!(spec.series[1].kind, SeriesKind::Line);
        assert_eq!(spec.series[1].axis, AxisSide::Secondary);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_tacos_chart_threshold_line() {
        let table = sku_sheet();
        let cols = SkuChartColumns::resolve(&table).unwrap();
        let series = year_series(&table, &cols, "2024").unwrap();
        let spec = tacos_chart(&series, 0.30, SIZE).unwrap();

        assert_eq!(spec.title, "TACOS 2024");
        assert_eq!(spec.primary.max, 0.6);
        assert_eq!(spec.primary.ticks.len(), 7);
        assert!(spec.series[1].dashed);
        assert_eq!(spec.series[1].values, vec![0.30; 3]);
    }

    #[test]
    fn test_safe_tacos_alone_gives_no_tacos_chart() {
        let full = sku_sheet();
        let tacos = full.position_of("TACOS").unwrap();
        let without = |columns: &[ColumnName]| -> Vec<ColumnName> {
            columns.iter().enumerate().filter(|(i, _)| *i != tacos).map(|(_, c)| c.clone()).collect()
        };
        let table = Table::from_rows(
            without(full.columns()),
            full.rows()
                .iter()
                .map(|row| {
                    row.iter().enumerate().filter(|(i, _)| *i != tacos).map(|(_, c)| c.clone()).collect()
                })
                .collect(),
        );

        let cols = SkuChartColumns::resolve(&table).unwrap();
        assert_eq!(cols.tacos, None);
        assert!(cols.safe_tacos.is_some());

        let series = year_series(&table, &cols, "2024").unwrap();
        assert!(tacos_chart(&series, 0.30, SIZE).is_none());
    }

    #[test]
    fn test_comparison_chart_groups() {
        let totals = vec![
            YearMetrics { year: "2025".into(), quantity: 4, revenue: 80.0, ad_spend: 8.0 },
            YearMetrics { year: "2024".into(), quantity: 3, revenue: 450.0, ad_spend: 60.0 },
        ];
        let spec = comparison_chart(&totals, SIZE);
        assert_eq!(spec.x_labels, vec!["2025", "2024"]);
        assert_eq!(spec.series.len(), 3);
        assert_eq!(spec.series[0].values, vec![4.0, 3.0]);
        assert_eq!(spec.primary.max, 800.0);
    }
}
