use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub branch: String,
    pub customer_type: String,
    pub gender: String,
    pub product_line: String,
    pub total: f64,
    pub cogs: f64,
}

impl SalesRecord {
    pub fn profit(&self) -> f64 {
        self.total - self.cogs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyProfit {
    pub date: NaiveDate,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayTotal {
    pub weekday: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderProductTotal {
    pub gender: String,
    pub product_line: String,
    pub total: f64,
}

/// Sales per date, one column per hour slot. `totals` is aligned with `slots`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourSlotMatrix {
    pub slots: Vec<String>,
    pub rows: Vec<HourSlotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourSlotRow {
    pub date: NaiveDate,
    pub totals: Vec<f64>,
}

/// The eight aggregates behind the dashboard panels, computed for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesViews {
    pub sales_trend: Vec<DailyTotal>,
    pub product_performance: Vec<CategoryTotal>,
    pub customer_segmentation: Vec<CategoryTotal>,
    pub average_transaction: Vec<DailyAverage>,
    pub profitability: Vec<DailyProfit>,
    pub time_of_day: HourSlotMatrix,
    pub weekday_sales: Vec<WeekdayTotal>,
    pub gender_product: Vec<GenderProductTotal>,
}

/// Dashboard panel a view feeds, keyed by the panel id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub measure: &'static str,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewsDocument<'a> {
    pub time_period: &'a str,
    pub branch: &'a str,
    pub reference_year: i32,
    pub panels: Vec<PanelInfo>,
    pub views: &'a SalesViews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    SalesTrend,
    Profitability,
    AverageTransaction,
    ProductPerformance,
    CustomerSegmentation,
    GenderProduct,
    TimeOfDay,
    WeekdaySales,
}

impl ViewKind {
    /// Panel order used by the dashboard layout.
    pub const ALL: [ViewKind; 8] = [
        ViewKind::SalesTrend,
        ViewKind::Profitability,
        ViewKind::AverageTransaction,
        ViewKind::ProductPerformance,
        ViewKind::CustomerSegmentation,
        ViewKind::GenderProduct,
        ViewKind::TimeOfDay,
        ViewKind::WeekdaySales,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ViewKind::SalesTrend => "sales-trends",
            ViewKind::Profitability => "profitability",
            ViewKind::AverageTransaction => "avg-transaction",
            ViewKind::ProductPerformance => "product-performance",
            ViewKind::CustomerSegmentation => "customer-segmentation",
            ViewKind::GenderProduct => "gender-on-product",
            ViewKind::TimeOfDay => "time-of-day",
            ViewKind::WeekdaySales => "sales-by-day",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::SalesTrend => "Sales Trends Over Time",
            ViewKind::Profitability => "Profitability Analysis",
            ViewKind::AverageTransaction => "Average Transaction Analysis",
            ViewKind::ProductPerformance => "Product Performance Analysis",
            ViewKind::CustomerSegmentation => "Customer Segmentation",
            ViewKind::GenderProduct => "Impact of Gender on Product Preference",
            ViewKind::TimeOfDay => "Sales by Time of Day",
            ViewKind::WeekdaySales => "Sales by Day of the Week",
        }
    }

    pub fn measure_label(self) -> &'static str {
        match self {
            ViewKind::SalesTrend => "Total Sales (MMK)",
            ViewKind::Profitability => "Total Profit (MMK)",
            ViewKind::AverageTransaction => "Average Transaction Value (MMK)",
            ViewKind::TimeOfDay => "Total Sales",
            ViewKind::ProductPerformance
            | ViewKind::CustomerSegmentation
            | ViewKind::GenderProduct
            | ViewKind::WeekdaySales => "Total (MMK)",
        }
    }
}

impl SalesViews {
    /// Number of rows in the given view; the heatmap counts dates.
    pub fn row_count(&self, kind: ViewKind) -> usize {
        match kind {
            ViewKind::SalesTrend => self.sales_trend.len(),
            ViewKind::Profitability => self.profitability.len(),
            ViewKind::AverageTransaction => self.average_transaction.len(),
            ViewKind::ProductPerformance => self.product_performance.len(),
            ViewKind::CustomerSegmentation => self.customer_segmentation.len(),
            ViewKind::GenderProduct => self.gender_product.len(),
            ViewKind::TimeOfDay => self.time_of_day.rows.len(),
            ViewKind::WeekdaySales => self.weekday_sales.len(),
        }
    }

    pub fn panels(&self) -> Vec<PanelInfo> {
        ViewKind::ALL
            .iter()
            .map(|kind| PanelInfo {
                id: kind.id(),
                title: kind.title(),
                measure: kind.measure_label(),
                rows: self.row_count(*kind),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_ids_are_unique() {
        let mut ids: Vec<&str> = ViewKind::ALL.iter().map(|kind| kind.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn profit_subtracts_cogs() {
        let record = SalesRecord {
            date: NaiveDate::from_ymd_opt(2019, 1, 8).unwrap(),
            time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            branch: "A".to_string(),
            customer_type: "Member".to_string(),
            gender: "Female".to_string(),
            product_line: "Food".to_string(),
            total: 50.0,
            cogs: 20.0,
        };
        assert!((record.profit() - 30.0).abs() < 1e-9);
    }
}
