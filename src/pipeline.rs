use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Timelike, Weekday};
use tracing::debug;

use crate::catalog::{BranchFilter, DashboardContext, Selection};
use crate::models::{
    CategoryTotal, DailyAverage, DailyProfit, DailyTotal, GenderProductTotal, HourSlotMatrix,
    HourSlotRow, SalesRecord, SalesViews, WeekdayTotal,
};

/// Half-open hour interval `[start, end)` with its column label.
#[derive(Debug, Clone, Copy)]
pub struct HourSlot {
    pub start: u32,
    pub end: u32,
    pub label: &'static str,
}

const SLOT_COUNT: usize = 4;

pub const HOUR_SLOTS: [HourSlot; SLOT_COUNT] = [
    HourSlot { start: 0, end: 6, label: "00 to 06" },
    HourSlot { start: 6, end: 12, label: "06 to 12" },
    HourSlot { start: 12, end: 18, label: "12 to 18" },
    HourSlot { start: 18, end: 24, label: "18 to 24" },
];

const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn hour_slot(hour: u32) -> Option<usize> {
    HOUR_SLOTS
        .iter()
        .position(|slot| hour >= slot.start && hour < slot.end)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Monday of ISO `week` in `reference_year` and the date seven days later.
pub fn week_window(reference_year: i32, week: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_isoywd_opt(reference_year, week, Weekday::Mon)?;
    Some((start, start + Duration::days(7)))
}

/// Rows matching the selection. The week window excludes its Monday and
/// includes the following Monday.
pub fn filter_records<'a>(ctx: &'a DashboardContext, selection: &Selection) -> Vec<&'a SalesRecord> {
    let window = match selection.week {
        0 => None,
        week => match week_window(ctx.reference_year(), week) {
            Some(window) => Some(window),
            None => return Vec::new(),
        },
    };

    ctx.records()
        .iter()
        .filter(|record| match &selection.branch {
            BranchFilter::All => true,
            BranchFilter::Only(branch) => record.branch == *branch,
        })
        .filter(|record| match window {
            Some((start, end)) => record.date > start && record.date <= end,
            None => true,
        })
        .collect()
}

pub fn compute_views(ctx: &DashboardContext, selection: &Selection) -> SalesViews {
    let rows = filter_records(ctx, selection);
    debug!(
        week = selection.week,
        branch = ?selection.branch,
        rows = rows.len(),
        "computing dashboard views"
    );

    SalesViews {
        sales_trend: sales_trend(&rows),
        product_performance: product_performance(&rows),
        customer_segmentation: customer_segmentation(&rows),
        average_transaction: average_transaction(&rows),
        profitability: profitability(&rows),
        time_of_day: time_of_day(&rows),
        weekday_sales: weekday_sales(&rows),
        gender_product: gender_product(&rows),
    }
}

fn sum_by_date(rows: &[&SalesRecord], measure: impl Fn(&SalesRecord) -> f64) -> BTreeMap<NaiveDate, f64> {
    let mut sums = BTreeMap::new();
    for record in rows.iter().copied() {
        *sums.entry(record.date).or_insert(0.0) += measure(record);
    }
    sums
}

fn sales_trend(rows: &[&SalesRecord]) -> Vec<DailyTotal> {
    sum_by_date(rows, |record| record.total)
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

fn profitability(rows: &[&SalesRecord]) -> Vec<DailyProfit> {
    sum_by_date(rows, SalesRecord::profit)
        .into_iter()
        .map(|(date, profit)| DailyProfit { date, profit })
        .collect()
}

fn average_transaction(rows: &[&SalesRecord]) -> Vec<DailyAverage> {
    let mut groups: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in rows {
        let entry = groups.entry(record.date).or_insert((0.0, 0));
        entry.0 += record.total;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(date, (sum, count))| DailyAverage {
            date,
            average: sum / count as f64,
        })
        .collect()
}

/// Product lines keep the order in which they first appear.
fn product_performance(rows: &[&SalesRecord]) -> Vec<CategoryTotal> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for record in rows {
        let index = *positions.entry(record.product_line.as_str()).or_insert_with(|| {
            totals.push(CategoryTotal {
                category: record.product_line.clone(),
                total: 0.0,
            });
            totals.len() - 1
        });
        totals[index].total += record.total;
    }

    totals
}

fn customer_segmentation(rows: &[&SalesRecord]) -> Vec<CategoryTotal> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for record in rows {
        *sums.entry(record.customer_type.as_str()).or_insert(0.0) += record.total;
    }

    sums.into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect()
}

fn time_of_day(rows: &[&SalesRecord]) -> HourSlotMatrix {
    let mut cells: BTreeMap<NaiveDate, [f64; SLOT_COUNT]> = BTreeMap::new();
    for record in rows {
        let Some(slot) = hour_slot(record.time.hour()) else {
            continue;
        };
        cells.entry(record.date).or_insert([0.0; SLOT_COUNT])[slot] += record.total;
    }

    HourSlotMatrix {
        slots: HOUR_SLOTS.iter().map(|slot| slot.label.to_string()).collect(),
        rows: cells
            .into_iter()
            .map(|(date, totals)| HourSlotRow {
                date,
                totals: totals.to_vec(),
            })
            .collect(),
    }
}

/// Monday first; weekdays without sales are left out rather than zero-filled.
fn weekday_sales(rows: &[&SalesRecord]) -> Vec<WeekdayTotal> {
    let mut sums: [Option<f64>; 7] = [None; 7];
    for record in rows {
        let index = record.date.weekday().num_days_from_monday() as usize;
        *sums[index].get_or_insert(0.0) += record.total;
    }

    WEEKDAY_ORDER
        .iter()
        .zip(sums)
        .filter_map(|(day, total)| {
            total.map(|total| WeekdayTotal {
                weekday: weekday_name(*day).to_string(),
                total,
            })
        })
        .collect()
}

/// Every observed gender crossed with every observed product line, zero where
/// the pair never occurs. Ordered by product line, then gender.
fn gender_product(rows: &[&SalesRecord]) -> Vec<GenderProductTotal> {
    let mut genders: BTreeSet<&str> = BTreeSet::new();
    let mut product_lines: BTreeSet<&str> = BTreeSet::new();
    let mut sums: HashMap<(&str, &str), f64> = HashMap::new();

    for record in rows {
        genders.insert(record.gender.as_str());
        product_lines.insert(record.product_line.as_str());
        *sums
            .entry((record.gender.as_str(), record.product_line.as_str()))
            .or_insert(0.0) += record.total;
    }

    let mut output = Vec::with_capacity(genders.len() * product_lines.len());
    for product_line in &product_lines {
        for gender in &genders {
            output.push(GenderProductTotal {
                gender: gender.to_string(),
                product_line: product_line.to_string(),
                total: sums.get(&(*gender, *product_line)).copied().unwrap_or(0.0),
            });
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use chrono::NaiveTime;

    struct Sale {
        date: (i32, u32, u32),
        time: (u32, u32),
        branch: &'static str,
        customer_type: &'static str,
        gender: &'static str,
        product_line: &'static str,
        total: f64,
        cogs: f64,
    }

    impl Default for Sale {
        fn default() -> Self {
            Sale {
                date: (2019, 1, 8),
                time: (12, 0),
                branch: "A",
                customer_type: "Member",
                gender: "Male",
                product_line: "Food",
                total: 10.0,
                cogs: 5.0,
            }
        }
    }

    impl Sale {
        fn into_record(self) -> SalesRecord {
            SalesRecord {
                date: NaiveDate::from_ymd_opt(self.date.0, self.date.1, self.date.2).unwrap(),
                time: NaiveTime::from_hms_opt(self.time.0, self.time.1, 0).unwrap(),
                branch: self.branch.to_string(),
                customer_type: self.customer_type.to_string(),
                gender: self.gender.to_string(),
                product_line: self.product_line.to_string(),
                total: self.total,
                cogs: self.cogs,
            }
        }
    }

    fn context(sales: Vec<Sale>) -> DashboardContext {
        let records = sales.into_iter().map(Sale::into_record).collect();
        DashboardContext::new(Dataset::from_records(records).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> DashboardContext {
        context(vec![
            Sale { date: (2019, 1, 7), time: (9, 15), branch: "A", customer_type: "Member", gender: "Female", product_line: "Food", total: 100.0, cogs: 80.0 },
            Sale { date: (2019, 1, 8), time: (13, 5), branch: "B", customer_type: "Normal", gender: "Male", product_line: "Sports", total: 40.0, cogs: 30.0 },
            Sale { date: (2019, 1, 8), time: (19, 45), branch: "A", customer_type: "Member", gender: "Male", product_line: "Food", total: 60.0, cogs: 50.0 },
            Sale { date: (2019, 1, 10), time: (5, 59), branch: "C", customer_type: "Normal", gender: "Female", product_line: "Electronics", total: 25.0, cogs: 20.0 },
            Sale { date: (2019, 1, 14), time: (6, 0), branch: "B", customer_type: "Member", gender: "Female", product_line: "Sports", total: 70.0, cogs: 65.0 },
            Sale { date: (2019, 1, 16), time: (23, 59), branch: "A", customer_type: "Normal", gender: "Male", product_line: "Food", total: 15.0, cogs: 5.0 },
        ])
    }

    fn week(week: u32) -> Selection {
        Selection {
            week,
            branch: BranchFilter::All,
        }
    }

    #[test]
    fn week_window_starts_on_iso_monday() {
        assert_eq!(week_window(2019, 1), Some((date(2018, 12, 31), date(2019, 1, 7))));
        assert_eq!(week_window(2019, 2), Some((date(2019, 1, 7), date(2019, 1, 14))));
        assert_eq!(week_window(2019, 53), None);
    }

    #[test]
    fn week_filter_excludes_monday_and_includes_next_monday() {
        let ctx = sample();
        let rows = filter_records(&ctx, &week(2));
        let dates: Vec<NaiveDate> = rows.iter().map(|record| record.date).collect();
        assert_eq!(
            dates,
            vec![date(2019, 1, 8), date(2019, 1, 8), date(2019, 1, 10), date(2019, 1, 14)]
        );
        for w in 1..=ctx.dataset().last_week_number {
            let (start, _) = week_window(ctx.reference_year(), w).unwrap();
            assert!(filter_records(&ctx, &week(w)).iter().all(|record| record.date != start));
        }
    }

    #[test]
    fn branch_filter_keeps_only_that_branch() {
        let ctx = sample();
        let selection = Selection {
            week: 0,
            branch: BranchFilter::Only("A".to_string()),
        };
        let rows = filter_records(&ctx, &selection);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|record| record.branch == "A"));
    }

    #[test]
    fn unfiltered_trend_sums_whole_table() {
        let ctx = sample();
        let views = compute_views(&ctx, &Selection::everything());
        let trend_sum: f64 = views.sales_trend.iter().map(|row| row.total).sum();
        let table_sum: f64 = ctx.records().iter().map(|record| record.total).sum();
        assert!((trend_sum - table_sum).abs() < 1e-9);

        let dates: Vec<NaiveDate> = views.sales_trend.iter().map(|row| row.date).collect();
        assert_eq!(
            dates,
            vec![date(2019, 1, 7), date(2019, 1, 8), date(2019, 1, 10), date(2019, 1, 14), date(2019, 1, 16)]
        );
    }

    #[test]
    fn empty_selection_degrades_to_empty_views() {
        let ctx = sample();
        let selection = Selection {
            week: 1,
            branch: BranchFilter::Only("C".to_string()),
        };
        let views = compute_views(&ctx, &selection);
        assert!(views.sales_trend.is_empty());
        assert!(views.product_performance.is_empty());
        assert!(views.customer_segmentation.is_empty());
        assert!(views.average_transaction.is_empty());
        assert!(views.profitability.is_empty());
        assert!(views.time_of_day.rows.is_empty());
        assert_eq!(views.time_of_day.slots.len(), 4);
        assert!(views.weekday_sales.is_empty());
        assert!(views.gender_product.is_empty());
    }

    #[test]
    fn out_of_year_week_yields_empty_views() {
        let ctx = sample();
        let views = compute_views(&ctx, &week(53));
        assert!(views.sales_trend.is_empty());
    }

    #[test]
    fn profit_sums_total_minus_cogs_per_date() {
        let ctx = sample();
        let views = compute_views(&ctx, &Selection::everything());
        for row in &views.profitability {
            let expected: f64 = ctx
                .records()
                .iter()
                .filter(|record| record.date == row.date)
                .map(|record| record.total - record.cogs)
                .sum();
            assert!((row.profit - expected).abs() < 1e-9);
        }
        assert_eq!(views.profitability[1].date, date(2019, 1, 8));
        assert!((views.profitability[1].profit - 20.0).abs() < 1e-9);
    }

    #[test]
    fn average_transaction_is_mean_per_date() {
        let ctx = sample();
        let views = compute_views(&ctx, &Selection::everything());
        assert_eq!(views.average_transaction.len(), 5);
        assert_eq!(views.average_transaction[1].date, date(2019, 1, 8));
        assert!((views.average_transaction[1].average - 50.0).abs() < 1e-9);
    }

    #[test]
    fn product_lines_keep_first_seen_order() {
        let ctx = sample();
        let views = compute_views(&ctx, &Selection::everything());
        let categories: Vec<(&str, f64)> = views
            .product_performance
            .iter()
            .map(|row| (row.category.as_str(), row.total))
            .collect();
        assert_eq!(
            categories,
            vec![("Food", 175.0), ("Sports", 110.0), ("Electronics", 25.0)]
        );
    }

    #[test]
    fn customer_types_are_summed() {
        let ctx = sample();
        let views = compute_views(&ctx, &Selection::everything());
        assert_eq!(
            views.customer_segmentation,
            vec![
                CategoryTotal { category: "Member".to_string(), total: 230.0 },
                CategoryTotal { category: "Normal".to_string(), total: 80.0 },
            ]
        );
    }

    #[test]
    fn hour_slots_are_half_open() {
        assert_eq!(hour_slot(0), Some(0));
        assert_eq!(hour_slot(5), Some(0));
        assert_eq!(hour_slot(6), Some(1));
        assert_eq!(hour_slot(12), Some(2));
        assert_eq!(hour_slot(18), Some(3));
        assert_eq!(hour_slot(23), Some(3));
        assert_eq!(hour_slot(24), None);
    }

    #[test]
    fn heatmap_pivots_dates_by_slot_with_zero_fill() {
        let ctx = sample();
        let views = compute_views(&ctx, &Selection::everything());
        let matrix = &views.time_of_day;
        assert_eq!(matrix.slots, vec!["00 to 06", "06 to 12", "12 to 18", "18 to 24"]);
        assert_eq!(matrix.rows.len(), 5);
        assert_eq!(matrix.rows[0].totals, vec![0.0, 100.0, 0.0, 0.0]);
        assert_eq!(matrix.rows[1].date, date(2019, 1, 8));
        assert_eq!(matrix.rows[1].totals, vec![0.0, 0.0, 40.0, 60.0]);
        assert_eq!(matrix.rows[2].totals, vec![25.0, 0.0, 0.0, 0.0]);
        assert_eq!(matrix.rows[3].totals, vec![0.0, 70.0, 0.0, 0.0]);
        assert_eq!(matrix.rows[4].totals, vec![0.0, 0.0, 0.0, 15.0]);
    }

    #[test]
    fn weekday_sales_skip_missing_days() {
        let ctx = sample();
        // Week 2 covers Tue 8th, Thu 10th and Mon 14th.
        let views = compute_views(&ctx, &week(2));
        let days: Vec<(&str, f64)> = views
            .weekday_sales
            .iter()
            .map(|row| (row.weekday.as_str(), row.total))
            .collect();
        assert_eq!(days, vec![("Monday", 70.0), ("Tuesday", 100.0), ("Thursday", 25.0)]);
    }

    #[test]
    fn gender_product_fills_unobserved_pairs_with_zero() {
        let ctx = sample();
        let views = compute_views(&ctx, &Selection::everything());
        let pairs: Vec<(&str, &str, f64)> = views
            .gender_product
            .iter()
            .map(|row| (row.product_line.as_str(), row.gender.as_str(), row.total))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Electronics", "Female", 25.0),
                ("Electronics", "Male", 0.0),
                ("Food", "Female", 100.0),
                ("Food", "Male", 75.0),
                ("Sports", "Female", 70.0),
                ("Sports", "Male", 40.0),
            ]
        );
    }

    #[test]
    fn week_whose_window_opens_on_monday_drops_that_monday() {
        let ctx = context(vec![
            Sale { date: (2019, 1, 7), time: (10, 0), gender: "Male", total: 100.0, cogs: 60.0, ..Sale::default() },
            Sale { date: (2019, 1, 8), time: (20, 0), gender: "Female", total: 50.0, cogs: 20.0, ..Sale::default() },
        ]);
        assert_eq!(ctx.reference_year(), 2019);
        assert_eq!(week_window(2019, 2).map(|(start, _)| start), Some(date(2019, 1, 7)));

        let selection = ctx.resolve("Week 2", "All Branches").unwrap();
        let views = compute_views(&ctx, &selection);
        assert_eq!(views.sales_trend, vec![DailyTotal { date: date(2019, 1, 8), total: 50.0 }]);
        assert_eq!(views.profitability, vec![DailyProfit { date: date(2019, 1, 8), profit: 30.0 }]);
    }

    #[test]
    fn closing_monday_belongs_to_previous_week() {
        let ctx = context(vec![
            Sale { date: (2019, 1, 7), total: 100.0, cogs: 60.0, ..Sale::default() },
            Sale { date: (2019, 1, 8), total: 50.0, cogs: 20.0, ..Sale::default() },
        ]);
        let selection = ctx.resolve("Week 1", "All Branches").unwrap();
        let views = compute_views(&ctx, &selection);
        assert_eq!(views.sales_trend, vec![DailyTotal { date: date(2019, 1, 7), total: 100.0 }]);
    }
}
