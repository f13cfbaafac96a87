use std::fmt::Write;

use crate::catalog::DashboardContext;
use crate::models::{CategoryTotal, SalesViews, ViewKind, ViewsDocument};

pub const DASHBOARD_TITLE: &str = "Branch Sales Analysis and Customer Insights";

const EMPTY_VIEW: &str = "No sales recorded for this selection.";

/// Share of each category in the segment total, as a percentage.
pub fn segment_shares(segments: &[CategoryTotal]) -> Vec<(String, f64)> {
    let sum: f64 = segments.iter().map(|segment| segment.total).sum();

    segments
        .iter()
        .map(|segment| {
            let share = if sum == 0.0 {
                0.0
            } else {
                segment.total / sum * 100.0
            };
            (segment.category.clone(), share)
        })
        .collect()
}

pub fn views_json(
    ctx: &DashboardContext,
    time_period: &str,
    branch: &str,
    views: &SalesViews,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ViewsDocument {
        time_period,
        branch,
        reference_year: ctx.reference_year(),
        panels: views.panels(),
        views,
    })
}

pub fn build_report(
    ctx: &DashboardContext,
    time_period: &str,
    branch: &str,
    views: &SalesViews,
) -> String {
    let mut output = String::new();
    let dataset = ctx.dataset();

    let _ = writeln!(output, "# {DASHBOARD_TITLE}");
    let _ = writeln!(
        output,
        "Generated for {} / {} (data from {} to {}, weeks of {})",
        time_period, branch, dataset.min_date, dataset.max_date, dataset.reference_year
    );

    for kind in ViewKind::ALL {
        let _ = writeln!(output);
        let _ = writeln!(output, "<a id=\"{}\"></a>", kind.id());
        let _ = writeln!(output, "## {}", kind.title());

        if views.row_count(kind) == 0 {
            let _ = writeln!(output, "{EMPTY_VIEW}");
            continue;
        }

        let _ = writeln!(output, "_{}_", kind.measure_label());
        write_view(&mut output, kind, views);
    }

    output
}

fn write_view(output: &mut String, kind: ViewKind, views: &SalesViews) {
    match kind {
        ViewKind::SalesTrend => {
            for row in &views.sales_trend {
                let _ = writeln!(output, "- {}: {:.2}", row.date.format("%d-%m"), row.total);
            }
        }
        ViewKind::Profitability => {
            for row in &views.profitability {
                let _ = writeln!(output, "- {}: {:.2}", row.date.format("%d-%m"), row.profit);
            }
        }
        ViewKind::AverageTransaction => {
            for row in &views.average_transaction {
                let _ = writeln!(output, "- {}: {:.2}", row.date.format("%d-%m"), row.average);
            }
        }
        ViewKind::ProductPerformance => {
            for row in &views.product_performance {
                let _ = writeln!(output, "- {}: {:.2}", row.category, row.total);
            }
        }
        ViewKind::CustomerSegmentation => {
            let shares = segment_shares(&views.customer_segmentation);
            for (row, (_, share)) in views.customer_segmentation.iter().zip(shares) {
                let _ = writeln!(output, "- {}: {:.2} ({:.1}%)", row.category, row.total, share);
            }
        }
        ViewKind::GenderProduct => {
            for row in &views.gender_product {
                let _ = writeln!(output, "- {} / {}: {:.2}", row.product_line, row.gender, row.total);
            }
        }
        ViewKind::TimeOfDay => {
            let matrix = &views.time_of_day;
            let _ = writeln!(output, "| Date | {} |", matrix.slots.join(" | "));
            let _ = writeln!(output, "|---{}|", "|---".repeat(matrix.slots.len()));
            for row in &matrix.rows {
                let cells: Vec<String> = row.totals.iter().map(|total| format!("{total:.2}")).collect();
                let _ = writeln!(output, "| {} | {} |", row.date, cells.join(" | "));
            }
        }
        ViewKind::WeekdaySales => {
            for row in &views.weekday_sales {
                let _ = writeln!(output, "- {}: {:.2}", row.weekday, row.total);
            }
        }
    }
}
