use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod error;
mod loader;
mod models;
mod pipeline;
mod report;

use catalog::{DashboardContext, ALL_BRANCHES, ALL_WEEKS};

#[derive(Parser)]
#[command(name = "branch-sales-insights")]
#[command(about = "Branch sales analysis and customer insights", long_about = None)]
struct Cli {
    /// Sales dataset in CSV form
    #[arg(long, global = true, env = "SALES_DATASET", default_value = "SalesDatasetCorr.csv")]
    data: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selectable weeks and branches
    Catalog,
    /// Compute the dashboard views as JSON
    Views {
        #[arg(long, default_value = ALL_WEEKS)]
        week: String,
        #[arg(long, default_value = ALL_BRANCHES)]
        branch: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report of the dashboard views
    Report {
        #[arg(long, default_value = ALL_WEEKS)]
        week: String,
        #[arg(long, default_value = ALL_BRANCHES)]
        branch: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = load_context(&cli.data)?;

    match cli.command {
        Commands::Catalog => {
            let dataset = ctx.dataset();
            println!(
                "Sales from {} to {} ({} rows, weeks of {}).",
                dataset.min_date,
                dataset.max_date,
                dataset.records.len(),
                dataset.reference_year
            );
            println!("Weeks ({}):", ctx.weeks().len());
            for label in ctx.weeks().labels() {
                println!("- {label}");
            }
            println!("Branches:");
            for label in ctx.branches().labels() {
                println!("- {label}");
            }
        }
        Commands::Views { week, branch, out } => {
            let selection = ctx.resolve(&week, &branch)?;
            let views = pipeline::compute_views(&ctx, &selection);
            let json = report::views_json(&ctx, &week, &branch, &views)
                .context("failed to serialize views")?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Views written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report { week, branch, out } => {
            let selection = ctx.resolve(&week, &branch)?;
            let views = pipeline::compute_views(&ctx, &selection);
            let report = report::build_report(&ctx, &week, &branch, &views);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn load_context(path: &Path) -> anyhow::Result<DashboardContext> {
    let dataset = loader::load(path)
        .with_context(|| format!("failed to load sales data from {}", path.display()))?;
    Ok(DashboardContext::new(dataset))
}
