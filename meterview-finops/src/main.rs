use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand};
use meterview_common::YearMonth;
use meterview_finops::format::{format_fixed, format_number, format_up_to, METRIC_DECIMALS};
use meterview_finops::projection::{CostCharts, GroupTotal, MonthTotal, UsageCharts};
use meterview_finops::{
    load_reporting, CostDimension, CostView, Dimension, Projection, ReportView, ReportingView,
    SortDirection, SortState, Table, UsageDimension, UsageView, ViewAction, ViewStore,
};
use meterview_providers::proxy::ProxyBillingSource;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "meterview-report", about = "Terminal views of billing usage and cost")]
struct Cli {
    /// Base URL of the meterview proxy service.
    #[arg(long, env = "METERVIEW_API_URL", default_value = "http://localhost:3001")]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregated usage table with metric cards.
    Usage {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long = "global-account")]
        global_accounts: Vec<String>,
        #[arg(long = "subaccount")]
        subaccounts: Vec<String>,
        #[arg(long = "service")]
        services: Vec<String>,
        #[arg(long = "space")]
        spaces: Vec<String>,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Cost table with totals.
    Cost {
        #[arg(long = "global-account")]
        global_accounts: Vec<String>,
        #[arg(long = "subaccount")]
        subaccounts: Vec<String>,
        #[arg(long = "service")]
        services: Vec<String>,
        /// Report month as YYYY-MM.
        #[arg(long = "month")]
        months: Vec<String>,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Usage and cost charts side by side.
    Report {
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// First month, YYYYMM. Defaults to January of the current year.
    #[arg(long)]
    from: Option<YearMonth>,
    /// Last month, YYYYMM. Defaults to the current month.
    #[arg(long)]
    to: Option<YearMonth>,
}

impl RangeArgs {
    fn resolve(&self) -> anyhow::Result<(YearMonth, YearMonth)> {
        let now = Utc::now();
        let year = u16::try_from(now.year()).context("current year out of range")?;
        let month = u8::try_from(now.month()).context("current month out of range")?;
        let from = match self.from {
            Some(from) => from,
            None => YearMonth::new(year, 1).context("invalid default start month")?,
        };
        let to = match self.to {
            Some(to) => to,
            None => YearMonth::new(year, month).context("invalid default end month")?,
        };
        Ok((from, to))
    }
}

#[derive(Args, Debug)]
struct SortArgs {
    /// Field to sort the table by.
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending instead of ascending.
    #[arg(long, requires = "sort")]
    desc: bool,
}

impl SortArgs {
    fn actions<D: Dimension>(&self) -> Vec<ViewAction<D>> {
        let Some(field) = &self.sort else {
            return Vec::new();
        };
        let mut out = vec![ViewAction::ToggleSort(field.clone())];
        if self.desc {
            out.push(ViewAction::ToggleSort(field.clone()));
        }
        out
    }
}

fn filter_action<D: Dimension>(dimension: D, values: &[String]) -> Option<ViewAction<D>> {
    if values.is_empty() {
        return None;
    }
    let values: BTreeSet<String> = values.iter().cloned().collect();
    Some(ViewAction::SetFilter { dimension, values })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let source = Arc::new(
        ProxyBillingSource::new(cli.api_url.clone()).context("Failed to build HTTP client")?,
    );
    info!(api_url = %cli.api_url, "meterview-report starting");

    match cli.command {
        Command::Usage {
            range,
            global_accounts,
            subaccounts,
            services,
            spaces,
            sort,
        } => {
            let (from, to) = range.resolve()?;
            let store = ViewStore::new(source, UsageView::for_range(from, to));
            let view = store.load().await;
            fail_on_error(&view)?;

            let filters = [
                filter_action(UsageDimension::GlobalAccount, &global_accounts),
                filter_action(UsageDimension::Subaccount, &subaccounts),
                filter_action(UsageDimension::Service, &services),
                filter_action(UsageDimension::Space, &spaces),
            ];
            for action in filters.into_iter().flatten().chain(sort.actions()) {
                store.dispatch(action);
            }
            let view = store.snapshot();

            let metrics = view.metrics();
            println!("Usage {} - {}", from.dashed(), to.dashed());
            println!(
                "Total usage: {}   Services: {}   Subaccounts: {}   Spaces: {}",
                format_up_to(metrics.total_usage, METRIC_DECIMALS),
                metrics.services,
                metrics.subaccounts,
                metrics.spaces
            );
            println!();
            print_table(&view.table(), &view.sort);
        }
        Command::Cost {
            global_accounts,
            subaccounts,
            services,
            months,
            sort,
        } => {
            let store = ViewStore::new(source, CostView::default());
            let view = store.load().await;
            fail_on_error(&view)?;

            let filters = [
                filter_action(CostDimension::GlobalAccount, &global_accounts),
                filter_action(CostDimension::Subaccount, &subaccounts),
                filter_action(CostDimension::Service, &services),
                filter_action(CostDimension::ReportMonth, &months),
            ];
            for action in filters.into_iter().flatten().chain(sort.actions()) {
                store.dispatch(action);
            }
            let view = store.snapshot();

            let summary = view.summary();
            println!(
                "Total cost: {} {}   Records: {}",
                format_fixed(summary.total_cost, 2),
                summary.currency,
                summary.records
            );
            println!();
            print_table(&view.table(), &view.sort);
        }
        Command::Report { range } => {
            let (from, to) = range.resolve()?;
            let view = load_reporting(source.as_ref(), &ReportingView::new(from, to)).await;
            print_usage_charts(&view.usage_charts());
            println!();
            print_cost_charts(&view.cost_charts());
        }
    }

    Ok(())
}

fn fail_on_error<D: Dimension>(view: &ReportView<D>) -> anyhow::Result<()> {
    match view.slot.error() {
        Some(msg) => anyhow::bail!("{}", msg),
        None => Ok(()),
    }
}

// -----------------------------------------------------------------------------
// Text rendering
// -----------------------------------------------------------------------------

fn print_table(table: &Projection<Table>, sort: &SortState) {
    let table = match table {
        Projection::Empty { message } => {
            println!("{}", message);
            return;
        }
        Projection::Ready(table) => table,
    };

    let headers: Vec<String> = table
        .columns
        .iter()
        .map(|c| match sort.direction_of(&c.field) {
            SortDirection::Ascending => format!("{} ^", c.label),
            SortDirection::Descending => format!("{} v", c.label),
            SortDirection::None => c.label.clone(),
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    print_row(&headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    print_row(&rule, &widths);
    for row in &table.rows {
        print_row(row, &widths);
    }
    println!("{} rows", table.rows.len());
}

fn print_row(cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    println!("{}", line.join("  ").trim_end());
}

fn print_groups(title: &str, groups: &[GroupTotal], render: impl Fn(f64) -> String) {
    println!("{}", title);
    for g in groups {
        println!("  {:<40} {}", g.name, render(g.value));
    }
}

fn print_trend(title: &str, trend: &[MonthTotal], render: impl Fn(f64) -> String) {
    println!("{}", title);
    for m in trend {
        println!("  {:<8} {}", m.month, render(m.value));
    }
}

fn print_usage_charts(charts: &Projection<UsageCharts>) {
    println!("== Usage ==");
    let charts = match charts {
        Projection::Empty { message } => {
            println!("{}", message);
            return;
        }
        Projection::Ready(c) => c,
    };
    print_groups("Top services", &charts.services, format_number);
    print_groups("Top subaccounts", &charts.subaccounts, format_number);
    print_groups("Top spaces", &charts.spaces, format_number);
    print_trend("Monthly trend", &charts.monthly_trend, format_number);
}

fn print_cost_charts(charts: &Projection<CostCharts>) {
    println!("== Cost ==");
    let charts = match charts {
        Projection::Empty { message } => {
            println!("{}", message);
            return;
        }
        Projection::Ready(c) => c,
    };
    let money = |v: f64| {
        format!(
            "{} {}",
            format_fixed(v, 2),
            charts.currency
        )
    };
    print_groups("Top services", &charts.services, money);
    print_groups("Top subaccounts", &charts.subaccounts, money);
    print_groups("Top plans", &charts.plans, money);
    if charts.show_global_accounts() {
        print_groups("Global accounts", &charts.global_accounts, money);
    }
    print_trend("Monthly trend", &charts.monthly_trend, money);
}
