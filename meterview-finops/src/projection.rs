//! Chart and table shaped data derived from filtered records.

use crate::format::{format_cell, header_label, CellStyle, EMPTY_CELL};
use crate::sort::{sort, SortDirection, SortState};
use meterview_common::{cost_fields, format_year_month, usage_fields, CostRecord, Record, UsageRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const SERVICE_TOP_N: usize = 10;
pub const SUBACCOUNT_TOP_N: usize = 8;
pub const PLAN_TOP_N: usize = 6;
pub const SPACE_TOP_N: usize = 6;

pub const NO_USAGE_FOR_CHARTS: &str = "No usage data available for visualization.";
pub const NO_COST_FOR_CHARTS: &str = "No cost data available for visualization.";
pub const NO_USAGE_FOR_FILTERS: &str = "No usage data available for the selected filters.";
pub const NO_COST_FOR_FILTERS: &str = "No cost data available for the selected filters.";

/// Either something to draw or the message to show instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Projection<T> {
    Empty { message: &'static str },
    Ready(T),
}

impl<T> Projection<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Projection::Ready(t) => Some(t),
            Projection::Empty { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Projection::Empty { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub value: f64,
}

// -----------------------------------------------------------------------------
// Grouping
// -----------------------------------------------------------------------------

/// Sum `measure` per `key`, groups in first-seen order.
pub fn group_totals<'a, R, I, K, M>(records: I, key: K, measure: M) -> Vec<GroupTotal>
where
    R: 'a,
    I: IntoIterator<Item = &'a R>,
    K: Fn(&R) -> Option<String>,
    M: Fn(&R) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<GroupTotal> = Vec::new();
    for record in records {
        let name = key(record).unwrap_or_else(|| EMPTY_CELL.to_string());
        let value = measure(record);
        match index.get(&name) {
            Some(&i) => totals[i].value += value,
            None => {
                index.insert(name.clone(), totals.len());
                totals.push(GroupTotal { name, value });
            }
        }
    }
    totals
}

/// Largest `n` groups, biggest first; equal sums keep first-seen order.
pub fn top_n(mut totals: Vec<GroupTotal>, n: usize) -> Vec<GroupTotal> {
    totals.sort_by(|a, b| b.value.total_cmp(&a.value));
    totals.truncate(n);
    totals
}

/// Sums per `YYYY-MM`, oldest month first.
///
/// Plain string order is chronological because the month form is fixed width.
pub fn monthly_trend<'a, R, I, K, M>(records: I, month: K, measure: M) -> Vec<MonthTotal>
where
    R: 'a,
    I: IntoIterator<Item = &'a R>,
    K: Fn(&R) -> Option<String>,
    M: Fn(&R) -> f64,
{
    let mut months: Vec<MonthTotal> = group_totals(records, month, measure)
        .into_iter()
        .map(|g| MonthTotal {
            month: g.name,
            value: g.value,
        })
        .collect();
    months.sort_by(|a, b| a.month.cmp(&b.month));
    months
}

/// Currency of the first record, verbatim.
///
/// Records are not checked for agreeing currencies.
pub fn currency_label<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a CostRecord>,
{
    records
        .into_iter()
        .next()
        .and_then(CostRecord::currency)
        .unwrap_or_default()
}

fn usage_month(r: &UsageRecord) -> Option<String> {
    r.report_year_month().and_then(format_year_month)
}

fn cost_month(r: &CostRecord) -> Option<String> {
    r.report_year_month().and_then(format_year_month)
}

// -----------------------------------------------------------------------------
// Charts
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageCharts {
    pub services: Vec<GroupTotal>,
    pub subaccounts: Vec<GroupTotal>,
    pub spaces: Vec<GroupTotal>,
    pub monthly_trend: Vec<MonthTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostCharts {
    pub currency: String,
    pub services: Vec<GroupTotal>,
    pub subaccounts: Vec<GroupTotal>,
    pub plans: Vec<GroupTotal>,
    pub global_accounts: Vec<GroupTotal>,
    pub monthly_trend: Vec<MonthTotal>,
}

impl CostCharts {
    /// The per-global-account chart only says something with two or more accounts.
    pub fn show_global_accounts(&self) -> bool {
        self.global_accounts.len() > 1
    }
}

pub fn usage_charts(records: &[&UsageRecord]) -> Projection<UsageCharts> {
    if records.is_empty() {
        return Projection::Empty {
            message: NO_USAGE_FOR_CHARTS,
        };
    }
    let rows = records.iter().copied();
    Projection::Ready(UsageCharts {
        services: top_n(
            group_totals(rows.clone(), UsageRecord::service_name, UsageRecord::usage),
            SERVICE_TOP_N,
        ),
        subaccounts: top_n(
            group_totals(rows.clone(), UsageRecord::subaccount_name, UsageRecord::usage),
            SUBACCOUNT_TOP_N,
        ),
        spaces: top_n(
            group_totals(rows.clone(), UsageRecord::space_name, UsageRecord::usage),
            SPACE_TOP_N,
        ),
        monthly_trend: monthly_trend(rows, usage_month, UsageRecord::usage),
    })
}

pub fn cost_charts(records: &[&CostRecord]) -> Projection<CostCharts> {
    if records.is_empty() {
        return Projection::Empty {
            message: NO_COST_FOR_CHARTS,
        };
    }
    let rows = records.iter().copied();
    let mut global_accounts =
        group_totals(rows.clone(), CostRecord::global_account_name, CostRecord::cost);
    global_accounts.sort_by(|a, b| b.value.total_cmp(&a.value));
    Projection::Ready(CostCharts {
        currency: currency_label(rows.clone()),
        services: top_n(
            group_totals(rows.clone(), CostRecord::service_name, CostRecord::cost),
            SERVICE_TOP_N,
        ),
        subaccounts: top_n(
            group_totals(rows.clone(), CostRecord::subaccount_name, CostRecord::cost),
            SUBACCOUNT_TOP_N,
        ),
        plans: top_n(
            group_totals(rows.clone(), CostRecord::plan_name, CostRecord::cost),
            PLAN_TOP_N,
        ),
        global_accounts,
        monthly_trend: monthly_trend(rows, cost_month, CostRecord::cost),
    })
}

// -----------------------------------------------------------------------------
// Summary cards
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageMetrics {
    pub total_usage: f64,
    pub services: usize,
    pub subaccounts: usize,
    pub spaces: usize,
}

pub fn usage_metrics(records: &[&UsageRecord]) -> UsageMetrics {
    let distinct = |f: fn(&UsageRecord) -> Option<String>| {
        records.iter().map(|r| f(r)).collect::<HashSet<_>>().len()
    };
    UsageMetrics {
        total_usage: records.iter().map(|r| r.usage()).sum(),
        services: distinct(UsageRecord::service_name),
        subaccounts: distinct(UsageRecord::subaccount_name),
        spaces: distinct(UsageRecord::space_name),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub total_cost: f64,
    pub currency: String,
    pub records: usize,
}

pub fn cost_summary(records: &[&CostRecord]) -> CostSummary {
    CostSummary {
        total_cost: records.iter().map(|r| r.cost()).sum(),
        currency: currency_label(records.iter().copied()),
        records: records.len(),
    }
}

// -----------------------------------------------------------------------------
// Tables
// -----------------------------------------------------------------------------

/// Technical identifiers hidden from the usage table.
pub const USAGE_HIDDEN_FIELDS: [&str; 17] = [
    "globalAccountId",
    "subaccountId",
    "directoryId",
    "directoryName",
    "serviceId",
    "environmentInstanceId",
    "instanceId",
    "spaceId",
    "unitSingular",
    "unitPlural",
    "identityZone",
    "dataCenter",
    "dataCenterName",
    "startIsoDate",
    "endIsoDate",
    "application",
    "measureId",
];

pub const COST_COLUMNS: [&str; 13] = [
    cost_fields::GLOBAL_ACCOUNT_NAME,
    cost_fields::SUBACCOUNT_NAME,
    cost_fields::REPORT_YEAR_MONTH,
    cost_fields::SERVICE_NAME,
    cost_fields::PLAN_NAME,
    cost_fields::METRIC_NAME,
    cost_fields::UNIT_PLURAL,
    cost_fields::USAGE,
    cost_fields::CURRENCY,
    cost_fields::COST,
    cost_fields::QUOTA,
    cost_fields::ACTUAL_USAGE,
    cost_fields::CHARGED_BLOCKS,
];

const COST_AMOUNT_COLUMNS: [&str; 5] = [
    cost_fields::COST,
    cost_fields::USAGE,
    cost_fields::QUOTA,
    cost_fields::ACTUAL_USAGE,
    cost_fields::CHARGED_BLOCKS,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub field: String,
    pub label: String,
    pub sort: SortDirection,
    #[serde(skip)]
    style: CellStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn build<R: Record>(columns: Vec<Column>, rows: Vec<&R>) -> Table {
        let rows = rows
            .into_iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| format_cell(r.field(&c.field), c.style))
                    .collect()
            })
            .collect();
        Table { columns, rows }
    }
}

fn column(field: &str, style: CellStyle, sort_state: &SortState) -> Column {
    Column {
        field: field.to_string(),
        label: header_label(field),
        sort: sort_state.direction_of(field),
        style,
    }
}

/// Table over aggregated usage rows.
///
/// Columns are the fields of the first row minus [`USAGE_HIDDEN_FIELDS`].
pub fn usage_table(aggregated: &[UsageRecord], sort_state: &SortState) -> Projection<Table> {
    let Some(first) = aggregated.first() else {
        return Projection::Empty {
            message: NO_USAGE_FOR_FILTERS,
        };
    };
    let columns = first
        .fields()
        .keys()
        .filter(|k| !USAGE_HIDDEN_FIELDS.contains(&k.as_str()))
        .map(|k| {
            let style = if k == usage_fields::REPORT_YEAR_MONTH {
                CellStyle::Month
            } else {
                CellStyle::Plain
            };
            column(k, style, sort_state)
        })
        .collect();
    Projection::Ready(Table::build(columns, sort(aggregated, sort_state)))
}

pub fn cost_table(filtered: &[&CostRecord], sort_state: &SortState) -> Projection<Table> {
    if filtered.is_empty() {
        return Projection::Empty {
            message: NO_COST_FOR_FILTERS,
        };
    }
    let columns = COST_COLUMNS
        .iter()
        .map(|field| {
            let style = if *field == cost_fields::REPORT_YEAR_MONTH {
                CellStyle::Month
            } else if COST_AMOUNT_COLUMNS.contains(field) {
                CellStyle::Amount
            } else {
                CellStyle::Plain
            };
            column(field, style, sort_state)
        })
        .collect();
    Projection::Ready(Table::build(
        columns,
        sort(filtered.iter().copied(), sort_state),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn usage(v: Value) -> UsageRecord {
        serde_json::from_value(v).unwrap()
    }

    fn cost(v: Value) -> CostRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn top_n_sorts_descending_and_truncates() {
        let records: Vec<CostRecord> = (0..12)
            .map(|i| cost(json!({"ServiceName": format!("svc{i}"), "Cost": i})))
            .collect();
        let refs: Vec<&CostRecord> = records.iter().collect();
        let charts = cost_charts(&refs).ready().unwrap();
        assert_eq!(charts.services.len(), SERVICE_TOP_N);
        assert_eq!(charts.services[0].name, "svc11");
        assert_eq!(charts.services[9].name, "svc2");
    }

    fn assert_descending(groups: &[GroupTotal]) {
        assert!(groups.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn usage_charts_cut_subaccounts_and_spaces() {
        let records: Vec<UsageRecord> = (0..12)
            .map(|i| {
                usage(json!({
                    "serviceName": "svc",
                    "subaccountName": format!("sub{i}"),
                    "spaceName": format!("space{}", i % 9),
                    "usage": i + 1,
                }))
            })
            .collect();
        let refs: Vec<&UsageRecord> = records.iter().collect();
        let charts = usage_charts(&refs).ready().unwrap();

        assert_eq!(charts.subaccounts.len(), SUBACCOUNT_TOP_N);
        assert_eq!(charts.subaccounts.len(), 8);
        assert_descending(&charts.subaccounts);
        assert_eq!(charts.subaccounts[0].name, "sub11");
        assert_eq!(charts.subaccounts[7].name, "sub4");

        assert_eq!(charts.spaces.len(), SPACE_TOP_N);
        assert_eq!(charts.spaces.len(), 6);
        assert_descending(&charts.spaces);
        // space2 collects 3 + 12
        assert_eq!(charts.spaces[0], GroupTotal { name: "space2".into(), value: 15.0 });
    }

    #[test]
    fn cost_charts_cut_subaccounts_and_plans() {
        let records: Vec<CostRecord> = (0..12)
            .map(|i| {
                cost(json!({
                    "SubaccountName": format!("sub{i}"),
                    "PlanName": format!("plan{}", i % 9),
                    "Cost": (i + 1) * 10,
                }))
            })
            .collect();
        let refs: Vec<&CostRecord> = records.iter().collect();
        let charts = cost_charts(&refs).ready().unwrap();

        assert_eq!(charts.subaccounts.len(), SUBACCOUNT_TOP_N);
        assert_descending(&charts.subaccounts);
        assert_eq!(charts.subaccounts[0].name, "sub11");

        assert_eq!(charts.plans.len(), PLAN_TOP_N);
        assert_eq!(charts.plans.len(), 6);
        assert_descending(&charts.plans);
        let names: Vec<&str> = charts.plans.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["plan2", "plan1", "plan0", "plan8", "plan7", "plan6"]);
    }

    #[test]
    fn equal_sums_keep_first_seen_order() {
        let totals = vec![
            GroupTotal { name: "a".into(), value: 1.0 },
            GroupTotal { name: "b".into(), value: 2.0 },
            GroupTotal { name: "c".into(), value: 1.0 },
        ];
        let names: Vec<String> = top_n(totals, 3).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn monthly_trend_is_chronological() {
        let records = vec![
            usage(json!({"reportYearMonth": 202503, "usage": 2})),
            usage(json!({"reportYearMonth": 202501, "usage": 1})),
            usage(json!({"reportYearMonth": 202503, "usage": 5})),
        ];
        let refs: Vec<&UsageRecord> = records.iter().collect();
        let charts = usage_charts(&refs).ready().unwrap();
        assert_eq!(
            charts.monthly_trend,
            vec![
                MonthTotal { month: "2025-01".into(), value: 1.0 },
                MonthTotal { month: "2025-03".into(), value: 7.0 },
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_state() {
        assert_eq!(
            usage_charts(&[]),
            Projection::Empty { message: NO_USAGE_FOR_CHARTS }
        );
        assert!(cost_charts(&[]).is_empty());
        assert!(usage_table(&[], &SortState::default()).is_empty());
        assert!(cost_table(&[], &SortState::default()).is_empty());
    }

    #[test]
    fn cost_charts_use_first_currency_and_flag_global_accounts() {
        let records = vec![
            cost(json!({"GlobalAccountName": "GA", "PlanName": "p1", "Currency": "EUR", "Cost": 1.5})),
            cost(json!({"GlobalAccountName": "GB", "PlanName": "p1", "Currency": "USD", "Cost": 2.5})),
        ];
        let refs: Vec<&CostRecord> = records.iter().collect();
        let charts = cost_charts(&refs).ready().unwrap();
        assert_eq!(charts.currency, "EUR");
        assert!(charts.show_global_accounts());
        assert_eq!(charts.global_accounts[0].name, "GB");
        assert_eq!(charts.plans, vec![GroupTotal { name: "p1".into(), value: 4.0 }]);
    }

    #[test]
    fn metrics_count_distinct_values() {
        let records = vec![
            usage(json!({"serviceName": "a", "subaccountName": "x", "spaceName": "s", "usage": 1.25})),
            usage(json!({"serviceName": "b", "subaccountName": "x", "spaceName": "s", "usage": 2})),
        ];
        let refs: Vec<&UsageRecord> = records.iter().collect();
        let m = usage_metrics(&refs);
        assert_eq!(m.total_usage, 3.25);
        assert_eq!((m.services, m.subaccounts, m.spaces), (2, 1, 1));
    }

    #[test]
    fn cost_table_formats_cells() {
        let records = vec![cost(json!({
            "GlobalAccountName": "GA",
            "ReportYearMonth": 202502,
            "Cost": 1234.5,
            "Currency": "EUR",
            "Quota": null,
        }))];
        let refs: Vec<&CostRecord> = records.iter().collect();
        let table = cost_table(&refs, &SortState::default()).ready().unwrap();
        assert_eq!(table.columns.len(), COST_COLUMNS.len());
        assert_eq!(table.columns[0].label, "Global Account Name");
        let row = &table.rows[0];
        assert_eq!(row[0], "GA");
        assert_eq!(row[2], "2025-02");
        assert_eq!(row[9], "1,234.50");
        assert_eq!(row[10], "-");
        assert_eq!(row[4], "-");
    }

    #[test]
    fn usage_table_hides_technical_fields_and_sorts() {
        let records = vec![
            usage(json!({"serviceName": "b", "serviceId": "id-b", "reportYearMonth": 202501, "usage": 1})),
            usage(json!({"serviceName": "a", "serviceId": "id-a", "reportYearMonth": 202501, "usage": 2500})),
        ];
        let sort_state = SortState::by("serviceName", SortDirection::Ascending);
        let table = usage_table(&records, &sort_state).ready().unwrap();
        let fields: Vec<&str> = table.columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["serviceName", "reportYearMonth", "usage"]);
        assert_eq!(table.columns[0].sort, SortDirection::Ascending);
        assert_eq!(table.rows[0], vec!["a", "2025-01", "2,500"]);
    }
}
