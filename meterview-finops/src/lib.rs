//! Data shaping for the usage and cost dashboard: envelope normalization,
//! filtering, aggregation, sorting and the chart/table projections built on
//! top of them, plus the view state that ties them to fetches.

pub mod aggregate;
pub mod collate;
pub mod dashboard;
pub mod filter;
pub mod format;
pub mod normalize;
pub mod projection;
pub mod sort;
pub mod state;

pub use aggregate::{aggregate, AggregationKey};
pub use dashboard::{fetch_records, load_reporting, ViewStore};
pub use filter::{available_options, filter, CostDimension, Dimension, FilterSet, UsageDimension};
pub use normalize::{normalize, Envelope};
pub use projection::{CostCharts, CostSummary, Projection, Table, UsageCharts, UsageMetrics};
pub use sort::{sort, SortDirection, SortState};
pub use state::{
    CostView, LoadStatus, ReportTab, ReportView, ReportingAction, ReportingView, RequestId, Slot,
    UsageView, ViewAction,
};
