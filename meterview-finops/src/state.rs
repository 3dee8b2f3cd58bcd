//! View state for the dashboard pages.
//!
//! Every state is an immutable snapshot; `apply` returns the next one.
//! Records sit behind an `Arc` so snapshots are cheap to copy.

use crate::aggregate::aggregate;
use crate::filter::{available_options, filter, CostDimension, Dimension, FilterSet, UsageDimension};
use crate::projection::{
    cost_charts, cost_summary, cost_table, usage_charts, usage_metrics, usage_table, CostCharts,
    CostSummary, Projection, Table, UsageCharts, UsageMetrics,
};
use crate::sort::{sort, SortState};
use meterview_common::{CostRecord, FetchError, UsageRecord, YearMonth};
use meterview_providers::FetchParams;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Identifies one fetch issued by a [`Slot`]. Ids only grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Holder of one report's records.
///
/// A completion is accepted only if it answers the most recently issued
/// request; slower, older responses are dropped.
#[derive(Debug)]
pub struct Slot<R> {
    records: Arc<Vec<R>>,
    status: LoadStatus,
    issued: u64,
}

// Manual impl: cloning shares the records, so `R` need not be `Clone`.
impl<R> Clone for Slot<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            status: self.status.clone(),
            issued: self.issued,
        }
    }
}

impl<R> Default for Slot<R> {
    fn default() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            status: LoadStatus::Idle,
            issued: 0,
        }
    }
}

impl<R> Slot<R> {
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// The request a completion must carry to be accepted.
    pub fn latest_request(&self) -> Option<RequestId> {
        (self.issued > 0).then_some(RequestId(self.issued))
    }

    /// Issue the next request id and mark the slot loading.
    pub fn begin(&self) -> (Self, RequestId) {
        let issued = self.issued + 1;
        let next = Self {
            records: self.records.clone(),
            status: LoadStatus::Loading,
            issued,
        };
        (next, RequestId(issued))
    }

    /// Settle `request`. Failures empty the slot.
    pub fn complete(&self, request: RequestId, result: Result<Vec<R>, FetchError>) -> Self {
        if request.0 != self.issued {
            tracing::debug!(
                request = request.0,
                latest = self.issued,
                "dropping stale fetch result"
            );
            return self.clone();
        }
        match result {
            Ok(records) => Self {
                records: Arc::new(records),
                status: LoadStatus::Ready,
                issued: self.issued,
            },
            Err(e) => Self {
                records: Arc::new(Vec::new()),
                status: LoadStatus::Failed(e.user_message()),
                issued: self.issued,
            },
        }
    }
}

// -----------------------------------------------------------------------------
// Table pages (usage monitor, cost analysis)
// -----------------------------------------------------------------------------

/// Changes a table page can go through.
#[derive(Debug, Clone)]
pub enum ViewAction<D: Dimension> {
    /// New month range for the next usage fetch. Ignored by the cost page.
    SetRange { from: YearMonth, to: YearMonth },
    /// "Load Data": clears filters and starts a fetch.
    Load,
    /// Re-issue the last fetch with the same parameters; filters stay.
    Retry,
    Loaded {
        request: RequestId,
        result: Result<Vec<D::Record>, FetchError>,
    },
    SetFilter {
        dimension: D,
        values: BTreeSet<String>,
    },
    ClearFilters,
    ToggleSort(String),
}

#[derive(Debug, Clone)]
pub struct ReportView<D: Dimension> {
    /// Parameters the next "Load Data" will use.
    pub params: FetchParams,
    /// Parameters of the last issued fetch; retries reuse them.
    pub requested: Option<FetchParams>,
    pub slot: Slot<D::Record>,
    pub filters: FilterSet<D>,
    pub sort: SortState,
}

pub type UsageView = ReportView<UsageDimension>;
pub type CostView = ReportView<CostDimension>;

impl<D: Dimension> ReportView<D> {
    pub fn new(params: FetchParams) -> Self {
        Self {
            params,
            requested: None,
            slot: Slot::default(),
            filters: FilterSet::new(),
            sort: SortState::default(),
        }
    }

    pub fn apply(&self, action: ViewAction<D>) -> Self {
        let mut next = self.clone();
        match action {
            ViewAction::SetRange { from, to } => {
                if let FetchParams::Usage { .. } = next.params {
                    next.params = FetchParams::usage(from, to);
                }
            }
            ViewAction::Load => return self.begin(false).0,
            ViewAction::Retry => return self.begin(true).0,
            ViewAction::Loaded { request, result } => {
                next.slot = self.slot.complete(request, result);
            }
            ViewAction::SetFilter { dimension, values } => {
                next.filters = self.filters.with(dimension, values);
            }
            ViewAction::ClearFilters => {
                next.filters = FilterSet::new();
            }
            ViewAction::ToggleSort(field) => {
                next.sort = self.sort.toggle(&field);
            }
        }
        next
    }

    /// Start a fetch, returning the id its completion must carry.
    ///
    /// A retry keeps the filters and re-issues the last request; a fresh
    /// load clears the filters and uses the current parameters.
    pub fn begin(&self, retry: bool) -> (Self, RequestId) {
        let (slot, request) = self.slot.begin();
        let (filters, requested) = match (retry, self.requested) {
            (true, Some(last)) => (self.filters.clone(), last),
            (true, None) => (self.filters.clone(), self.params),
            (false, _) => (FilterSet::new(), self.params),
        };
        let next = Self {
            params: self.params,
            requested: Some(requested),
            slot,
            filters,
            sort: self.sort.clone(),
        };
        (next, request)
    }

    pub fn raw_records(&self) -> &[D::Record] {
        self.slot.records()
    }

    pub fn filtered_records(&self) -> Vec<&D::Record> {
        filter(self.slot.records(), &self.filters)
    }

    pub fn available_options(&self) -> BTreeMap<D, Vec<String>> {
        available_options(self.slot.records())
    }

    pub fn sorted_records(&self) -> Vec<&D::Record> {
        sort(self.filtered_records(), &self.sort)
    }
}

impl UsageView {
    pub fn for_range(from: YearMonth, to: YearMonth) -> Self {
        Self::new(FetchParams::usage(from, to))
    }

    pub fn aggregated_records(&self) -> Vec<UsageRecord> {
        aggregate(self.filtered_records())
    }

    pub fn table(&self) -> Projection<Table> {
        usage_table(&self.aggregated_records(), &self.sort)
    }

    pub fn metrics(&self) -> UsageMetrics {
        usage_metrics(&self.filtered_records())
    }

    pub fn charts(&self) -> Projection<UsageCharts> {
        let aggregated = self.aggregated_records();
        let refs: Vec<&UsageRecord> = aggregated.iter().collect();
        usage_charts(&refs)
    }
}

impl Default for CostView {
    fn default() -> Self {
        Self::new(FetchParams::Cost)
    }
}

impl CostView {
    pub fn table(&self) -> Projection<Table> {
        cost_table(&self.filtered_records(), &self.sort)
    }

    pub fn summary(&self) -> CostSummary {
        cost_summary(&self.filtered_records())
    }

    pub fn charts(&self) -> Projection<CostCharts> {
        cost_charts(&self.filtered_records())
    }
}

// -----------------------------------------------------------------------------
// Reporting page (usage + cost charts side by side)
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTab {
    #[default]
    Usage,
    Cost,
}

#[derive(Debug, Clone)]
pub enum ReportingAction {
    SelectTab(ReportTab),
    /// Starts both fetches.
    Load,
    UsageLoaded {
        request: RequestId,
        result: Result<Vec<UsageRecord>, FetchError>,
    },
    CostLoaded {
        request: RequestId,
        result: Result<Vec<CostRecord>, FetchError>,
    },
}

/// Combined charts page.
///
/// A side whose fetch fails renders as empty rather than failing the page.
#[derive(Debug, Clone)]
pub struct ReportingView {
    pub usage_params: FetchParams,
    pub usage: Slot<UsageRecord>,
    pub cost: Slot<CostRecord>,
    pub tab: ReportTab,
}

impl ReportingView {
    pub fn new(from: YearMonth, to: YearMonth) -> Self {
        Self {
            usage_params: FetchParams::usage(from, to),
            usage: Slot::default(),
            cost: Slot::default(),
            tab: ReportTab::default(),
        }
    }

    pub fn apply(&self, action: ReportingAction) -> Self {
        let mut next = self.clone();
        match action {
            ReportingAction::SelectTab(tab) => next.tab = tab,
            ReportingAction::Load => return self.begin().0,
            ReportingAction::UsageLoaded { request, result } => {
                next.usage = self.usage.complete(request, best_effort("usage", result));
            }
            ReportingAction::CostLoaded { request, result } => {
                next.cost = self.cost.complete(request, best_effort("cost", result));
            }
        }
        next
    }

    /// Start both fetches. Returns the usage and cost request ids.
    pub fn begin(&self) -> (Self, RequestId, RequestId) {
        let (usage, usage_request) = self.usage.begin();
        let (cost, cost_request) = self.cost.begin();
        let next = Self {
            usage,
            cost,
            ..self.clone()
        };
        (next, usage_request, cost_request)
    }

    pub fn is_loading(&self) -> bool {
        self.usage.is_loading() || self.cost.is_loading()
    }

    pub fn usage_charts(&self) -> Projection<UsageCharts> {
        let refs: Vec<&UsageRecord> = self.usage.records().iter().collect();
        usage_charts(&refs)
    }

    pub fn cost_charts(&self) -> Projection<CostCharts> {
        let refs: Vec<&CostRecord> = self.cost.records().iter().collect();
        cost_charts(&refs)
    }
}

fn best_effort<R>(side: &str, result: Result<Vec<R>, FetchError>) -> Result<Vec<R>, FetchError> {
    match result {
        Ok(records) => Ok(records),
        Err(e) => {
            tracing::warn!(side, error = %e, "report fetch failed, rendering without it");
            Ok(Vec::new())
        }
    }
}
