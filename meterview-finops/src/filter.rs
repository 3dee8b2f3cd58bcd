use meterview_common::{cost_fields, format_year_month, usage_fields, CostRecord, Record, UsageRecord};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// A column a record collection can be filtered on.
pub trait Dimension: Copy + Ord + Debug + 'static {
    type Record: Record + From<Map<String, Value>> + Clone + Debug + Send + Sync + 'static;

    /// Every dimension of this record kind, in display order.
    const ALL: &'static [Self];

    /// The value a record contributes to this dimension, as shown in the
    /// option list. `None` never passes an active filter.
    fn value_of(&self, record: &Self::Record) -> Option<String>;

    /// Option lists are sorted ascending unless this says otherwise.
    fn newest_first(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UsageDimension {
    GlobalAccount,
    Subaccount,
    Service,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CostDimension {
    GlobalAccount,
    Subaccount,
    Service,
    /// Compared on the `YYYY-MM` form.
    ReportMonth,
}

impl Dimension for UsageDimension {
    type Record = UsageRecord;

    const ALL: &'static [Self] = &[
        UsageDimension::GlobalAccount,
        UsageDimension::Subaccount,
        UsageDimension::Service,
        UsageDimension::Space,
    ];

    fn value_of(&self, record: &UsageRecord) -> Option<String> {
        let field = match self {
            UsageDimension::GlobalAccount => usage_fields::GLOBAL_ACCOUNT_NAME,
            UsageDimension::Subaccount => usage_fields::SUBACCOUNT_NAME,
            UsageDimension::Service => usage_fields::SERVICE_NAME,
            UsageDimension::Space => usage_fields::SPACE_NAME,
        };
        record.text(field)
    }
}

impl Dimension for CostDimension {
    type Record = CostRecord;

    const ALL: &'static [Self] = &[
        CostDimension::GlobalAccount,
        CostDimension::Subaccount,
        CostDimension::Service,
        CostDimension::ReportMonth,
    ];

    fn value_of(&self, record: &CostRecord) -> Option<String> {
        match self {
            CostDimension::GlobalAccount => record.text(cost_fields::GLOBAL_ACCOUNT_NAME),
            CostDimension::Subaccount => record.text(cost_fields::SUBACCOUNT_NAME),
            CostDimension::Service => record.text(cost_fields::SERVICE_NAME),
            CostDimension::ReportMonth => record
                .report_year_month()
                .and_then(format_year_month),
        }
    }

    fn newest_first(&self) -> bool {
        matches!(self, CostDimension::ReportMonth)
    }
}

/// Selected values per dimension.
///
/// An empty (or absent) selection places no restriction on that dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSet<D: Dimension> {
    selected: BTreeMap<D, BTreeSet<String>>,
}

impl<D: Dimension> Default for FilterSet<D> {
    fn default() -> Self {
        Self {
            selected: BTreeMap::new(),
        }
    }
}

impl<D: Dimension> FilterSet<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this set with `dimension` replaced by `values`.
    pub fn with<I, S>(&self, dimension: D, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            next.selected.remove(&dimension);
        } else {
            next.selected.insert(dimension, values);
        }
        next
    }

    pub fn selected(&self, dimension: D) -> Option<&BTreeSet<String>> {
        self.selected.get(&dimension)
    }

    pub fn is_active(&self) -> bool {
        self.selected.values().any(|v| !v.is_empty())
    }

    /// Total number of selected values across dimensions.
    pub fn selected_count(&self) -> usize {
        self.selected.values().map(BTreeSet::len).sum()
    }

    pub fn matches(&self, record: &D::Record) -> bool {
        self.selected.iter().all(|(dimension, accepted)| {
            accepted.is_empty()
                || dimension
                    .value_of(record)
                    .is_some_and(|v| accepted.contains(&v))
        })
    }
}

/// Records passing every active dimension, input order kept.
pub fn filter<'a, D: Dimension>(records: &'a [D::Record], filters: &FilterSet<D>) -> Vec<&'a D::Record> {
    if !filters.is_active() {
        return records.iter().collect();
    }
    records.iter().filter(|r| filters.matches(r)).collect()
}

/// Unique values present per dimension, sorted for the option lists.
pub fn available_options<D: Dimension>(records: &[D::Record]) -> BTreeMap<D, Vec<String>> {
    D::ALL
        .iter()
        .map(|dimension| {
            let unique: BTreeSet<String> =
                records.iter().filter_map(|r| dimension.value_of(r)).collect();
            let mut values: Vec<String> = unique.into_iter().collect();
            if dimension.newest_first() {
                values.reverse();
            }
            (*dimension, values)
        })
        .collect()
}
