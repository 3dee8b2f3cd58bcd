use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod error;
pub mod year_month;

pub use error::FetchError;
pub use year_month::{format_year_month, YearMonth};

// -----------------------------------------------------------------------------
// Field names (as emitted by the billing API)
// -----------------------------------------------------------------------------

pub mod usage_fields {
    pub const GLOBAL_ACCOUNT_NAME: &str = "globalAccountName";
    pub const SUBACCOUNT_NAME: &str = "subaccountName";
    pub const REPORT_YEAR_MONTH: &str = "reportYearMonth";
    pub const SERVICE_NAME: &str = "serviceName";
    pub const PLAN: &str = "plan";
    pub const PLAN_NAME: &str = "planName";
    pub const ENVIRONMENT_INSTANCE_NAME: &str = "environmentInstanceName";
    pub const SPACE_NAME: &str = "spaceName";
    pub const METRIC_NAME: &str = "metricName";
    pub const USAGE: &str = "usage";
}

pub mod cost_fields {
    pub const GLOBAL_ACCOUNT_NAME: &str = "GlobalAccountName";
    pub const SUBACCOUNT_NAME: &str = "SubaccountName";
    pub const REPORT_YEAR_MONTH: &str = "ReportYearMonth";
    pub const SERVICE_NAME: &str = "ServiceName";
    pub const PLAN_NAME: &str = "PlanName";
    pub const METRIC_NAME: &str = "MetricName";
    pub const UNIT_PLURAL: &str = "UnitPlural";
    pub const USAGE: &str = "Usage";
    pub const CURRENCY: &str = "Currency";
    pub const COST: &str = "Cost";
    pub const QUOTA: &str = "Quota";
    pub const ACTUAL_USAGE: &str = "ActualUsage";
    pub const CHARGED_BLOCKS: &str = "ChargedBlocks";
}

// -----------------------------------------------------------------------------
// Records
// -----------------------------------------------------------------------------

/// Read access shared by usage and cost rows.
///
/// Rows are flat JSON objects; any field the API sends is kept, so callers
/// can sort or display columns this crate has no accessor for.
pub trait Record {
    fn fields(&self) -> &Map<String, Value>;

    fn field(&self, name: &str) -> Option<&Value> {
        self.fields().get(name)
    }

    /// String-ish view of a field. Numbers are rendered, null/missing is `None`.
    fn text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Numeric view of a field; missing or non-numeric reads as 0.
    fn number(&self, name: &str) -> f64 {
        self.field(name).and_then(Value::as_f64).unwrap_or(0.0)
    }
}

/// One row of the account-level usage report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageRecord(Map<String, Value>);

/// One row of the monthly subaccount cost report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostRecord(Map<String, Value>);

impl Record for UsageRecord {
    fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Record for CostRecord {
    fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for UsageRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Map<String, Value>> for CostRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl UsageRecord {
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn global_account_name(&self) -> Option<String> {
        self.text(usage_fields::GLOBAL_ACCOUNT_NAME)
    }

    pub fn subaccount_name(&self) -> Option<String> {
        self.text(usage_fields::SUBACCOUNT_NAME)
    }

    pub fn report_year_month(&self) -> Option<&Value> {
        self.field(usage_fields::REPORT_YEAR_MONTH)
    }

    pub fn service_name(&self) -> Option<String> {
        self.text(usage_fields::SERVICE_NAME)
    }

    pub fn space_name(&self) -> Option<String> {
        self.text(usage_fields::SPACE_NAME)
    }

    pub fn usage(&self) -> f64 {
        self.number(usage_fields::USAGE)
    }

    /// Replace the `usage` measure. Only the aggregator builds merged rows,
    /// fetched rows are never touched.
    pub fn with_usage(mut self, usage: f64) -> Self {
        self.0
            .insert(usage_fields::USAGE.to_string(), number_value(usage));
        self
    }
}

impl CostRecord {
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn global_account_name(&self) -> Option<String> {
        self.text(cost_fields::GLOBAL_ACCOUNT_NAME)
    }

    pub fn subaccount_name(&self) -> Option<String> {
        self.text(cost_fields::SUBACCOUNT_NAME)
    }

    pub fn report_year_month(&self) -> Option<&Value> {
        self.field(cost_fields::REPORT_YEAR_MONTH)
    }

    pub fn service_name(&self) -> Option<String> {
        self.text(cost_fields::SERVICE_NAME)
    }

    pub fn plan_name(&self) -> Option<String> {
        self.text(cost_fields::PLAN_NAME)
    }

    pub fn currency(&self) -> Option<String> {
        self.text(cost_fields::CURRENCY)
    }

    pub fn cost(&self) -> f64 {
        self.number(cost_fields::COST)
    }
}

/// Integral sums stay integers so `8` does not come back as `8.0`.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn usage(v: Value) -> UsageRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn unknown_fields_survive_a_roundtrip() {
        let r = usage(json!({"serviceName": "hana", "directoryId": "d-1", "usage": 2}));
        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["directoryId"], "d-1");
    }

    #[test]
    fn non_numeric_usage_reads_as_zero() {
        assert_eq!(usage(json!({"usage": "12"})).usage(), 0.0);
        assert_eq!(usage(json!({})).usage(), 0.0);
        assert_eq!(usage(json!({"usage": 1.5})).usage(), 1.5);
    }

    #[test]
    fn text_renders_numbers_and_hides_null() {
        let r = usage(json!({"reportYearMonth": 202501, "spaceName": null}));
        assert_eq!(r.text("reportYearMonth").as_deref(), Some("202501"));
        assert_eq!(r.space_name(), None);
    }

    #[test]
    fn with_usage_keeps_integers_integral() {
        let r = usage(json!({"usage": 3})).with_usage(8.0);
        assert_eq!(r.field("usage"), Some(&json!(8)));
        let r = r.with_usage(2.5);
        assert_eq!(r.field("usage"), Some(&json!(2.5)));
    }

    #[test]
    fn cost_accessors() {
        let r: CostRecord =
            serde_json::from_value(json!({"Cost": 10.25, "Currency": "EUR", "PlanName": "standard"}))
                .unwrap();
        assert_eq!(r.cost(), 10.25);
        assert_eq!(r.currency().as_deref(), Some("EUR"));
        assert_eq!(r.plan_name().as_deref(), Some("standard"));
    }
}
