use meterview_common::{usage_fields, Record, UsageRecord};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Fields that identify a usage row; rows equal on all of them are merged.
pub const AGGREGATION_FIELDS: [&str; 8] = [
    usage_fields::GLOBAL_ACCOUNT_NAME,
    usage_fields::SUBACCOUNT_NAME,
    usage_fields::REPORT_YEAR_MONTH,
    usage_fields::SERVICE_NAME,
    usage_fields::PLAN,
    usage_fields::ENVIRONMENT_INSTANCE_NAME,
    usage_fields::SPACE_NAME,
    usage_fields::METRIC_NAME,
];

/// Composite identity of a usage row.
///
/// Components are kept apart (not joined into one string), so a dash inside
/// a subaccount name cannot make two different rows collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey(Vec<KeyPart>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Missing,
    Null,
    Bool(bool),
    // Canonical decimal rendering: 202501 and 202501.0 agree.
    Number(String),
    Text(String),
    Json(String),
}

impl KeyPart {
    fn of(value: Option<&Value>) -> Self {
        match value {
            None => KeyPart::Missing,
            Some(Value::Null) => KeyPart::Null,
            Some(Value::Bool(b)) => KeyPart::Bool(*b),
            Some(Value::Number(n)) => KeyPart::Number(
                n.as_f64()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| n.to_string()),
            ),
            Some(Value::String(s)) => KeyPart::Text(s.clone()),
            Some(other) => KeyPart::Json(other.to_string()),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Missing => f.write_str("undefined"),
            KeyPart::Null => f.write_str("null"),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Number(s) | KeyPart::Text(s) | KeyPart::Json(s) => f.write_str(s),
        }
    }
}

impl AggregationKey {
    pub fn of(record: &UsageRecord) -> Self {
        AggregationKey(
            AGGREGATION_FIELDS
                .iter()
                .map(|field| KeyPart::of(record.field(field)))
                .collect(),
        )
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// Merge usage rows sharing an [`AggregationKey`].
///
/// `usage` is summed (non-numeric counts as 0); every other field comes from
/// the first row seen for the key. Output follows first-occurrence order.
pub fn aggregate<'a, I>(records: I) -> Vec<UsageRecord>
where
    I: IntoIterator<Item = &'a UsageRecord>,
{
    aggregate_keyed(records)
        .into_iter()
        .map(|(_, record)| record)
        .collect()
}

/// Same as [`aggregate`], with each merged row's key.
pub fn aggregate_keyed<'a, I>(records: I) -> Vec<(AggregationKey, UsageRecord)>
where
    I: IntoIterator<Item = &'a UsageRecord>,
{
    let mut index: HashMap<AggregationKey, usize> = HashMap::new();
    let mut groups: Vec<(AggregationKey, &'a UsageRecord, f64)> = Vec::new();

    for record in records {
        let key = AggregationKey::of(record);
        match index.get(&key) {
            Some(&i) => groups[i].2 += record.usage(),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, record, record.usage()));
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, first, total)| (key, first.clone().with_usage(total)))
        .collect()
}
