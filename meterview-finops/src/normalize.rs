//! Unwrapping of billing API response envelopes.
//!
//! The billing endpoints (and the proxies in front of them) wrap the record
//! array differently: OData v4 uses `value`, OData v2 `d.results`, the
//! reporting API `content`, and so on. A bare array is also accepted.

use meterview_common::FetchError;
use serde_json::{Map, Value};

/// One known envelope shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{ "value": [...] }`
    Value,
    /// `{ "d": { "results": [...] } }`
    ODataV2Results,
    /// `{ "content": [...] }`
    Content,
    /// `{ "data": [...] }`
    Data,
    /// `{ "records": [...] }`
    Records,
    /// `{ "results": [...] }`
    Results,
}

/// Probe order. When a response carries more than one matching field the
/// earliest entry here decides.
pub const ENVELOPE_PRIORITY: [Envelope; 6] = [
    Envelope::Value,
    Envelope::ODataV2Results,
    Envelope::Content,
    Envelope::Data,
    Envelope::Records,
    Envelope::Results,
];

impl Envelope {
    /// Top-level field the envelope hangs off.
    pub fn field(&self) -> &'static str {
        match self {
            Envelope::Value => "value",
            Envelope::ODataV2Results => "d",
            Envelope::Content => "content",
            Envelope::Data => "data",
            Envelope::Records => "records",
            Envelope::Results => "results",
        }
    }

    /// The wrapped array, if this envelope matches `obj`.
    pub fn extract<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a Vec<Value>> {
        let slot = obj.get(self.field())?;
        match self {
            Envelope::ODataV2Results => slot.get("results")?.as_array(),
            _ => slot.as_array(),
        }
    }

    fn take(&self, obj: &mut Map<String, Value>) -> Option<Vec<Value>> {
        let slot = match self {
            Envelope::ODataV2Results => obj
                .get_mut(self.field())?
                .as_object_mut()?
                .remove("results")?,
            _ => obj.remove(self.field())?,
        };
        match slot {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Which envelope a response uses, `None` for a bare array or no match.
pub fn detect_envelope(value: &Value) -> Option<Envelope> {
    let obj = value.as_object()?;
    ENVELOPE_PRIORITY
        .iter()
        .copied()
        .find(|e| e.extract(obj).is_some())
}

/// Pull the record array out of a response, unchanged and in order.
pub fn extract_array(value: Value) -> Result<Vec<Value>, FetchError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            let Some(envelope) = ENVELOPE_PRIORITY
                .iter()
                .find(|e| e.extract(&obj).is_some())
            else {
                let fields: Vec<String> = obj.keys().cloned().collect();
                tracing::warn!(?fields, "unknown response envelope");
                return Err(FetchError::MalformedResponse {
                    fields: Some(fields),
                });
            };
            Ok(envelope.take(&mut obj).unwrap_or_default())
        }
        _ => Err(FetchError::MalformedResponse { fields: None }),
    }
}

/// Unwrap the envelope and turn each element into a record.
///
/// Elements must be JSON objects; anything else fails the whole response.
pub fn normalize<R>(value: Value) -> Result<Vec<R>, FetchError>
where
    R: From<Map<String, Value>>,
{
    extract_array(value)?
        .into_iter()
        .map(|item| match item {
            Value::Object(fields) => Ok(R::from(fields)),
            _ => Err(FetchError::MalformedResponse { fields: None }),
        })
        .collect()
}
