use async_trait::async_trait;
use meterview_common::{FetchError, YearMonth};
use std::fmt;

pub mod credentials;
pub mod proxy;
pub mod upstream;

pub use credentials::Credentials;
pub use proxy::ProxyBillingSource;
pub use upstream::{UpstreamClient, UpstreamConfig};

/// Which report a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Usage,
    Cost,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Usage => "usage",
            ReportKind::Cost => "cost",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single fetch. Usage needs a month range, cost takes none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchParams {
    Usage { from: YearMonth, to: YearMonth },
    Cost,
}

impl FetchParams {
    pub fn usage(from: YearMonth, to: YearMonth) -> Self {
        FetchParams::Usage { from, to }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            FetchParams::Usage { .. } => ReportKind::Usage,
            FetchParams::Cost => ReportKind::Cost,
        }
    }
}

/// The data-fetch capability the dashboard core depends on.
///
/// Implementations attach credentials and talk to whatever sits in front of
/// the billing API. The returned value is the raw JSON, envelope included;
/// unwrapping it is the caller's job.
#[async_trait]
pub trait BillingSource: Send + Sync {
    async fn fetch(&self, params: &FetchParams) -> Result<serde_json::Value, FetchError>;
}

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::MockBillingSource;
