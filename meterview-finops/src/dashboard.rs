use crate::filter::Dimension;
use crate::normalize::normalize;
use crate::state::{ReportView, ReportingAction, ReportingView, ViewAction};
use meterview_common::{CostRecord, FetchError, UsageRecord};
use meterview_providers::{BillingSource, FetchParams};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

/// Fetch one report and unwrap its envelope into records.
pub async fn fetch_records<R>(
    source: &dyn BillingSource,
    params: &FetchParams,
) -> Result<Vec<R>, FetchError>
where
    R: From<Map<String, Value>>,
{
    let kind = params.kind();
    let raw = source.fetch(params).await?;
    let records = normalize(raw)?;
    tracing::debug!(%kind, count = records.len(), "report fetched");
    Ok(records)
}

/// Owns one table page's state and drives its fetches.
///
/// Every change is published through a `watch` channel, so renderers only
/// ever see whole snapshots.
pub struct ViewStore<D: Dimension> {
    source: Arc<dyn BillingSource>,
    state: watch::Sender<ReportView<D>>,
}

impl<D: Dimension> ViewStore<D> {
    pub fn new(source: Arc<dyn BillingSource>, initial: ReportView<D>) -> Self {
        let (state, _) = watch::channel(initial);
        Self { source, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReportView<D>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ReportView<D> {
        self.state.borrow().clone()
    }

    /// Apply a synchronous change (filters, sort, range).
    pub fn dispatch(&self, action: ViewAction<D>) {
        self.state.send_modify(|view| *view = view.apply(action));
    }

    /// "Load Data": clear filters and fetch with the current parameters.
    pub async fn load(&self) -> ReportView<D> {
        self.fetch(false).await
    }

    /// Fetch again with the last parameters, keeping filters.
    pub async fn retry(&self) -> ReportView<D> {
        self.fetch(true).await
    }

    async fn fetch(&self, retry: bool) -> ReportView<D> {
        let mut issued = None;
        self.state.send_modify(|view| {
            let (next, request) = view.begin(retry);
            issued = next.requested.map(|params| (request, params));
            *view = next;
        });
        let Some((request, params)) = issued else {
            return self.snapshot();
        };

        let result = fetch_records(self.source.as_ref(), &params).await;
        if let Err(e) = &result {
            tracing::error!(kind = %params.kind(), error = %e, "report fetch failed");
        }
        self.dispatch(ViewAction::Loaded { request, result });
        self.snapshot()
    }
}

/// Load both reports concurrently.
///
/// A failing side is logged and rendered empty; the page still loads.
pub async fn load_reporting(source: &dyn BillingSource, view: &ReportingView) -> ReportingView {
    let (view, usage_request, cost_request) = view.begin();
    let usage_params = view.usage_params;

    let (usage, cost) = tokio::join!(
        fetch_records::<UsageRecord>(source, &usage_params),
        fetch_records::<CostRecord>(source, &FetchParams::Cost),
    );

    view.apply(ReportingAction::UsageLoaded {
        request: usage_request,
        result: usage,
    })
    .apply(ReportingAction::CostLoaded {
        request: cost_request,
        result: cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::UsageDimension;
    use crate::state::{CostView, LoadStatus, UsageView};
    use async_trait::async_trait;
    use meterview_providers::{MockBillingSource, ReportKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ym(s: &str) -> meterview_common::YearMonth {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn load_normalizes_envelope() {
        let source = MockBillingSource::new().with_response(
            ReportKind::Cost,
            Ok(json!({"content": [{"ServiceName": "a", "Cost": 1.5}, {"ServiceName": "b", "Cost": 2}]})),
        );
        let store = ViewStore::new(Arc::new(source), CostView::default());
        let view = store.load().await;
        assert_eq!(view.slot.status(), &LoadStatus::Ready);
        assert_eq!(view.raw_records().len(), 2);
        assert_eq!(view.summary().total_cost, 3.5);
    }

    #[tokio::test]
    async fn load_failure_surfaces_user_message() {
        let source = MockBillingSource::new().with_response(
            ReportKind::Usage,
            Ok(json!({"unexpected": true, "shape": 1})),
        );
        let store = ViewStore::new(
            Arc::new(source),
            UsageView::for_range(ym("202501"), ym("202510")),
        );
        let view = store.load().await;
        assert!(view.raw_records().is_empty());
        assert_eq!(
            view.slot.error(),
            Some(r#"Invalid data format. Response structure: ["unexpected","shape"]"#)
        );
    }

    #[tokio::test]
    async fn retry_keeps_filters_and_params() {
        let source = Arc::new(MockBillingSource::new().with_response(
            ReportKind::Usage,
            Ok(json!([{"serviceName": "a", "usage": 1}])),
        ));
        let store = ViewStore::new(
            source.clone(),
            UsageView::for_range(ym("202501"), ym("202503")),
        );
        store.load().await;
        store.dispatch(ViewAction::SetFilter {
            dimension: UsageDimension::Service,
            values: ["a".to_string()].into(),
        });
        let view = store.retry().await;
        assert!(view.filters.is_active());
        assert_eq!(
            source.calls(),
            vec![
                FetchParams::usage(ym("202501"), ym("202503")),
                FetchParams::usage(ym("202501"), ym("202503")),
            ]
        );
    }

    /// First call is slow, every later call answers at once.
    struct SlowFirstSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BillingSource for SlowFirstSource {
        async fn fetch(&self, _params: &FetchParams) -> Result<Value, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(json!([{"serviceName": "stale", "usage": 1}]))
            } else {
                Ok(json!([{"serviceName": "fresh", "usage": 1}, {"serviceName": "fresh2", "usage": 2}]))
            }
        }
    }

    #[tokio::test]
    async fn slower_earlier_fetch_cannot_overwrite_newer_one() {
        let store = ViewStore::new(
            Arc::new(SlowFirstSource {
                calls: AtomicUsize::new(0),
            }),
            UsageView::for_range(ym("202501"), ym("202510")),
        );

        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            store.load().await
        };
        let (_, _) = tokio::join!(store.load(), second);

        let view = store.snapshot();
        assert_eq!(view.slot.status(), &LoadStatus::Ready);
        assert_eq!(view.raw_records().len(), 2);
        assert_eq!(
            view.raw_records()[0].service_name().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_ready() {
        let source = MockBillingSource::new()
            .with_response(ReportKind::Cost, Ok(json!({"d": {"results": []}})))
            .with_delay(ReportKind::Cost, Duration::from_millis(50));
        let store = ViewStore::new(Arc::new(source), CostView::default());
        let mut rx = store.subscribe();

        let watcher = async {
            rx.changed().await.unwrap();
            let loading = rx.borrow_and_update().slot.is_loading();
            rx.changed().await.unwrap();
            let ready = rx.borrow_and_update().slot.status().clone();
            (loading, ready)
        };
        let (_, (loading, ready)) = tokio::join!(store.load(), watcher);
        assert!(loading);
        assert_eq!(ready, LoadStatus::Ready);
        assert!(store.snapshot().table().is_empty());
    }

    #[tokio::test]
    async fn reporting_is_best_effort() {
        let source = MockBillingSource::new()
            .with_response(ReportKind::Usage, Err(FetchError::network("offline")))
            .with_response(
                ReportKind::Cost,
                Ok(json!({"value": [{"ServiceName": "x", "Cost": 4, "Currency": "USD"}]})),
            );
        let view = load_reporting(&source, &ReportingView::new(ym("202501"), ym("202510"))).await;
        assert!(!view.is_loading());
        assert!(view.usage.records().is_empty());
        assert!(view.usage_charts().is_empty());
        let charts = view.cost_charts().ready().unwrap();
        assert_eq!(charts.currency, "USD");
        assert_eq!(source.calls().len(), 2);
    }
}
