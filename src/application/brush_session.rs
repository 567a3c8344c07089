//! Interactive brushing over a chart snapshot.
//!
//! Every brush event is echoed on the handle channel right away; the
//! expensive re-aggregation is throttled.

use std::time::Duration;

use solstate_api_types::ChartView;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::catalog;
use crate::application::charts::{ChartSnapshot, build_view};
use crate::application::throttle::Throttle;
use crate::domain::series::BrushInterval;

const EVENT_BUFFER: usize = 64;

pub type BrushEvent = Option<BrushInterval>;

pub struct BrushSession {
    events: mpsc::Sender<BrushEvent>,
    handle: watch::Receiver<BrushEvent>,
    views: mpsc::Receiver<ChartView>,
    task: JoinHandle<()>,
}

impl BrushSession {
    pub fn spawn(snapshot: ChartSnapshot, percent: Option<bool>, window: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (handle_tx, handle_rx) = watch::channel(None);
        let (views_tx, views_rx) = mpsc::channel(EVENT_BUFFER);

        let task = tokio::spawn(run(
            snapshot,
            percent,
            Throttle::new(window),
            events_rx,
            handle_tx,
            views_tx,
        ));

        Self {
            events: events_tx,
            handle: handle_rx,
            views: views_rx,
            task,
        }
    }

    /// Queue a brush move; `None` clears the brush. Returns `false` once the
    /// session has stopped.
    pub async fn brush(&self, event: BrushEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Latest handle position, updated on every event.
    pub fn handle(&self) -> watch::Receiver<BrushEvent> {
        self.handle.clone()
    }

    pub async fn next_view(&mut self) -> Option<ChartView> {
        self.views.recv().await
    }

    /// Stop accepting events, deliver any pending view, and wait for the
    /// worker to finish. Views not yet received are returned.
    pub async fn finish(self) -> Vec<ChartView> {
        let Self {
            events,
            mut views,
            task,
            ..
        } = self;
        drop(events);

        let mut remaining = Vec::new();
        while let Some(view) = views.recv().await {
            remaining.push(view);
        }
        join_worker(task).await;
        remaining
    }
}

/// Waits for the worker, logging a panic or cancellation. Returns whether it
/// exited cleanly.
async fn join_worker(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(err) => {
            warn!(
                target = "solstate::brush",
                error = %err,
                panicked = err.is_panic(),
                "brush session worker failed"
            );
            false
        }
    }
}

async fn run(
    snapshot: ChartSnapshot,
    percent: Option<bool>,
    mut throttle: Throttle<BrushEvent>,
    mut events: mpsc::Receiver<BrushEvent>,
    handle: watch::Sender<BrushEvent>,
    views: mpsc::Sender<ChartView>,
) {
    let spec = catalog::dataset(snapshot.dataset);
    let emit = |brush: BrushEvent| build_view(spec, &snapshot, brush.as_ref(), percent);

    loop {
        let deadline = throttle.deadline();
        tokio::select! {
            event = events.recv() => {
                let Some(brush) = event else {
                    if let Some(brush) = throttle.flush() {
                        let _ = views.send(emit(brush)).await;
                    }
                    break;
                };
                handle.send_replace(brush);
                if let Some(brush) = throttle.offer(brush, Instant::now())
                    && views.send(emit(brush)).await.is_err()
                {
                    break;
                }
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(brush) = throttle.poll_trailing(Instant::now())
                    && views.send(emit(brush)).await.is_err()
                {
                    break;
                }
            }
        }
    }

    debug!(
        target = "solstate::brush",
        dataset = snapshot.dataset.as_str(),
        "brush session closed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::charts::{ChartStore, UpstreamTarget};
    use crate::application::pipeline::RawRow;
    use crate::application::sources::{Endpoint, FetchError, RowSource};
    use crate::domain::datasets::DatasetId;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use time::macros::date;
    use url::Url;

    struct Daily;

    #[async_trait]
    impl RowSource for Daily {
        async fn fetch_rows(&self, _endpoint: &Endpoint) -> Result<Vec<RawRow>, FetchError> {
            Ok((1..=9)
                .map(|day| {
                    json!({"block_date": format!("2024-01-0{day}"), "dex": "Orca", "TVL": day})
                })
                .collect())
        }
    }

    async fn snapshot() -> ChartSnapshot {
        let store = ChartStore::new(
            Arc::new(Daily),
            UpstreamTarget {
                base_url: Url::parse("http://upstream.test").expect("url"),
                api_key: None,
            },
        );
        store.snapshot(DatasetId::DexTvl).await.expect("snapshot")
    }

    fn days(start: u8, end: u8) -> BrushEvent {
        let start = date!(2024 - 01 - 01).replace_day(start).expect("start");
        let end = date!(2024 - 01 - 01).replace_day(end).expect("end");
        Some(BrushInterval::new(start, end).expect("brush"))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_yields_leading_and_trailing_views() {
        let mut session = BrushSession::spawn(snapshot().await, Some(false), Duration::from_millis(100));
        let handle = session.handle();

        for end in 2..=6 {
            assert!(session.brush(days(1, end)).await);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*handle.borrow(), days(1, 6));

        let leading = session.next_view().await.expect("leading view");
        assert_eq!(leading.rows.len(), 2);
        let trailing = session.next_view().await.expect("trailing view");
        assert_eq!(trailing.rows.len(), 6);

        assert!(session.finish().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_events_each_fire() {
        let mut session = BrushSession::spawn(snapshot().await, Some(false), Duration::from_millis(100));
        session.brush(days(1, 3)).await;
        assert_eq!(session.next_view().await.expect("view").rows.len(), 3);
        tokio::time::sleep(Duration::from_millis(150)).await;
        session.brush(None).await;
        let cleared = session.next_view().await.expect("view");
        assert_eq!(cleared.rows.len(), 9);
        assert!(cleared.brush.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn closing_flushes_pending_brush() {
        let session = BrushSession::spawn(snapshot().await, Some(false), Duration::from_millis(100));
        session.brush(days(1, 2)).await;
        session.brush(days(4, 5)).await;
        let views = session.finish().await;
        let last = views.last().expect("flushed view");
        assert_eq!(last.rows.len(), 2);
        assert_eq!(last.rows[0].bucket, date!(2024 - 01 - 04));
    }

    #[tokio::test]
    async fn aborted_worker_reports_unclean_exit() {
        let stalled = tokio::spawn(std::future::pending::<()>());
        stalled.abort();
        assert!(!join_worker(stalled).await);

        let clean = tokio::spawn(async {});
        assert!(join_worker(clean).await);
    }
}
