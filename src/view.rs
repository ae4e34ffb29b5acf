// src/view.rs - Data source listing the active alarms raised by anomaly detection
use crate::alarms::{AlarmFilter, AlarmRecord};
use crate::backend::{fetch_active_alarms, AlarmBackend};
use crate::config::ViewConfig;
use crate::error::{Result, ViewError};
use crate::page::Page;
use crate::schema::{self, Column};
use crate::source::{DataSource, InitArgs};
use crate::transform::{self, TransformStats};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

#[cfg(feature = "metrics")]
use metrics::counter;

type FetchResult = Result<Vec<Option<AlarmRecord>>>;

/// Failure recorded for a fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Missing or unrecognized backend response
    DataUnavailable(String),
    /// The backend call failed
    Transport(String),
}

impl FetchFailure {
    fn to_error(&self) -> ViewError {
        match self {
            FetchFailure::DataUnavailable(msg) => ViewError::DataUnavailable(msg.clone()),
            FetchFailure::Transport(msg) => ViewError::Transport(msg.clone()),
        }
    }
}

impl From<ViewError> for FetchFailure {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::DataUnavailable(msg) => FetchFailure::DataUnavailable(msg),
            ViewError::Transport(msg) => FetchFailure::Transport(msg),
            other => FetchFailure::Transport(other.to_string()),
        }
    }
}

/// Where the view is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    FetchPending,
    FetchResolved,
    FetchFailed,
}

enum FetchState {
    Empty,
    Pending(oneshot::Receiver<FetchResult>),
    Resolved(Vec<Option<AlarmRecord>>),
    Failed(FetchFailure),
}

struct Connection {
    backend: Arc<dyn AlarmBackend>,
    runtime: Handle,
}

/// Read-only view over the active alarms of the suggestion engine.
///
/// A query cycle is `initialize`, `prepare_fetch`, then `next_page`. The fetch
/// runs as a task on the runtime passed at initialization so the host can read
/// [`columns`](Self::columns) while the backend call is in flight. The first
/// page request waits for that task; every page is final.
///
/// # Examples
///
/// ```rust,no_run
/// use anomaly_events::{AnomalyAlarmView, InitArgs, SnapshotBackend, ViewConfig};
/// use std::sync::Arc;
///
/// # async fn run() -> anomaly_events::Result<()> {
/// let backend = Arc::new(SnapshotBackend::from_json_file("alarms.json")?);
///
/// let mut view = AnomalyAlarmView::new(ViewConfig::default());
/// view.initialize(InitArgs::new(backend)?);
/// view.prepare_fetch()?;
///
/// let page = view.next_page().await?;
/// assert!(!page.has_next_page);
/// # Ok(())
/// # }
/// ```
pub struct AnomalyAlarmView {
    config: ViewConfig,
    connection: Option<Connection>,
    state: FetchState,
    last_stats: Option<TransformStats>,
}

impl AnomalyAlarmView {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            connection: None,
            state: FetchState::Empty,
            last_stats: None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Store the backend and runtime handles used by later fetches
    pub fn initialize(&mut self, args: InitArgs) {
        debug!("Anomaly alarm view initialized (source id {})", self.config.source_id);
        self.connection = Some(Connection {
            backend: args.backend,
            runtime: args.runtime,
        });
    }

    /// Start the active alarm request for a new cycle.
    ///
    /// The result is not awaited here; backend failures are reported by the next
    /// page request. A second call replaces the pending request.
    pub fn prepare_fetch(&mut self) -> Result<()> {
        let connection = self.connection.as_ref().ok_or_else(|| {
            ViewError::NotInitialized("prepare_fetch called before initialize".to_string())
        })?;

        if matches!(self.state, FetchState::Pending(_)) {
            debug!("Replacing pending fetch; only the latest request will be awaited");
        }

        let backend = Arc::clone(&connection.backend);
        let filter = AlarmFilter::source_equals(self.config.source_id);
        let (tx, rx) = oneshot::channel();

        connection.runtime.spawn(async move {
            let outcome = fetch_active_alarms(backend.as_ref(), filter).await;
            if tx.send(outcome).is_err() {
                debug!("Fetch result discarded; the cycle was replaced");
            }
        });

        #[cfg(feature = "metrics")]
        counter!("anomaly_events_fetch_cycles_total").increment(1);

        self.state = FetchState::Pending(rx);
        self.last_stats = None;
        Ok(())
    }

    /// Fixed column layout; independent of the fetch state
    pub fn columns(&self) -> &'static [Column] {
        schema::columns()
    }

    /// Wait for the pending fetch and return the only page of this cycle.
    ///
    /// Without a prior `prepare_fetch` this returns an empty page.
    pub async fn next_page(&mut self) -> Result<Page> {
        if let FetchState::Pending(rx) = &mut self.state {
            let received = rx.await;
            self.settle(received);
        }
        self.render()
    }

    /// Blocking variant of [`next_page`](Self::next_page) for synchronous hosts.
    ///
    /// Must not be called from within an async execution context.
    pub fn blocking_next_page(&mut self) -> Result<Page> {
        match std::mem::replace(&mut self.state, FetchState::Empty) {
            FetchState::Pending(rx) => self.settle(rx.blocking_recv()),
            other => self.state = other,
        }
        self.render()
    }

    pub fn phase(&self) -> Phase {
        match (&self.connection, &self.state) {
            (None, _) => Phase::Uninitialized,
            (Some(_), FetchState::Empty) => Phase::Initialized,
            (Some(_), FetchState::Pending(_)) => Phase::FetchPending,
            (Some(_), FetchState::Resolved(_)) => Phase::FetchResolved,
            (Some(_), FetchState::Failed(_)) => Phase::FetchFailed,
        }
    }

    /// Counters of the most recent rendered page
    pub fn last_stats(&self) -> Option<TransformStats> {
        self.last_stats
    }

    fn settle(&mut self, received: std::result::Result<FetchResult, oneshot::error::RecvError>) {
        self.state = match received {
            Ok(Ok(alarms)) => FetchState::Resolved(alarms),
            Ok(Err(err)) => {
                warn!("Active alarm fetch failed: {}", err);
                #[cfg(feature = "metrics")]
                counter!("anomaly_events_fetch_failures_total").increment(1);
                FetchState::Failed(err.into())
            }
            Err(_) => {
                warn!("Active alarm fetch task ended without a result");
                #[cfg(feature = "metrics")]
                counter!("anomaly_events_fetch_failures_total").increment(1);
                FetchState::Failed(FetchFailure::Transport(
                    "fetch task ended without a result".to_string(),
                ))
            }
        };
    }

    fn render(&mut self) -> Result<Page> {
        match &self.state {
            FetchState::Empty => Ok(Page::empty()),
            FetchState::Pending(_) => Err(ViewError::Transport(
                "fetch result not received".to_string(),
            )),
            FetchState::Failed(failure) => Err(failure.to_error()),
            FetchState::Resolved(alarms) => {
                let (page, stats) = transform::build_page(alarms, self.config.source_id);
                info!(
                    "Anomaly page: {} rows from {} entries ({} null, {} foreign source, {} not anomalies)",
                    stats.rows, stats.received, stats.null_skipped, stats.foreign_source, stats.not_anomaly
                );

                // Count each cycle once; repeated page requests reuse the result
                #[cfg(feature = "metrics")]
                {
                    if self.last_stats.is_none() {
                        counter!("anomaly_events_rows_total").increment(stats.rows as u64);
                        counter!("anomaly_events_dropped_total")
                            .increment((stats.received - stats.rows) as u64);
                    }
                }

                self.last_stats = Some(stats);
                Ok(page)
            }
        }
    }
}

impl Default for AnomalyAlarmView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

#[async_trait]
impl DataSource for AnomalyAlarmView {
    fn on_init(&mut self, args: InitArgs) -> Result<()> {
        self.initialize(args);
        Ok(())
    }

    fn on_prepare_fetch(&mut self) -> Result<()> {
        self.prepare_fetch()
    }

    fn columns(&self) -> &'static [Column] {
        schema::columns()
    }

    async fn next_page(&mut self) -> Result<Page> {
        AnomalyAlarmView::next_page(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::{AlarmMetadata, AnomalyMetadata, AnomalyType};
    use crate::backend::{BackendRequest, BackendResponse, SnapshotBackend};
    use chrono::DateTime;
    use uuid::Uuid;

    struct FailingBackend;

    #[async_trait]
    impl AlarmBackend for FailingBackend {
        async fn send(&self, _request: BackendRequest) -> Result<BackendResponse> {
            Err(ViewError::Transport("connection refused".to_string()))
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl AlarmBackend for PanickingBackend {
        async fn send(&self, _request: BackendRequest) -> Result<BackendResponse> {
            panic!("backend connection lost");
        }
    }

    fn anomaly_alarm(alarm_id: i32) -> AlarmRecord {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        AlarmRecord {
            backend_instance_id: 1,
            alarm_id,
            element_id: 7,
            element_name: "Encoder 1".to_string(),
            parameter_id: 1001,
            parameter_name: "Bitrate".to_string(),
            table_row_key: None,
            display_value: "3 Mbps".to_string(),
            severity: "Minor".to_string(),
            source_id: 63,
            time_of_arrival: at,
            creation_time: at,
            metadata: AlarmMetadata::Anomaly(AnomalyMetadata {
                anomaly_type: AnomalyType::LevelShift,
                guid: Uuid::new_v4(),
            }),
        }
    }

    #[tokio::test]
    async fn test_next_page_without_fetch_is_empty() {
        let mut view = AnomalyAlarmView::default();
        assert_eq!(view.phase(), Phase::Uninitialized);

        let page = view.next_page().await.unwrap();
        assert!(page.is_empty());
        assert!(view.last_stats().is_none());
    }

    #[tokio::test]
    async fn test_prepare_fetch_requires_initialize() {
        let mut view = AnomalyAlarmView::default();
        assert!(matches!(view.prepare_fetch(), Err(ViewError::NotInitialized(_))));
    }

    #[tokio::test]
    async fn test_cycle_walks_through_phases() {
        let backend = Arc::new(SnapshotBackend::new(vec![Some(anomaly_alarm(1)), None]));
        let mut view = AnomalyAlarmView::default();

        view.initialize(InitArgs::new(backend).unwrap());
        assert_eq!(view.phase(), Phase::Initialized);

        view.prepare_fetch().unwrap();
        assert_eq!(view.phase(), Phase::FetchPending);

        let page = view.next_page().await.unwrap();
        assert_eq!(page.len(), 1);
        assert!(!page.has_next_page);
        assert_eq!(view.phase(), Phase::FetchResolved);

        let stats = view.last_stats().unwrap();
        assert_eq!((stats.received, stats.null_skipped, stats.rows), (2, 1, 1));

        // Repeated request in the same cycle renders the cached result
        assert_eq!(view.next_page().await.unwrap(), page);
        assert_eq!(view.last_stats(), Some(stats));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_on_page_request() {
        let mut view = AnomalyAlarmView::default();
        view.initialize(InitArgs::new(Arc::new(FailingBackend)).unwrap());

        // The failure is deferred: preparing the fetch succeeds.
        view.prepare_fetch().unwrap();

        let err = view.next_page().await.unwrap_err();
        assert!(matches!(err, ViewError::Transport(ref msg) if msg == "connection refused"));
        assert_eq!(view.phase(), Phase::FetchFailed);

        // Same cycle, same outcome.
        assert!(matches!(view.next_page().await, Err(ViewError::Transport(_))));
    }

    #[tokio::test]
    async fn test_fetch_task_dying_surfaces_as_transport() {
        let mut view = AnomalyAlarmView::default();
        view.initialize(InitArgs::new(Arc::new(PanickingBackend)).unwrap());
        view.prepare_fetch().unwrap();

        let err = view.next_page().await.unwrap_err();
        assert!(matches!(err, ViewError::Transport(ref msg) if msg.contains("without a result")));
        assert_eq!(view.phase(), Phase::FetchFailed);
    }

    #[test]
    fn test_blocking_page_request_reports_failure() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut view = AnomalyAlarmView::default();
        view.initialize(InitArgs::with_runtime(
            Arc::new(FailingBackend),
            runtime.handle().clone(),
        ));
        view.prepare_fetch().unwrap();

        assert!(matches!(view.blocking_next_page(), Err(ViewError::Transport(_))));
        assert_eq!(view.phase(), Phase::FetchFailed);
        assert!(matches!(view.blocking_next_page(), Err(ViewError::Transport(_))));
    }

    #[tokio::test]
    async fn test_new_cycle_starts_fresh_fetch() {
        let backend = Arc::new(SnapshotBackend::new(vec![Some(anomaly_alarm(1))]));
        let mut view = AnomalyAlarmView::default();
        view.initialize(InitArgs::new(backend).unwrap());

        view.prepare_fetch().unwrap();
        view.prepare_fetch().unwrap();
        assert_eq!(view.next_page().await.unwrap().len(), 1);

        view.prepare_fetch().unwrap();
        assert!(view.last_stats().is_none());
        assert_eq!(view.next_page().await.unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_failure_keeps_error_kind() {
        let failure = FetchFailure::from(ViewError::DataUnavailable("No alarms found".to_string()));
        assert!(matches!(failure.to_error(), ViewError::DataUnavailable(_)));

        let failure = FetchFailure::from(ViewError::Config("bad".to_string()));
        assert!(matches!(failure.to_error(), ViewError::Transport(ref msg) if msg.contains("bad")));
    }
}
