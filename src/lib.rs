//! Anomaly Events - active anomaly alarms as a query data source
//!
//! Lists the alarms currently raised by the behavioral anomaly detection
//! engine (the "suggestion engine" source) and renders them as typed rows with
//! element, parameter and time range references for drill-down.
//!
//! # Feature Flags
//!
//! - `metrics`: counters for fetch cycles, emitted rows and dropped alarms
//!
//! # Examples
//!
//! ```rust,no_run
//! use anomaly_events::{AnomalyAlarmView, Config, InitArgs, SnapshotBackend};
//! use std::sync::Arc;
//!
//! # async fn run() -> anomaly_events::Result<()> {
//! anomaly_events::init()?;
//!
//! let config = Config::from_file("config.yaml")?;
//! let backend = Arc::new(SnapshotBackend::from_json_file("alarms.json")?);
//!
//! let mut view = AnomalyAlarmView::new(config.view);
//! view.initialize(InitArgs::new(backend)?);
//! view.prepare_fetch()?;
//!
//! for row in view.next_page().await?.rows {
//!     println!("{}", row.to_json());
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// CORE MODULES
// ============================================================================

/// Error type and result alias
pub mod error;

/// Active alarm records, metadata payloads and alarm filters
pub mod alarms;

/// Backend request/response contract and the snapshot backend
pub mod backend;

/// YAML configuration
pub mod config;

/// Column layout
pub mod schema;

/// Rows, row metadata and pages
pub mod page;

/// Alarm filtering and row construction
pub mod transform;

/// Query host lifecycle contract
pub mod source;

/// The anomaly alarm data source
pub mod view;

// ============================================================================
// PUBLIC RE-EXPORTS
// ============================================================================

pub use alarms::{AlarmFilter, AlarmMetadata, AlarmRecord, AnomalyMetadata, AnomalyType};
pub use backend::{AlarmBackend, BackendRequest, BackendResponse, SnapshotBackend};
pub use config::{BackendConfig, Config, ViewConfig};
pub use error::{Result, ViewError};
pub use page::{Cell, Page, Row, RowMetadata};
pub use schema::{Column, ColumnType};
pub use source::{DataSource, InitArgs};
pub use transform::TransformStats;
pub use view::{AnomalyAlarmView, Phase};

// ============================================================================
// VERSION INFORMATION
// ============================================================================

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize logging and, when enabled, the metrics descriptions.
///
/// `RUST_LOG` takes precedence over the default `anomaly_events=info` filter.
/// Calling this more than once is harmless.
pub fn init() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("anomaly_events=info");
    // Already initialized by the host or an earlier call
    let _ = env_logger::Builder::from_env(env).try_init();

    #[cfg(feature = "metrics")]
    init_metrics_registry();

    log::debug!("anomaly-events {} initialized", VERSION);
    Ok(())
}

#[cfg(feature = "metrics")]
fn init_metrics_registry() {
    use metrics::describe_counter;

    describe_counter!("anomaly_events_fetch_cycles_total", "Active alarm fetches started");
    describe_counter!("anomaly_events_fetch_failures_total", "Fetch cycles that ended in an error");
    describe_counter!("anomaly_events_rows_total", "Anomaly rows emitted");
    describe_counter!("anomaly_events_dropped_total", "Fetched entries that produced no row");
}
