// src/backend.rs
use crate::alarms::{AlarmFilter, AlarmRecord};
use crate::error::{Result, ViewError};
use async_trait::async_trait;
use log::{debug, warn};
use std::path::Path;

/// Message the data source can send to the alarm backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    /// List the active alarms matching `filter`
    GetActiveAlarms { filter: AlarmFilter },
}

/// Backend answer to a [`BackendRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    /// Active alarm list; entries may be null
    ActiveAlarms(Vec<Option<AlarmRecord>>),
    /// A response of some other message type
    Other { kind: String },
    /// The backend answered without a message
    NoResponse,
}

/// Remote alarm store. Implementations report call failures as `ViewError::Transport`.
#[async_trait]
pub trait AlarmBackend: Send + Sync {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse>;
}

/// Request the active alarms matching `filter` and unwrap the alarm list.
///
/// Anything other than an active alarm list is reported as
/// [`ViewError::DataUnavailable`].
pub async fn fetch_active_alarms(
    backend: &dyn AlarmBackend,
    filter: AlarmFilter,
) -> Result<Vec<Option<AlarmRecord>>> {
    match backend.send(BackendRequest::GetActiveAlarms { filter }).await? {
        BackendResponse::ActiveAlarms(alarms) => {
            debug!("Backend returned {} active alarm entries", alarms.len());
            Ok(alarms)
        }
        BackendResponse::Other { kind } => {
            warn!("Unexpected '{}' response to active alarm request", kind);
            Err(ViewError::DataUnavailable("No alarms found".to_string()))
        }
        BackendResponse::NoResponse => {
            Err(ViewError::DataUnavailable("No alarms found".to_string()))
        }
    }
}

/// In-process backend serving a fixed list of active alarms
#[derive(Debug, Clone, Default)]
pub struct SnapshotBackend {
    alarms: Vec<Option<AlarmRecord>>,
}

impl SnapshotBackend {
    pub fn new(alarms: Vec<Option<AlarmRecord>>) -> Self {
        Self { alarms }
    }

    /// Parse a JSON array of alarm records; `null` entries are kept
    pub fn from_json(json: &str) -> Result<Self> {
        let alarms: Vec<Option<AlarmRecord>> = serde_json::from_str(json)?;
        Ok(Self::new(alarms))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Number of entries, null entries included
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}

#[async_trait]
impl AlarmBackend for SnapshotBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse> {
        match request {
            BackendRequest::GetActiveAlarms { filter } => {
                // Null entries are not filterable and pass through as-is.
                let alarms = self
                    .alarms
                    .iter()
                    .filter(|entry| entry.as_ref().map_or(true, |alarm| filter.matches(alarm)))
                    .cloned()
                    .collect();
                Ok(BackendResponse::ActiveAlarms(alarms))
            }
        }
    }
}
