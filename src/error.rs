use thiserror::Error;

/// Error type shared by the data source, the backend adapters and configuration loading.
#[derive(Error, Debug)]
pub enum ViewError {
    /// The backend answered with nothing, or with a response that is not an
    /// active alarm list
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The backend call itself failed
    #[error("Transport failure: {0}")]
    Transport(String),

    /// A fetch was requested before the data source received its backend handle
    #[error("Data source not initialized: {0}")]
    NotInitialized(String),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O related failure
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while parsing YAML configuration files
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error while parsing alarm snapshots
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViewError {
    /// True for the two errors a page request can surface from a fetch cycle.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, ViewError::DataUnavailable(_) | ViewError::Transport(_))
    }
}

/// Convenient alias over [`Result`] using [`ViewError`]
pub type Result<T> = std::result::Result<T, ViewError>;
