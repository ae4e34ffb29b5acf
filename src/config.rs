// src/config.rs - Data source and backend configuration

use crate::error::{Result, ViewError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// MAIN CONFIGURATION
// ============================================================================

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data source settings
    #[serde(default)]
    pub view: ViewConfig,

    /// Where alarms are read from when running standalone
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Config {
    /// Load and validate a YAML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.view.validate()?;
        if let Some(snapshot) = &self.backend.snapshot {
            if !snapshot.exists() {
                return Err(ViewError::Config(format!(
                    "Alarm snapshot '{}' does not exist",
                    snapshot.display()
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// VIEW CONFIGURATION
// ============================================================================

/// Settings of the anomaly alarm view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Source id of the suggestion engine; differs between deployments
    #[serde(default = "default_source_id")]
    pub source_id: i32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source_id < 0 {
            return Err(ViewError::Config(format!(
                "Invalid source id {} (must not be negative)",
                self.source_id
            )));
        }
        Ok(())
    }
}

// ============================================================================
// BACKEND CONFIGURATION
// ============================================================================

/// Standalone backend settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// JSON file holding an active alarm list
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

// ============================================================================
// DEFAULT VALUE FUNCTIONS
// ============================================================================

fn default_source_id() -> i32 { 63 }
