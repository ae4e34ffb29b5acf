// File: src/alarms.rs
// Active alarm records as delivered by the monitoring backend
//
// This module holds the read-only alarm model, the metadata payload decoded into
// an explicit sum type, and the filter sent along with active alarm requests.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// SECTION 1: ALARM RECORD
// ==========================================

/// One active alarm instance held by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRecord {
    /// Backend instance (agent) that owns the alarm
    pub backend_instance_id: i32,

    /// Alarm identifier, unique per backend instance
    pub alarm_id: i32,

    /// Element the alarm was raised on
    pub element_id: i32,

    /// Element display name
    pub element_name: String,

    /// Parameter the alarm was raised on
    pub parameter_id: i32,

    /// Parameter display name
    pub parameter_name: String,

    /// Table row primary key, present for alarms on table parameters
    #[serde(default)]
    pub table_row_key: Option<String>,

    /// Value shown to operators
    #[serde(default)]
    pub display_value: String,

    /// Severity label as reported by the backend
    pub severity: String,

    /// Subsystem that raised the alarm
    pub source_id: i32,

    /// Time the latest alarm update arrived
    pub time_of_arrival: DateTime<FixedOffset>,

    /// Time the alarm tree was created
    pub creation_time: DateTime<FixedOffset>,

    /// Source specific payload
    #[serde(default)]
    pub metadata: AlarmMetadata,
}

impl AlarmRecord {
    /// Composite `"{backend_instance_id}/{alarm_id}"` identifier
    pub fn composite_id(&self) -> String {
        format!("{}/{}", self.backend_instance_id, self.alarm_id)
    }

    /// Anomaly payload, if this alarm was raised by anomaly detection
    pub fn anomaly(&self) -> Option<&AnomalyMetadata> {
        match &self.metadata {
            AlarmMetadata::Anomaly(anomaly) => Some(anomaly),
            AlarmMetadata::None | AlarmMetadata::Other { .. } => None,
        }
    }
}

// ==========================================
// SECTION 2: METADATA PAYLOAD
// ==========================================

/// Alarm metadata, decoded at the backend boundary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlarmMetadata {
    /// No payload attached
    #[default]
    None,

    /// Raised by behavioral anomaly detection
    Anomaly(AnomalyMetadata),

    /// Any payload this crate does not interpret
    Other {
        /// Payload kind reported by the backend
        name: String,
    },
}

/// Payload carried by alarms from the anomaly detection engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyMetadata {
    /// Classifier of the detected change
    pub anomaly_type: AnomalyType,

    /// Correlation identifier shared by all alarms of one anomaly event
    pub guid: Uuid,
}

/// Kinds of behavioral change the detection engine reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyType {
    /// Sudden persistent jump in level
    LevelShift,

    /// Signal stopped changing
    Flatline,

    /// Change in the slope of the trend
    TrendChange,

    /// Change in noise level
    VarianceChange,

    /// Short-lived outlier
    Spike,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyType::LevelShift => "LevelShift",
            AnomalyType::Flatline => "Flatline",
            AnomalyType::TrendChange => "TrendChange",
            AnomalyType::VarianceChange => "VarianceChange",
            AnomalyType::Spike => "Spike",
        };
        f.write_str(name)
    }
}

// ==========================================
// SECTION 3: ALARM FILTER
// ==========================================

/// Integer field an alarm filter item can compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmFilterField {
    SourceId,
    BackendInstanceId,
    ElementId,
}

/// Comparison applied between the field and the item values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareType {
    /// Field equals one of the values
    Equality,
    /// Field equals none of the values
    Inequality,
}

/// Single filter condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmFilterItem {
    pub field: AlarmFilterField,
    pub compare: CompareType,
    pub values: Vec<i32>,
}

impl AlarmFilterItem {
    /// Evaluate this condition against one alarm
    pub fn matches(&self, alarm: &AlarmRecord) -> bool {
        let actual = match self.field {
            AlarmFilterField::SourceId => alarm.source_id,
            AlarmFilterField::BackendInstanceId => alarm.backend_instance_id,
            AlarmFilterField::ElementId => alarm.element_id,
        };
        let listed = self.values.contains(&actual);
        match self.compare {
            CompareType::Equality => listed,
            CompareType::Inequality => !listed,
        }
    }
}

/// Conjunction of filter items; an empty filter matches every alarm
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmFilter {
    pub items: Vec<AlarmFilterItem>,
}

impl AlarmFilter {
    /// Filter selecting the alarms raised by one source
    pub fn source_equals(source_id: i32) -> Self {
        Self {
            items: vec![AlarmFilterItem {
                field: AlarmFilterField::SourceId,
                compare: CompareType::Equality,
                values: vec![source_id],
            }],
        }
    }

    pub fn matches(&self, alarm: &AlarmRecord) -> bool {
        self.items.iter().all(|item| item.matches(alarm))
    }
}

// ==========================================
// SECTION 4: TESTS
// ==========================================
