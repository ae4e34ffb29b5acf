// src/transform.rs - Filter fetched alarms and turn them into rows
use crate::alarms::{AlarmMetadata, AlarmRecord};
use crate::page::{Cell, ElementRef, Page, ParamRef, Row, RowMetadata, TimeRange};
use chrono::Utc;
use log::{trace, warn};
use serde::Serialize;

/// Text used in the anomaly columns for alarms without anomaly metadata
pub const NOT_AN_ANOMALY: &str = "Not an anomaly";

/// Counters for one pass over a fetched alarm list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// Entries in the backend response, nulls included
    pub received: usize,
    /// Null entries skipped
    pub null_skipped: usize,
    /// Alarms from another source that slipped through the backend filter
    pub foreign_source: usize,
    /// Alarms without anomaly metadata
    pub not_anomaly: usize,
    /// Rows emitted
    pub rows: usize,
}

/// Build the single page for a fetched alarm list.
///
/// Entries are processed in order. Null entries, alarms whose source differs from
/// `source_id` and alarms without anomaly metadata are dropped.
pub fn build_page(alarms: &[Option<AlarmRecord>], source_id: i32) -> (Page, TransformStats) {
    let mut stats = TransformStats {
        received: alarms.len(),
        ..TransformStats::default()
    };
    let mut rows = Vec::with_capacity(alarms.len());

    for entry in alarms {
        let Some(alarm) = entry else {
            stats.null_skipped += 1;
            continue;
        };

        if alarm.source_id != source_id {
            warn!(
                "Dropping alarm {} from source {} (expected source {})",
                alarm.composite_id(),
                alarm.source_id,
                source_id
            );
            stats.foreign_source += 1;
            continue;
        }

        if alarm.anomaly().is_none() {
            trace!("Alarm {} carries no anomaly metadata", alarm.composite_id());
            stats.not_anomaly += 1;
            continue;
        }

        rows.push(build_row(alarm));
    }

    stats.rows = rows.len();
    (Page::last(rows), stats)
}

/// Render one alarm as a row with its reference metadata
pub fn build_row(alarm: &AlarmRecord) -> Row {
    let (anomaly_type, guid) = match &alarm.metadata {
        AlarmMetadata::Anomaly(anomaly) => (anomaly.anomaly_type.to_string(), anomaly.guid.to_string()),
        AlarmMetadata::None | AlarmMetadata::Other { .. } => {
            (NOT_AN_ANOMALY.to_string(), NOT_AN_ANOMALY.to_string())
        }
    };

    let cells = vec![
        Cell::Text(alarm.composite_id()),
        Cell::Text(alarm.element_name.clone()),
        Cell::Text(alarm.parameter_name.clone()),
        Cell::Text(alarm.display_value.clone()),
        Cell::Timestamp(alarm.time_of_arrival.with_timezone(&Utc)),
        Cell::Text(alarm.severity.clone()),
        Cell::Text(anomaly_type),
        Cell::Text(guid),
    ];

    Row {
        cells,
        metadata: RowMetadata {
            element: ElementRef {
                backend_instance_id: alarm.backend_instance_id,
                element_id: alarm.element_id,
            },
            parameter: ParamRef {
                backend_instance_id: alarm.backend_instance_id,
                element_id: alarm.element_id,
                parameter_id: alarm.parameter_id,
                table_row_key: alarm.table_row_key.clone(),
            },
            time_range: TimeRange {
                start: alarm.creation_time,
                end: alarm.time_of_arrival,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::{AnomalyMetadata, AnomalyType};
    use crate::schema;
    use chrono::{DateTime, TimeZone};
    use uuid::Uuid;

    const GUID: &str = "6f1c2a52-3f4e-4d7a-9d61-0b8f4b6c9a10";

    fn alarm(alarm_id: i32, metadata: AlarmMetadata) -> AlarmRecord {
        AlarmRecord {
            backend_instance_id: 1,
            alarm_id,
            element_id: 7,
            element_name: "Encoder 1".to_string(),
            parameter_id: 1001,
            parameter_name: "Bitrate".to_string(),
            table_row_key: Some("eth0".to_string()),
            display_value: "12.5 Mbps".to_string(),
            severity: "Major".to_string(),
            source_id: 63,
            time_of_arrival: DateTime::parse_from_rfc3339("2024-01-01T02:00:00+02:00").unwrap(),
            creation_time: DateTime::parse_from_rfc3339("2023-12-31T23:30:00Z").unwrap(),
            metadata,
        }
    }

    fn spike() -> AlarmMetadata {
        AlarmMetadata::Anomaly(AnomalyMetadata {
            anomaly_type: AnomalyType::Spike,
            guid: Uuid::parse_str(GUID).unwrap(),
        })
    }

    #[test]
    fn test_row_cells_follow_schema() {
        let row = build_row(&alarm(42, spike()));

        assert_eq!(row.cells.len(), schema::COLUMNS.len());
        assert_eq!(row.text(schema::ID), "1/42");
        assert_eq!(row.text(schema::ELEMENT), "Encoder 1");
        assert_eq!(row.text(schema::PARAMETER), "Bitrate");
        assert_eq!(row.text(schema::VALUE), "12.5 Mbps");
        assert_eq!(row.text(schema::SEVERITY), "Major");
        assert_eq!(row.text(schema::ANOMALY_TYPE), "Spike");
        assert_eq!(row.text(schema::GUID), GUID);
    }

    #[test]
    fn test_time_is_normalized_to_utc() {
        let row = build_row(&alarm(42, spike()));
        let time = row.cell(schema::TIME).and_then(Cell::as_timestamp).unwrap();
        assert_eq!(time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_row_metadata_snapshots_references() {
        let source = alarm(42, spike());
        let row = build_row(&source);

        assert_eq!(row.metadata.element.to_string(), "1/7");
        assert_eq!(row.metadata.parameter.to_string(), "1/7/1001/eth0");
        assert_eq!(row.metadata.time_range.start, source.creation_time);
        assert_eq!(row.metadata.time_range.end, source.time_of_arrival);
    }

    #[test]
    fn test_non_anomaly_cells_fall_back() {
        let row = build_row(&alarm(1, AlarmMetadata::Other { name: "Correlation".to_string() }));
        assert_eq!(row.text(schema::ANOMALY_TYPE), NOT_AN_ANOMALY);
        assert_eq!(row.text(schema::GUID), NOT_AN_ANOMALY);
    }

    #[test]
    fn test_page_drops_nulls_foreign_and_plain_alarms() {
        let mut foreign = alarm(3, spike());
        foreign.source_id = 12;

        let alarms = vec![
            Some(alarm(1, spike())),
            None,
            Some(alarm(2, AlarmMetadata::None)),
            Some(foreign),
            Some(alarm(4, spike())),
        ];

        let (page, stats) = build_page(&alarms, 63);

        let ids: Vec<_> = page.rows.iter().map(|r| r.text(schema::ID).to_string()).collect();
        assert_eq!(ids, ["1/1", "1/4"]);
        assert!(!page.has_next_page);
        assert_eq!(
            stats,
            TransformStats {
                received: 5,
                null_skipped: 1,
                foreign_source: 1,
                not_anomaly: 1,
                rows: 2,
            }
        );
    }

    #[test]
    fn test_empty_list_gives_empty_terminal_page() {
        let (page, stats) = build_page(&[], 63);
        assert!(page.is_empty());
        assert!(!page.has_next_page);
        assert_eq!(stats, TransformStats::default());
    }
}
