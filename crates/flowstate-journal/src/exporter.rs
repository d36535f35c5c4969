//! Export the action event log to various formats

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use flowstate_core::{ActionEvent, ActionEventLog};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// RON format (Rust Object Notation)
    Ron,
    /// JSON format (requires serde_json feature)
    Json,
    /// CSV format, one row per event
    Csv,
    /// Human-readable text format
    Text,
}

/// Exporter for event log data
pub struct Exporter<'a> {
    log: &'a ActionEventLog,
}

impl<'a> Exporter<'a> {
    /// Create a new exporter
    pub fn new(log: &'a ActionEventLog) -> Self {
        Self { log }
    }

    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Ron => self.to_ron(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Csv => Ok(self.to_csv()),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Export to RON format
    pub fn to_ron(&self) -> Result<String> {
        let export = ExportData::from_log(self.log);
        ron::ser::to_string_pretty(&export, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Export to JSON format
    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String> {
        let export = ExportData::from_log(self.log);
        serde_json::to_string_pretty(&export).map_err(|e| Error::Serialization(e.to_string()))
    }

    #[cfg(not(feature = "serde_json"))]
    pub fn to_json(&self) -> Result<String> {
        Err(Error::ExportError(
            "JSON export requires the 'serde_json' feature".to_string(),
        ))
    }

    /// Export to CSV format
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("sequence_number,name,is_active,first_time,last_time,payload\n");

        for event in self.log.events() {
            let payload_escaped = event.payload.replace('"', "\"\"");
            output.push_str(&format!(
                "{},{},{},{},{},\"{}\"\n",
                event.sequence_number,
                event.name,
                event.is_active,
                event.first_time.to_rfc3339(),
                event.last_time.to_rfc3339(),
                payload_escaped
            ));
        }

        output
    }

    /// Export to human-readable text format
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let stats = self.log.stats();

        output.push_str("=== Action Event Log ===\n\n");
        output.push_str(&format!("Total events: {}\n", stats.total_events));
        output.push_str(&format!("Active: {}\n", stats.active_events));
        output.push_str(&format!("Inactive: {}\n", stats.inactive_events));

        output.push_str("\n=== Events ===\n\n");
        for event in self.log.events() {
            let marker = if event.is_active { ' ' } else { 'x' };
            output.push_str(&format!(
                "[{}] #{} {} {}\n",
                marker, event.sequence_number, event.name, event.payload
            ));
        }

        output
    }

    /// Export only events in a sequence range (inclusive)
    pub fn export_range(&self, start: usize, end: usize, format: ExportFormat) -> Result<String> {
        let filtered = FilteredExport {
            events: self
                .log
                .events()
                .iter()
                .filter(|e| e.sequence_number >= start && e.sequence_number <= end)
                .cloned()
                .collect(),
        };

        match format {
            ExportFormat::Ron => {
                ron::ser::to_string_pretty(&filtered, ron::ser::PrettyConfig::default())
                    .map_err(|e| Error::Serialization(e.to_string()))
            }
            #[cfg(feature = "serde_json")]
            ExportFormat::Json => serde_json::to_string_pretty(&filtered)
                .map_err(|e| Error::Serialization(e.to_string())),
            #[cfg(not(feature = "serde_json"))]
            ExportFormat::Json => Err(Error::ExportError(
                "JSON export requires the 'serde_json' feature".to_string(),
            )),
            _ => Err(Error::ExportError(
                "Range export only supports RON and JSON".to_string(),
            )),
        }
    }
}

/// Data structure for full log export
#[derive(Debug, Clone, Serialize)]
struct ExportData {
    version: u32,
    stats: ExportStats,
    events: Vec<ActionEvent>,
}

impl ExportData {
    fn from_log(log: &ActionEventLog) -> Self {
        let stats = log.stats();
        Self {
            version: 1,
            stats: ExportStats {
                total_events: stats.total_events,
                active_events: stats.active_events,
                inactive_events: stats.inactive_events,
                first_time: stats.first_time,
                last_time: stats.last_time,
            },
            events: log.events().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ExportStats {
    total_events: usize,
    active_events: usize,
    inactive_events: usize,
    first_time: Option<DateTime<Utc>>,
    last_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
struct FilteredExport {
    events: Vec<ActionEvent>,
}
