//! Summaries and queries over the action event log

use chrono::{DateTime, Utc};
use flowstate_core::{ActionEvent, ActionEventLog};
use indexmap::IndexMap;

/// Auditor for querying and analyzing recorded actions
pub struct Auditor<'a> {
    log: &'a ActionEventLog,
}

impl<'a> Auditor<'a> {
    /// Create a new auditor for a log
    pub fn new(log: &'a ActionEventLog) -> Self {
        Self { log }
    }

    /// Generate a report of everything recorded
    pub fn generate_report(&self) -> AuditReport {
        let stats = self.log.stats();
        let mut by_action: IndexMap<String, ActionCounts> = IndexMap::new();

        for event in self.log.events() {
            let counts = by_action.entry(event.name.clone()).or_default();
            counts.total += 1;
            if event.is_active {
                counts.active += 1;
            }
        }

        AuditReport {
            total_events: stats.total_events,
            active_events: stats.active_events,
            inactive_events: stats.inactive_events,
            first_time: stats.first_time,
            last_time: stats.last_time,
            by_action,
        }
    }

    /// Events matching every criterion set on `query`
    pub fn query(&self, query: &AuditQuery) -> Vec<&'a ActionEvent> {
        self.log
            .events()
            .iter()
            .filter(|event| query.matches(event))
            .collect()
    }

    /// Count events recorded under an action name
    pub fn count_action(&self, name: &str) -> usize {
        self.log.events().iter().filter(|e| e.name == name).count()
    }

    /// Action names in order of first appearance
    pub fn unique_actions(&self) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = Vec::new();
        for event in self.log.events() {
            if !names.contains(&event.name.as_str()) {
                names.push(event.name.as_str());
            }
        }
        names
    }
}

/// Per-action event counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounts {
    pub total: usize,
    pub active: usize,
}

/// Summary of the event log
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub total_events: usize,
    pub active_events: usize,
    pub inactive_events: usize,
    pub first_time: Option<DateTime<Utc>>,
    pub last_time: Option<DateTime<Utc>>,
    /// Counts keyed by action name, in order of first appearance
    pub by_action: IndexMap<String, ActionCounts>,
}

impl std::fmt::Display for AuditReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Audit Report ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        writeln!(f, "Active: {}", self.active_events)?;
        writeln!(f, "Inactive: {}", self.inactive_events)?;

        if let (Some(first), Some(last)) = (self.first_time, self.last_time) {
            writeln!(f, "Time range: {} - {}", first.to_rfc3339(), last.to_rfc3339())?;
        }

        if !self.by_action.is_empty() {
            writeln!(f, "\nEvents by action:")?;
            for (name, counts) in &self.by_action {
                writeln!(f, "  {}: {} ({} active)", name, counts.total, counts.active)?;
            }
        }

        Ok(())
    }
}

/// Query criteria for filtering events
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Filter by action name
    pub name: Option<String>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    /// Lowest sequence number (inclusive)
    pub from_sequence: Option<usize>,
    /// Highest sequence number (inclusive)
    pub to_sequence: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn in_range(mut self, from: usize, to: usize) -> Self {
        self.from_sequence = Some(from);
        self.to_sequence = Some(to);
        self
    }

    fn matches(&self, event: &ActionEvent) -> bool {
        if let Some(ref name) = self.name {
            if &event.name != name {
                return false;
            }
        }
        if let Some(is_active) = self.is_active {
            if event.is_active != is_active {
                return false;
            }
        }
        if let Some(from) = self.from_sequence {
            if event.sequence_number < from {
                return false;
            }
        }
        if let Some(to) = self.to_sequence {
            if event.sequence_number > to {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn create_test_log() -> ActionEventLog {
        let mut log = ActionEventLog::new();
        for (name, payload) in [("increment", "1"), ("rename", "\"a\""), ("increment", "2")] {
            log.add_event(ActionEvent::new(name, payload, Rc::new(|| {})));
        }
        log.set_active(2, false).unwrap();
        log
    }

    #[test]
    fn test_generate_report() {
        let log = create_test_log();
        let report = Auditor::new(&log).generate_report();

        assert_eq!(report.total_events, 3);
        assert_eq!(report.inactive_events, 1);
        assert_eq!(
            report.by_action.get("increment"),
            Some(&ActionCounts {
                total: 2,
                active: 1
            })
        );
        assert_eq!(report.by_action.keys().next().map(String::as_str), Some("increment"));
    }

    #[test]
    fn test_report_display() {
        let log = create_test_log();
        let text = Auditor::new(&log).generate_report().to_string();

        assert!(text.contains("Audit Report"));
        assert!(text.contains("rename: 1 (1 active)"));
    }

    #[test]
    fn test_query() {
        let log = create_test_log();
        let auditor = Auditor::new(&log);

        let active_increments = auditor.query(&AuditQuery::new().with_name("increment").active(true));
        assert_eq!(active_increments.len(), 1);
        assert_eq!(active_increments[0].sequence_number, 0);

        let tail = auditor.query(&AuditQuery::new().in_range(1, 2));
        assert_eq!(tail.len(), 2);
    }

    #[test]
    fn test_counts_and_unique_actions() {
        let log = create_test_log();
        let auditor = Auditor::new(&log);

        assert_eq!(auditor.count_action("increment"), 2);
        assert_eq!(auditor.count_action("missing"), 0);
        assert_eq!(auditor.unique_actions(), vec!["increment", "rename"]);
    }
}
