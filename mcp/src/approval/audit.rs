//! Audit log for MCP approval decisions.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Source of an approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    Policy,
    UserResponse,
    Timeout,
}

/// Result of an approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionResult {
    Approved,
    Denied,
    Pending,
}

impl DecisionResult {
    pub fn is_approved(&self) -> bool {
        matches!(self, DecisionResult::Approved)
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, DecisionResult::Pending)
    }
}

/// A single audit log entry: one decision about one tool call in one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub response_id: String,
    pub server_id: String,
    pub tool_name: String,
    pub result: DecisionResult,
    pub source: DecisionSource,
}

impl AuditEntry {
    pub fn new(
        response_id: String,
        server_id: String,
        tool_name: String,
        result: DecisionResult,
        source: DecisionSource,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            response_id,
            server_id,
            tool_name,
            result,
            source,
        }
    }
}

/// Thread-safe, bounded ring buffer of recent approval decisions.
#[derive(Debug)]
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditEntry>>,
    max_entries: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries)),
            max_entries,
        }
    }

    pub fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap();
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn for_response(&self, response_id: &str) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap();
        entries
            .iter()
            .filter(|e| e.response_id == response_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_returns_most_recent_first() {
        let log = AuditLog::new();
        log.record(AuditEntry::new(
            "resp_1".into(),
            "srv1".into(),
            "get_weather".into(),
            DecisionResult::Approved,
            DecisionSource::Policy,
        ));
        log.record(AuditEntry::new(
            "resp_1".into(),
            "srv1".into(),
            "delete_forecast".into(),
            DecisionResult::Denied,
            DecisionSource::UserResponse,
        ));

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].tool_name, "delete_forecast");
    }

    #[test]
    fn evicts_oldest_entry_past_capacity() {
        let log = AuditLog::with_capacity(2);
        for i in 0..5 {
            log.record(AuditEntry::new(
                "resp_1".into(),
                "srv1".into(),
                format!("tool-{i}"),
                DecisionResult::Approved,
                DecisionSource::Policy,
            ));
        }
        assert_eq!(log.len(), 2);
        let recent = log.recent(10);
        assert_eq!(recent[0].tool_name, "tool-4");
        assert_eq!(recent[1].tool_name, "tool-3");
    }

    #[test]
    fn filters_by_response_id() {
        let log = AuditLog::new();
        log.record(AuditEntry::new(
            "resp_1".into(),
            "srv1".into(),
            "a".into(),
            DecisionResult::Approved,
            DecisionSource::Policy,
        ));
        log.record(AuditEntry::new(
            "resp_2".into(),
            "srv1".into(),
            "b".into(),
            DecisionResult::Approved,
            DecisionSource::Policy,
        ));
        assert_eq!(log.for_response("resp_1").len(), 1);
    }
}
