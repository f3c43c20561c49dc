//! # Health Result Cache
//!
//! Last known non-Ok result per check identity. An identity is present if
//! and only if its most recent evaluation was not Ok.

use dashmap::DashMap;

use super::check::CheckResult;

#[derive(Debug, Default)]
pub struct HealthResultCache {
    results: DashMap<String, CheckResult>,
}

impl HealthResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &str) -> Option<CheckResult> {
        self.results.get(source).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, source: &str) -> bool {
        self.results.contains_key(source)
    }

    /// Insert or overwrite; returns the previous entry
    pub fn set(&self, source: impl Into<String>, result: CheckResult) -> Option<CheckResult> {
        self.results.insert(source.into(), result)
    }

    pub fn remove(&self, source: &str) -> Option<CheckResult> {
        self.results.remove(source).map(|(_, result)| result)
    }

    /// Snapshot of every cached result, ordered by source
    pub fn all_current(&self) -> Vec<CheckResult> {
        let mut results: Vec<CheckResult> = self
            .results
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        results.sort_by(|a, b| a.source.cmp(&b.source));
        results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
