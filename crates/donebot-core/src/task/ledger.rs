//! Last-completed logical date per task key.
//!
//! A task is done for date `D` iff its entry equals `D`; older entries
//! simply stop matching once the logical date moves on.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::registry::{TaskDefinition, TaskRegistry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionLedger(BTreeMap<String, NaiveDate>);

impl CompletionLedger {
    /// Unconditional; the caller has already checked `key` against the
    /// registry.
    pub fn mark_done(&mut self, key: &str, date: NaiveDate) {
        self.0.insert(key.to_string(), date);
    }

    pub fn is_done(&self, key: &str, date: NaiveDate) -> bool {
        self.0.get(key) == Some(&date)
    }

    pub fn last_done(&self, key: &str) -> Option<NaiveDate> {
        self.0.get(key).copied()
    }

    /// Tasks not done for `date`, in registry order.
    pub fn pending<'r>(&self, registry: &'r TaskRegistry, date: NaiveDate) -> Vec<&'r TaskDefinition> {
        registry
            .tasks()
            .iter()
            .filter(|t| !self.is_done(&t.key, date))
            .collect()
    }

    /// Drop every entry recorded for `date`.
    pub fn clear_for_date(&mut self, date: NaiveDate) {
        self.0.retain(|_, done| *done != date);
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    pub fn forget(&mut self, key: &str) -> Option<NaiveDate> {
        self.0.remove(key)
    }

    /// Drop entries for keys the registry no longer knows. Returns the
    /// pruned keys.
    pub fn retain_known(&mut self, registry: &TaskRegistry) -> Vec<String> {
        let orphans: Vec<String> = self
            .0
            .keys()
            .filter(|key| !registry.contains(key))
            .cloned()
            .collect();
        for key in &orphans {
            self.0.remove(key);
        }
        orphans
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
