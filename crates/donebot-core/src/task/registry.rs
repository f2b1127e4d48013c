//! Ordered task definitions plus the default task used by a bare `/done`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Longest label kept, in characters.
pub const MAX_LABEL_CHARS: usize = 80;

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9_-]{1,32}$").expect("task key pattern is valid")
});

/// Trim and lowercase a raw key.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Trim and truncate to [`MAX_LABEL_CHARS`] characters; case is kept.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().chars().take(MAX_LABEL_CHARS).collect()
}

/// Normalized key, or [`TaskError::InvalidKey`].
pub fn validated_key(raw: &str) -> Result<String, TaskError> {
    let key = normalize_key(raw);
    if KEY_PATTERN.is_match(&key) {
        Ok(key)
    } else {
        Err(TaskError::InvalidKey(key))
    }
}

/// Normalized label, or [`TaskError::EmptyLabel`].
pub fn validated_label(raw: &str) -> Result<String, TaskError> {
    let label = normalize_label(raw);
    if label.is_empty() {
        Err(TaskError::EmptyLabel)
    } else {
        Ok(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub key: String,
    pub label: String,
}

/// One row of [`TaskRegistry::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskListing<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub is_default: bool,
}

/// Task definitions in insertion order.
///
/// `default`, when set, always names a task in `tasks`, and keys are unique.
/// Serialized as `{"default": ..., "tasks": [{"key", "label"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRegistry {
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    tasks: Vec<TaskDefinition>,
}

impl TaskRegistry {
    /// Registry holding one task, which is also the default.
    pub fn seeded(key: &str, label: &str) -> Self {
        let mut registry = Self::default();
        if registry.add(key, label).is_err() {
            tracing::warn!(key, "seed task is invalid; starting with an empty registry");
        }
        registry
    }

    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    pub fn default_key(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.key == key)
    }

    /// Append a task; the first task added becomes the default.
    pub fn add(&mut self, key: &str, label: &str) -> Result<&TaskDefinition, TaskError> {
        let key = validated_key(key)?;
        let label = validated_label(label)?;
        if self.contains(&key) {
            return Err(TaskError::DuplicateKey(key));
        }
        if self.default.is_none() {
            self.default = Some(key.clone());
        }
        self.tasks.push(TaskDefinition { key, label });
        let last = self.tasks.len() - 1;
        Ok(&self.tasks[last])
    }

    /// Remove a task and return it so the caller can prune the ledger.
    pub fn remove(&mut self, key: &str) -> Result<TaskDefinition, TaskError> {
        let key = normalize_key(key);
        let idx = self
            .position(&key)
            .ok_or_else(|| TaskError::UnknownKey(key.clone()))?;
        let removed = self.tasks.remove(idx);
        if self.default.as_deref() == Some(removed.key.as_str()) {
            self.default = self.tasks.first().map(|t| t.key.clone());
        }
        Ok(removed)
    }

    pub fn set_default(&mut self, key: &str) -> Result<(), TaskError> {
        let key = normalize_key(key);
        if !self.contains(&key) {
            return Err(TaskError::UnknownKey(key));
        }
        self.default = Some(key);
        Ok(())
    }

    /// Relabel in place; position is unchanged.
    pub fn set_label(&mut self, key: &str, label: &str) -> Result<&TaskDefinition, TaskError> {
        let key = normalize_key(key);
        let idx = self
            .position(&key)
            .ok_or_else(|| TaskError::UnknownKey(key.clone()))?;
        self.tasks[idx].label = validated_label(label)?;
        Ok(&self.tasks[idx])
    }

    /// Resolve the target of `/done [key]`.
    pub fn resolve(&self, key: Option<&str>) -> Result<&TaskDefinition, TaskError> {
        match key {
            Some(raw) => {
                let key = normalize_key(raw);
                self.get(&key).ok_or(TaskError::UnknownKey(key))
            }
            None => {
                let key = self.default.as_deref().ok_or(TaskError::NoDefaultTask)?;
                self.get(key).ok_or(TaskError::NoDefaultTask)
            }
        }
    }

    pub fn list(&self) -> Vec<TaskListing<'_>> {
        self.tasks
            .iter()
            .map(|t| TaskListing {
                key: &t.key,
                label: &t.label,
                is_default: self.default.as_deref() == Some(t.key.as_str()),
            })
            .collect()
    }

    /// Restore the invariants on a registry read from disk: duplicate keys
    /// are dropped (first wins), and a dangling default moves to the first
    /// task. Returns `true` if anything changed.
    pub fn repair(&mut self) -> bool {
        let before = self.tasks.len();
        let mut seen = HashSet::new();
        self.tasks.retain(|t| seen.insert(t.key.clone()));
        let mut changed = self.tasks.len() != before;

        let default_valid = self
            .default
            .as_deref()
            .is_some_and(|key| self.tasks.iter().any(|t| t.key == key));
        if !default_valid {
            let replacement = self.tasks.first().map(|t| t.key.clone());
            changed |= replacement != self.default;
            self.default = replacement;
        }
        changed
    }
}
