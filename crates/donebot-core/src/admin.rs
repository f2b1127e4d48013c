//! Local registry administration for the CLI.
//!
//! Uses the same registry operations and reply texts as the chat commands,
//! but reports failures as [`TaskError`](crate::error::TaskError) instead of
//! replies.

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::messages;
use crate::orchestrator::{load_blobs, RunSettings};
use crate::state::RunState;
use crate::storage::{BlobStore, StateStore};
use crate::task::{TaskDefinition, TaskRegistry};

pub struct TaskAdmin<'s, S: BlobStore + ?Sized> {
    blobs: StateStore<'s, S>,
    settings: RunSettings,
}

impl<'s, S: BlobStore + ?Sized> TaskAdmin<'s, S> {
    pub fn new(store: &'s S, settings: RunSettings) -> Self {
        Self {
            blobs: StateStore::new(store, &settings.state_blob, &settings.tasks_blob),
            settings,
        }
    }

    fn load(&self) -> Result<(RunState, TaskRegistry)> {
        load_blobs(&self.blobs, &self.settings)
    }

    pub fn registry(&self) -> Result<TaskRegistry> {
        Ok(self.load()?.1)
    }

    pub fn add(&self, key: &str, label: &str) -> Result<String> {
        let (mut state, mut registry) = self.load()?;
        let task: TaskDefinition = registry.add(key, label)?.clone();
        state.done.forget(&task.key);
        self.blobs.save_registry(&registry)?;
        self.blobs.save_state(&state)?;
        Ok(messages::task_added(
            &task,
            registry.default_key() == Some(task.key.as_str()),
        ))
    }

    pub fn remove(&self, key: &str) -> Result<String> {
        let (mut state, mut registry) = self.load()?;
        let removed = registry.remove(key)?;
        state.done.forget(&removed.key);
        self.blobs.save_registry(&registry)?;
        self.blobs.save_state(&state)?;
        Ok(messages::task_removed(&removed, registry.default_key()))
    }

    pub fn set_label(&self, key: &str, label: &str) -> Result<String> {
        let (_, mut registry) = self.load()?;
        let reply = messages::task_relabeled(registry.set_label(key, label)?);
        self.blobs.save_registry(&registry)?;
        Ok(reply)
    }

    pub fn set_default(&self, key: &str) -> Result<String> {
        let (_, mut registry) = self.load()?;
        registry.set_default(key)?;
        self.blobs.save_registry(&registry)?;
        Ok(messages::default_set(registry.default_key().unwrap_or_default()))
    }

    /// Status summary for the logical date of `now`.
    pub fn status(&self, now: DateTime<FixedOffset>) -> Result<String> {
        let (state, registry) = self.load()?;
        let date = self.settings.policy.target_date(&now);
        Ok(messages::status_summary(&registry, &state.done, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, TaskError};
    use crate::storage::{Config, MemoryBlobStore};
    use chrono::NaiveDate;

    fn settings() -> RunSettings {
        RunSettings::local(&Config::default()).unwrap()
    }

    #[test]
    fn first_use_starts_from_seed_task() {
        let store = MemoryBlobStore::new();
        let admin = TaskAdmin::new(&store, settings());
        let registry = admin.registry().unwrap();
        assert_eq!(registry.default_key(), Some("task"));
        assert_eq!(registry.tasks()[0].label, "Daily task");
    }

    #[test]
    fn add_and_remove_persist_both_blobs() {
        let store = MemoryBlobStore::new();
        let admin = TaskAdmin::new(&store, settings());
        assert_eq!(admin.add("gym", "Gym").unwrap(), "Added task: gym (Gym).");
        store.insert("state.json", r#"{"last_update_id": 4, "done": {"gym": "2024-01-10"}}"#);

        assert_eq!(
            admin.remove("gym").unwrap(),
            "Removed task: gym. Default task: task."
        );
        let state = store.get("state.json").unwrap();
        assert!(!state.contains("gym"));
        assert!(state.contains("\"last_update_id\": 4"));
        assert!(!store.get("tasks.json").unwrap().contains("gym"));
    }

    #[test]
    fn registry_errors_surface_as_task_errors() {
        let store = MemoryBlobStore::new();
        let admin = TaskAdmin::new(&store, settings());
        assert!(matches!(
            admin.set_default("nope"),
            Err(CoreError::Task(TaskError::UnknownKey(_)))
        ));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn status_uses_logical_date() {
        let store = MemoryBlobStore::new();
        store.insert("state.json", r#"{"last_update_id": 1, "done": {"task": "2024-01-10"}}"#);
        let admin = TaskAdmin::new(&store, settings());
        let now = DateTime::parse_from_rfc3339("2024-01-11T00:30:00-06:00").unwrap();
        let text = admin.status(now).unwrap();
        assert!(text.starts_with(&format!("Status for {}:", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())));
        assert!(text.ends_with("All done!"));
    }
}
