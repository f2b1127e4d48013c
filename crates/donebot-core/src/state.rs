//! Per-invocation run state persisted between scheduler ticks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::{CompletionLedger, TaskRegistry};

/// `{"last_update_id": n, "done": {key: date}}`.
///
/// `last_update_id` is the highest processed update id; it only moves
/// backwards on `/resetall`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default)]
    pub last_update_id: i64,
    #[serde(default)]
    pub done: CompletionLedger,
    /// Single-task state written by the first version of the bot.
    #[serde(default, skip_serializing)]
    last_done_date: Option<NaiveDate>,
}

impl RunState {
    pub fn observe_update(&mut self, update_id: i64) {
        self.last_update_id = self.last_update_id.max(update_id);
    }

    /// Move a legacy `last_done_date` onto the registry default. Only applies
    /// when the ledger is still empty. Returns the migrated date.
    pub fn migrate_legacy(&mut self, registry: &TaskRegistry) -> Option<NaiveDate> {
        let date = self.last_done_date.take()?;
        if !self.done.is_empty() {
            return None;
        }
        let key = registry.default_key()?;
        self.done.mark_done(key, date);
        Some(date)
    }
}
