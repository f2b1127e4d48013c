//! Outbound chat texts.

use chrono::NaiveDate;

use crate::task::{CompletionLedger, TaskDefinition, TaskRegistry};

const COMMAND_HELP: &str = "Commands:\n\
/done [key] - mark a task done for tonight\n\
/status - show tonight's progress\n\
/tasks or /help - show this list\n\
/add <key> <label> - add a task\n\
/remove <key> - remove a task\n\
/label <key> <label> - rename a task\n\
/default <key> - task used by a bare /done\n\
/reset - clear tonight's completions\n\
/resetall - clear all completion history";

/// Reply to `/tasks` and `/help`.
pub fn tasks_listing(registry: &TaskRegistry) -> String {
    let mut out = String::new();
    if registry.is_empty() {
        out.push_str("No tasks yet. Add one with /add <key> <label>.");
    } else {
        out.push_str("Tasks:");
        for row in registry.list() {
            out.push_str(&format!("\n• {}: {}", row.key, row.label));
            if row.is_default {
                out.push_str(" (default)");
            }
        }
    }
    out.push_str("\n\n");
    out.push_str(COMMAND_HELP);
    out
}

/// Reply to `/status`.
pub fn status_summary(registry: &TaskRegistry, ledger: &CompletionLedger, date: NaiveDate) -> String {
    if registry.is_empty() {
        return format!("Status for {date}: no tasks defined. Add one with /add <key> <label>.");
    }

    let pending = ledger.pending(registry, date);
    let total = registry.tasks().len();
    let mut lines = vec![format!("Status for {date}:")];
    for task in registry.tasks() {
        let mark = if ledger.is_done(&task.key, date) { "✅" } else { "⬜" };
        lines.push(format!("{mark} {}: {}", task.key, task.label));
    }
    if pending.is_empty() {
        lines.push("All done!".to_string());
    } else {
        let keys: Vec<&str> = pending.iter().map(|t| t.key.as_str()).collect();
        lines.push(format!(
            "{} of {total} done. Pending: {}",
            total - pending.len(),
            keys.join(", ")
        ));
    }
    lines.join("\n")
}

/// Nightly nudge listing everything still open for `date`.
pub fn reminder(date: NaiveDate, pending: &[&TaskDefinition]) -> String {
    let mut lines = vec![format!("Reminder: not done yet for {date}:")];
    for task in pending {
        lines.push(format!("• {}: {}", task.key, task.label));
    }
    lines.push("Reply with /done <key> to stop reminders for that task.".to_string());
    lines.join("\n")
}

pub fn done_marked(key: &str, date: NaiveDate) -> String {
    format!("Marked done: {key} for {date}.")
}

pub fn task_added(task: &TaskDefinition, is_default: bool) -> String {
    let mut msg = format!("Added task: {} ({}).", task.key, task.label);
    if is_default {
        msg.push_str(" It is the default task.");
    }
    msg
}

pub fn task_removed(task: &TaskDefinition, new_default: Option<&str>) -> String {
    match new_default {
        Some(key) => format!("Removed task: {}. Default task: {key}.", task.key),
        None => format!("Removed task: {}. No tasks left.", task.key),
    }
}

pub fn task_relabeled(task: &TaskDefinition) -> String {
    format!("Updated task: {} ({}).", task.key, task.label)
}

pub fn default_set(key: &str) -> String {
    format!("Default task: {key}.")
}

pub fn reset_day(date: NaiveDate) -> String {
    format!("Cleared completions for {date}.")
}

pub fn reset_all() -> String {
    "Cleared all completion history.".to_string()
}
