//! Command interpreter.
//!
//! A run is reduced in three phases:
//!
//! 1. [`Interpreter::fold`] each update in arrival order: advance the
//!    watermark, drop foreign or empty updates, apply per-message mutations
//!    and collect their replies. `/reset`, `/resetall`, `/tasks` and
//!    `/status` only record a request; `/reset` also records the logical
//!    date of its own message, as `/done` does.
//! 2. [`Interpreter::finish`] applies the strongest reset requested, once
//!    per recorded date.
//! 3. It then renders the single informational reply (tasks listing or
//!    status) against the post-reset ledger and a freshly read logical date.
//!
//! Any reply at all marks the run as responded, which suppresses the
//! reminder for that run.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::command::{self, Command};
use crate::messages;
use crate::state::RunState;
use crate::task::TaskRegistry;
use crate::transport::Update;
use crate::window::{CivilZone, Clock, WindowPolicy};

/// Batch-level reset request; `All` subsumes `Day`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResetScope {
    #[default]
    None,
    Day,
    All,
}

/// Informational reply requested during the batch. The last request wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoRequest {
    Tasks,
    Status,
}

/// Phase-one accumulator.
#[derive(Debug, Default)]
pub struct Batch {
    replies: Vec<String>,
    reset: ResetScope,
    /// Logical dates named by `/reset` messages.
    reset_dates: BTreeSet<NaiveDate>,
    info: Option<InfoRequest>,
    registry_changed: bool,
    handled: usize,
    ignored: usize,
}

/// Result of a fully reduced batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Replies in send order: per-command, then reset, then info.
    pub replies: Vec<String>,
    pub registry_changed: bool,
    pub reset: ResetScope,
    /// Logical date used for the reset and the info reply.
    pub date: NaiveDate,
    pub handled: usize,
    pub ignored: usize,
}

impl Outcome {
    /// True if any command produced a reply; the reminder is skipped.
    pub fn responded(&self) -> bool {
        !self.replies.is_empty()
    }
}

/// Interprets commands from a single chat.
#[derive(Debug, Clone)]
pub struct Interpreter {
    chat_id: String,
    policy: WindowPolicy,
    zone: CivilZone,
}

impl Interpreter {
    pub fn new(chat_id: impl Into<String>, policy: WindowPolicy, zone: CivilZone) -> Self {
        Self {
            chat_id: chat_id.into(),
            policy,
            zone,
        }
    }

    /// Run all three phases over `updates`.
    pub fn interpret(
        &self,
        updates: &[Update],
        state: &mut RunState,
        registry: &mut TaskRegistry,
        clock: &dyn Clock,
    ) -> Outcome {
        let started = clock.now();
        let mut batch = Batch::default();
        for update in updates {
            self.fold(&mut batch, state, registry, update, started);
        }
        // Processing may have crossed a window boundary; read the clock again.
        self.finish(batch, state, registry, clock.now())
    }

    /// Phase one for a single update. `now` is used when the message carries
    /// no timestamp of its own.
    pub fn fold(
        &self,
        batch: &mut Batch,
        state: &mut RunState,
        registry: &mut TaskRegistry,
        update: &Update,
        now: DateTime<FixedOffset>,
    ) {
        state.observe_update(update.update_id);

        let Some(message) = &update.message else {
            batch.ignored += 1;
            return;
        };
        if message.chat_id != self.chat_id {
            tracing::warn!(update_id = update.update_id, chat_id = %message.chat_id, "ignoring update from foreign chat");
            batch.ignored += 1;
            return;
        }
        let Some(parsed) = message.text.as_deref().and_then(command::parse) else {
            batch.ignored += 1;
            return;
        };

        batch.handled += 1;
        let cmd = match parsed {
            Ok(cmd) => cmd,
            Err(usage) => {
                tracing::debug!(update_id = update.update_id, %usage, "command missing arguments");
                batch.replies.push(usage.to_string());
                return;
            }
        };
        tracing::debug!(update_id = update.update_id, command = cmd.name(), "command");

        let sent_at = message.sent_at(&self.zone).unwrap_or(now);
        match cmd {
            Command::Tasks | Command::Help => batch.info = Some(InfoRequest::Tasks),
            Command::Status => batch.info = Some(InfoRequest::Status),
            Command::Reset => {
                batch.reset = batch.reset.max(ResetScope::Day);
                batch.reset_dates.insert(self.policy.target_date(&sent_at));
            }
            Command::ResetAll => batch.reset = ResetScope::All,
            Command::Done { key } => {
                let reply = match registry.resolve(key.as_deref()) {
                    Ok(task) => {
                        let date = self.policy.target_date(&sent_at);
                        state.done.mark_done(&task.key, date);
                        tracing::info!(key = %task.key, %date, "marked done");
                        messages::done_marked(&task.key, date)
                    }
                    Err(e) => e.to_string(),
                };
                batch.replies.push(reply);
            }
            Command::Add { key, label } => {
                let reply = match registry.add(&key, &label).cloned() {
                    Ok(task) => {
                        batch.registry_changed = true;
                        // A key re-added after removal starts clean.
                        state.done.forget(&task.key);
                        tracing::info!(key = %task.key, "task added");
                        messages::task_added(&task, registry.default_key() == Some(task.key.as_str()))
                    }
                    Err(e) => e.to_string(),
                };
                batch.replies.push(reply);
            }
            Command::Remove { key } => {
                let reply = match registry.remove(&key) {
                    Ok(removed) => {
                        batch.registry_changed = true;
                        state.done.forget(&removed.key);
                        tracing::info!(key = %removed.key, "task removed");
                        messages::task_removed(&removed, registry.default_key())
                    }
                    Err(e) => e.to_string(),
                };
                batch.replies.push(reply);
            }
            Command::Label { key, label } => {
                let reply = match registry.set_label(&key, &label) {
                    Ok(task) => {
                        batch.registry_changed = true;
                        tracing::info!(key = %task.key, "task relabeled");
                        messages::task_relabeled(task)
                    }
                    Err(e) => e.to_string(),
                };
                batch.replies.push(reply);
            }
            Command::Default { key } => {
                let reply = match registry.set_default(&key) {
                    Ok(()) => {
                        batch.registry_changed = true;
                        let key = registry.default_key().unwrap_or_default();
                        tracing::info!(key, "default task changed");
                        messages::default_set(key)
                    }
                    Err(e) => e.to_string(),
                };
                batch.replies.push(reply);
            }
        }
    }

    /// Phases two and three.
    pub fn finish(
        &self,
        mut batch: Batch,
        state: &mut RunState,
        registry: &TaskRegistry,
        now: DateTime<FixedOffset>,
    ) -> Outcome {
        let date = self.policy.target_date(&now);

        match batch.reset {
            ResetScope::None => {}
            ResetScope::Day => {
                for &day in &batch.reset_dates {
                    state.done.clear_for_date(day);
                    tracing::info!(date = %day, "completions reset for date");
                    batch.replies.push(messages::reset_day(day));
                }
            }
            ResetScope::All => {
                state.done.clear_all();
                state.last_update_id = 0;
                tracing::info!("all completions reset; update offset rewound to 0");
                batch.replies.push(messages::reset_all());
            }
        }

        match batch.info {
            Some(InfoRequest::Tasks) => batch.replies.push(messages::tasks_listing(registry)),
            Some(InfoRequest::Status) => {
                batch
                    .replies
                    .push(messages::status_summary(registry, &state.done, date))
            }
            None => {}
        }

        Outcome {
            replies: batch.replies,
            registry_changed: batch.registry_changed,
            reset: batch.reset,
            date,
            handled: batch.handled,
            ignored: batch.ignored,
        }
    }
}
