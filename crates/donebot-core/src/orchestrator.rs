//! One scheduler tick: load, fetch, interpret, persist, reply or remind.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{ConfigError, Result};
use crate::interpreter::{Interpreter, ResetScope};
use crate::messages;
use crate::state::RunState;
use crate::storage::{BlobStore, Config, StateStore};
use crate::task::TaskRegistry;
use crate::transport::MessageTransport;
use crate::window::{CivilZone, Clock, WindowPolicy};

/// Everything a run needs from configuration, resolved up front.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub chat_id: String,
    pub policy: WindowPolicy,
    pub zone: CivilZone,
    pub state_blob: String,
    pub tasks_blob: String,
    pub seed_key: String,
    pub seed_label: String,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            chat_id: config.chat_id()?,
            ..Self::local(config)?
        })
    }

    /// Settings for commands that never talk to the chat.
    pub fn local(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            chat_id: String::new(),
            policy: config.window_policy()?,
            zone: config.zone()?,
            state_blob: config.storage.state_file.clone(),
            tasks_blob: config.storage.tasks_file.clone(),
            seed_key: config.seed_task.key.clone(),
            seed_label: config.seed_task.label.clone(),
        })
    }

    pub fn seed_registry(&self) -> TaskRegistry {
        TaskRegistry::seeded(&self.seed_key, &self.seed_label)
    }
}

/// Reminder emitted at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub date: NaiveDate,
    pub pending: Vec<String>,
}

/// Summary of a completed run, printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub handled: usize,
    pub ignored: usize,
    pub last_update_id: i64,
    pub registry_saved: bool,
    pub replies_sent: usize,
    pub reset: Option<&'static str>,
    pub reminder: Option<ReminderReport>,
}

/// Load both blobs, migrate legacy state and drop completions for tasks
/// the registry no longer has.
pub(crate) fn load_blobs<S: BlobStore + ?Sized>(
    blobs: &StateStore<'_, S>,
    settings: &RunSettings,
) -> Result<(RunState, TaskRegistry)> {
    let mut state = blobs.load_state()?;
    let registry = blobs.load_registry(|| settings.seed_registry())?;

    if let Some(date) = state.migrate_legacy(&registry) {
        tracing::warn!(%date, key = ?registry.default_key(), "migrated legacy single-task state");
    }
    let orphans = state.done.retain_known(&registry);
    if !orphans.is_empty() {
        tracing::warn!(?orphans, "dropped completions for unknown tasks");
    }
    Ok((state, registry))
}

/// Loads both blobs, drives the interpreter and decides what to send.
pub struct Orchestrator<T, S, C> {
    settings: RunSettings,
    transport: T,
    store: S,
    clock: C,
}

impl<T, S, C> Orchestrator<T, S, C>
where
    T: MessageTransport,
    S: BlobStore,
    C: Clock,
{
    pub fn new(settings: RunSettings, transport: T, store: S, clock: C) -> Self {
        Self {
            settings,
            transport,
            store,
            clock,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn blobs(&self) -> StateStore<'_, S> {
        StateStore::new(&self.store, &self.settings.state_blob, &self.settings.tasks_blob)
    }

    fn load(&self) -> Result<(RunState, TaskRegistry)> {
        load_blobs(&self.blobs(), &self.settings)
    }

    /// One full pass.
    ///
    /// # Errors
    ///
    /// Storage and transport failures abort the run. If sending fails after
    /// the blobs were saved, the processed updates stay processed.
    pub fn run_once(&self) -> Result<RunReport> {
        let (mut state, mut registry) = self.load()?;

        let offset = state.last_update_id + 1;
        let updates = self.transport.fetch_updates(offset)?;
        tracing::debug!(offset, count = updates.len(), "updates fetched");

        let interpreter = Interpreter::new(
            self.settings.chat_id.clone(),
            self.settings.policy,
            self.settings.zone,
        );
        let outcome = interpreter.interpret(&updates, &mut state, &mut registry, &self.clock);

        let blobs = self.blobs();
        if outcome.registry_changed {
            blobs.save_registry(&registry)?;
        }
        blobs.save_state(&state)?;

        let mut report = RunReport {
            fetched: updates.len(),
            handled: outcome.handled,
            ignored: outcome.ignored,
            last_update_id: state.last_update_id,
            registry_saved: outcome.registry_changed,
            replies_sent: 0,
            reset: match outcome.reset {
                ResetScope::None => None,
                ResetScope::Day => Some("day"),
                ResetScope::All => Some("all"),
            },
            reminder: None,
        };

        if outcome.responded() {
            for reply in &outcome.replies {
                self.transport.send(reply)?;
                report.replies_sent += 1;
            }
            return Ok(report);
        }

        let now = self.clock.now();
        if !self.settings.policy.is_in_window(&now) {
            tracing::debug!(%now, "outside reminder window");
            return Ok(report);
        }
        let date = self.settings.policy.target_date(&now);
        let pending = state.done.pending(&registry, date);
        if pending.is_empty() {
            tracing::debug!(%date, "nothing pending");
            return Ok(report);
        }

        self.transport.send(&messages::reminder(date, &pending))?;
        tracing::info!(%date, pending = pending.len(), "reminder sent");
        report.reminder = Some(ReminderReport {
            date,
            pending: pending.iter().map(|t| t.key.clone()).collect(),
        });
        Ok(report)
    }
}
