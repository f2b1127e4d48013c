//! End-to-end runs of the orchestrator against an in-memory transport,
//! in-memory blobs and a pinned clock.

use chrono::{DateTime, FixedOffset, NaiveDate};
use donebot_core::error::TransportError;
use donebot_core::{
    BlobStore, Config, CoreError, IncomingMessage, ManualClock, MemoryBlobStore, MessageTransport,
    Orchestrator, RecordingTransport, RunSettings, StateStore, Update,
};

const CHAT: &str = "4242";
const TWO_TASKS: &str = r#"{"default":"gym","tasks":[{"key":"gym","label":"Gym"},{"key":"read","label":"Read"}]}"#;

type Bot = Orchestrator<RecordingTransport, MemoryBlobStore, ManualClock>;

fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn settings() -> RunSettings {
    RunSettings {
        chat_id: CHAT.into(),
        ..RunSettings::local(&Config::default()).unwrap()
    }
}

fn bot(now: &str, state: Option<&str>, tasks: Option<&str>) -> Bot {
    let store = MemoryBlobStore::new();
    if let Some(raw) = state {
        store.insert("state.json", raw);
    }
    if let Some(raw) = tasks {
        store.insert("tasks.json", raw);
    }
    Orchestrator::new(settings(), RecordingTransport::new(), store, ManualClock::new(at(now)))
}

fn msg(id: i64, text: &str) -> Update {
    Update {
        update_id: id,
        message: Some(IncomingMessage {
            chat_id: CHAT.into(),
            text: Some(text.into()),
            timestamp: None,
        }),
    }
}

fn stamped(id: i64, text: &str, unix_secs: i64) -> Update {
    let mut update = msg(id, text);
    if let Some(message) = update.message.as_mut() {
        message.timestamp = Some(unix_secs);
    }
    update
}

fn saved_state(bot: &Bot) -> donebot_core::RunState {
    StateStore::new(bot.store(), "state.json", "tasks.json")
        .load_state()
        .unwrap()
}

#[test]
fn bare_done_marks_default_task() {
    let bot = bot("2024-01-10T20:00:00-06:00", None, Some(TWO_TASKS));
    bot.transport().push_batch(vec![msg(1, "/done")]);

    let report = bot.run_once().unwrap();

    assert_eq!(bot.transport().sent(), vec!["Marked done: gym for 2024-01-10."]);
    assert!(saved_state(&bot).done.is_done("gym", d("2024-01-10")));
    assert_eq!(report.replies_sent, 1);
    assert!(report.reminder.is_none());
}

#[test]
fn status_after_midnight_reports_previous_evening() {
    let bot = bot(
        "2024-01-11T01:30:00-06:00",
        Some(r#"{"last_update_id": 3, "done": {"gym": "2024-01-10"}}"#),
        Some(TWO_TASKS),
    );
    bot.transport().push_batch(vec![msg(4, "/status")]);

    bot.run_once().unwrap();

    assert_eq!(
        bot.transport().sent(),
        vec!["Status for 2024-01-10:\n✅ gym: Gym\n⬜ read: Read\n1 of 2 done. Pending: read"]
    );
    assert_eq!(bot.transport().offsets(), vec![4]);
}

#[test]
fn reset_wins_over_earlier_done_in_same_batch() {
    let bot = bot("2024-01-10T21:00:00-06:00", None, Some(TWO_TASKS));
    bot.transport()
        .push_batch(vec![msg(1, "/done gym"), msg(2, "/reset"), msg(3, "/reset")]);

    let report = bot.run_once().unwrap();

    let state = saved_state(&bot);
    assert_eq!(state.done.last_done("gym"), None);
    assert_eq!(state.last_update_id, 3);
    assert_eq!(report.reset, Some("day"));
    assert_eq!(
        bot.transport().sent(),
        vec!["Marked done: gym for 2024-01-10.", "Cleared completions for 2024-01-10."]
    );
}

#[test]
fn reset_sent_before_cutoff_clears_that_evening_even_if_processed_after() {
    let bot = bot("2024-01-11T02:01:00-06:00", None, Some(TWO_TASKS));
    bot.transport().push_batch(vec![
        stamped(1, "/done gym", 1_704_959_940), // 01:59:00 local
        stamped(2, "/reset", 1_704_959_970), // 01:59:30 local
    ]);

    bot.run_once().unwrap();

    assert_eq!(saved_state(&bot).done.last_done("gym"), None);
    assert_eq!(
        bot.transport().sent(),
        vec!["Marked done: gym for 2024-01-10.", "Cleared completions for 2024-01-10."]
    );
}

#[test]
fn done_after_summer_cutoff_counts_for_the_new_day() {
    let bot = bot("2024-07-11T02:31:00-05:00", None, Some(TWO_TASKS));
    // 02:30 daylight time; a fixed -06:00 reading would be 01:30, still the previous evening.
    bot.transport().push_batch(vec![stamped(1, "/done", 1_720_683_000)]);

    bot.run_once().unwrap();

    assert_eq!(bot.transport().sent(), vec!["Marked done: gym for 2024-07-11."]);
}

#[test]
fn resetall_rewinds_offset_and_empties_ledger() {
    let bot = bot(
        "2024-01-10T21:00:00-06:00",
        Some(r#"{"last_update_id": 900, "done": {"gym": "2024-01-09", "read": "2024-01-10"}}"#),
        Some(TWO_TASKS),
    );
    bot.transport().push_batch(vec![msg(901, "/resetall")]);

    bot.run_once().unwrap();

    let state = saved_state(&bot);
    assert_eq!(state.last_update_id, 0);
    assert!(state.done.is_empty());
    assert_eq!(bot.transport().sent(), vec!["Cleared all completion history."]);

    // Next run polls from the start of the provider's backlog.
    bot.run_once().unwrap();
    assert_eq!(bot.transport().offsets(), vec![901, 1]);
}

#[test]
fn reminder_lists_pending_tasks_in_registry_order() {
    let bot = bot(
        "2024-01-10T19:00:00-06:00",
        None,
        Some(r#"{"default":"read","tasks":[{"key":"walk","label":"Walk"},{"key":"gym","label":"Gym"},{"key":"read","label":"Read"}]}"#),
    );
    saved_state_write(&bot, r#"{"last_update_id": 0, "done": {"gym": "2024-01-10"}}"#);

    let report = bot.run_once().unwrap();

    assert_eq!(
        bot.transport().sent(),
        vec!["Reminder: not done yet for 2024-01-10:\n• walk: Walk\n• read: Read\n\
              Reply with /done <key> to stop reminders for that task."]
    );
    let reminder = report.reminder.unwrap();
    assert_eq!(reminder.date, d("2024-01-10"));
    assert_eq!(reminder.pending, vec!["walk", "read"]);
}

fn saved_state_write(bot: &Bot, raw: &str) {
    bot.store().save("state.json", raw).unwrap();
}

#[test]
fn reminder_at_cutoff_targets_previous_evening() {
    let bot = bot("2024-01-11T02:00:00-06:00", None, Some(TWO_TASKS));
    bot.run_once().unwrap();
    assert_eq!(bot.transport().sent().len(), 1);
    assert!(bot.transport().sent()[0].starts_with("Reminder: not done yet for 2024-01-10:"));
}

#[test]
fn no_reminder_outside_window_but_state_still_saved() {
    let bot = bot("2024-01-11T02:00:01-06:00", None, Some(TWO_TASKS));
    bot.transport().push_batch(vec![msg(7, "good morning")]);

    let report = bot.run_once().unwrap();

    assert!(bot.transport().sent().is_empty());
    assert!(report.reminder.is_none());
    assert_eq!(bot.store().writes(), vec!["state.json"]);
    assert_eq!(saved_state(&bot).last_update_id, 7);

    bot.run_once().unwrap();
    assert_eq!(bot.transport().offsets(), vec![1, 8]);
}

#[test]
fn no_reminder_when_everything_is_done() {
    let bot = bot(
        "2024-01-10T23:00:00-06:00",
        Some(r#"{"last_update_id": 0, "done": {"gym": "2024-01-10", "read": "2024-01-10"}}"#),
        Some(TWO_TASKS),
    );
    let report = bot.run_once().unwrap();
    assert!(bot.transport().sent().is_empty());
    assert!(report.reminder.is_none());
}

#[test]
fn command_reply_suppresses_reminder() {
    let bot = bot("2024-01-10T20:00:00-06:00", None, Some(TWO_TASKS));
    bot.transport().push_batch(vec![msg(1, "/add walk Walk")]);

    let report = bot.run_once().unwrap();

    assert_eq!(bot.transport().sent(), vec!["Added task: walk (Walk)."]);
    assert!(report.reminder.is_none());
    assert!(report.registry_saved);
    assert_eq!(bot.store().writes(), vec!["tasks.json", "state.json"]);
}

#[test]
fn usage_reply_suppresses_reminder() {
    let bot = bot("2024-01-10T20:00:00-06:00", None, Some(TWO_TASKS));
    bot.transport().push_batch(vec![msg(1, "/remove")]);
    bot.run_once().unwrap();
    assert_eq!(bot.transport().sent(), vec!["Usage: /remove <key>"]);
}

#[test]
fn remove_then_add_leaves_no_residual_completion() {
    let bot = bot(
        "2024-01-10T20:00:00-06:00",
        Some(r#"{"last_update_id": 0, "done": {"gym": "2024-01-10"}}"#),
        Some(TWO_TASKS),
    );
    bot.transport().push_batch(vec![msg(1, "/remove gym")]);
    bot.run_once().unwrap();
    assert_eq!(saved_state(&bot).done.last_done("gym"), None);

    bot.transport().push_batch(vec![msg(2, "/add gym Gym"), msg(3, "/status")]);
    bot.run_once().unwrap();

    let sent = bot.transport().sent();
    assert_eq!(sent.last().unwrap(), "Status for 2024-01-10:\n⬜ read: Read\n⬜ gym: Gym\n0 of 2 done. Pending: read, gym");
    assert_eq!(saved_state(&bot).done.last_done("gym"), None);
}

#[test]
fn missing_registry_blob_seeds_single_task() {
    let bot = bot("2024-01-10T20:00:00-06:00", None, None);
    bot.transport().push_batch(vec![msg(1, "/done")]);
    bot.run_once().unwrap();
    assert_eq!(bot.transport().sent(), vec!["Marked done: task for 2024-01-10."]);
    // Seeding alone is not a mutation.
    assert_eq!(bot.store().writes(), vec!["state.json"]);
}

#[test]
fn legacy_state_is_migrated_onto_default_task() {
    let bot = bot(
        "2024-01-10T20:00:00-06:00",
        Some(r#"{"last_update_id": 12, "last_done_date": "2024-01-10"}"#),
        None,
    );
    let report = bot.run_once().unwrap();

    assert!(report.reminder.is_none());
    let raw = bot.store().get("state.json").unwrap();
    assert!(raw.contains("\"task\": \"2024-01-10\""));
    assert!(!raw.contains("last_done_date"));
    assert_eq!(bot.transport().offsets(), vec![13]);
}

#[test]
fn foreign_chat_is_ignored_but_consumed() {
    let bot = bot("2024-01-10T12:00:00-06:00", None, Some(TWO_TASKS));
    let mut foreign = msg(5, "/resetall");
    foreign.message.as_mut().unwrap().chat_id = "1".into();
    bot.transport().push_batch(vec![foreign]);

    let report = bot.run_once().unwrap();

    assert_eq!(report.ignored, 1);
    assert!(bot.transport().sent().is_empty());
    assert_eq!(saved_state(&bot).last_update_id, 5);
}

struct DownTransport;

impl MessageTransport for DownTransport {
    fn fetch_updates(&self, _offset: i64) -> Result<Vec<Update>, TransportError> {
        Err(TransportError::Status {
            method: "getUpdates",
            status: 502,
            body: "Bad Gateway".into(),
        })
    }

    fn send(&self, _text: &str) -> Result<(), TransportError> {
        unreachable!("fetch fails first")
    }
}

#[test]
fn transport_failure_aborts_without_persisting() {
    let bot = Orchestrator::new(
        settings(),
        DownTransport,
        MemoryBlobStore::new(),
        ManualClock::new(at("2024-01-10T20:00:00-06:00")),
    );
    let err = bot.run_once().unwrap_err();
    assert!(matches!(err, CoreError::Transport(TransportError::Status { status: 502, .. })));
    assert!(bot.store().writes().is_empty());
}
