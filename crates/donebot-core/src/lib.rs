//! # donebot Core Library
//!
//! The logic of a personal nightly reminder bot. An external scheduler runs
//! the bot once a minute or so; each run polls the chat for commands,
//! updates per-task completion for the current evening, and during the
//! nightly window reminds about whatever is still open.
//!
//! ## Architecture
//!
//! - **Window**: pure policy mapping a timestamp to window membership and to
//!   the logical date it belongs to (the window crosses midnight)
//! - **Tasks**: ordered task registry with a default task, plus a ledger of
//!   the last date each task was completed
//! - **Interpreter**: folds a batch of chat updates into state mutations and
//!   replies; resets and informational replies apply once per batch
//! - **Orchestrator**: load, fetch, interpret, persist, then reply or remind
//! - **Storage / Transport**: JSON blobs on disk and the Telegram Bot API
//!
//! ## Key Components
//!
//! - [`Orchestrator`]: one scheduler tick
//! - [`Interpreter`]: the batch reducer
//! - [`WindowPolicy`]: window and logical-date rules
//! - [`Config`]: TOML configuration

pub mod admin;
pub mod command;
pub mod error;
pub mod interpreter;
pub mod messages;
pub mod orchestrator;
pub mod state;
pub mod storage;
pub mod task;
pub mod transport;
pub mod window;

pub use admin::TaskAdmin;
pub use command::Command;
pub use error::{ConfigError, CoreError, StorageError, TaskError, TransportError};
pub use interpreter::{Interpreter, Outcome, ResetScope};
pub use orchestrator::{Orchestrator, ReminderReport, RunReport, RunSettings};
pub use state::RunState;
pub use storage::{BlobStore, Config, FileBlobStore, MemoryBlobStore, StateStore};
pub use task::{CompletionLedger, TaskDefinition, TaskRegistry};
pub use transport::{IncomingMessage, MessageTransport, RecordingTransport, TelegramTransport, Update};
pub use window::{CivilZone, Clock, ManualClock, SystemClock, WindowPolicy};
