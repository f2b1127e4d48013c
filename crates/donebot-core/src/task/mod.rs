//! Task definitions and their per-day completion records.

pub mod ledger;
pub mod registry;

pub use ledger::CompletionLedger;
pub use registry::{
    normalize_key, normalize_label, TaskDefinition, TaskListing, TaskRegistry, MAX_LABEL_CHARS,
};
