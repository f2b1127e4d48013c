//! Messaging provider seam.
//!
//! The orchestrator only sees [`MessageTransport`]; [`TelegramTransport`] is
//! the production implementation and [`RecordingTransport`] an in-memory one
//! for tests and dry runs.

pub mod telegram;

use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::window::CivilZone;

use crate::error::TransportError;

pub use telegram::TelegramTransport;

/// One inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: String,
    pub text: Option<String>,
    /// Unix seconds, as sent by the provider.
    pub timestamp: Option<i64>,
}

impl IncomingMessage {
    /// Message time in `zone`, if the provider sent a valid one.
    pub fn sent_at(&self, zone: &CivilZone) -> Option<DateTime<FixedOffset>> {
        let ts = self.timestamp?;
        Utc.timestamp_opt(ts, 0).single().map(|t| zone.localize(&t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

pub trait MessageTransport {
    /// Updates with id `>= offset`, oldest first.
    fn fetch_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError>;

    fn send(&self, text: &str) -> Result<(), TransportError>;
}

/// Serves queued batches and records everything sent.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    batches: RefCell<VecDeque<Vec<Update>>>,
    offsets: RefCell<Vec<i64>>,
    sent: RefCell<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next `fetch_updates` call.
    pub fn push_batch(&self, updates: Vec<Update>) {
        self.batches.borrow_mut().push_back(updates);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.borrow().clone()
    }
}

impl MessageTransport for RecordingTransport {
    fn fetch_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        self.offsets.borrow_mut().push(offset);
        Ok(self.batches.borrow_mut().pop_front().unwrap_or_default())
    }

    fn send(&self, text: &str) -> Result<(), TransportError> {
        self.sent.borrow_mut().push(text.to_string());
        Ok(())
    }
}
