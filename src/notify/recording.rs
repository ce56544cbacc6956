//! notify::recording
//!
//! In-memory transport for deterministic testing.
//!
//! # Example
//!
//! ```
//! use refnotify::notify::recording::RecordingTransport;
//!
//! let transport = RecordingTransport::new();
//! assert!(transport.sent().is_empty());
//!
//! // Make every send fail, to exercise error paths
//! transport.fail_with("mailbox full");
//! ```

use std::sync::{Arc, Mutex};

use super::{Message, Transport, TransportError};

/// Transport that records messages instead of sending them.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    sent: Vec<Message>,
    /// Error text returned for every send while set
    fail_with: Option<String>,
    attempts: usize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        self.lock().fail_with = Some(reason.into());
    }

    /// Messages successfully sent so far.
    pub fn sent(&self) -> Vec<Message> {
        self.lock().sent.clone()
    }

    /// Number of send attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingInner> {
        // A panic while holding the lock leaves plain data behind
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for RecordingTransport {
    fn send(&self, message: &Message) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.attempts += 1;
        if let Some(reason) = &inner.fail_with {
            return Err(TransportError::Rejected(reason.clone()));
        }
        inner.sent.push(message.clone());
        Ok(())
    }
}
