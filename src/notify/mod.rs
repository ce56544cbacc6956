//! notify
//!
//! Message delivery.
//!
//! # Transports
//!
//! - [`SendmailTransport`]: pipes the message into `sendmail -t -oi`
//! - [`StdoutTransport`]: prints the message, for dry runs
//! - [`recording::RecordingTransport`]: keeps messages in memory, for tests
//!
//! Delivery is fire-and-forget. A failed send is reported to the caller
//! once and never retried.

pub mod message;
pub mod recording;
pub mod sendmail;

pub use message::Message;
pub use sendmail::SendmailTransport;

use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;

/// Errors from delivering a message.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: PathBuf,
        source: io::Error,
    },

    #[error("'{program}' exited unsuccessfully ({status})")]
    Status { program: PathBuf, status: String },

    #[error("failed to write message: {0}")]
    Io(#[from] io::Error),

    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Something that can deliver a message.
pub trait Transport {
    fn send(&self, message: &Message) -> Result<(), TransportError>;
}

/// Writes each message to stdout instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send(&self, message: &Message) -> Result<(), TransportError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write!(out, "{}", message)?;
        if !message.body.ends_with('\n') {
            writeln!(out)?;
        }
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}
