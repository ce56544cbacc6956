//! core::event
//!
//! Forge push webhook payloads.
//!
//! A forwarding layer in front of the tool receives the forge's HTTP push
//! webhook and hands the JSON body over unchanged. Only the fields needed
//! to describe the update and locate the repository are read; everything
//! else in the payload is ignored.

use serde::Deserialize;
use thiserror::Error;

use super::types::{RefUpdate, TypeError};

/// Errors from reading a push payload.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed push payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("push payload describes an invalid update: {0}")]
    Invalid(#[from] TypeError),
}

/// The parts of a push webhook payload this tool uses.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub refname: String,
    pub before: String,
    pub after: String,
    pub repository: Repository,
    #[serde(default)]
    pub pusher: Option<Pusher>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub clone_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Pusher {
    pub name: String,
}

impl PushEvent {
    /// Parse a payload from its JSON text.
    ///
    /// # Example
    ///
    /// ```
    /// use refnotify::core::event::PushEvent;
    ///
    /// let event = PushEvent::from_json(r#"{
    ///     "ref": "refs/heads/main",
    ///     "before": "0000000000000000000000000000000000000000",
    ///     "after": "abc123def4567890abc123def4567890abc12345",
    ///     "repository": { "full_name": "acme/widgets" }
    /// }"#).unwrap();
    /// assert_eq!(event.repository.full_name, "acme/widgets");
    /// ```
    pub fn from_json(text: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The reference update this push describes.
    pub fn update(&self) -> Result<RefUpdate, EventError> {
        Ok(RefUpdate::from_parts(
            &self.refname,
            &self.before,
            &self.after,
        )?)
    }

    /// Login of the pushing user, when the forge reports one.
    pub fn pusher_name(&self) -> Option<&str> {
        self.pusher.as_ref().map(|p| p.name.as_str())
    }
}
