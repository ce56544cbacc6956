//! notify::sendmail
//!
//! Delivery through a local `sendmail` compatible program.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::{Message, Transport, TransportError};

/// Pipes messages into `<program> -t -oi`.
///
/// `-t` takes the recipients from the headers; `-oi` stops a line holding
/// a single `.` from ending the message early.
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    program: PathBuf,
}

impl SendmailTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Transport for SendmailTransport {
    fn send(&self, message: &Message) -> Result<(), TransportError> {
        let mut child = Command::new(&self.program)
            .args(["-t", "-oi"])
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| TransportError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping stdin closes the pipe so the program sees end of input.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(message.to_string().as_bytes()),
            None => Ok(()),
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(TransportError::Status {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        written?;

        tracing::info!(
            program = %self.program.display(),
            subject = %message.subject,
            "message handed to mail transport"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Oid, RefKind, RefName};
    use crate::render::RenderedReport;

    fn message() -> Message {
        Message::new(
            vec!["dev@example.com".to_string()],
            None,
            RefName::new("refs/heads/main").unwrap(),
            RefKind::Branch,
            Oid::zero(),
            Oid::new("abc123def4567890abc123def4567890abc12345").unwrap(),
            RenderedReport {
                subject: "subject".to_string(),
                body: "body\n".to_string(),
            },
        )
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let transport = SendmailTransport::new("/nonexistent/refnotify-sendmail");
        let result = transport.send(&message());
        assert!(matches!(result, Err(TransportError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn pipes_message_to_program() {
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let captured = temp.path().join("captured");
        let script = temp.path().join("sendmail");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" > '{0}.args'\ncat > '{0}'\n", captured.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        SendmailTransport::new(&script).send(&message()).unwrap();

        let text = std::fs::read_to_string(&captured).unwrap();
        assert!(text.starts_with("To: dev@example.com\nSubject: subject\n"));
        assert!(text.ends_with("\n\nbody\n"));
        let args = std::fs::read_to_string(captured.with_extension("args")).unwrap();
        assert_eq!(args.trim(), "-t -oi");
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_status_error() {
        let transport = SendmailTransport::new("/bin/false");
        let result = transport.send(&message());
        assert!(matches!(result, Err(TransportError::Status { .. })));
    }
}
