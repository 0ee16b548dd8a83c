//! Signed-in session state.
//!
//! One [`SessionWriter`] (held by the auth flow) and any number of
//! [`SessionReader`]s handed to whatever needs the token.

use crate::models::User;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Create a fresh, signed-out session pair.
pub fn session_channel() -> (SessionWriter, SessionReader) {
    let (tx, rx) = watch::channel(None);
    (SessionWriter { tx }, SessionReader { rx })
}

#[derive(Debug)]
pub struct SessionWriter {
    tx: watch::Sender<Option<Session>>,
}

impl SessionWriter {
    pub fn sign_in(&self, session: Session) {
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) -> Option<Session> {
        self.tx.send_replace(None)
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionReader {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionReader {
    /// The bearer token, if one is held and non-blank.
    pub fn token(&self) -> Option<String> {
        self.rx
            .borrow()
            .as_ref()
            .map(|s| s.token.clone())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn user(&self) -> Option<User> {
        self.rx.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }
}

/// Session persisted between CLI runs.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        Ok(())
    }

    /// A missing or unreadable file means "signed out".
    pub fn load(&self) -> Option<Session> {
        let data = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&data) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session file {}", self.path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str) -> Session {
        Session {
            token: token.to_string(),
            user: User {
                id: "1".into(),
                name: "Ada".into(),
                email: "ada@example.org".into(),
                ..User::default()
            },
        }
    }

    #[test]
    fn readers_see_writer_updates() {
        let (writer, reader) = session_channel();
        let other = writer.reader();
        assert!(!reader.is_authenticated());

        writer.sign_in(session("abc"));
        assert_eq!(reader.token().as_deref(), Some("abc"));
        assert_eq!(other.user().map(|u| u.name), Some("Ada".to_string()));

        let previous = writer.sign_out();
        assert_eq!(previous.map(|s| s.token), Some("abc".to_string()));
        assert!(reader.token().is_none());
        assert!(other.snapshot().is_none());
    }

    #[test]
    fn blank_token_is_not_authenticated() {
        let (writer, reader) = session_channel();
        writer.sign_in(session("   "));
        assert!(reader.token().is_none());
        assert!(!reader.is_authenticated());
        assert!(reader.user().is_some());
    }

    #[test]
    fn session_file_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        assert!(file.load().is_none());

        file.save(&session("tok")).unwrap();
        assert_eq!(file.load().map(|s| s.token), Some("tok".to_string()));

        file.clear().unwrap();
        assert!(file.load().is_none());
        file.clear().unwrap();
    }

    #[test]
    fn corrupt_session_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(SessionFile::new(path).load().is_none());
    }
}
