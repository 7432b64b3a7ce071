use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    /// `None` keeps the message until something replaces it.
    pub expires_at: Option<Instant>,
}

/// The single transient message line shown under the panels.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    current: Option<StatusMessage>,
    duration: Duration,
}

impl StatusBoard {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    fn set(&mut self, kind: StatusKind, text: String, expires: bool, now: Instant) {
        self.current = Some(StatusMessage {
            kind,
            text,
            expires_at: expires.then(|| now + self.duration),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Info, text.into(), true, Instant::now());
    }

    /// Info that stays up until superseded.
    pub fn sticky(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Info, text.into(), false, Instant::now());
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Success, text.into(), true, Instant::now());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Error, text.into(), true, Instant::now());
    }

    /// Drop the message once it has expired.
    pub fn tick(&mut self, now: Instant) {
        if let Some(expires_at) = self.current.as_ref().and_then(|m| m.expires_at) {
            if now >= expires_at {
                self.current = None;
            }
        }
    }
}
