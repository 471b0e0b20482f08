// ABOUTME: Session-wide holder of the single current status report
// Screens report outcomes here; the notifier subscribes to changes

use chrono::{DateTime, Local};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Error,
    Success,
    Info,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Success => "success",
            Self::Info => "info",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Error => "✕",
            Self::Success => "✓",
            Self::Info => "ℹ",
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self {
            Self::Error => "Operation failed",
            Self::Success => "Operation completed",
            Self::Info => "Notice",
        }
    }
}

/// Machine-readable outcome attached to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Status returned by the server.
    Http(u16),
    /// No response was received.
    NetworkError,
    /// The request failed before it could be sent.
    UnknownError,
}

impl StatusCode {
    pub fn http(&self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self::Http(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{}", code),
            Self::NetworkError => write!(f, "NETWORK_ERROR"),
            Self::UnknownError => write!(f, "UNKNOWN_ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
    pub code: Option<StatusCode>,
    pub created_at: DateTime<Local>,
    /// Increases with every `set_status`; identifies this exact report.
    pub sequence: u64,
}

impl Status {
    /// Creation time as shown in the overlay.
    pub fn timestamp(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }

    /// Code label as shown in the overlay, e.g. `HTTP 200` or `NETWORK_ERROR`.
    pub fn code_label(&self) -> Option<String> {
        self.code.map(|code| match code {
            StatusCode::Http(n) => format!("HTTP {}", n),
            other => other.to_string(),
        })
    }
}

#[derive(Debug)]
struct Inner {
    tx: watch::Sender<Option<Status>>,
    next_sequence: AtomicU64,
}

/// Handle to the current status. Clones share the same underlying slot.
#[derive(Debug, Clone)]
pub struct StatusStore {
    inner: Arc<Inner>,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                tx,
                next_sequence: AtomicU64::new(1),
            }),
        }
    }

    /// Replaces the current status unconditionally and notifies subscribers.
    pub fn set_status(
        &self,
        kind: StatusKind,
        message: impl Into<String>,
        code: Option<StatusCode>,
    ) -> Status {
        let mut message = message.into();
        if message.trim().is_empty() {
            warn!("Empty {} status message, using fallback text", kind.as_str());
            message = kind.fallback_message().to_string();
        }

        let status = Status {
            kind,
            message,
            code,
            created_at: Local::now(),
            sequence: self.inner.next_sequence.fetch_add(1, Ordering::Relaxed),
        };
        debug!(
            kind = kind.as_str(),
            sequence = status.sequence,
            "status set: {}",
            status.message
        );

        self.inner.tx.send_replace(Some(status.clone()));
        status
    }

    pub fn report_error(&self, message: impl Into<String>, code: Option<StatusCode>) -> Status {
        self.set_status(StatusKind::Error, message, code)
    }

    pub fn report_success(&self, message: impl Into<String>, code: Option<StatusCode>) -> Status {
        self.set_status(StatusKind::Success, message, code)
    }

    pub fn report_info(&self, message: impl Into<String>, code: Option<StatusCode>) -> Status {
        self.set_status(StatusKind::Info, message, code)
    }

    /// Drops the current status. Subscribers are only woken if there was one.
    pub fn clear(&self) {
        self.inner.tx.send_if_modified(|current| current.take().is_some());
    }

    /// Clears only if the current status is the one identified by `sequence`.
    /// Returns whether anything was cleared.
    pub fn clear_if(&self, sequence: u64) -> bool {
        self.inner.tx.send_if_modified(|current| {
            if current.as_ref().map(|s| s.sequence) == Some(sequence) {
                *current = None;
                true
            } else {
                false
            }
        })
    }

    pub fn current(&self) -> Option<Status> {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Status>> {
        self.inner.tx.subscribe()
    }
}
