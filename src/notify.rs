//! Bounded queue for user-facing toast notifications.
//!
//! The executor's callers push one message per terminal outcome; whatever
//! renders them (terminal, GUI, test harness) drains the receiver at its
//! own pace. Rendering technology is out of scope here.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub at: DateTime<Utc>,
}

/// Sending half of the notification queue. Cheap to clone; every clone
/// feeds the same receiver.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Create a queue holding up to 100 undelivered notifications.
    pub fn channel() -> (Notifier, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(100);
        (Notifier { tx }, rx)
    }

    /// Enqueue without blocking. A full or closed queue drops the
    /// notification; a toast nobody can see is not worth stalling a
    /// mutation for.
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) {
        let notification = Notification {
            message: message.into(),
            kind,
            at: Utc::now(),
        };
        if let Err(e) = self.tx.try_send(notification) {
            tracing::warn!("[NOTIFY] dropping notification: {}", e);
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(message, NotificationKind::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(message, NotificationKind::Error);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(message, NotificationKind::Info);
    }
}
