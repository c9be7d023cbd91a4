use log::{error, info, warn};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A short user-facing message with a title, as shown in a toast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: Level,
    pub title: String,
    pub message: String,
}

/// Toast sink. Receives human-readable messages, never error codes.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, title: &str, message: &str);

    fn success(&self, title: &str, message: &str) {
        self.notify(Level::Success, title, message);
    }

    fn warning(&self, title: &str, message: &str) {
        self.notify(Level::Warning, title, message);
    }

    fn error(&self, title: &str, message: &str) {
        self.notify(Level::Error, title, message);
    }
}

/// Writes toasts to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: Level, title: &str, message: &str) {
        match level {
            Level::Success | Level::Info => info!("[{}] {}", title, message),
            Level::Warning => warn!("[{}] {}", title, message),
            Level::Error => error!("[{}] {}", title, message),
        }
    }
}

/// Keeps every toast so callers can show or inspect them later. Toasts are
/// logged as well.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .map(|mut t| std::mem::take(&mut *t))
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts.lock().ok().and_then(|t| t.last().cloned())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, title: &str, message: &str) {
        LogNotifier.notify(level, title, message);
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(Toast {
                level,
                title: title.to_string(),
                message: message.to_string(),
            });
        }
    }
}
