//! User-facing notifications.
//!
//! A single slot: at most one notice is current at a time, a new notice
//! replaces the old one immediately, and every notice expires on its own
//! after four seconds. Each notice carries a sequence number so a stale
//! expiry task can never clear a newer notice.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const EXPIRY: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

pub struct Notifications {
    current: Arc<Mutex<Option<(u64, Notice)>>>,
    seq: u64,
    expiry: Option<JoinHandle<()>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            seq: 0,
            expiry: None,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.post(NoticeKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.post(NoticeKind::Error, message.into());
    }

    fn post(&mut self, kind: NoticeKind, message: String) {
        // Replacing the notice restarts the expiry window
        if let Some(handle) = self.expiry.take() {
            handle.abort();
        }

        self.seq += 1;
        let seq = self.seq;
        *self.current.lock().unwrap() = Some((seq, Notice { kind, message }));

        let slot = Arc::clone(&self.current);
        self.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(EXPIRY).await;
            let mut current = slot.lock().unwrap();
            if matches!(*current, Some((s, _)) if s == seq) {
                *current = None;
            }
        }));
    }

    pub fn current(&self) -> Option<Notice> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, notice)| notice.clone())
    }

    /// Total notices posted since construction.
    #[cfg(test)]
    pub fn posted(&self) -> u64 {
        self.seq
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Notifications {
    fn drop(&mut self) {
        if let Some(handle) = self.expiry.take() {
            handle.abort();
        }
    }
}
