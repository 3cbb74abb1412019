//! Process-wide list of user-facing error messages.
//!
//! Background work (image downloads, dataset refreshes) has nobody to return
//! an error to, so it appends a message here instead. Front ends render the
//! list and let the user dismiss entries one at a time.

use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::error;

/// Append-only error list with dismiss-one semantics.
#[derive(Debug)]
pub struct ErrorLog {
    errors: Mutex<Vec<String>>,
    /// Bumped on every change so observers can re-render.
    revision: watch::Sender<u64>,
}

impl ErrorLog {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            errors: Mutex::new(Vec::new()),
            revision,
        }
    }

    /// Append a message.
    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.lock().push(message);
        self.bump();
    }

    /// Append an error's display text.
    pub fn report(&self, err: &impl std::fmt::Display) {
        self.push(err.to_string());
    }

    /// Remove the message at `index`. Out-of-range indices are ignored and
    /// return `None`.
    pub fn dismiss(&self, index: usize) -> Option<String> {
        let removed = {
            let mut errors = self.lock();
            (index < errors.len()).then(|| errors.remove(index))
        };
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    /// Current messages, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Receiver that changes whenever the list does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}
