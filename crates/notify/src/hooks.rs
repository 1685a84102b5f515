//! Collaborator seams consumed by the core workflows.

use std::error::Error;
use std::sync::{Mutex, PoisonError};

use tracing::{error, info};

use crate::notice::NoticeQueue;

/// Receives terminal failures meant for the user.
pub trait ErrorReporter: Send + Sync {
    /// Shows `message`, optionally with the error that caused it.
    fn show_error(&self, message: &str, error: Option<&dyn Error>);
}

/// Receives named usage events.
pub trait Analytics: Send + Sync {
    fn track(&self, event: &str);
}

/// Reporter that logs each error and queues it as a notice.
#[derive(Debug, Default)]
pub struct QueueReporter {
    queue: Mutex<NoticeQueue>,
}

impl QueueReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every pending notice.
    pub fn drain(&self) -> Vec<crate::Notice> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
    }
}

impl ErrorReporter for QueueReporter {
    fn show_error(&self, message: &str, err: Option<&dyn Error>) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        match err {
            Some(e) => {
                error!(error = %e, "{message}");
                queue.error_with(message, e.to_string());
            }
            None => {
                error!("{message}");
                queue.error(message);
            }
        }
    }
}

/// Analytics sink that only emits a log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn track(&self, event: &str) {
        info!(event, "tracked event");
    }
}
