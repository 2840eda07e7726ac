//! Deadline-bounded partial results (spec §4.G: "All operations accept a
//! deadline and return a structured partial result if the deadline is
//! reached, never silently truncated numbers").

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    pub fn after(duration: Duration) -> Self {
        Self {
            expires_at: Instant::now() + duration,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Wraps a result that may have been cut short by a [`Deadline`]. `complete`
/// is `false` whenever any contributing sub-operation was skipped because
/// the deadline had passed — the caller is expected to surface that to the
/// user rather than presenting `data` as the full answer.
#[derive(Debug, Clone)]
pub struct Partial<T> {
    pub data: T,
    pub complete: bool,
    pub note: Option<String>,
}

impl<T> Partial<T> {
    pub fn complete(data: T) -> Self {
        Self {
            data,
            complete: true,
            note: None,
        }
    }

    pub fn truncated(data: T, note: impl Into<String>) -> Self {
        Self {
            data,
            complete: false,
            note: Some(note.into()),
        }
    }
}
