//! Monotonic timestamp source for completion responses.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

/// Wall clock that never goes backwards within a process.
///
/// Keeps a high-water mark in microseconds; a reading older than the mark
/// (system clock stepped back) is reported as the mark instead.
#[derive(Debug, Default)]
pub struct Clock {
    last_micros: AtomicI64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current instant, never earlier than any previous reading.
    pub fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let micros = now.timestamp_micros();
        let previous = self.last_micros.fetch_max(micros, Ordering::SeqCst);

        if previous > micros {
            DateTime::from_timestamp_micros(previous).unwrap_or(now)
        } else {
            now
        }
    }

    /// Current instant as an RFC 3339 string with microsecond precision.
    pub fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}
