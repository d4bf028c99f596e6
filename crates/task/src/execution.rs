use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::time::Instant;
use tracing::Level;
use uuid::Uuid;

/// Run-time context of one leaf action.
///
/// Collects everything the action writes to its two output streams. The
/// executor turns it into a [`Detail`](crate::Detail) right after the action
/// returns.
#[derive(Debug)]
pub struct Execution {
    id: Uuid,
    started: DateTime<Utc>,
    start: Instant,
    out: String,
    err: String,
}

impl Execution {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Utc::now(),
            start: Instant::now(),
            out: String::new(),
            err: String::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// Print one line; warnings and errors go to the error stream
    pub fn print(&mut self, level: Level, message: impl AsRef<str>) {
        let stream = if level == Level::WARN || level == Level::ERROR {
            &mut self.err
        } else {
            &mut self.out
        };
        let _ = writeln!(stream, "{}", message.as_ref());
    }

    /// Append raw text to the standard stream
    pub fn write_out(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Append raw text to the error stream
    pub fn write_err(&mut self, text: &str) {
        self.err.push_str(text);
    }

    pub fn out(&self) -> &str {
        &self.out
    }

    pub fn err(&self) -> &str {
        &self.err
    }

    pub(crate) fn into_streams(self) -> (String, String) {
        (self.out, self.err)
    }
}

impl Default for Execution {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_routes_by_level() {
        let mut execution = Execution::new();
        execution.print(Level::TRACE, "t");
        execution.print(Level::DEBUG, "d");
        execution.print(Level::INFO, "i");
        execution.print(Level::WARN, "w");
        execution.print(Level::ERROR, "e");
        assert_eq!(execution.out(), "t\nd\ni\n");
        assert_eq!(execution.err(), "w\ne\n");
    }

    #[test]
    fn test_raw_writes_are_kept_verbatim() {
        let mut execution = Execution::new();
        execution.write_out("a");
        execution.write_out("b\n");
        execution.write_err("  x");
        let (out, err) = execution.into_streams();
        assert_eq!(out, "ab\n");
        assert_eq!(err, "  x");
    }
}
