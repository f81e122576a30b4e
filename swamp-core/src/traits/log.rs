//! Event log sink

/// Append-only text log
///
/// Receives one complete line per call, without a terminator.
pub trait LogSink {
    fn log_line(&mut self, line: &str);
}
