pub mod lines;
pub mod stream;

/// Terminal state of a single probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Server closed the body.
    Exhausted { lines: usize, bytes: usize },
    /// Read window elapsed before the body ended.
    TimedOut { lines: usize, bytes: usize },
    Failed { error: String },
}
