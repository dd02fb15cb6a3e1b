use std::io;

use tracing::warn;

/// A non-fatal error encountered while a pipeline runs.
///
/// These never travel on the main data channels. A `Read` error stops the line
/// source early but lets the rest of the pipeline drain and close normally; a
/// `Parse` error drops that single line's contribution. Either way the caller
/// sees a possibly-shorter output stream, never a failed one.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError<E> {
    /// The input stream failed while reading line `line_index`. No further
    /// lines are produced after this.
    #[error("read failed at line {line_index}: {source}")]
    Read {
        line_index: u64,
        #[source]
        source: io::Error,
    },
    /// The mapper rejected line `line_index`. The line contributes no entry.
    #[error("parse failed at line {line_index}: {error}")]
    Parse { line_index: u64, error: E },
}

impl<E> PipelineError<E> {
    /// The 1-based input position the error occurred at
    pub fn line_index(&self) -> u64 {
        match self {
            Self::Read { line_index, .. } | Self::Parse { line_index, .. } => *line_index,
        }
    }
}

/// Receives the pipeline's non-fatal errors.
///
/// Called from the line source task and from mapping tasks, possibly
/// concurrently. Not a control-flow path: whatever an observer does, the
/// pipeline behaves the same.
///
/// Any `Fn(PipelineError<E>)` closure is an observer:
///
/// ```rust
/// use mapline::{ErrorObserver, PipelineError};
///
/// let observer = |error: PipelineError<std::num::ParseIntError>| {
///     eprintln!("dropped line {}", error.line_index());
/// };
/// # fn takes_observer(_o: impl ErrorObserver<std::num::ParseIntError>) {}
/// # takes_observer(observer);
/// ```
pub trait ErrorObserver<E>: Send + Sync {
    fn on_error(&self, error: PipelineError<E>);
}

impl<F, E> ErrorObserver<E> for F
where
    F: Fn(PipelineError<E>) + Send + Sync,
{
    fn on_error(&self, error: PipelineError<E>) {
        (self)(error)
    }
}

/// The default observer. Errors are dropped silently; a failed line simply
/// contributes nothing downstream.
pub struct Ignore;

impl<E> ErrorObserver<E> for Ignore {
    fn on_error(&self, _error: PipelineError<E>) {}
}

/// An observer that logs every error at `warn` level via [`tracing`]
pub struct LogErrors;

impl<E> ErrorObserver<E> for LogErrors
where
    E: std::fmt::Display,
{
    fn on_error(&self, error: PipelineError<E>) {
        warn!(line_index = error.line_index(), %error, "pipeline error");
    }
}
