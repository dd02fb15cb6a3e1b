//! Bounded-concurrency map/reduce for line-oriented streams.
//!
//! `mapline` reads an input stream line by line, applies an async parsing
//! function ("mapper") to each line under a limited degree of parallelism,
//! and feeds the parsed entries to an aggregation function ("reducer") that
//! emits the final output stream. However large the input, at most N parse
//! operations run at once, and the caller consumes results incrementally
//! while the pipeline is still working.
//!
//! Main features:
//!
//! - Explicit concurrency and buffering control via [`Limits`]
//! - Pluggable mapper and [`Reducer`] - the core only orchestrates
//! - Entries carry their original line position, so order-sensitive reducers
//!   can recover input order (see [`SortByLine`])
//! - Best-effort degradation: unparsable lines and broken input streams
//!   shorten the output instead of failing it, observable via [`ErrorObserver`]
//! - Builds on Tokio tasks and channels; no locks, no shared mutable state
//!
//! Example:
//!
//! ```rust
//! use mapline::{Limits, MapReduce, PassThrough};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let (mut output, h) = MapReduce::new(
//!     |line: String| async move { line.parse::<f64>() },
//!     PassThrough,
//! )
//! .limits(Limits::concurrent(4).buffer(16))
//! .spawn(&b"1.5\noops\n2.5"[..]);
//!
//! let mut total = 0.0;
//! while let Some(entry) = output.recv().await {
//!     total += entry.value;
//! }
//!
//! // "oops" is dropped, the rest still flows through
//! assert_eq!(total, 4.0);
//! h.await.unwrap();
//! # });
//! ```
//!
//! ## How it runs
//!
//! [`MapReduce::spawn`] launches three cooperating tasks:
//!
//! 1. The *line source* splits the input into lines, numbering them from 1,
//!    and hands them over one at a time.
//! 2. The *mapper pool* fans lines out to at most `Limits::concurrency`
//!    concurrent mapping tasks. Parsed entries flow into a bounded channel of
//!    capacity `Limits::buffer`; when it fills up, mapping suspends, which in
//!    turn holds back the source.
//! 3. The *reducer* runs once, drains that channel, and writes the output
//!    stream the caller receives.
//!
//! Shutdown is strictly ordered: when the input ends, the pool stops
//! admitting work, waits for every in-flight mapping task, and only then lets
//! the entry channel close; the reducer finishes after that, closing the
//! output. Draining the output receiver to `None` is therefore the only
//! completion signal a caller needs.
//!
//! Entries reach the reducer in task completion order, not input order.
//! Reducers that care use the carried `line_index` to reorder.

mod error;
mod limits;
mod line;
mod pipeline;
mod pool;
mod reduce;

#[cfg(test)]
mod test_utils;

pub use error::{ErrorObserver, Ignore, LogErrors, PipelineError};
pub use limits::Limits;
pub use line::Indexed;
pub use pipeline::MapReduce;
pub use reduce::{PassThrough, Reducer, SortByLine};
