/// Controls the resource bounds of a pipeline run
///
/// Example:
///
/// ```rust
/// use mapline::Limits;
///
/// // run up to 4 mappers at once, buffering up to 32 parsed entries
/// let limits = Limits::concurrent(4).buffer(32);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// How many mapping tasks can execute concurrently. The mapper pool never
    /// runs more than this many parse operations at once, regardless of input size.
    pub concurrency: usize,
    /// How many parsed entries can accumulate between the mapper pool and the reducer.
    /// In other words, this is the capacity of the entry channel. When it is full,
    /// mapping tasks suspend before publishing.
    /// Defaults to the concurrency number.
    pub buffer: usize,
}

impl Limits {
    /// Defines limits with the given number of concurrent mapping tasks.
    /// The entry buffer capacity defaults to the same number.
    pub fn concurrent(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            buffer: concurrency.max(1),
        }
    }

    /// Defines fully serial limits with a single mapping task at a time
    pub fn serial() -> Self {
        Self {
            concurrency: 1,
            buffer: 1,
        }
    }

    /// How many parsed entries can be stored in memory before the reducer takes them
    /// (default = concurrency). Bounded channels hold at least one item, so the
    /// effective minimum is 1.
    pub fn buffer(self, buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            ..self
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::concurrent(10)
    }
}
