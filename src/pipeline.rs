use std::{future::Future, sync::Arc};

use futures::{
    future::BoxFuture,
    stream::{FuturesUnordered, StreamExt},
    FutureExt,
};
use tokio::{
    io::AsyncRead,
    sync::mpsc::{self, Receiver},
    task::{JoinError, JoinHandle},
};

use crate::{
    error::{ErrorObserver, Ignore},
    line::{Indexed, LineSource},
    pool::MapperPool,
    reduce::Reducer,
    Limits,
};

/// A `MapReduce` describes one pipeline run: a mapper applied to every input
/// line under a bounded degree of parallelism, and a reducer that turns the
/// parsed entries into the output stream.
///
/// [`spawn`](MapReduce::spawn) launches the run in the background and hands
/// back the output receiver. The caller drains it until `None`, which is the
/// pipeline's only completion signal.
///
/// # Example
/// ```rust
/// use mapline::{Limits, MapReduce, SortByLine};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let (mut output, h) = MapReduce::new(
///     |line: String| async move { line.parse::<i64>() },
///     SortByLine,
/// )
/// .limits(Limits::concurrent(2))
/// .spawn(&b"10\n20\n30"[..]);
///
/// let mut values = Vec::new();
/// while let Some(entry) = output.recv().await {
///     values.push(entry.value);
/// }
///
/// assert_eq!(values, vec![10, 20, 30]);
/// h.await.unwrap();
/// # });
/// ```
///
/// # Errors
/// A failed parse drops that line; a failed read stops the input early. Both
/// are invisible on the output path - the stream just ends with fewer items.
/// Subscribe with [`on_error`](MapReduce::on_error) to observe them.
pub struct MapReduce<M, R, E>
where
    E: 'static,
{
    map_fn: M,
    reducer: R,
    limits: Limits,
    observer: Arc<dyn ErrorObserver<E>>,
}

impl<M, R, E> MapReduce<M, R, E>
where
    E: Send + 'static,
{
    /// Describes a pipeline with the given mapper and reducer and default [`Limits`]
    pub fn new(map_fn: M, reducer: R) -> Self {
        Self {
            map_fn,
            reducer,
            limits: Limits::default(),
            observer: Arc::new(Ignore),
        }
    }

    /// Sets the concurrency limit and entry buffer capacity for this run
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Subscribes an observer to the run's non-fatal errors. The default
    /// observer ignores them.
    pub fn on_error(mut self, observer: impl ErrorObserver<E> + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Launches the pipeline against the given input stream.
    ///
    /// Three stages are spawned: the line source, the mapper pool, and the
    /// reducer. Returns the output receiver and a join future that resolves
    /// once all three have finished. The output's producing side closes
    /// exactly once, when the reducer returns - which can only happen after
    /// the pool has joined every in-flight mapping task and closed the entry
    /// channel.
    pub fn spawn<In, Fut, T, Out>(
        self,
        input: In,
    ) -> (Receiver<Out>, BoxFuture<'static, Result<(), JoinError>>)
    where
        In: AsyncRead + Send + Unpin + 'static,
        M: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        R: Reducer<Indexed<T>, Out>,
        Out: Send + 'static,
    {
        let Self {
            map_fn,
            reducer,
            limits,
            observer,
        } = self;

        let source = LineSource {
            input,
            observer: Arc::clone(&observer),
        };
        let (lines, source_handle) = source.spawn();

        let pool = MapperPool {
            map_fn: Arc::new(map_fn),
            limits,
            observer,
        };
        let (entries, pool_handle) = pool.spawn(lines);

        let (output_sender, output_receiver) = mpsc::channel(1);
        let reducer_handle = tokio::spawn(reducer.reduce(entries, output_sender));

        let mut handles: FuturesUnordered<JoinHandle<()>> =
            [source_handle, pool_handle, reducer_handle]
                .into_iter()
                .collect();

        let join_result = async move {
            while let Some(res) = handles.next().await {
                res?;
            }

            Ok(())
        };

        (output_receiver, join_result.boxed())
    }
}
