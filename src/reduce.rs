use std::future::Future;

use tokio::sync::mpsc::{Receiver, Sender};

use crate::line::Indexed;

/// The aggregation half of a pipeline.
///
/// A reducer is started exactly once per run, as its own task, concurrently
/// with the line source and the mapper pool. It owns the entry receiver and
/// the output sender: it must drain `input` until the channel closes, and the
/// output closes when it drops `output`. What happens in between - forwarding,
/// filtering, grouping, folding, sorting by line index - is entirely up to the
/// implementation.
///
/// Any `FnOnce(Receiver<In>, Sender<Out>) -> Future` closure is a reducer:
///
/// ```rust
/// use tokio::sync::mpsc::{Receiver, Sender};
/// use mapline::Indexed;
///
/// // keep only even values
/// let evens = |mut input: Receiver<Indexed<i64>>, output: Sender<Indexed<i64>>| async move {
///     while let Some(entry) = input.recv().await {
///         if entry.value % 2 == 0 {
///             if output.send(entry).await.is_err() {
///                 break;
///             }
///         }
///     }
/// };
/// # fn takes_reducer(_r: impl mapline::Reducer<Indexed<i64>, Indexed<i64>>) {}
/// # takes_reducer(evens);
/// ```
pub trait Reducer<In, Out>: Send + 'static {
    fn reduce(
        self,
        input: Receiver<In>,
        output: Sender<Out>,
    ) -> impl Future<Output = ()> + Send + 'static;
}

impl<F, Fut, In, Out> Reducer<In, Out> for F
where
    F: FnOnce(Receiver<In>, Sender<Out>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn reduce(
        self,
        input: Receiver<In>,
        output: Sender<Out>,
    ) -> impl Future<Output = ()> + Send + 'static {
        (self)(input, output)
    }
}

/// Forwards every entry unchanged, in arrival order
pub struct PassThrough;

impl<In> Reducer<In, In> for PassThrough
where
    In: Send + 'static,
{
    async fn reduce(self, mut input: Receiver<In>, output: Sender<In>) {
        while let Some(entry) = input.recv().await {
            if let Err(_e) = output.send(entry).await {
                break;
            }
        }
    }
}

/// Collects the whole input, then emits it in input-line order.
///
/// Entries reach the reducer in task completion order; this is the explicit
/// reordering step for callers that need input order back. It buffers the
/// entire run in memory, so it only suits bounded inputs.
pub struct SortByLine;

impl<T> Reducer<Indexed<T>, Indexed<T>> for SortByLine
where
    T: Send + 'static,
{
    async fn reduce(self, mut input: Receiver<Indexed<T>>, output: Sender<Indexed<T>>) {
        let mut entries = Vec::new();
        while let Some(entry) = input.recv().await {
            entries.push(entry);
        }

        entries.sort_by_key(|entry| entry.line_index);

        for entry in entries {
            if let Err(_e) = output.send(entry).await {
                break;
            }
        }
    }
}
