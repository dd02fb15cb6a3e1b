use std::{future::Future, sync::Arc};

use tokio::{
    sync::{
        mpsc::{self, Receiver},
        Semaphore,
    },
    task::{JoinHandle, JoinSet},
};

use crate::{
    error::{ErrorObserver, PipelineError},
    line::{Indexed, RawLine},
    Limits,
};

/// Fans lines out to at most `limits.concurrency` concurrent mapping tasks and
/// publishes every successfully parsed entry to a bounded entry channel.
///
/// A semaphore is the sole throttle: the admission loop takes one permit per
/// task and each task returns its permit when it finishes. Shutdown is two
/// phased - once the line channel closes the loop stops admitting, waits for
/// every in-flight task to finish, and only then lets the entry channel close.
/// Nothing can publish after close.
///
/// Parse failures go to the observer and drop that line's contribution; they
/// never stop the pool. Entries arrive downstream in task completion order,
/// not input order - consumers sort by the carried `line_index` if they care.
pub(crate) struct MapperPool<F, E> {
    pub(crate) map_fn: Arc<F>,
    pub(crate) limits: Limits,
    pub(crate) observer: Arc<dyn ErrorObserver<E>>,
}

impl<F, Fut, T, E> MapperPool<F, E>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn spawn(self, mut lines: Receiver<RawLine>) -> (Receiver<Indexed<T>>, JoinHandle<()>) {
        let (entry_sender, entry_receiver) = mpsc::channel(self.limits.buffer);
        let semaphore = Arc::new(Semaphore::new(self.limits.concurrency));

        let h = tokio::spawn(async move {
            let mut in_flight = JoinSet::new();

            loop {
                // The permit is taken before the line so a full pool exerts
                // backpressure on the source instead of buffering lines here.
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let Some(RawLine { text, line_index }) = lines.recv().await else {
                    // Source exhausted. The permit drops unused; stop admitting.
                    break;
                };

                let map_fn = Arc::clone(&self.map_fn);
                let observer = Arc::clone(&self.observer);
                let entry_sender = entry_sender.clone();

                in_flight.spawn(async move {
                    match (map_fn)(text).await {
                        Ok(value) => {
                            // Suspends while the entry channel is full. A send
                            // error means the reducer is gone; the entry is lost
                            // but the pool keeps draining.
                            let _ = entry_sender.send(Indexed { line_index, value }).await;
                        }
                        Err(error) => {
                            observer.on_error(PipelineError::Parse { line_index, error });
                        }
                    }
                    drop(permit);
                });
            }

            // Drain every admitted task before the entry sender drops. Tasks
            // hold clones of the sender, so the channel closes exactly once,
            // after the last in-flight publish.
            while in_flight.join_next().await.is_some() {}
        });

        (entry_receiver, h)
    }
}
