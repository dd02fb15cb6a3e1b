use std::sync::Arc;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc::{self, Receiver},
    task::JoinHandle,
};

use crate::error::{ErrorObserver, PipelineError};

/// One raw input line, tagged with its 1-based position in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLine {
    pub(crate) text: String,
    pub(crate) line_index: u64,
}

/// A value annotated with the 1-based index of the input line it was parsed from.
///
/// Entries arrive at the reducer in whatever order the mapping tasks finish.
/// Order-sensitive reducers sort by `line_index` to recover input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed<T> {
    pub line_index: u64,
    pub value: T,
}

/// Reads an input stream line by line and publishes each line to the mapper pool.
///
/// The output channel has capacity 1 - the source holds at most one line in
/// flight and suspends until a mapping task takes it. Line indices start at 1
/// and increase with no gaps. A read error stops the source immediately: the
/// error goes to the observer and the channel closes, so downstream stages
/// drain and finish with fewer items instead of hanging.
pub(crate) struct LineSource<In, E> {
    pub(crate) input: In,
    pub(crate) observer: Arc<dyn ErrorObserver<E>>,
}

impl<In, E> LineSource<In, E>
where
    In: AsyncRead + Send + Unpin + 'static,
    E: Send + 'static,
{
    pub(crate) fn spawn(self) -> (Receiver<RawLine>, JoinHandle<()>) {
        let (line_sender, line_receiver) = mpsc::channel(1);

        let h = tokio::spawn(async move {
            let mut lines = BufReader::new(self.input).lines();
            let mut line_index = 0u64;

            loop {
                match lines.next_line().await {
                    Ok(Some(text)) => {
                        line_index += 1;
                        let line = RawLine { text, line_index };
                        if let Err(_e) = line_sender.send(line).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(source) => {
                        self.observer.on_error(PipelineError::Read {
                            line_index: line_index + 1,
                            source,
                        });
                        break;
                    }
                }
            }
        });

        (line_receiver, h)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::Ignore;
    use crate::test_utils::FailingReader;

    fn source(input: impl AsyncRead + Send + Unpin + 'static) -> LineSource<impl AsyncRead + Send + Unpin + 'static, String> {
        LineSource {
            input,
            observer: Arc::new(Ignore),
        }
    }

    #[tokio::test]
    async fn lines_are_indexed_from_one() {
        let (mut lines, h) = source(&b"a\nb\nc"[..]).spawn();

        assert_eq!(
            lines.recv().await,
            Some(RawLine {
                text: "a".to_string(),
                line_index: 1
            })
        );
        assert_eq!(
            lines.recv().await,
            Some(RawLine {
                text: "b".to_string(),
                line_index: 2
            })
        );
        assert_eq!(
            lines.recv().await,
            Some(RawLine {
                text: "c".to_string(),
                line_index: 3
            })
        );
        assert_eq!(lines.recv().await, None);

        h.await.unwrap();
    }

    #[tokio::test]
    async fn terminators_are_stripped() {
        let (mut lines, h) = source(&b"a\r\nb\n"[..]).spawn();

        assert_eq!(lines.recv().await.unwrap().text, "a");
        assert_eq!(lines.recv().await.unwrap().text, "b");
        assert_eq!(lines.recv().await, None);

        h.await.unwrap();
    }

    #[tokio::test]
    async fn read_error_closes_the_channel_and_reaches_the_observer() {
        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_by_observer = Arc::clone(&seen);

        let source: LineSource<_, String> = LineSource {
            input: FailingReader::after(b"a\nb\n"),
            observer: Arc::new(move |error: PipelineError<String>| {
                assert!(matches!(error, PipelineError::Read { .. }));
                seen_by_observer.lock().unwrap().push(error.line_index());
            }),
        };
        let (mut lines, h) = source.spawn();

        assert_eq!(lines.recv().await.unwrap().line_index, 1);
        assert_eq!(lines.recv().await.unwrap().line_index, 2);
        assert_eq!(lines.recv().await, None);

        h.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn source_stops_when_the_receiver_is_dropped() {
        let (lines, h) = source(&b"a\nb\nc"[..]).spawn();

        drop(lines);

        h.await.unwrap();
    }
}
