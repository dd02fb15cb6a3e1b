use std::{
    io,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, ReadBuf};

/// Tracks how many tracked sections run at once, and the highest count seen.
/// Used to assert that the mapper pool respects its concurrency limit.
#[derive(Clone)]
pub struct ConcurrencyGauge {
    current: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
}

pub struct GaugeSlot {
    current: Arc<AtomicUsize>,
}

impl ConcurrencyGauge {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicUsize::new(0)),
            max_seen: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enters a tracked section. The section ends when the returned slot drops.
    pub fn enter(&self) -> GaugeSlot {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);

        GaugeSlot {
            current: Arc::clone(&self.current),
        }
    }

    pub fn max_seen(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }
}

impl Drop for GaugeSlot {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An `AsyncRead` that yields the given bytes, then fails with `BrokenPipe`
pub struct FailingReader {
    remaining: &'static [u8],
}

impl FailingReader {
    pub fn after(bytes: &'static [u8]) -> Self {
        Self { remaining: bytes }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.remaining.is_empty() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "input stream broke",
            )));
        }

        let n = self.remaining.len().min(buf.remaining());
        let (chunk, rest) = self.remaining.split_at(n);
        buf.put_slice(chunk);
        self.remaining = rest;

        Poll::Ready(Ok(()))
    }
}
