//! Bounded byte conduit coupling an extraction process to an upload
//!
//! The writer half is owned by the task draining the extractor's stdout,
//! the reader half by the upload task. Writes block while the buffer is
//! full and reads block while it is empty, so a fast producer can never
//! outrun a slow consumer by more than the buffer capacity. Either side
//! can poison the conduit; the other side's next operation then fails.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex};

/// Default buffer capacity (4 MiB)
pub const DEFAULT_CONDUIT_CAPACITY: usize = 4 * 1024 * 1024;

struct Shared {
    state: Mutex<State>,
    readable: Condvar,
    writable: Condvar,
}

struct State {
    buf: VecDeque<u8>,
    capacity: usize,
    write_closed: bool,
    read_closed: bool,
    failure: Option<String>,
}

/// Create a conduit with the given buffer capacity.
///
/// Returns the two directional halves. Dropping the writer signals
/// end-of-stream to the reader; dropping the reader makes further writes
/// fail with `BrokenPipe`.
pub fn conduit(capacity: usize) -> (ConduitWriter, ConduitReader) {
    assert!(capacity > 0, "conduit capacity must be non-zero");
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            buf: VecDeque::with_capacity(capacity),
            capacity,
            write_closed: false,
            read_closed: false,
            failure: None,
        }),
        readable: Condvar::new(),
        writable: Condvar::new(),
    });
    (
        ConduitWriter {
            shared: shared.clone(),
        },
        ConduitReader { shared },
    )
}

/// Producer half of a conduit.
pub struct ConduitWriter {
    shared: Arc<Shared>,
}

/// Consumer half of a conduit.
pub struct ConduitReader {
    shared: Arc<Shared>,
}

fn poison(shared: &Shared, msg: String) {
    let mut state = shared.state.lock().unwrap();
    if state.failure.is_none() {
        state.failure = Some(msg);
    }
    shared.readable.notify_all();
    shared.writable.notify_all();
}

impl ConduitWriter {
    /// Poison the conduit: the reader's next read fails with `msg` even if
    /// buffered bytes remain. Used when the producer learns its stream is
    /// truncated (e.g. the extraction process exited non-zero).
    pub fn fail(&self, msg: impl Into<String>) {
        poison(&self.shared, msg.into());
    }
}

impl Write for ConduitWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock().unwrap();
        loop {
            if let Some(msg) = &state.failure {
                return Err(io::Error::other(msg.clone()));
            }
            if state.read_closed {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "conduit reader dropped",
                ));
            }
            let room = state.capacity - state.buf.len();
            if room > 0 {
                let n = room.min(data.len());
                state.buf.extend(&data[..n]);
                self.shared.readable.notify_one();
                return Ok(n);
            }
            state = self.shared.writable.wait(state).unwrap();
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConduitWriter {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock().unwrap();
        state.write_closed = true;
        self.shared.readable.notify_all();
    }
}

impl ConduitReader {
    /// Poison the conduit: the writer's next write fails with `msg`.
    pub fn fail(&self, msg: impl Into<String>) {
        poison(&self.shared, msg.into());
    }
}

impl Read for ConduitReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock().unwrap();
        loop {
            // A poisoned conduit must never look like a clean end-of-stream
            if let Some(msg) = &state.failure {
                return Err(io::Error::other(msg.clone()));
            }
            if !state.buf.is_empty() {
                let n = out.len().min(state.buf.len());
                for (dst, b) in out[..n].iter_mut().zip(state.buf.drain(..n)) {
                    *dst = b;
                }
                self.shared.writable.notify_one();
                return Ok(n);
            }
            if state.write_closed {
                return Ok(0);
            }
            state = self.shared.readable.wait(state).unwrap();
        }
    }
}

impl Drop for ConduitReader {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock().unwrap();
        state.read_closed = true;
        self.shared.writable.notify_all();
    }
}
