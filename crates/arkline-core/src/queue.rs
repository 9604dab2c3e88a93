//! Bounded, closable queue feeding the worker pool
//!
//! Uses `Mutex + Condvar` from std — no external dependencies.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// Bounded multi-producer multi-consumer queue with close semantics.
///
/// [`push`](UnitQueue::push) blocks while the queue is at capacity, so a
/// producer enumerating units is throttled to match consumer throughput.
/// [`pop`](UnitQueue::pop) blocks until an item arrives and returns `None`
/// once the queue has been closed and drained.
pub struct UnitQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

struct State<T> {
    items: VecDeque<T>,
    capacity: usize,
    closed: bool,
}

impl<T> UnitQueue<T> {
    /// Create a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Block until there is room, then enqueue `item`.
    ///
    /// Returns `false` if the queue was closed in the meantime; the item is
    /// dropped.
    pub fn push(&self, item: T) -> bool {
        let mut state = self.state.lock().unwrap();
        while state.items.len() >= state.capacity && !state.closed {
            state = self.not_full.wait(state).unwrap();
        }
        if state.closed {
            return false;
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
        true
    }

    /// Block until an item is available. `None` means closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self.not_empty.wait(state).unwrap();
        }
    }

    /// Close the queue. No further pushes are accepted; consumers drain
    /// what remains, then observe the end of the queue.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Items currently queued.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let q = UnitQueue::new(4);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        q.close();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn pop_after_close_drains_remaining() {
        let q = UnitQueue::new(2);
        q.push("a");
        q.close();
        assert_eq!(q.pop(), Some("a"));
        assert_eq!(q.pop(), None);
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn push_after_close_rejected() {
        let q = UnitQueue::new(2);
        q.close();
        assert!(!q.push(1));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn blocked_pop_wakes_on_push() {
        let q = Arc::new(UnitQueue::new(1));
        let q2 = q.clone();
        let handle = std::thread::spawn(move || q2.pop());
        std::thread::sleep(Duration::from_millis(50));
        q.push(7);
        assert_eq!(handle.join().unwrap(), Some(7));
    }

    #[test]
    fn full_queue_blocks_producer() {
        let q = Arc::new(UnitQueue::new(1));
        q.push(1);

        let q2 = q.clone();
        let producer = std::thread::spawn(move || q2.push(2));

        // Producer is stuck until a consumer makes room
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(q.len(), 1);

        assert_eq!(q.pop(), Some(1));
        assert!(producer.join().unwrap());
        assert_eq!(q.pop(), Some(2));
    }

    #[test]
    fn blocked_producer_unblocks_on_close() {
        let q = Arc::new(UnitQueue::new(1));
        q.push(1);

        let q2 = q.clone();
        let producer = std::thread::spawn(move || q2.push(2));
        std::thread::sleep(Duration::from_millis(50));
        q.close();

        // Push fails rather than hanging forever
        assert!(!producer.join().unwrap());
    }

    #[test]
    fn many_producers_many_consumers() {
        let q = Arc::new(UnitQueue::new(4));
        let mut producers = Vec::new();
        for p in 0..4 {
            let q = q.clone();
            producers.push(std::thread::spawn(move || {
                for i in 0..25 {
                    q.push(p * 100 + i);
                }
            }));
        }

        let mut consumers = Vec::new();
        for _ in 0..3 {
            let q = q.clone();
            consumers.push(std::thread::spawn(move || {
                let mut count = 0usize;
                while q.pop().is_some() {
                    count += 1;
                }
                count
            }));
        }

        for p in producers {
            p.join().unwrap();
        }
        q.close();

        let total: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
        assert_eq!(total, 100);
    }
}
