use std::collections::VecDeque;
use std::sync::Arc;

use log::trace;
use parking_lot::{Condvar, Mutex};

/// A bounded multi-producer / multi-consumer FIFO, shared between the stages
/// of a processing pipeline.
///
/// The queue is opened with a fixed `capacity` and a number of registered
/// `writers`. `push` blocks while the queue is full; `pop` blocks while the
/// queue is empty and at least one writer remains registered. Once every
/// writer has called [`BatchQueue::close_writer`] and the queue has drained,
/// `pop` returns `None` for every pending and subsequent call.
///
/// Cloning the handle is cheap and yields another view on the same queue.
/// FIFO order is preserved per producer; the interleaving across producers
/// is unspecified.
pub struct BatchQueue<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    name     : String,
    capacity : usize,
    state    : Mutex<State<T>>,
    not_empty: Condvar,
    not_full : Condvar,
}

struct State<T> {
    items  : VecDeque<T>,
    writers: usize,
}

impl<T> Clone for BatchQueue<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> BatchQueue<T> {
    /// Open a new queue holding at most `capacity` items, with `writers`
    /// registered producers. The `name` only shows up in trace logs.
    pub fn open(name: &str, capacity: usize, writers: usize) -> Self {
        let shared = Shared {
            name     : name.to_string(),
            capacity : capacity.max(1),
            state    : Mutex::new(State { items: VecDeque::with_capacity(capacity.max(1)), writers }),
            not_empty: Condvar::new(),
            not_full : Condvar::new(),
        };
        Self { shared: Arc::new(shared) }
    }

    /// Append an item at the back of the queue, blocking while the queue is
    /// at capacity.
    pub fn push(&self, item: T) {
        let mut state = self.shared.state.lock();
        while state.items.len() >= self.shared.capacity {
            self.shared.not_full.wait(&mut state);
        }
        state.items.push_back(item);
        drop(state);
        self.shared.not_empty.notify_one();
    }

    /// Remove the item at the front of the queue.
    ///
    /// Blocks while the queue is empty and writers remain. Returns `None`
    /// once the queue is both drained and closed (writer count at zero).
    pub fn pop(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.shared.not_full.notify_one();
                return Some(item)
            }
            if state.writers == 0 {
                return None
            }
            self.shared.not_empty.wait(&mut state);
        }
    }

    /// Deregister one producer. Closing the last writer wakes every pending
    /// `pop` so consumers can observe the end of the stream.
    pub fn close_writer(&self) {
        let mut state = self.shared.state.lock();
        debug_assert!(state.writers > 0, "queue '{}': writer count underflow", self.shared.name);
        state.writers = state.writers.saturating_sub(1);
        let closed = state.writers == 0;
        drop(state);
        if closed {
            trace!("queue '{}': last writer closed", self.shared.name);
            self.shared.not_empty.notify_all();
        }
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
