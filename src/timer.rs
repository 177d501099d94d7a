use futures::task::AtomicWaker;
use std::{
    cmp::{Ordering as CmpOrdering, Reverse},
    collections::BinaryHeap,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    task::{Context, Poll},
    time::Instant,
};

// a simple leaf future, completed by the executor once its deadline is due
pub struct TimerFuture {
    shared_state: Arc<SharedState>,
}

struct SharedState {
    completed: AtomicBool,
    // set once the future is dropped; the queue discards the entry
    cancelled: AtomicBool,
    waker: AtomicWaker,
}

impl Future for TimerFuture {
    type Output = ();
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // quick check to avoid registration if already done.
        if self.shared_state.completed.load(Ordering::Acquire) {
            return Poll::Ready(());
        }

        self.shared_state.waker.register(cx.waker());

        // Need to check condition **after** `register` to avoid a race
        // condition that would result in lost notifications.
        if self.shared_state.completed.load(Ordering::Acquire) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl TimerFuture {
    /// Registers a timer due at `deadline` on `queue`.
    pub fn new(deadline: Instant, queue: &TimerQueue) -> Self {
        let shared_state = Arc::new(SharedState {
            completed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            waker: AtomicWaker::new(),
        });
        queue.push(deadline, shared_state.clone());
        TimerFuture { shared_state }
    }

    pub fn is_elapsed(&self) -> bool {
        self.shared_state.completed.load(Ordering::Acquire)
    }
}

impl Drop for TimerFuture {
    fn drop(&mut self) {
        self.shared_state.cancelled.store(true, Ordering::Release);
    }
}

struct Entry {
    deadline: Instant,
    // registration order; breaks ties between equal deadlines
    seq: u64,
    state: Arc<SharedState>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

#[derive(Default)]
struct Inner {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

/// Pending timers ordered by deadline, then by registration.
#[derive(Default)]
pub struct TimerQueue {
    inner: Mutex<Inner>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, deadline: Instant, state: Arc<SharedState>) {
        let mut inner = self.inner.lock().unwrap();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        tracing::trace!(seq, "timer registered");
        inner.heap.push(Reverse(Entry {
            deadline,
            seq,
            state,
        }));
    }

    /// Earliest deadline still awaited. Dropped timers at the front are
    /// discarded on the way.
    pub fn next_deadline(&self) -> Option<Instant> {
        let mut inner = self.inner.lock().unwrap();
        while let Some(Reverse(entry)) = inner.heap.peek() {
            if !entry.state.cancelled.load(Ordering::Acquire) {
                return Some(entry.deadline);
            }
            tracing::trace!(seq = entry.seq, "dropped timer discarded");
            inner.heap.pop();
        }
        None
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().heap.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Completes every timer due at or before `now`, waking its task.
    /// Returns how many fired.
    pub fn fire_expired(&self, now: Instant) -> usize {
        // collect first so wakers run without holding the lock
        let mut due = Vec::new();
        {
            let mut inner = self.inner.lock().unwrap();
            while let Some(Reverse(entry)) = inner.heap.peek() {
                if entry.deadline > now {
                    break;
                }
                if let Some(Reverse(entry)) = inner.heap.pop() {
                    if !entry.state.cancelled.load(Ordering::Acquire) {
                        due.push(entry);
                    }
                }
            }
        }
        for entry in &due {
            tracing::trace!(seq = entry.seq, "timer fired");
            entry.state.completed.store(true, Ordering::Release);
            entry.state.waker.wake();
        }
        due.len()
    }
}
