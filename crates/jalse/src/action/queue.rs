//! # WorkQueue
//!
//! A min-heap of action contexts ordered by estimated fire time, with lazy
//! deletion: a context cancelled or rescheduled while still sitting in the
//! heap is dropped the next time it would otherwise be popped, rather than
//! being removed eagerly. Every operation is thread-safe.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::context::ActionContext;

struct HeapEntry<T> {
    estimated: Instant,
    generation: u64,
    ctx: Arc<ActionContext<T>>,
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated == other.estimated
    }
}
impl<T> Eq for HeapEntry<T> {}
impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest time sorts highest.
        other.estimated.cmp(&self.estimated)
    }
}

pub(crate) struct WorkQueue<T> {
    heap: Mutex<BinaryHeap<HeapEntry<T>>>,
    ready: Condvar,
}

impl<T> WorkQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            ready: Condvar::new(),
        }
    }

    pub(crate) fn add(&self, ctx: Arc<ActionContext<T>>) {
        let estimated = ctx.estimated();
        let generation = ctx.generation();
        let mut heap = self.heap.lock();
        heap.push(HeapEntry {
            estimated,
            generation,
            ctx,
        });
        self.ready.notify_all();
    }

    /// Pops the earliest context if, and only if, it is ready now and still
    /// the live scheduling of that context (not a stale heap entry left by a
    /// cancel or an earlier cycle of a periodic re-schedule).
    pub(crate) fn poll_ready(&self) -> Option<Arc<ActionContext<T>>> {
        let mut heap = self.heap.lock();
        loop {
            match heap.peek() {
                Some(top) if top.estimated <= Instant::now() => {
                    let top = heap.pop().expect("peeked entry must be present");
                    if top.generation != top.ctx.generation() || top.ctx.is_done() {
                        continue;
                    }
                    return Some(top.ctx);
                }
                _ => return None,
            }
        }
    }

    pub(crate) fn await_next_ready(&self, fallback: Duration) {
        let mut heap = self.heap.lock();
        let deadline = match heap.peek() {
            Some(top) => top.estimated,
            None => {
                self.ready.wait_for(&mut heap, fallback);
                return;
            }
        };
        let now = Instant::now();
        if deadline > now {
            self.ready.wait_for(&mut heap, deadline - now);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub(crate) fn clear(&self) -> Vec<Arc<ActionContext<T>>> {
        let mut heap = self.heap.lock();
        let drained = heap.drain().map(|e| e.ctx).collect();
        self.ready.notify_all();
        drained
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<ActionContext<T>>> {
        self.heap.lock().iter().map(|e| Arc::clone(&e.ctx)).collect()
    }

    pub(crate) fn notify(&self) {
        self.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Bindings;
    use crate::error::JalseResult;

    struct NoopAction;
    impl super::super::context::Action<()> for NoopAction {
        fn perform(&self, _ctx: &ActionContext<()>) -> JalseResult<()> {
            Ok(())
        }
    }

    #[test]
    fn poll_ready_respects_ordering() {
        let queue: WorkQueue<()> = WorkQueue::new();
        let bindings = Bindings::new();
        let late = ActionContext::new(std::sync::Weak::new(), Arc::new(NoopAction), &bindings);
        let early = ActionContext::new(std::sync::Weak::new(), Arc::new(NoopAction), &bindings);

        late.set_initial_delay(Duration::from_millis(0));
        early.set_initial_delay(Duration::from_millis(0));

        // Force distinguishable estimated times without sleeping in a test.
        queue.add(Arc::clone(&early));
        std::thread::sleep(Duration::from_millis(5));
        queue.add(Arc::clone(&late));

        let first = queue.poll_ready().unwrap();
        assert_eq!(first.id(), early.id());
        let second = queue.poll_ready().unwrap();
        assert_eq!(second.id(), late.id());
        assert!(queue.poll_ready().is_none());
    }

    #[test]
    fn cancelled_entry_is_skipped_lazily() {
        let queue: WorkQueue<()> = WorkQueue::new();
        let bindings = Bindings::new();
        let ctx = ActionContext::new(std::sync::Weak::new(), Arc::new(NoopAction), &bindings);
        queue.add(Arc::clone(&ctx));
        ctx.cancel();
        assert!(queue.poll_ready().is_none());
    }
}
