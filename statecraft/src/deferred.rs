//! Deferred-event queue: a FIFO of event codes postponed by the active
//! state, replayed once a subsequent transition succeeds.

use alloc::collections::VecDeque;

/// Grows without bound (matching the reference implementation's "unbounded
/// growth with a high-water warning" policy) but tracks the highest length
/// it has ever reached, so a caller can compare that against its own
/// threshold to detect events nothing ever consumes; see
/// [`DeferredQueue::high_water_mark`].
pub(crate) struct DeferredQueue {
    queue: VecDeque<u16>,
    high_water: usize,
}

impl DeferredQueue {
    pub(crate) fn new() -> Self {
        DeferredQueue {
            queue: VecDeque::new(),
            high_water: 0,
        }
    }

    pub(crate) fn push(&mut self, event: u16) {
        self.queue.push_back(event);
        if self.queue.len() > self.high_water {
            self.high_water = self.queue.len();
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Highest length this queue has ever reached. Compare against a
    /// caller-chosen threshold to detect events nobody ever consumes.
    pub(crate) fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Discards every queued event. Used on actor shutdown.
    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }

    /// Drains the queue once, calling `f` for each event in arrival order.
    /// `f` is expected to process the event and, if it defers again, push it
    /// straight back via [`push`](Self::push). Bounding the pass to the
    /// queue's length when the pass started means a freshly re-deferred
    /// event is not revisited until the *next* pass, which rules out
    /// livelock.
    pub(crate) fn drain_once(&mut self, mut f: impl FnMut(u16)) {
        let rounds = self.queue.len();
        for _ in 0..rounds {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            f(event);
        }
    }
}
