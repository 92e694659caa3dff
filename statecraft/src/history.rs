//! History store: per-composite snapshots of the sub-path that was active
//! the last time a composite state was exited.

use alloc::vec::Vec;

/// One slot per state-map index. Only composite states with a reachable
/// `history(...)` target ever get a non-empty entry; leaves keep `None`
/// forever.
pub(crate) struct HistoryStore {
    slots: Vec<Option<Vec<usize>>>,
}

impl HistoryStore {
    pub(crate) fn new(states: usize) -> Self {
        HistoryStore {
            slots: (0..states).map(|_| None).collect(),
        }
    }

    pub(crate) fn record(&mut self, index: usize, suffix: &[usize]) {
        self.slots[index] = Some(suffix.to_vec());
    }

    pub(crate) fn recall(&self, index: usize) -> Option<&[usize]> {
        self.slots[index].as_deref()
    }
}
