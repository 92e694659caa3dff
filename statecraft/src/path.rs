//! The active-state path: a bounded stack of dense state-path indices,
//! outermost (root) first.

use heapless::Vec as HVec;

use crate::error::EngineError;

/// A path stack bounded at compile time by `DEPTH`, the maximum nesting
/// depth observed by the transition-table compiler. Pushing past `DEPTH`
/// is a construction-time bug (the compiler validates depth up front), so
/// in steady state this never allocates and never overflows.
#[derive(Clone)]
pub(crate) struct ActivePath<const DEPTH: usize> {
    indices: HVec<usize, DEPTH>,
}

impl<const DEPTH: usize> ActivePath<DEPTH> {
    pub(crate) fn new() -> Self {
        ActivePath { indices: HVec::new() }
    }

    pub(crate) fn push(&mut self, index: usize) -> Result<(), EngineError> {
        self.indices.push(index).map_err(|_| EngineError::DepthExceeded)
    }

    pub(crate) fn pop(&mut self) -> Option<usize> {
        self.indices.pop()
    }

    pub(crate) fn top(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub(crate) fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub(crate) fn len(&self) -> usize {
        self.indices.len()
    }

    /// Length of the common prefix shared with `other`.
    pub(crate) fn common_prefix_len(&self, other: &[usize]) -> usize {
        self.indices.iter().zip(other.iter()).take_while(|(a, b)| a == b).count()
    }
}
