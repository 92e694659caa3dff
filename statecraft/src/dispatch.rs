//! The dispatch table: `event_code -> state_path_index -> candidates`.

use alloc::vec::Vec;

use crate::transition::{Action, Guard};

/// One precompiled candidate eligible for a given `(event, active-state)`
/// pair. Candidates at a slot are tried in declaration order; the first
/// whose guard passes executes.
#[derive(Clone)]
pub(crate) struct Candidate<Ctx, Bus> {
    /// Resolved destination path, outermost-first. For a history candidate
    /// this is the path *down to* the history anchor; the engine splices in
    /// the recorded suffix at dispatch time.
    pub destination: Vec<usize>,
    pub is_history: bool,
    pub is_deferred: bool,
    pub is_internal: bool,
    pub guard: Guard<Ctx, Bus>,
    pub action: Action<Ctx, Bus>,
}

/// Immutable, two-level lookup table produced once by the transition-table
/// compiler and never mutated afterwards.
pub(crate) struct DispatchTable<Ctx, Bus> {
    /// `rows[event_slot][state_index]` -> ordered candidates.
    rows: Vec<Vec<Vec<Candidate<Ctx, Bus>>>>,
    states: usize,
}

impl<Ctx, Bus> DispatchTable<Ctx, Bus> {
    pub(crate) fn new(event_slots: usize, states: usize) -> Self {
        DispatchTable {
            rows: (0..event_slots).map(|_| (0..states).map(|_| Vec::new()).collect()).collect(),
            states,
        }
    }

    pub(crate) fn push(&mut self, event_slot: usize, state_index: usize, candidate: Candidate<Ctx, Bus>) {
        debug_assert!(event_slot < self.rows.len(), "event slot out of range");
        debug_assert!(state_index < self.states, "state index out of range");
        self.rows[event_slot][state_index].push(candidate);
    }

    pub(crate) fn lookup(&self, event_slot: usize, state_index: usize) -> &[Candidate<Ctx, Bus>] {
        &self.rows[event_slot][state_index]
    }
}
