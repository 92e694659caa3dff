//! The transition-table compiler.
//!
//! Turns the recursive graph of `make_transition_table`/`make_internal_transition_table`
//! calls reachable from a root state into the flat, immutable artifacts the
//! engine runs against: a dense state map, a two-level dispatch table, and
//! the initial active-state path. This runs once, when an `Hsm` is
//! constructed; see [`crate::engine::Hsm::new`].

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::TypeId;
use core::time::Duration;

use crate::dispatch::{Candidate, DispatchTable};
use crate::error::CompileError;
use crate::event::{table_width, EventCode, EventSlot};
use crate::state::{state, Behavior, ErasedState, State, StateRef};
use crate::transition::{Source, Target, TransitionRow};

/// One entry of the state map: a discovered `(state, ancestor-chain)` tuple,
/// recorded at the dense index it was assigned. `path` is root-first,
/// inclusive of this state itself.
struct MapEntry<Ctx, Bus> {
    type_id: TypeId,
    path: Vec<TypeId>,
    state_ref: StateRef<Ctx, Bus>,
}

/// A declared row, tagged with the depth of the state whose table it came
/// from. Outer-declared rows sort before inner ones for the same event, so
/// an ancestor can intercept an event its descendants also handle.
struct Flat<Ctx, Bus> {
    decl_depth: usize,
    order: usize,
    row: TransitionRow<Ctx, Bus>,
}

/// Output of [`compile`]: everything an `Hsm` needs to run, plus bookkeeping
/// the engine consults for `update`/`current_state_name`.
pub(crate) struct Compiled<Ctx, Bus> {
    pub(crate) dispatch: DispatchTable<Ctx, Bus>,
    pub(crate) state_names: Vec<&'static str>,
    pub(crate) type_ids: Vec<TypeId>,
    pub(crate) constructors: Vec<fn() -> Box<dyn ErasedState<Ctx, Bus>>>,
    pub(crate) behavior_ctors: Vec<fn() -> Vec<Box<dyn Behavior<Ctx, Bus>>>>,
    pub(crate) update_intervals: Vec<Option<Duration>>,
    pub(crate) default_children: Vec<Option<usize>>,
    pub(crate) initial_path: Vec<usize>,
    pub(crate) has_history: bool,
    pub(crate) event_slots: usize,
    pub(crate) max_depth: usize,
}

/// Compiles the graph reachable from `Root`. Fails only on malformed
/// declarations (see [`CompileError`]); a successful result's dispatch table
/// is then immutable for the life of the `Hsm`.
pub(crate) fn compile<Root, Ctx, Bus, E>() -> Result<Compiled<Ctx, Bus>, CompileError>
where
    Root: State<Ctx, Bus>,
    E: EventCode,
{
    let root_ref = state::<Root, Ctx, Bus>();
    let map = discover(root_ref.clone())?;

    let max_depth = map.iter().map(|e| e.path.len()).max().unwrap_or(1);
    let event_slots = table_width::<E>();
    let mut dispatch = DispatchTable::new(event_slots, map.len());
    let mut has_history = false;

    let mut flats = collect_flats(&map);
    flats.sort_by_key(|f| (f.decl_depth, f.order));

    for flat in &flats {
        let source_indices = resolve_source(&flat.row.source, root_ref.type_id, &map)?;
        let event_slot = match flat.row.event {
            EventSlot::Event(code) => code as usize,
            EventSlot::Anonymous => event_slots - 1,
        };

        if flat.row.internal {
            for &leaf in &source_indices {
                dispatch.push(
                    event_slot,
                    leaf,
                    Candidate {
                        destination: chain_to(leaf, &map),
                        is_history: false,
                        is_deferred: false,
                        is_internal: true,
                        guard: flat.row.guard.clone(),
                        action: flat.row.action.clone(),
                    },
                );
            }
            continue;
        }

        let (destination, is_history_target) = resolve_target(&flat.row.target, root_ref.type_id, &map)?;
        has_history |= is_history_target;

        for &leaf in &source_indices {
            dispatch.push(
                event_slot,
                leaf,
                Candidate {
                    destination: destination.clone(),
                    is_history: is_history_target,
                    is_deferred: false,
                    is_internal: false,
                    guard: flat.row.guard.clone(),
                    action: flat.row.action.clone(),
                },
            );
        }
    }

    // Deferred events are the lowest-priority fallback: appended after every
    // real candidate in their slot, so an inherited transition still wins
    // over deferral if its guard passes.
    for (idx, entry) in map.iter().enumerate() {
        for &code in entry.state_ref.defer_events {
            dispatch.push(
                code as usize,
                idx,
                Candidate {
                    destination: Vec::new(),
                    is_history: false,
                    is_deferred: true,
                    is_internal: false,
                    guard: always_true(),
                    action: noop(),
                },
            );
        }
    }

    let initial_path = descend_initial(0, &map);
    let default_children = (0..map.len())
        .map(|idx| map[idx].state_ref.initial_child.as_ref().map(|c| index_of(c.type_id, &map).expect("initial child registered during discovery")))
        .collect();

    Ok(Compiled {
        dispatch,
        state_names: map.iter().map(|e| e.state_ref.name).collect(),
        type_ids: map.iter().map(|e| e.type_id).collect(),
        constructors: map.iter().map(|e| e.state_ref.construct).collect(),
        behavior_ctors: map.iter().map(|e| e.state_ref.behaviors).collect(),
        update_intervals: map.iter().map(|e| e.state_ref.update_interval).collect(),
        default_children,
        initial_path,
        has_history,
        event_slots,
        max_depth,
    })
}

/// Phase A: discovers every reachable `(state, ancestor-chain)` tuple by
/// walking `make_transition_table`/`initial_child` from the root, plus any
/// pseudo-state reference's explicit parent chain.
fn discover<Ctx, Bus>(root_ref: StateRef<Ctx, Bus>) -> Result<Vec<MapEntry<Ctx, Bus>>, CompileError> {
    let mut map: Vec<MapEntry<Ctx, Bus>> = Vec::new();
    let root_type = root_ref.type_id;
    let mut worklist: Vec<(StateRef<Ctx, Bus>, Vec<TypeId>)> = vec![(root_ref, vec![root_type])];

    while let Some((state_ref, path)) = worklist.pop() {
        if let Some(existing) = map.iter().find(|e| e.type_id == state_ref.type_id) {
            if existing.path != path {
                return Err(CompileError::DuplicateTypeRegistration { state: state_ref.name });
            }
            continue;
        }

        let rows = (state_ref.transitions)();
        if !rows.is_empty() && state_ref.initial_child.is_none() {
            return Err(CompileError::MissingInitialChild { state: state_ref.name });
        }

        let mut children: Vec<StateRef<Ctx, Bus>> = Vec::new();
        if let Some(initial) = &state_ref.initial_child {
            children.push((**initial).clone());
        }
        for row in &rows {
            if let Source::Bare(s) = &row.source {
                children.push(s.clone());
            }
            if let Target::Bare(s) = &row.target {
                children.push(s.clone());
            }
            enqueue_pseudo_refs(&row.source, &row.target, root_type, &mut worklist);
        }

        for child in children {
            let mut child_path = path.clone();
            child_path.push(child.type_id);
            worklist.push((child.clone(), child_path));
        }

        map.push(MapEntry {
            type_id: state_ref.type_id,
            path,
            state_ref,
        });
    }

    let root_pos = map.iter().position(|e| e.type_id == root_type).expect("root always registered");
    map.swap(0, root_pos);
    Ok(map)
}

fn collect_flats<Ctx, Bus>(map: &[MapEntry<Ctx, Bus>]) -> Vec<Flat<Ctx, Bus>> {
    let mut order = 0usize;
    let mut flats = Vec::new();
    for entry in map {
        let decl_depth = entry.path.len() - 1;
        for row in (entry.state_ref.transitions)() {
            flats.push(Flat { decl_depth, order, row });
            order += 1;
        }
        for internal_row in (entry.state_ref.internal_transitions)() {
            let row = TransitionRow {
                source: Source::Bare(entry.state_ref.clone()),
                event: internal_row.event,
                guard: internal_row.guard,
                action: internal_row.action,
                target: Target::Bare(entry.state_ref.clone()),
                internal: true,
            };
            flats.push(Flat { decl_depth, order, row });
            order += 1;
        }
    }
    flats
}

fn index_of<Ctx, Bus>(id: TypeId, map: &[MapEntry<Ctx, Bus>]) -> Option<usize> {
    map.iter().position(|e| e.type_id == id)
}

fn path_to_index<Ctx, Bus>(path: &[TypeId], map: &[MapEntry<Ctx, Bus>]) -> Option<usize> {
    map.iter().position(|e| e.path == path)
}

fn is_leaf<Ctx, Bus>(idx: usize, map: &[MapEntry<Ctx, Bus>]) -> bool {
    let path = &map[idx].path;
    !map.iter().any(|e| e.path.len() == path.len() + 1 && e.path[..path.len()] == path[..])
}

/// Every leaf whose path is at or below `idx`'s path, i.e. `idx` itself if
/// it's already a leaf, otherwise every descendant leaf.
fn leaves_under<Ctx, Bus>(idx: usize, map: &[MapEntry<Ctx, Bus>]) -> Vec<usize> {
    let path = map[idx].path.clone();
    (0..map.len())
        .filter(|&i| map[i].path.len() >= path.len() && map[i].path[..path.len()] == path[..])
        .filter(|&i| is_leaf(i, map))
        .collect()
}

/// Walks `initial_child` from `idx` down to a leaf, collecting every index
/// passed through along the way (inclusive of `idx` and the final leaf).
fn descend_initial<Ctx, Bus>(mut idx: usize, map: &[MapEntry<Ctx, Bus>]) -> Vec<usize> {
    let mut out = Vec::new();
    loop {
        out.push(idx);
        match &map[idx].state_ref.initial_child {
            Some(child) => idx = index_of(child.type_id, map).expect("initial child registered during discovery"),
            None => break,
        }
    }
    out
}

/// The chain of indices from the root down to (and including) `idx`, i.e.
/// every prefix of its path converted to a dense index.
fn chain_to<Ctx, Bus>(idx: usize, map: &[MapEntry<Ctx, Bus>]) -> Vec<usize> {
    let path = &map[idx].path;
    (1..=path.len())
        .map(|len| path_to_index(&path[..len], map).expect("every prefix of a registered path is itself registered"))
        .collect()
}

fn absolute_path<Ctx, Bus>(root: TypeId, named: TypeId, parents: &[StateRef<Ctx, Bus>]) -> Vec<TypeId> {
    let mut path = vec![root];
    path.extend(parents.iter().rev().map(|p| p.type_id));
    path.push(named);
    path
}

fn enqueue_pseudo_refs<Ctx, Bus>(
    source: &Source<Ctx, Bus>,
    target: &Target<Ctx, Bus>,
    root: TypeId,
    worklist: &mut Vec<(StateRef<Ctx, Bus>, Vec<TypeId>)>,
) {
    match source {
        Source::Exit(s, parents) | Source::Direct(s, parents) => {
            worklist.push((s.clone(), absolute_path(root, s.type_id, parents)));
        }
        Source::Bare(_) => {}
    }
    match target {
        Target::Entry(s, parents) | Target::Direct(s, parents) => {
            worklist.push((s.clone(), absolute_path(root, s.type_id, parents)));
        }
        Target::History(parents) => {
            if let Some(anchor) = parents.first() {
                let mut path = vec![root];
                path.extend(parents.iter().rev().map(|p| p.type_id));
                worklist.push((anchor.clone(), path));
            }
        }
        Target::Bare(_) => {}
    }
}

fn resolve_source<Ctx, Bus>(source: &Source<Ctx, Bus>, root: TypeId, map: &[MapEntry<Ctx, Bus>]) -> Result<Vec<usize>, CompileError> {
    match source {
        Source::Bare(s) => {
            let idx = index_of(s.type_id, map).ok_or(CompileError::UnreachableTarget { state: s.name })?;
            Ok(leaves_under(idx, map))
        }
        Source::Exit(s, parents) | Source::Direct(s, parents) => {
            let path = absolute_path(root, s.type_id, parents);
            let idx = path_to_index(&path, map).ok_or(CompileError::UnreachableTarget { state: s.name })?;
            Ok(vec![idx])
        }
    }
}

/// The full root-inclusive destination path for landing on `idx`: the
/// ancestor chain down to `idx` (via [`chain_to`]), extended by `idx`'s own
/// forward initial descent. Every [`Candidate::destination`] must be
/// root-inclusive like this, since `execute_transition` compares it against
/// the active path position-by-position (see `engine.rs`'s
/// `common_prefix_len`/`enter_path`) — `descend_initial` alone only covers
/// the suffix from `idx` downward and would desync that comparison at
/// position 0 for any target that isn't a direct child of the root.
fn full_descent<Ctx, Bus>(idx: usize, map: &[MapEntry<Ctx, Bus>]) -> Vec<usize> {
    let mut path = chain_to(idx, map);
    let descent = descend_initial(idx, map);
    path.extend_from_slice(&descent[1..]);
    path
}

fn resolve_target<Ctx, Bus>(target: &Target<Ctx, Bus>, root: TypeId, map: &[MapEntry<Ctx, Bus>]) -> Result<(Vec<usize>, bool), CompileError> {
    match target {
        Target::Bare(s) => {
            let idx = index_of(s.type_id, map).ok_or(CompileError::UnreachableTarget { state: s.name })?;
            Ok((full_descent(idx, map), false))
        }
        Target::Entry(s, parents) | Target::Direct(s, parents) => {
            let path = absolute_path(root, s.type_id, parents);
            let idx = path_to_index(&path, map).ok_or(CompileError::UnreachableTarget { state: s.name })?;
            Ok((full_descent(idx, map), false))
        }
        Target::History(parents) => {
            let mut path = vec![root];
            path.extend(parents.iter().rev().map(|p| p.type_id));
            let idx = path_to_index(&path, map).ok_or(CompileError::UnreachableTarget {
                state: parents.first().map(|p| p.name).unwrap_or("history"),
            })?;
            Ok((chain_to(idx, map), true))
        }
    }
}

fn always_true<Ctx, Bus>() -> crate::transition::Guard<Ctx, Bus> {
    Arc::new(|_: &mut Ctx, _: &mut Bus, _: u16| true)
}

fn noop<Ctx, Bus>() -> crate::transition::Action<Ctx, Bus> {
    Arc::new(|_: &mut Ctx, _: &mut Bus, _: u16| {})
}
