//! The runtime engine: active-path bookkeeping, dispatch, and the
//! exit/action/entry walk that executes a resolved transition.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;
use core::time::Duration;

use crate::compiler::{compile, Compiled};
use crate::deferred::DeferredQueue;
use crate::error::{CompileError, EngineError};
use crate::event::{anonymous_code, EventCode};
use crate::history::HistoryStore;
use crate::path::ActivePath;
use crate::state::{Behavior, ErasedState, State};

/// Upper bound on a chain of anonymous (completion) transitions fired back
/// to back after a single entry walk. A well-formed graph never approaches
/// this; it exists so a guard cycle degrades to a no-op instead of hanging.
const MAX_ANONYMOUS_CHAIN: usize = 64;

/// Supplies the current time for update-cadence bookkeeping. Implement this
/// over whatever clock the host environment provides; `statecraft-actor`
/// supplies a `std::time::Instant`-backed implementation.
pub trait Clock {
    /// Current time, as an offset from an arbitrary but fixed epoch.
    fn now(&self) -> Duration;
}

/// Outcome of feeding one event to an [`Hsm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// A transition (internal or external) executed.
    Success,
    /// The active state defers this event; it has been queued for replay
    /// after the next successful transition.
    Deferred,
    /// No candidate was declared for this event in the active state or any
    /// of its ancestors.
    Nothing,
    /// Candidates were declared, but every guard rejected the event.
    Failed,
    /// The transition's destination could not be entered; see [`EngineError`].
    Error(EngineError),
}

struct Frame<Ctx, Bus> {
    index: usize,
    instance: Box<dyn ErasedState<Ctx, Bus>>,
    behaviors: Vec<Box<dyn Behavior<Ctx, Bus>>>,
    last_update: Duration,
}

/// A compiled hierarchical state machine.
///
/// `DEPTH` bounds the nesting depth of the state graph; [`Hsm::new`] fails
/// with [`CompileError::DepthExceeded`] if `Root`'s graph needs more. `Ctx`
/// and `Bus` are threaded through every hook, guard, and action unchanged;
/// `Hsm` imposes no bounds on them beyond what the declared states need.
pub struct Hsm<Ctx, Bus, E, const DEPTH: usize = 16> {
    compiled: Compiled<Ctx, Bus>,
    type_ids: Vec<TypeId>,
    default_child: Vec<Option<usize>>,
    active: ActivePath<DEPTH>,
    frames: Vec<Frame<Ctx, Bus>>,
    history: HistoryStore,
    deferred: DeferredQueue,
    _event: core::marker::PhantomData<fn() -> E>,
}

impl<Ctx, Bus, E, const DEPTH: usize> Hsm<Ctx, Bus, E, DEPTH>
where
    E: EventCode,
{
    /// Compiles `Root`'s transition graph and enters its initial configuration.
    pub fn new<Root>(ctx: &mut Ctx, bus: &mut Bus) -> Result<Self, CompileError>
    where
        Root: State<Ctx, Bus>,
    {
        let compiled = compile::<Root, Ctx, Bus, E>()?;
        if compiled.max_depth > DEPTH {
            return Err(CompileError::DepthExceeded {
                observed: compiled.max_depth,
                max: DEPTH,
            });
        }

        let type_ids = compiled.type_ids.clone();
        let default_child = compiled.default_children.clone();
        let history = HistoryStore::new(compiled.state_names.len());
        let initial_path = compiled.initial_path.clone();

        let mut hsm = Hsm {
            compiled,
            type_ids,
            default_child,
            active: ActivePath::new(),
            frames: Vec::new(),
            history,
            deferred: DeferredQueue::new(),
            _event: core::marker::PhantomData,
        };

        hsm.enter_path(ctx, bus, &initial_path, Duration::ZERO)
            .map_err(|_| CompileError::DepthExceeded {
                observed: hsm.compiled.max_depth,
                max: DEPTH,
            })?;
        hsm.settle_anonymous(ctx, bus);
        Ok(hsm)
    }

    /// Feeds one event to the machine.
    pub fn process(&mut self, ctx: &mut Ctx, bus: &mut Bus, event: E) -> ProcessResult {
        let result = self.process_code(ctx, bus, event.code());
        if result == ProcessResult::Success {
            self.replay_deferred(ctx, bus);
        }
        result
    }

    /// Advances every active state (and its behaviors) whose
    /// [`State::update_interval`] has elapsed since it last fired.
    pub fn update(&mut self, ctx: &mut Ctx, bus: &mut Bus, clock: &dyn Clock) {
        let now = clock.now();
        for frame in &mut self.frames {
            let Some(interval) = self.compiled.update_intervals[frame.index] else {
                continue;
            };
            if now.saturating_sub(frame.last_update) >= interval {
                frame.instance.update(ctx, bus);
                for behavior in &mut frame.behaviors {
                    behavior.update(ctx, bus);
                }
                frame.last_update = now;
            }
        }
    }

    /// Whether the exact active leaf is of type `S`. Does not consider
    /// ancestors; see [`Hsm::is_in`] for an ancestor-inclusive query.
    pub fn is<S: 'static>(&self) -> bool {
        match self.active.top() {
            Some(idx) => self.type_ids[idx] == TypeId::of::<S>(),
            None => false,
        }
    }

    /// Whether `S` is the active leaf or any of its active ancestors. Not
    /// part of the transition semantics proper; a convenience for callers
    /// that want "currently somewhere under `S`" rather than an exact match.
    pub fn is_in<S: 'static>(&self) -> bool {
        let target = TypeId::of::<S>();
        self.active.as_slice().iter().any(|&idx| self.type_ids[idx] == target)
    }

    /// The reflected name of the active leaf, for logging and diagnostics.
    pub fn current_state_name(&self) -> &'static str {
        match self.active.top() {
            Some(idx) => self.compiled.state_names[idx],
            None => "<uninitialized>",
        }
    }

    /// High-water mark of the deferred-event queue, for detecting events
    /// that nothing ever consumes.
    pub fn deferred_high_water(&self) -> usize {
        self.deferred.high_water_mark()
    }

    /// Discards every currently-queued deferred event without replaying
    /// them. Per the engine's shutdown contract, a host (such as
    /// `statecraft-actor`'s run loop) calls this once it has decided to stop
    /// processing further events, rather than letting stale deferrals leak
    /// into whatever comes next.
    pub fn clear_deferred(&mut self) {
        self.deferred.clear();
    }

    fn process_code(&mut self, ctx: &mut Ctx, bus: &mut Bus, code: u16) -> ProcessResult {
        let Some(leaf) = self.active.top() else {
            return ProcessResult::Nothing;
        };
        let event_slot = if code == anonymous_code::<E>() {
            self.compiled.event_slots - 1
        } else {
            code as usize
        };

        #[cfg(feature = "log")]
        log::trace!("process(code={code}) from `{}`", self.compiled.state_names[leaf]);

        let candidates = self.compiled.dispatch.lookup(event_slot, leaf);
        if candidates.is_empty() {
            return ProcessResult::Nothing;
        }

        let mut saw_candidate = false;
        for i in 0..candidates.len() {
            let candidate = &self.compiled.dispatch.lookup(event_slot, leaf)[i];
            if candidate.is_deferred {
                self.deferred.push(code);
                #[cfg(feature = "log")]
                log::debug!("deferred code={code} from `{}`", self.compiled.state_names[leaf]);
                return ProcessResult::Deferred;
            }
            saw_candidate = true;
            if !(candidate.guard)(ctx, bus, code) {
                continue;
            }

            let action = candidate.action.clone();
            if candidate.is_internal {
                action(ctx, bus, code);
                #[cfg(feature = "log")]
                log::debug!("internal transition on code={code} in `{}`", self.compiled.state_names[leaf]);
                self.settle_anonymous(ctx, bus);
                return ProcessResult::Success;
            }

            let destination = self.resolve_destination(candidate);
            match self.execute_transition(ctx, bus, &destination, &action, code) {
                Ok(()) => {
                    #[cfg(feature = "log")]
                    log::debug!("transitioned to `{}` on code={code}", self.current_state_name());
                    self.settle_anonymous(ctx, bus);
                    return ProcessResult::Success;
                }
                Err(e) => return ProcessResult::Error(e),
            }
        }

        if saw_candidate {
            ProcessResult::Failed
        } else {
            ProcessResult::Nothing
        }
    }

    fn resolve_destination(&self, candidate: &crate::dispatch::Candidate<Ctx, Bus>) -> Vec<usize> {
        if !candidate.is_history {
            return candidate.destination.clone();
        }
        let anchor = *candidate.destination.last().expect("history destination names its anchor");
        let mut path = candidate.destination.clone();
        match self.history.recall(anchor) {
            Some(suffix) => path.extend_from_slice(suffix),
            None => {
                let mut idx = anchor;
                while let Some(child) = self.default_child[idx] {
                    path.push(child);
                    idx = child;
                }
            }
        }
        path
    }

    /// Runs the exit/action/entry walk for a resolved transition: records
    /// history for every composite being left, exits down to the least
    /// common ancestor, runs the action, then enters the new suffix.
    fn execute_transition(
        &mut self,
        ctx: &mut Ctx,
        bus: &mut Bus,
        destination: &[usize],
        action: &crate::transition::Action<Ctx, Bus>,
        code: u16,
    ) -> Result<(), EngineError> {
        let lca_len = self.active.common_prefix_len(destination);
        self.record_history(lca_len);
        self.exit_to(ctx, bus, lca_len);
        action(ctx, bus, code);
        self.enter_path(ctx, bus, destination, Duration::ZERO)
    }

    /// Snapshots the sub-path below every composite about to be exited, so a
    /// later `history(...)` target can restore it.
    fn record_history(&mut self, lca_len: usize) {
        let path = self.active.as_slice().to_vec();
        for depth in lca_len..path.len() {
            let idx = path[depth];
            if self.default_child[idx].is_some() {
                self.history.record(idx, &path[depth + 1..]);
            }
        }
    }

    fn exit_to(&mut self, ctx: &mut Ctx, bus: &mut Bus, keep_len: usize) {
        while self.active.len() > keep_len {
            self.active.pop();
            let mut frame = self.frames.pop().expect("active path and frame stack stay in lockstep");
            frame.instance.on_exit(ctx, bus);
            for behavior in frame.behaviors.iter_mut().rev() {
                behavior.on_exit(ctx, bus);
            }
        }
    }

    fn enter_path(&mut self, ctx: &mut Ctx, bus: &mut Bus, path: &[usize], now: Duration) -> Result<(), EngineError> {
        let start = self.active.len();
        for &idx in &path[start..] {
            self.active.push(idx)?;
            let mut instance = (self.compiled.constructors[idx])();
            let mut behaviors = (self.compiled.behavior_ctors[idx])();
            instance.on_entry(ctx, bus);
            for behavior in &mut behaviors {
                behavior.on_entry(ctx, bus);
            }
            self.frames.push(Frame {
                index: idx,
                instance,
                behaviors,
                last_update: now,
            });
        }
        Ok(())
    }

    /// Chases anonymous (no-event) transitions until none apply or the
    /// safety bound is hit. Called once after construction and after every
    /// successfully executed transition — internal or external alike.
    fn settle_anonymous(&mut self, ctx: &mut Ctx, bus: &mut Bus) {
        for _ in 0..MAX_ANONYMOUS_CHAIN {
            let code = anonymous_code::<E>();
            match self.process_code(ctx, bus, code) {
                ProcessResult::Success => continue,
                _ => return,
            }
        }
    }

    fn replay_deferred(&mut self, ctx: &mut Ctx, bus: &mut Bus) {
        let mut pending = core::mem::replace(&mut self.deferred, DeferredQueue::new());
        pending.drain_once(|code| {
            let _ = self.process_code(ctx, bus, code);
        });
    }
}

