//! The transition declaration surface: `state(S) + event(E) [guard] / action
//! = state(T)`, expressed as a fluent builder over [`StateRef`] descriptors.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::event::{EventCode, EventSlot};
use crate::state::{state, State, StateRef};

/// A guard predicate. By convention guards must be side-effect-free, though
/// this is not enforced; they receive the same arguments as actions so a
/// guard and its paired action can share context.
pub type Guard<Ctx, Bus> = Arc<dyn Fn(&mut Ctx, &mut Bus, u16) -> bool + Send + Sync>;

/// A transition's side-effecting action.
pub type Action<Ctx, Bus> = Arc<dyn Fn(&mut Ctx, &mut Bus, u16) + Send + Sync>;

fn always<Ctx, Bus>(_: &mut Ctx, _: &mut Bus, _: u16) -> bool {
    true
}

fn noop<Ctx, Bus>(_: &mut Ctx, _: &mut Bus, _: u16) {}

/// How a transition's source state is named.
#[derive(Clone)]
pub enum Source<Ctx, Bus> {
    /// A bare state reference: matches while the state, or any of its
    /// descendants, is active.
    Bare(StateRef<Ctx, Bus>),
    /// `exit(S, P...)`: matches only the specific deep leaf `S` reached via
    /// ancestor chain `P...`.
    Exit(StateRef<Ctx, Bus>, Vec<StateRef<Ctx, Bus>>),
    /// `direct(S, P...)` used as a source: same matching rule as `Exit`.
    Direct(StateRef<Ctx, Bus>, Vec<StateRef<Ctx, Bus>>),
}

impl<Ctx, Bus> Source<Ctx, Bus> {
    pub(crate) fn state_ref(&self) -> &StateRef<Ctx, Bus> {
        match self {
            Source::Bare(s) | Source::Exit(s, _) | Source::Direct(s, _) => s,
        }
    }

    pub(crate) fn parents(&self) -> Option<&[StateRef<Ctx, Bus>]> {
        match self {
            Source::Bare(_) => None,
            Source::Exit(_, p) | Source::Direct(_, p) => Some(p),
        }
    }

    /// Whether this source matches only an exact deep leaf, rather than any
    /// descendant of a composite.
    pub(crate) fn is_exact(&self) -> bool {
        !matches!(self, Source::Bare(_))
    }
}

/// How a transition's target state is named.
#[derive(Clone)]
pub enum Target<Ctx, Bus> {
    /// A bare state reference; if composite, resolves through its initial
    /// descendants.
    Bare(StateRef<Ctx, Bus>),
    /// `entry(S, P...)`: enters `S` via the named ancestor chain.
    Entry(StateRef<Ctx, Bus>, Vec<StateRef<Ctx, Bus>>),
    /// `direct(S, P...)`: targets the exact deep leaf `S`, bypassing initial
    /// descent along the way.
    Direct(StateRef<Ctx, Bus>, Vec<StateRef<Ctx, Bus>>),
    /// `history(P...)`: resumes the most recently active sub-configuration
    /// of the named composite chain.
    History(Vec<StateRef<Ctx, Bus>>),
}

/// One row of a (possibly nested) transition table.
pub struct TransitionRow<Ctx, Bus> {
    pub(crate) source: Source<Ctx, Bus>,
    pub(crate) event: EventSlot,
    pub(crate) guard: Guard<Ctx, Bus>,
    pub(crate) action: Action<Ctx, Bus>,
    pub(crate) target: Target<Ctx, Bus>,
    pub(crate) internal: bool,
}

/// A row of an internal transition table; its target is always its source.
pub struct InternalRow<Ctx, Bus> {
    pub(crate) event: EventSlot,
    pub(crate) guard: Guard<Ctx, Bus>,
    pub(crate) action: Action<Ctx, Bus>,
}

/// Fluent builder for a single transition row.
///
/// ```ignore
/// Row::on::<Idle, _>(Event::Start)
///     .guard(|ctx, _bus, _evt| ctx.ready)
///     .action(|ctx, _bus, _evt| ctx.started = true)
///     .target::<Running>()
/// ```
pub struct Row<Ctx, Bus> {
    source: Source<Ctx, Bus>,
    event: EventSlot,
    guard: Guard<Ctx, Bus>,
    action: Action<Ctx, Bus>,
    internal: bool,
}

impl<Ctx, Bus> Row<Ctx, Bus> {
    fn from_source(source: Source<Ctx, Bus>, event: EventSlot) -> Self {
        Row {
            source,
            event,
            guard: Arc::new(always),
            action: Arc::new(noop),
            internal: false,
        }
    }

    /// `state(S) + event(E)`: an external transition row triggered by `E`.
    pub fn on<S, E>(event: E) -> Self
    where
        S: State<Ctx, Bus>,
        E: EventCode,
    {
        Self::from_source(Source::Bare(state::<S, Ctx, Bus>()), EventSlot::of(event))
    }

    /// Same as [`on`](Row::on), but the source is `exit(S, P...)`: the row
    /// only matches while the exact deep leaf `S` is active.
    pub fn exit_on<S, E>(event: E, parents: &[StateRef<Ctx, Bus>]) -> Self
    where
        S: State<Ctx, Bus>,
        E: EventCode,
    {
        Self::from_source(
            Source::Exit(state::<S, Ctx, Bus>(), parents.to_vec()),
            EventSlot::of(event),
        )
    }

    /// Same as [`on`](Row::on), but the source is `direct(S, P...)`.
    pub fn direct_on<S, E>(event: E, parents: &[StateRef<Ctx, Bus>]) -> Self
    where
        S: State<Ctx, Bus>,
        E: EventCode,
    {
        Self::from_source(
            Source::Direct(state::<S, Ctx, Bus>(), parents.to_vec()),
            EventSlot::of(event),
        )
    }

    /// `state(S)` with no event: an anonymous (completion) transition row.
    pub fn anonymous<S>() -> Self
    where
        S: State<Ctx, Bus>,
    {
        Self::from_source(Source::Bare(state::<S, Ctx, Bus>()), EventSlot::Anonymous)
    }

    /// Attaches a guard predicate (`[ guard ]`).
    pub fn guard(mut self, guard: impl Fn(&mut Ctx, &mut Bus, u16) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Arc::new(guard);
        self
    }

    /// Attaches an action (`/ action`).
    pub fn action(mut self, action: impl Fn(&mut Ctx, &mut Bus, u16) + Send + Sync + 'static) -> Self {
        self.action = Arc::new(action);
        self
    }

    /// `= state(T)`: a bare target; completes the row.
    pub fn target<T>(self) -> TransitionRow<Ctx, Bus>
    where
        T: State<Ctx, Bus>,
    {
        self.finish(Target::Bare(state::<T, Ctx, Bus>()))
    }

    /// `= entry(T, P...)`.
    pub fn target_entry<T>(self, parents: &[StateRef<Ctx, Bus>]) -> TransitionRow<Ctx, Bus>
    where
        T: State<Ctx, Bus>,
    {
        self.finish(Target::Entry(state::<T, Ctx, Bus>(), parents.to_vec()))
    }

    /// `= direct(T, P...)`.
    pub fn target_direct<T>(self, parents: &[StateRef<Ctx, Bus>]) -> TransitionRow<Ctx, Bus>
    where
        T: State<Ctx, Bus>,
    {
        self.finish(Target::Direct(state::<T, Ctx, Bus>(), parents.to_vec()))
    }

    /// `= history(P...)`.
    pub fn target_history(self, parents: &[StateRef<Ctx, Bus>]) -> TransitionRow<Ctx, Bus> {
        self.finish(Target::History(parents.to_vec()))
    }

    /// `+ row`: mark this row internal. Only valid for a bare source; the
    /// target is implicitly the source and executing it runs only the
    /// action, with no exit/entry walk.
    pub fn internal(self) -> TransitionRow<Ctx, Bus> {
        let target = match &self.source {
            Source::Bare(s) => Target::Bare(s.clone()),
            Source::Exit(s, p) => Target::Direct(s.clone(), p.clone()),
            Source::Direct(s, p) => Target::Direct(s.clone(), p.clone()),
        };
        TransitionRow {
            source: self.source,
            event: self.event,
            guard: self.guard,
            action: self.action,
            target,
            internal: true,
        }
    }

    fn finish(self, target: Target<Ctx, Bus>) -> TransitionRow<Ctx, Bus> {
        TransitionRow {
            source: self.source,
            event: self.event,
            guard: self.guard,
            action: self.action,
            target,
            internal: self.internal,
        }
    }
}

/// Builds one row of an internal transition table (`make_internal_transition_table`).
pub fn internal_row<Ctx, Bus, E>(
    event: E,
    guard: impl Fn(&mut Ctx, &mut Bus, u16) -> bool + Send + Sync + 'static,
    action: impl Fn(&mut Ctx, &mut Bus, u16) + Send + Sync + 'static,
) -> InternalRow<Ctx, Bus>
where
    E: EventCode,
{
    InternalRow {
        event: EventSlot::of(event),
        guard: Arc::new(guard),
        action: Arc::new(action),
    }
}
