//! States and the descriptors the transition-table compiler uses to talk
//! about them without knowing their concrete Rust type.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;
use core::time::Duration;

use crate::transition::{InternalRow, TransitionRow};

/// A user-declared state.
///
/// A state is *composite* if it overrides [`make_transition_table`] and/or
/// [`initial_child`] with a non-empty nested table; otherwise it is a leaf.
/// Every method has a default appropriate for a leaf state with no hooks, so
/// a minimal state needs only `#[derive(Default)]`.
///
/// [`make_transition_table`]: State::make_transition_table
/// [`initial_child`]: State::initial_child
pub trait State<Ctx, Bus>: Default + Send + 'static {
    /// The rows of this state's own transition table, i.e. the transitions
    /// that fire while one of its children is active.
    fn make_transition_table() -> Vec<TransitionRow<Ctx, Bus>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Internal transitions: rows that execute their action without any
    /// exit/entry walk. Inherited by every leaf descendant of this state.
    fn make_internal_transition_table() -> Vec<InternalRow<Ctx, Bus>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// The default child entered when this (composite) state is targeted
    /// without a more specific pseudo-state. `None` marks a leaf.
    fn initial_child() -> Option<StateRef<Ctx, Bus>>
    where
        Self: Sized,
    {
        None
    }

    /// Event codes this state defers rather than processes immediately.
    fn defer_events() -> &'static [u16]
    where
        Self: Sized,
    {
        &[]
    }

    /// How often [`update`](State::update) and this state's behaviors are
    /// invoked while the state is active. `None` disables periodic update.
    fn update_interval() -> Option<Duration>
    where
        Self: Sized,
    {
        None
    }

    /// Behaviors attached to this state, invoked after its own hooks in
    /// declaration order.
    fn behaviors() -> Vec<Box<dyn Behavior<Ctx, Bus>>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Called once when this state is entered.
    fn on_entry(&self, _ctx: &mut Ctx, _bus: &mut Bus) {}

    /// Called once when this state is exited.
    fn on_exit(&self, _ctx: &mut Ctx, _bus: &mut Bus) {}

    /// Called on every periodic tick the state is active for, subject to
    /// [`update_interval`](State::update_interval).
    fn update(&self, _ctx: &mut Ctx, _bus: &mut Bus) {}
}

/// An independent entry/exit/update trio attached to a state, invoked after
/// the state's own hooks. Lets cross-cutting behavior (blink timers, telemetry)
/// be reused across states without subclassing.
pub trait Behavior<Ctx, Bus>: Send {
    /// Called when the owning state is entered, after the state's own hook.
    fn on_entry(&mut self, _ctx: &mut Ctx, _bus: &mut Bus) {}
    /// Called when the owning state is exited, after the state's own hook.
    fn on_exit(&mut self, _ctx: &mut Ctx, _bus: &mut Bus) {}
    /// Called on the owning state's update cadence, after the state's own hook.
    fn update(&mut self, _ctx: &mut Ctx, _bus: &mut Bus) {}
}

/// Object-safe view of a [`State`], used once the concrete type has been
/// erased behind a [`StateRef`].
pub(crate) trait ErasedState<Ctx, Bus>: Send {
    fn on_entry(&self, ctx: &mut Ctx, bus: &mut Bus);
    fn on_exit(&self, ctx: &mut Ctx, bus: &mut Bus);
    fn update(&self, ctx: &mut Ctx, bus: &mut Bus);
}

impl<T, Ctx, Bus> ErasedState<Ctx, Bus> for T
where
    T: State<Ctx, Bus>,
{
    fn on_entry(&self, ctx: &mut Ctx, bus: &mut Bus) {
        State::on_entry(self, ctx, bus);
    }

    fn on_exit(&self, ctx: &mut Ctx, bus: &mut Bus) {
        State::on_exit(self, ctx, bus);
    }

    fn update(&self, ctx: &mut Ctx, bus: &mut Bus) {
        State::update(self, ctx, bus);
    }
}

/// A reference to a state type, as used inside a transition table: `state(S)`.
///
/// Built with [`state::<S, _, _>()`](state). Cheap to pass around; the only
/// owned data is the (rare) boxed descriptor of a composite's initial child.
pub struct StateRef<Ctx, Bus> {
    pub(crate) type_id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) construct: fn() -> Box<dyn ErasedState<Ctx, Bus>>,
    pub(crate) transitions: fn() -> Vec<TransitionRow<Ctx, Bus>>,
    pub(crate) internal_transitions: fn() -> Vec<InternalRow<Ctx, Bus>>,
    pub(crate) initial_child: Option<Box<StateRef<Ctx, Bus>>>,
    pub(crate) defer_events: &'static [u16],
    pub(crate) update_interval: Option<Duration>,
    pub(crate) behaviors: fn() -> Vec<Box<dyn Behavior<Ctx, Bus>>>,
}

impl<Ctx, Bus> Clone for StateRef<Ctx, Bus> {
    fn clone(&self) -> Self {
        StateRef {
            type_id: self.type_id,
            name: self.name,
            construct: self.construct,
            transitions: self.transitions,
            internal_transitions: self.internal_transitions,
            initial_child: self.initial_child.clone(),
            defer_events: self.defer_events,
            update_interval: self.update_interval,
            behaviors: self.behaviors,
        }
    }
}

impl<Ctx, Bus> core::fmt::Debug for StateRef<Ctx, Bus> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateRef").field("name", &self.name).finish()
    }
}

/// Builds the descriptor for state type `S`, resolving its initial child (if
/// any) eagerly. This is the `state(S)` reference of the declaration surface.
pub fn state<S, Ctx, Bus>() -> StateRef<Ctx, Bus>
where
    S: State<Ctx, Bus>,
{
    StateRef {
        type_id: TypeId::of::<S>(),
        name: core::any::type_name::<S>(),
        construct: || Box::new(S::default()),
        transitions: S::make_transition_table,
        internal_transitions: S::make_internal_transition_table,
        initial_child: S::initial_child().map(Box::new),
        defer_events: S::defer_events(),
        update_interval: S::update_interval(),
        behaviors: S::behaviors,
    }
}
