//! End-to-end coverage of the engine's transition semantics: nested
//! composites, guards, self-transitions, inherited vs. overriding event
//! handling, internal transitions, and deferred-event replay.

use statecraft::prelude::*;
use statecraft::{InternalRow, ProcessResult, StateRef, TransitionRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, statecraft::Event)]
enum Ev {
    E1,
    E2,
    E3,
    E4,
    Ie1,
    Ie2,
}

#[derive(Default)]
struct Ctx;

type Bus = ();

// S1 .. S4, with S2/S3 each a composite over three nested children, matching
// the shape used throughout this test module: a top-level row intercepts an
// event an inner row also declares, and the top-level row wins.
#[derive(Default)]
struct Fixture;

impl State<Ctx, Bus> for Fixture {
    fn initial_child() -> Option<StateRef<Ctx, Bus>> {
        Some(state::<S1, _, _>())
    }

    fn make_transition_table() -> Vec<TransitionRow<Ctx, Bus>> {
        vec![
            Row::on::<S1, _>(Ev::E1).target::<S2>(),
            Row::on::<S2, _>(Ev::E2).target::<S3>(),
            Row::on::<S2, _>(Ev::E3).target::<S3>(),
            Row::on::<S3, _>(Ev::E2).target::<S4>(),
            Row::on::<S3, _>(Ev::E1).target::<S2>(),
            Row::on::<S1, _>(Ev::E4).guard(|_: &mut Ctx, _: &mut Bus, _| true).target::<S4>(),
            Row::on::<S1, _>(Ev::E3).guard(|_: &mut Ctx, _: &mut Bus, _| false).target::<S4>(),
            Row::on::<S2, _>(Ev::E4).target::<S2>(),
            Row::on::<S4, _>(Ev::E4).target::<S4>(),
        ]
    }
}

#[derive(Default)]
struct S1;
impl State<Ctx, Bus> for S1 {}

#[derive(Default)]
struct S2;
impl State<Ctx, Bus> for S2 {
    fn initial_child() -> Option<StateRef<Ctx, Bus>> {
        Some(state::<Is21, _, _>())
    }

    fn make_transition_table() -> Vec<TransitionRow<Ctx, Bus>> {
        vec![
            Row::on::<Is21, _>(Ev::Ie1).target::<Is22>(),
            Row::on::<Is22, _>(Ev::Ie2).target::<Is23>(),
            Row::on::<Is23, _>(Ev::E3).target::<Is21>(),
            Row::on::<Is21, _>(Ev::E3).target::<Is23>(),
        ]
    }
}

#[derive(Default)]
struct Is21;
impl State<Ctx, Bus> for Is21 {}
#[derive(Default)]
struct Is22;
impl State<Ctx, Bus> for Is22 {}
#[derive(Default)]
struct Is23;
impl State<Ctx, Bus> for Is23 {}

#[derive(Default)]
struct S3;
impl State<Ctx, Bus> for S3 {
    fn initial_child() -> Option<StateRef<Ctx, Bus>> {
        Some(state::<Is31, _, _>())
    }

    fn make_transition_table() -> Vec<TransitionRow<Ctx, Bus>> {
        vec![
            Row::on::<Is31, _>(Ev::Ie1).target::<Is32>(),
            Row::on::<Is32, _>(Ev::Ie2).target::<Is33>(),
            Row::on::<Is33, _>(Ev::E3).target::<Is31>(),
            Row::on::<Is31, _>(Ev::E3).target::<Is33>(),
        ]
    }
}

#[derive(Default)]
struct Is31;
impl State<Ctx, Bus> for Is31 {}
#[derive(Default)]
struct Is32;
impl State<Ctx, Bus> for Is32 {}
#[derive(Default)]
struct Is33;
impl State<Ctx, Bus> for Is33 {}

#[derive(Default)]
struct S4;
impl State<Ctx, Bus> for S4 {}

fn fixture() -> statecraft::Hsm<Ctx, Bus, Ev> {
    let mut ctx = Ctx;
    let mut bus = ();
    statecraft::Hsm::new::<Fixture>(&mut ctx, &mut bus).expect("fixture graph compiles")
}

#[test]
fn scenario_1_unconditional_guard_transitions_directly() {
    let mut hsm = fixture();
    let mut ctx = Ctx;
    let mut bus = ();
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::E4), ProcessResult::Success);
    assert!(hsm.is::<S4>());
}

#[test]
fn scenario_2_outer_transition_wins_over_inner_for_same_event() {
    let mut hsm = fixture();
    let mut ctx = Ctx;
    let mut bus = ();
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::E1), ProcessResult::Success);
    assert!(hsm.is::<Is21>());
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::Ie1), ProcessResult::Success);
    assert!(hsm.is::<Is22>());
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::Ie2), ProcessResult::Success);
    assert!(hsm.is::<Is23>());
    // Is23 declares its own `E3 -> Is21` row, but S2's outer `E3 -> S3` row
    // was declared at a shallower nesting depth and wins.
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::E3), ProcessResult::Success);
    assert!(hsm.is::<Is31>());
    assert!(hsm.is_in::<S3>());
}

#[test]
fn scenario_3_failing_guard_with_no_fallback_yields_nothing() {
    let mut hsm = fixture();
    let mut ctx = Ctx;
    let mut bus = ();
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::E3), ProcessResult::Nothing);
    assert!(hsm.is::<S1>());
}

#[test]
fn scenario_4_inner_toggle_survives_repeated_events() {
    let mut hsm = fixture();
    let mut ctx = Ctx;
    let mut bus = ();
    hsm.process(&mut ctx, &mut bus, Ev::E1);
    hsm.process(&mut ctx, &mut bus, Ev::E2);
    assert!(hsm.is::<Is31>());

    for i in 0..6 {
        hsm.process(&mut ctx, &mut bus, Ev::E3);
        if i % 2 == 0 {
            assert!(hsm.is::<Is33>(), "iteration {i}");
        } else {
            assert!(hsm.is::<Is31>(), "iteration {i}");
        }
    }
}

#[test]
fn scenario_5_self_transition_keeps_leaf_active() {
    let mut hsm = fixture();
    let mut ctx = Ctx;
    let mut bus = ();
    hsm.process(&mut ctx, &mut bus, Ev::E1);
    hsm.process(&mut ctx, &mut bus, Ev::E2);
    hsm.process(&mut ctx, &mut bus, Ev::E2);
    assert!(hsm.is::<S4>());
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::E4), ProcessResult::Success);
    assert!(hsm.is::<S4>());
}

#[test]
fn nothing_result_does_not_disturb_active_path_or_deferred_queue() {
    let mut hsm = fixture();
    let mut ctx = Ctx;
    let mut bus = ();
    // Ie2 has no candidate anywhere along S1's ancestor chain.
    assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::Ie2), ProcessResult::Nothing);
    assert!(hsm.is::<S1>());
    assert_eq!(hsm.deferred_high_water(), 0);
}

// A dedicated internal-transition fixture: S1's own internal row fires its
// action without disturbing the active path.
mod internal_fixture {
    use super::*;

    #[derive(Default)]
    struct Root;
    impl State<Ctx, Bus> for Root {
        fn initial_child() -> Option<StateRef<Ctx, Bus>> {
            Some(state::<Leaf, _, _>())
        }
    }

    #[derive(Default)]
    struct Leaf;
    impl State<Ctx, Bus> for Leaf {
        fn make_internal_transition_table() -> Vec<InternalRow<Ctx, Bus>> {
            vec![statecraft::internal_row(Ev::Ie1, |_: &mut Ctx, _: &mut Bus, _| true, |_, _, _| {})]
        }
    }

    #[test]
    fn internal_transition_preserves_active_path() {
        let mut ctx = Ctx;
        let mut bus = ();
        let mut hsm = statecraft::Hsm::<Ctx, Bus, Ev>::new::<Root>(&mut ctx, &mut bus).unwrap();
        assert!(hsm.is::<Leaf>());
        assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::Ie1), ProcessResult::Success);
        assert!(hsm.is::<Leaf>());
    }
}

// Regression: an internal transition's action firing must drain any
// anonymous (completion) transition the active state declares, exactly as a
// resolved external transition's entry walk does — internal execution is
// one of the two cases §4.4's "drain anonymous transitions on success"
// step covers, not just the external one.
mod internal_then_anonymous {
    use super::*;

    // A dedicated context: Leaf's anonymous row is guarded on `unlocked`, so
    // it can't have already fired during construction (when `unlocked` is
    // still `false`) — it only becomes eligible once the internal
    // transition's action has run and flipped the flag.
    #[derive(Default)]
    struct Gate {
        unlocked: bool,
    }

    #[derive(Default)]
    struct Root;
    impl State<Gate, Bus> for Root {
        fn initial_child() -> Option<StateRef<Gate, Bus>> {
            Some(state::<Leaf, _, _>())
        }

        fn make_transition_table() -> Vec<TransitionRow<Gate, Bus>> {
            vec![Row::anonymous::<Leaf>().guard(|ctx: &mut Gate, _: &mut Bus, _| ctx.unlocked).target::<Done>()]
        }
    }

    #[derive(Default)]
    struct Leaf;
    impl State<Gate, Bus> for Leaf {
        fn make_internal_transition_table() -> Vec<InternalRow<Gate, Bus>> {
            vec![statecraft::internal_row(
                Ev::Ie1,
                |_: &mut Gate, _: &mut Bus, _| true,
                |ctx: &mut Gate, _: &mut Bus, _| ctx.unlocked = true,
            )]
        }
    }

    #[derive(Default)]
    struct Done;
    impl State<Gate, Bus> for Done {}

    #[test]
    fn internal_transition_drains_a_pending_anonymous_transition() {
        let mut ctx = Gate::default();
        let mut bus = ();
        let mut hsm = statecraft::Hsm::<Gate, Bus, Ev>::new::<Root>(&mut ctx, &mut bus).unwrap();
        assert!(hsm.is::<Leaf>(), "the anonymous row's guard keeps it from firing until `unlocked` is set");

        assert_eq!(hsm.process(&mut ctx, &mut bus, Ev::Ie1), ProcessResult::Success);
        assert!(hsm.is::<Done>(), "the internal transition's success should have drained Leaf's anonymous row");
    }
}

// Scenario 6: a deferred event fires once a subsequent transition makes it
// valid again, replayed within the same successful `process` call. Uses a
// standalone fixture (rather than the S1..S4 one above) so the deferring
// leaf has no other candidate competing for the same event — an inherited,
// non-deferred candidate always takes priority over a deferred one in the
// same dispatch slot, so reusing S2/S3's shared `E2` row here would make the
// deferral itself unreachable.
mod deferred_fixture {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, statecraft::Event)]
    enum DeferredEv {
        Settle,
        Readout,
    }

    #[derive(Default)]
    struct Root;
    impl State<Ctx, Bus> for Root {
        fn initial_child() -> Option<StateRef<Ctx, Bus>> {
            Some(state::<Measuring, _, _>())
        }
    }

    #[derive(Default)]
    struct Measuring;
    impl State<Ctx, Bus> for Measuring {
        fn initial_child() -> Option<StateRef<Ctx, Bus>> {
            Some(state::<Sampling, _, _>())
        }

        fn make_transition_table() -> Vec<TransitionRow<Ctx, Bus>> {
            vec![
                Row::on::<Sampling, _>(DeferredEv::Settle).target::<Settling>(),
                Row::on::<Settling, _>(DeferredEv::Readout).target::<Done>(),
            ]
        }
    }

    #[derive(Default)]
    struct Sampling;
    impl State<Ctx, Bus> for Sampling {
        fn defer_events() -> &'static [u16] {
            &[DeferredEv::Readout as u16]
        }
    }

    #[derive(Default)]
    struct Settling;
    impl State<Ctx, Bus> for Settling {}

    #[derive(Default)]
    struct Done;
    impl State<Ctx, Bus> for Done {}

    #[test]
    fn deferred_event_replays_after_next_successful_transition() {
        let mut ctx = Ctx;
        let mut bus = ();
        let mut hsm = statecraft::Hsm::<Ctx, Bus, DeferredEv>::new::<Root>(&mut ctx, &mut bus).unwrap();
        assert!(hsm.is::<Sampling>());

        assert_eq!(hsm.process(&mut ctx, &mut bus, DeferredEv::Readout), ProcessResult::Deferred);
        assert!(hsm.is::<Sampling>());

        assert_eq!(hsm.process(&mut ctx, &mut bus, DeferredEv::Settle), ProcessResult::Success);
        assert!(hsm.is::<Done>(), "deferred Readout should replay once Settling makes it valid");
    }
}

// Regression for the compiler's destination-path resolution: a transition
// between two leaves that share a composite ancestor (and the root) above
// them must not disturb that shared ancestor. Earlier, `resolve_target`
// built bare/entry/direct destinations from `descend_initial` alone, which
// omitted the root-to-ancestor prefix entirely; every ordinary transition
// whose target wasn't a direct initial-descent child of the root then
// computed a least-common-ancestor depth of 0, spuriously exiting and
// re-entering every shared ancestor (root included) on every toggle.
mod ancestor_preservation {
    use super::*;

    #[derive(Default)]
    struct Counts {
        root_entries: u32,
        root_exits: u32,
        mid_entries: u32,
        mid_exits: u32,
    }

    #[derive(Default)]
    struct Root;
    impl State<Counts, Bus> for Root {
        fn initial_child() -> Option<StateRef<Counts, Bus>> {
            Some(state::<Mid, _, _>())
        }

        fn on_entry(&self, ctx: &mut Counts, _bus: &mut Bus) {
            ctx.root_entries += 1;
        }

        fn on_exit(&self, ctx: &mut Counts, _bus: &mut Bus) {
            ctx.root_exits += 1;
        }
    }

    #[derive(Default)]
    struct Mid;
    impl State<Counts, Bus> for Mid {
        fn initial_child() -> Option<StateRef<Counts, Bus>> {
            Some(state::<Left, _, _>())
        }

        fn make_transition_table() -> Vec<TransitionRow<Counts, Bus>> {
            vec![
                Row::on::<Left, _>(Ev::E3).target::<Right>(),
                Row::on::<Right, _>(Ev::E3).target::<Left>(),
            ]
        }

        fn on_entry(&self, ctx: &mut Counts, _bus: &mut Bus) {
            ctx.mid_entries += 1;
        }

        fn on_exit(&self, ctx: &mut Counts, _bus: &mut Bus) {
            ctx.mid_exits += 1;
        }
    }

    #[derive(Default)]
    struct Left;
    impl State<Counts, Bus> for Left {}
    #[derive(Default)]
    struct Right;
    impl State<Counts, Bus> for Right {}

    #[test]
    fn toggling_siblings_leaves_shared_ancestors_untouched() {
        let mut ctx = Counts::default();
        let mut bus = ();
        let mut hsm = statecraft::Hsm::<Counts, Bus, Ev>::new::<Root>(&mut ctx, &mut bus).unwrap();
        assert_eq!((ctx.root_entries, ctx.mid_entries), (1, 1));

        for i in 0..6 {
            hsm.process(&mut ctx, &mut bus, Ev::E3);
            assert!(if i % 2 == 0 { hsm.is::<Right>() } else { hsm.is::<Left>() }, "iteration {i}");
        }

        assert_eq!(ctx.root_entries, 1, "root entered once at construction, never again");
        assert_eq!(ctx.root_exits, 0, "root never exited while a descendant remains active");
        assert_eq!(ctx.mid_entries, 1, "Mid entered once at construction, never again");
        assert_eq!(ctx.mid_exits, 0, "Mid never exited while Left/Right toggle beneath it");
    }
}

// Round-trip law: symmetric on_entry/on_exit hooks leave a user counter
// unchanged after entering and leaving a state.
mod round_trip {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: i32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, statecraft::Event)]
    enum RtEv {
        Go,
        Back,
    }

    #[derive(Default)]
    struct Root;
    impl State<Counter, Bus> for Root {
        fn initial_child() -> Option<StateRef<Counter, Bus>> {
            Some(state::<Idle, _, _>())
        }

        fn make_transition_table() -> Vec<TransitionRow<Counter, Bus>> {
            vec![
                Row::on::<Idle, _>(RtEv::Go).target::<Temp>(),
                Row::on::<Temp, _>(RtEv::Back).target::<Idle>(),
            ]
        }
    }

    #[derive(Default)]
    struct Idle;
    impl State<Counter, Bus> for Idle {}

    #[derive(Default)]
    struct Temp;
    impl State<Counter, Bus> for Temp {
        fn on_entry(&self, ctx: &mut Counter, _bus: &mut Bus) {
            ctx.value += 5;
        }

        fn on_exit(&self, ctx: &mut Counter, _bus: &mut Bus) {
            ctx.value -= 5;
        }
    }

    #[test]
    fn entering_then_leaving_a_state_restores_the_counter() {
        let mut ctx = Counter::default();
        let mut bus = ();
        let mut hsm = statecraft::Hsm::<Counter, Bus, RtEv>::new::<Root>(&mut ctx, &mut bus).unwrap();
        assert_eq!(ctx.value, 0);

        hsm.process(&mut ctx, &mut bus, RtEv::Go);
        assert_eq!(ctx.value, 5);

        hsm.process(&mut ctx, &mut bus, RtEv::Back);
        assert_eq!(ctx.value, 0);
    }
}
