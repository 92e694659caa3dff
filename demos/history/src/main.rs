//! A dishwasher whose program pauses when the door opens and resumes from
//! wherever it left off when the door closes again — the canonical use case
//! for a `history(...)` target. `DoorClosed` is a composite over
//! `Idle`/`Soap`/`Rinse`/`Dry`; opening the door leaves it for the `DoorOpened`
//! leaf regardless of which child was active, and closing it again resolves
//! `history(DoorClosed)` back to that child rather than restarting at `Idle`.

use statecraft::prelude::*;
use statecraft::Hsm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, statecraft::Event)]
enum Event {
    StartProgram,
    DoorOpened,
    DoorClosed,
    TimerElapsed,
}

#[derive(Default)]
struct Dishwasher;

type Bus = ();

#[derive(Default)]
struct Machine;

impl State<Dishwasher, Bus> for Machine {
    fn initial_child() -> Option<statecraft::StateRef<Dishwasher, Bus>> {
        Some(state::<DoorClosed, _, _>())
    }

    fn make_transition_table() -> Vec<statecraft::TransitionRow<Dishwasher, Bus>> {
        vec![
            Row::on::<DoorClosed, _>(Event::DoorOpened).target::<DoorOpened>(),
            Row::on::<DoorOpened, _>(Event::DoorClosed).target_history(&[state::<DoorClosed, _, _>()]),
        ]
    }
}

#[derive(Default)]
struct DoorClosed;

impl State<Dishwasher, Bus> for DoorClosed {
    fn initial_child() -> Option<statecraft::StateRef<Dishwasher, Bus>> {
        Some(state::<Idle, _, _>())
    }

    fn make_transition_table() -> Vec<statecraft::TransitionRow<Dishwasher, Bus>> {
        vec![
            Row::on::<Idle, _>(Event::StartProgram).target::<Soap>(),
            Row::on::<Soap, _>(Event::TimerElapsed).target::<Rinse>(),
            Row::on::<Rinse, _>(Event::TimerElapsed).target::<Dry>(),
            Row::on::<Dry, _>(Event::TimerElapsed).target::<Idle>(),
        ]
    }
}

#[derive(Default)]
struct Idle;
impl State<Dishwasher, Bus> for Idle {}

#[derive(Default)]
struct Soap;
impl State<Dishwasher, Bus> for Soap {}

#[derive(Default)]
struct Rinse;
impl State<Dishwasher, Bus> for Rinse {}

#[derive(Default)]
struct Dry;
impl State<Dishwasher, Bus> for Dry {}

#[derive(Default)]
struct DoorOpened;
impl State<Dishwasher, Bus> for DoorOpened {}

fn main() {
    let mut ctx = Dishwasher;
    let mut bus = ();
    let mut hsm = Hsm::<Dishwasher, Bus, Event>::new::<Machine>(&mut ctx, &mut bus).expect("dishwasher's state graph compiles");

    let steps = [
        Event::StartProgram,
        Event::TimerElapsed,
        Event::TimerElapsed,
        Event::DoorOpened,
        Event::DoorClosed,
        Event::TimerElapsed,
    ];

    println!("state: {}", hsm.current_state_name());
    for event in steps {
        hsm.process(&mut ctx, &mut bus, event);
        println!("state: {}", hsm.current_state_name());
    }
}
