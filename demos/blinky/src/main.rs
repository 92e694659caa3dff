//! A blinking LED with a button that pauses and resumes it, driven through
//! `statecraft-actor`'s run loop. `Blinking` owns `LedOn`/`LedOff` as nested
//! children and toggles between them on `TimerElapsed`; `System` owns
//! `Blinking`/`NotBlinking` as siblings and switches between them on
//! `ButtonPressed`. The timer itself is simulated by a broker pump pushing
//! `TimerElapsed` on a fixed cadence, standing in for whatever interrupt or
//! peripheral timer a real embedded target would wire up instead.

use std::thread;
use std::time::Duration;

use statecraft::prelude::*;
use statecraft_actor::{Actor, ActorContext, ActorState, ActorStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, statecraft::Event)]
enum Event {
    TimerElapsed,
    ButtonPressed,
}

#[derive(Default)]
struct Blinky {
    actor: ActorState,
    led_on: bool,
}

impl ActorContext for Blinky {
    fn actor_status(&self) -> ActorStatus {
        self.actor.actor_status()
    }

    fn set_actor_status(&mut self, status: ActorStatus) {
        self.actor.set_actor_status(status);
    }

    fn stop_requested(&self) -> bool {
        self.actor.stop_requested()
    }

    fn request_stop(&mut self) {
        self.actor.request_stop();
    }
}

type Bus = ();

#[derive(Default)]
struct System;

impl State<Blinky, Bus> for System {
    fn initial_child() -> Option<statecraft::StateRef<Blinky, Bus>> {
        Some(state::<Blinking, _, _>())
    }

    fn make_transition_table() -> Vec<statecraft::TransitionRow<Blinky, Bus>> {
        vec![
            Row::on::<Blinking, _>(Event::ButtonPressed).target::<NotBlinking>(),
            Row::on::<NotBlinking, _>(Event::ButtonPressed).target::<Blinking>(),
        ]
    }
}

#[derive(Default)]
struct Blinking;

impl State<Blinky, Bus> for Blinking {
    fn initial_child() -> Option<statecraft::StateRef<Blinky, Bus>> {
        Some(state::<LedOn, _, _>())
    }

    fn make_transition_table() -> Vec<statecraft::TransitionRow<Blinky, Bus>> {
        vec![
            Row::on::<LedOn, _>(Event::TimerElapsed).target::<LedOff>(),
            Row::on::<LedOff, _>(Event::TimerElapsed).target::<LedOn>(),
        ]
    }
}

#[derive(Default)]
struct LedOn;

impl State<Blinky, Bus> for LedOn {
    fn on_entry(&self, ctx: &mut Blinky, _bus: &mut Bus) {
        ctx.led_on = true;
        println!("led: on");
    }
}

#[derive(Default)]
struct LedOff;

impl State<Blinky, Bus> for LedOff {
    fn on_entry(&self, ctx: &mut Blinky, _bus: &mut Bus) {
        ctx.led_on = false;
        println!("led: off");
    }
}

#[derive(Default)]
struct NotBlinking;

impl State<Blinky, Bus> for NotBlinking {
    fn on_entry(&self, _ctx: &mut Blinky, _bus: &mut Bus) {
        println!("blinking paused");
    }

    fn on_exit(&self, _ctx: &mut Blinky, _bus: &mut Bus) {
        println!("blinking resumed");
    }
}

fn main() {
    let tick = Duration::from_millis(300);

    let actor = Actor::<System, Blinky, Bus, Event>::new(Blinky::default(), (), tick)
        .expect("blinky's state graph compiles")
        .with_broker_pump(tick, |handle| handle.push_event(Event::TimerElapsed));

    let driver_handle = actor.handle();
    let driver = thread::spawn(move || {
        thread::sleep(tick * 6);
        driver_handle.push_event(Event::ButtonPressed);
        thread::sleep(tick * 4);
        driver_handle.push_event(Event::ButtonPressed);
        thread::sleep(tick * 6);
        driver_handle.request_stop();
    });

    actor.run();
    driver.join().expect("driver thread panicked");
}
