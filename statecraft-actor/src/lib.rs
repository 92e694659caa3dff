//! Threading harness binding a `statecraft::Hsm` to a context, a bus, and a
//! queue of externally-produced events.
//!
//! `statecraft` itself is transport- and thread-agnostic: `Hsm::process` and
//! `Hsm::update` are plain synchronous calls, and nothing in the core crate
//! spawns a thread or owns a mutex. This crate supplies the other half —
//! the run loop, the periodic update driver, and the single-mutex
//! concurrency model — the same division the reference implementation draws
//! between its state-machine frontend and its `Actor`/`MessageBroker` layer.

mod actor;
mod clock;
mod status;

pub use actor::{Actor, BrokerHandle};
pub use clock::SystemClock;
pub use status::{ActorContext, ActorState, ActorStatus};
