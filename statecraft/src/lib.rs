//! Hierarchical state machines for event-driven, embedded and real-time
//! control systems.
//!
//! A machine is declared as a tree of [`State`] implementations: composite
//! states contribute a nested [`make_transition_table`](State::make_transition_table)
//! describing transitions among their direct children, leaves contribute
//! none. [`Hsm::new`] compiles that tree, reachable from a chosen root, into
//! a flat dispatch table once; [`Hsm::process`] and [`Hsm::update`] then run
//! against that table with no further allocation beyond what a guard or
//! action itself performs.
//!
//! ```ignore
//! use statecraft::prelude::*;
//!
//! #[derive(Default)]
//! struct Idle;
//! #[derive(Default)]
//! struct Running;
//!
//! impl State<Context, Bus> for Idle {
//!     fn make_transition_table() -> Vec<TransitionRow<Context, Bus>> {
//!         vec![Row::on::<Idle, _>(Event::Start).target::<Running>()]
//!     }
//! }
//! impl State<Context, Bus> for Running {}
//! ```
//!
//! See the crate's `demos/` for complete, runnable machines including
//! history pseudo-states and deferred events.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod compiler;
mod deferred;
mod dispatch;
mod engine;
mod error;
mod event;
mod history;
mod path;
mod state;
mod transition;

pub use engine::{Clock, Hsm, ProcessResult};
pub use error::{CompileError, EngineError};
pub use event::{is_known_code, EventCode, EventSlot, Reflect};
pub use state::{state, Behavior, State, StateRef};
pub use transition::{internal_row, Action, Guard, InternalRow, Row, Source, Target, TransitionRow};

#[cfg(feature = "macro")]
pub use statecraft_macro::Event;

/// Convenience re-export of the common declaration surface.
pub mod prelude {
    pub use crate::event::EventCode;
    pub use crate::state::{state, State};
    pub use crate::transition::{internal_row, Row};
    pub use crate::{Hsm, ProcessResult};

    #[cfg(feature = "macro")]
    pub use crate::Event;
}
