//! Allocation and reflection utilities used by `statecraft`'s actor harness
//! and demos.
//!
//! None of this sits on the HSM engine's hot path: the transition-table
//! compiler and dispatch table never reach for a [`TlsfPool`] or a
//! [`StaticStack`]. `statecraft` does depend on this crate for one thing —
//! [`Reflect`], the event-name reflection its `EventCode` trait builds on —
//! because diagnostics ("what event just fired") are exactly the kind of
//! enum-reflection utility a closed, finite event set needs, and
//! duplicating that trait inside the core engine crate would just be the
//! same utility under a different name.

#![no_std]

extern crate alloc;

mod alloc_unique;
mod reflect;
mod static_stack;
mod tlsf;

pub use alloc_unique::{allocate_unique, PoolBox};
pub use reflect::Reflect;
pub use static_stack::StaticStack;
pub use tlsf::TlsfPool;
