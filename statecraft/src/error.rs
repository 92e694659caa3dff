//! Error taxonomy.
//!
//! Per the engine's error handling design: malformed transition tables are
//! *build failures*, reported from [`crate::Hsm::new`] as [`CompileError`].
//! Once an [`crate::Hsm`] exists its dispatch table is immutable and
//! `process`/`update`/`is` cannot fail on account of the graph itself;
//! [`EngineError`] only covers the residual case where a user-chosen
//! `DEPTH` const generic turns out to be smaller than the graph needs.

use core::fmt;

/// A failure detected while compiling the transition table, before any
/// `Hsm` exists. All of these are programming errors: fix the state
/// declarations and recompile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A composite state's `make_transition_table`/`initial_child` imply it
    /// has children, but it never names an `initial_child`.
    MissingInitialChild { state: &'static str },
    /// A transition names a target that the flattening walk never reaches
    /// through initial descent, an explicit parent chain, or a sibling
    /// transition.
    UnreachableTarget { state: &'static str },
    /// The graph's nesting depth exceeds the `DEPTH` const generic chosen
    /// for this `Hsm`.
    DepthExceeded { observed: usize, max: usize },
    /// Two state types declared equal names in a context requiring a dense
    /// index (diagnostic aid only; the compiler does not need unique names
    /// to function, but colliding names break `current_state_name`).
    DuplicateTypeRegistration { state: &'static str },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::MissingInitialChild { state } => {
                write!(f, "composite state `{state}` declares no initial child")
            }
            CompileError::UnreachableTarget { state } => {
                write!(f, "state `{state}` is targeted by a transition but is never reachable")
            }
            CompileError::DepthExceeded { observed, max } => {
                write!(f, "state graph nesting depth {observed} exceeds configured maximum {max}")
            }
            CompileError::DuplicateTypeRegistration { state } => {
                write!(f, "state `{state}` was registered more than once under the same parent")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CompileError {}

/// An error surfaced by a live `Hsm`, rather than by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// A transition (ordinarily via history restoration) attempted to push
    /// the active path past the `DEPTH` const generic.
    DepthExceeded,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DepthExceeded => write!(f, "active path exceeded the configured maximum depth"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}
