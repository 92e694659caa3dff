//! Enum name/value reflection.
//!
//! The reference implementation derives this from `__PRETTY_FUNCTION__`
//! parsing at compile time (magic_enum-style, see `util/enum_utils.hpp`).
//! Rust's `core::any::type_name` gives the same trick for types, but not for
//! individual enum variants, so there is no equivalent free lunch here;
//! implementors instead get it for free from `#[derive(Event)]`
//! (`statecraft_macro`), which generates the `match` arms this trait asks
//! for. Hand implementations are only needed for enums declared without
//! that macro.

/// A fieldless enum whose variants can recover their declared name and
/// ordinal, and whose full set of values can be enumerated — the minimum
/// reflection the actor harness needs to log an event by name and the
/// transition-table compiler needs to size its dispatch axis.
pub trait Reflect: Copy + 'static {
    /// Number of declared variants.
    const COUNT: usize;

    /// Position of this variant among [`Reflect::values`], in declaration order.
    fn ordinal(self) -> usize;

    /// The variant's declared name, for diagnostics.
    fn name(self) -> &'static str;

    /// Every declared variant, in ascending ordinal order.
    fn values() -> &'static [Self]
    where
        Self: Sized;
}
