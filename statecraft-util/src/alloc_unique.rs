//! An allocator-aware unique pointer, for giving a value TLSF-pool-backed
//! storage instead of the global allocator's.
//!
//! Ported from the reference implementation's `allocate_unique`, which
//! wraps `std::allocator_traits` construction/destruction around a
//! `std::unique_ptr` with a custom deleter. Rust has no allocator-parameric
//! smart pointer on stable, so `PoolBox` plays that role directly against
//! [`TlsfPool`] rather than against an arbitrary allocator trait.

use core::alloc::Layout;
use core::cell::RefCell;
use core::fmt;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use crate::tlsf::TlsfPool;

/// A value of `T` allocated from a shared [`TlsfPool`], returned to the pool
/// on drop.
pub struct PoolBox<'p, T> {
    pool: &'p RefCell<TlsfPool>,
    ptr: NonNull<T>,
}

impl<'p, T> PoolBox<'p, T> {
    /// Moves `value` into storage drawn from `pool`. Returns `value` back on
    /// allocation failure, mirroring the reference implementation's
    /// exception-safe rollback (construct-then-deallocate-on-failure, here
    /// expressed as allocate-before-move so there is nothing to unwind).
    pub fn new(pool: &'p RefCell<TlsfPool>, value: T) -> Result<Self, T> {
        let layout = Layout::new::<T>();
        let raw = match pool.borrow_mut().alloc(layout) {
            Some(raw) => raw,
            None => return Err(value),
        };
        let ptr = raw.cast::<T>();
        // SAFETY: `raw` was just allocated with exactly `Layout::new::<T>()`
        // and is owned exclusively by this `PoolBox` from here on.
        unsafe { ptr.as_ptr().write(value) };
        Ok(PoolBox { pool, ptr })
    }
}

impl<T> Deref for PoolBox<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: `ptr` was initialized in `new` and only `Drop` ever
        // invalidates it, which cannot run while this borrow is live.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for PoolBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: see `Deref::deref`; `&mut self` guarantees exclusivity.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for PoolBox<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `ptr` is live and uniquely owned by this box until this
        // point, so it's sound to drop the value in place and hand the
        // storage back to the pool that produced it.
        unsafe {
            core::ptr::drop_in_place(self.ptr.as_ptr());
            self.pool.borrow_mut().dealloc(self.ptr.cast());
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PoolBox<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Free-function form matching the reference API's `allocate_unique(alloc, args...)`.
pub fn allocate_unique<T>(pool: &RefCell<TlsfPool>, value: T) -> Result<PoolBox<'_, T>, T> {
    PoolBox::new(pool, value)
}
