//! The brain's scoped binding context, resolving an implicit brain
//! argument for assembly operations that don't take one explicitly.
//!
//! `Brain::enter` pushes the brain onto a thread-local stack; while the
//! returned [`BrainScope`] guard is alive, [`with_current_brain`] resolves
//! it for implicit-context assembly operations. Scopes nest (LIFO) and must
//! be exited in that order.

use crate::brain::Brain;
use crate::error::CoreError;
use std::cell::{Cell, RefCell};

thread_local! {
    static BRAIN_STACK: RefCell<Vec<*const Brain>> = RefCell::new(Vec::new());
}

/// RAII handle produced by [`Brain::enter`]. While alive, assembly
/// operations with no explicit brain argument resolve to this brain.
pub struct BrainScope<'a> {
    ptr: *const Brain,
    exited: Cell<bool>,
    _marker: std::marker::PhantomData<&'a Brain>,
}

impl<'a> BrainScope<'a> {
    pub(crate) fn new(brain: &'a Brain) -> Self {
        let ptr = brain as *const Brain;
        BRAIN_STACK.with(|stack| stack.borrow_mut().push(ptr));
        BrainScope { ptr, exited: Cell::new(false), _marker: std::marker::PhantomData }
    }

    /// Explicitly leave the scope. Returns `ScopeMisuse` if this scope is
    /// not the top of the stack (i.e. it was not exited in LIFO order).
    pub fn exit(self) -> Result<(), CoreError> {
        self.pop()
    }

    fn pop(&self) -> Result<(), CoreError> {
        if self.exited.get() {
            return Ok(());
        }
        self.exited.set(true);
        BRAIN_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let is_top = matches!(stack.last(), Some(&top) if top == self.ptr);
            // Remove this scope's entry wherever it sits so the stack never
            // retains a pointer past its guard's lifetime, even on misuse.
            if let Some(pos) = stack.iter().rposition(|&p| p == self.ptr) {
                stack.remove(pos);
            }
            if is_top {
                Ok(())
            } else {
                Err(CoreError::ScopeMisuse {
                    reason: "brain scopes must be exited in LIFO order".into(),
                })
            }
        })
    }
}

impl<'a> Drop for BrainScope<'a> {
    fn drop(&mut self) {
        if !self.exited.get() && self.pop().is_err() {
            // Drop cannot return a Result; an out-of-order scope exit is a
            // programming error in the caller, not a recoverable runtime
            // condition, so we fail loudly instead of leaving the
            // thread-local stack corrupted.
            panic!("ScopeMisuse: brain scope dropped out of LIFO order");
        }
    }
}

/// Run `f` with the currently bound brain, or `None` if no scope is active
/// on this thread. The reference is only valid for the duration of the
/// call; it cannot outlive it.
pub fn with_current_brain<F, R>(f: F) -> R
where
    F: FnOnce(Option<&Brain>) -> R,
{
    let top = BRAIN_STACK.with(|stack| stack.borrow().last().copied());
    match top {
        Some(ptr) => f(Some(unsafe { &*ptr })),
        None => f(None),
    }
}

/// Number of brain scopes currently nested on this thread (for tests and
/// diagnostics).
pub fn depth() -> usize {
    BRAIN_STACK.with(|stack| stack.borrow().len())
}
