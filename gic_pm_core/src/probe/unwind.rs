//! Ordered cleanup of partially completed initialization.

use alloc::{boxed::Box, vec::Vec};

/// A stack of release actions, each paired with a resource acquired earlier.
///
/// If the list is dropped without [`Unwind::commit`], the actions run in the reverse order they
/// were pushed, so every failure path releases exactly what was acquired before it.
pub struct Unwind<'a> {
    steps: Vec<Box<dyn FnOnce() + 'a>>,
}

impl Default for Unwind<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Unwind<'a> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Register the action that releases the most recently acquired resource.
    pub fn push(&mut self, release: impl FnOnce() + 'a) {
        self.steps.push(Box::new(release));
    }

    /// Keep everything that was acquired; no action will run.
    pub fn commit(mut self) {
        self.steps.clear();
    }
}

impl Drop for Unwind<'_> {
    fn drop(&mut self) {
        while let Some(release) = self.steps.pop() {
            release();
        }
    }
}
