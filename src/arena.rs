//! Grow-only scratch storage owned by a single surface.
//!
//! Buffers are borrowed for the duration of one call through [`Scratch::scope`]
//! and handed back empty, so nothing staged in them outlives the call. Capacity
//! only grows (to the next power of two), which amortises repeated small growths.

/// Rounds `required` up to the capacity a grow-only buffer reallocates to.
#[inline]
pub fn grown_capacity(required: usize) -> usize {
    required.max(1).next_power_of_two()
}

/// A reusable staging vector.
#[derive(Debug, Default)]
pub struct Scratch<T> {
    buf: Vec<T>,
}

impl<T> Scratch<T> {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Current capacity in elements.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Makes room for at least `required` elements.
    ///
    /// Returns `true` when the buffer had to be reallocated.
    pub fn reserve(&mut self, required: usize) -> bool {
        if required <= self.buf.capacity() {
            return false;
        }
        let target = grown_capacity(required);
        self.buf = Vec::with_capacity(target);
        tracing::trace!(capacity = target, "scratch buffer grown");
        true
    }

    /// Lends the (empty) buffer to `f` and takes it back afterwards.
    ///
    /// Whatever `f` leaves in the buffer is discarded; copy out what must survive.
    pub fn scope<R>(&mut self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        self.buf.clear();
        let out = f(&mut self.buf);
        self.buf.clear();
        out
    }

    /// Returns the memory to the allocator.
    pub fn release(&mut self) {
        self.buf = Vec::new();
    }
}
