//! Float cells shared between partition workers.
//!
//! Every access uses `Ordering::Relaxed`: workers may observe values that
//! are stale relative to another partition, but never torn ones. Ordering
//! across `run` boundaries comes from the scheduler's pending counters.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
#[repr(transparent)]
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub(crate) fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub(crate) fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Allocate `len` cells initialised to `value`
pub(crate) fn cells(len: usize, value: f32) -> Box<[AtomicF32]> {
    (0..len).map(|_| AtomicF32::new(value)).collect()
}
