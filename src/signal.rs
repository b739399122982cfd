use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Latest published progress fraction.
///
/// Exactly one writer (the synchronizer) holds the handle that can `publish`;
/// readers such as the frame loop only `load`. The value is stored as `f64`
/// bits so the frame thread never takes a lock.
#[derive(Clone, Debug)]
pub struct ProgressCell {
    bits: Arc<AtomicU64>,
}

impl Default for ProgressCell {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ProgressCell {
    pub fn new(initial: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(initial.to_bits())),
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub(crate) fn publish(&self, fraction: f64) {
        self.bits.store(fraction.to_bits(), Ordering::Release);
    }

    /// Read-only view for consumers on other schedules.
    pub fn reader(&self) -> ProgressReader {
        ProgressReader {
            bits: Arc::clone(&self.bits),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProgressReader {
    bits: Arc<AtomicU64>,
}

impl ProgressReader {
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
