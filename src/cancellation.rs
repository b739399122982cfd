//! Lifecycle handles for everything bound to one loaded collection.
//!
//! Scroll subscriptions and frame loops are stopped by cancelling their
//! token explicitly on teardown; nothing relies on `Drop` to stop a stale
//! generation from writing.

use anyhow::{Result, anyhow};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(anyhow!("generation cancelled at stage={stage}"));
        }
        Ok(())
    }
}

/// Handle returned by every subscribe call.
///
/// Cancelling it detaches the listener; the owner of the listener list prunes
/// cancelled entries on its next publish.
#[derive(Clone, Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}
