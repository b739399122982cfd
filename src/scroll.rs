//! Viewport scroll observation.
//!
//! Pixel offsets become a normalized fraction here. Every notification is a
//! sample: nothing is coalesced, so the last sample at scroll end is always
//! the one that reaches the synchronizer.

use crate::cancellation::{CancellationToken, Subscription};
use tracing::{debug, trace};

/// The host's scrollable surface.
pub trait Viewport: Send {
    fn scroll_offset(&self) -> f64;
    /// Scrollable range in pixels (content height minus viewport height).
    fn max_scroll_offset(&self) -> f64;
    fn scroll_to(&mut self, offset: f64);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub offset: f64,
    pub max_offset: f64,
}

impl ScrollSample {
    pub fn of(viewport: &dyn Viewport) -> Self {
        Self {
            offset: viewport.scroll_offset(),
            max_offset: viewport.max_scroll_offset(),
        }
    }

    pub fn fraction(&self) -> f64 {
        fraction_for(self.offset, self.max_offset)
    }
}

/// `clamp(offset / max_offset, 0, 1)`, or 0 when the content does not scroll.
pub fn fraction_for(offset: f64, max_offset: f64) -> f64 {
    if !offset.is_finite() || !max_offset.is_finite() || max_offset <= 0.0 {
        return 0.0;
    }
    (offset / max_offset).clamp(0.0, 1.0)
}

type Listener = Box<dyn FnMut(f64) + Send>;

pub struct ScrollTracker {
    token: CancellationToken,
    listeners: Vec<(Subscription, Listener)>,
    samples: u64,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            listeners: Vec::new(),
            samples: 0,
        }
    }

    /// Register a listener for every published fraction.
    pub fn subscribe(&mut self, listener: impl FnMut(f64) + Send + 'static) -> Subscription {
        let subscription = Subscription::new(CancellationToken::new());
        if self.token.is_cancelled() {
            // Torn down: hand back an already-dead handle.
            subscription.cancel();
            return subscription;
        }
        self.listeners.push((subscription.clone(), Box::new(listener)));
        subscription
    }

    /// Convert one viewport notification and publish it.
    ///
    /// Returns `None` once the tracker has been torn down.
    pub fn notify(&mut self, sample: ScrollSample) -> Option<f64> {
        if self.token.is_cancelled() {
            trace!(offset = sample.offset, "Dropping scroll sample after teardown");
            return None;
        }
        let fraction = sample.fraction();
        self.samples += 1;
        trace!(
            offset = sample.offset,
            max_offset = sample.max_offset,
            fraction,
            "Scroll sample"
        );
        self.listeners.retain(|(sub, _)| sub.is_active());
        for (_, listener) in self.listeners.iter_mut() {
            listener(fraction);
        }
        Some(fraction)
    }

    /// Cancel every subscription and stop publishing.
    pub fn teardown(&mut self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
        for (sub, _) in self.listeners.drain(..) {
            sub.cancel();
        }
        debug!(samples = self.samples, "Scroll tracker torn down");
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.iter().filter(|(sub, _)| sub.is_active()).count()
    }

    pub fn sample_count(&self) -> u64 {
        self.samples
    }
}

/// In-process viewport with fixed geometry.
///
/// Used by the headless driver and as the viewport fake in tests; every
/// programmatic `scroll_to` is recorded.
#[derive(Debug, Clone)]
pub struct HeadlessViewport {
    offset: f64,
    viewport_height: f64,
    content_height: f64,
    moves: Vec<f64>,
}

impl HeadlessViewport {
    pub fn new(viewport_height: f64, content_height: f64) -> Self {
        Self {
            offset: 0.0,
            viewport_height: viewport_height.max(0.0),
            content_height: content_height.max(0.0),
            moves: Vec::new(),
        }
    }

    /// Simulate the user dragging the scrollbar: no programmatic move recorded.
    pub fn user_scroll(&mut self, offset: f64) -> ScrollSample {
        self.offset = offset;
        ScrollSample::of(self)
    }

    pub fn moves(&self) -> &[f64] {
        &self.moves
    }
}

impl Viewport for HeadlessViewport {
    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn max_scroll_offset(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    fn scroll_to(&mut self, offset: f64) {
        self.offset = offset.clamp(0.0, self.max_scroll_offset());
        self.moves.push(self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn fraction_is_clamped_and_zero_when_content_fits() {
        assert_eq!(fraction_for(500.0, 1000.0), 0.5);
        assert_eq!(fraction_for(1200.0, 1000.0), 1.0);
        assert_eq!(fraction_for(-3.0, 1000.0), 0.0);
        assert_eq!(fraction_for(10.0, 0.0), 0.0);
        assert_eq!(fraction_for(f64::NAN, 100.0), 0.0);
        assert_eq!(fraction_for(10.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn every_sample_reaches_listeners_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut tracker = ScrollTracker::new();
        tracker.subscribe(move |f| sink.lock().expect("lock").push(f));

        for offset in [0.0, 250.0, 250.0, 1000.0] {
            tracker.notify(ScrollSample {
                offset,
                max_offset: 1000.0,
            });
        }

        assert_eq!(*seen.lock().expect("lock"), vec![0.0, 0.25, 0.25, 1.0]);
        assert_eq!(tracker.sample_count(), 4);
    }

    #[test]
    fn cancelled_subscription_stops_receiving() {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let mut tracker = ScrollTracker::new();
        let sub = tracker.subscribe(move |_| *sink.lock().expect("lock") += 1);
        let sample = ScrollSample {
            offset: 1.0,
            max_offset: 2.0,
        };

        tracker.notify(sample);
        sub.cancel();
        tracker.notify(sample);

        assert_eq!(*count.lock().expect("lock"), 1);
        assert_eq!(tracker.listener_count(), 0);
    }

    #[test]
    fn nothing_is_published_after_teardown() {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let mut tracker = ScrollTracker::new();
        let sub = tracker.subscribe(move |_| *sink.lock().expect("lock") += 1);

        tracker.teardown();

        assert!(!sub.is_active());
        assert_eq!(
            tracker.notify(ScrollSample {
                offset: 1.0,
                max_offset: 2.0
            }),
            None
        );
        assert_eq!(*count.lock().expect("lock"), 0);
        assert!(!tracker.subscribe(|_| {}).is_active());
    }

    #[test]
    fn headless_viewport_clamps_programmatic_moves() {
        let mut viewport = HeadlessViewport::new(900.0, 18_900.0);
        assert_eq!(viewport.max_scroll_offset(), 18_000.0);

        viewport.scroll_to(9_000.0);
        viewport.scroll_to(50_000.0);

        assert_eq!(viewport.moves(), &[9_000.0, 18_000.0]);
        let sample = viewport.user_scroll(4_500.0);
        assert_eq!(sample.fraction(), 0.25);
        assert_eq!(viewport.moves().len(), 2);
    }
}
