//! Reconciles where a freshly loaded collection should start, and gates
//! persistence until that decision is made.
//!
//! ```text
//! Uninitialized --begin_load--> Restoring --complete_restore--> Ready
//!       ^                                                         |
//!       +------------------------ begin_load (swap) --------------+
//! ```
//!
//! Precedence on load: deep link, then the persisted position, then zero.
//! Samples arriving while `Restoring` are observed but never persisted, so a
//! zero reported at mount cannot clobber a saved position.

use crate::collection::{Collection, DeepLinkTarget};
use crate::deep_link;
use crate::scroll::Viewport;
use crate::signal::ProgressCell;
use crate::store::ProgressStore;
use serde::Serialize;
use tracing::{debug, info, trace, warn};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SyncPhase {
    Uninitialized,
    Restoring,
    Ready,
}

/// Which source decided the starting position of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Resolution {
    DeepLink,
    Restored,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Adopted as the current position and persisted.
    Adopted,
    /// Seen while restoring; neither adopted nor persisted.
    Suppressed,
    /// No collection is loaded.
    Ignored,
}

#[derive(Debug)]
pub struct PositionSynchronizer {
    phase: SyncPhase,
    collection: Option<Collection>,
    progress: ProgressCell,
    store: ProgressStore,
    resolution: Option<Resolution>,
    suppressed_samples: u64,
}

impl PositionSynchronizer {
    pub fn new(store: ProgressStore, progress: ProgressCell) -> Self {
        Self {
            phase: SyncPhase::Uninitialized,
            collection: None,
            progress,
            store,
            resolution: None,
            suppressed_samples: 0,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn progress(&self) -> f64 {
        self.progress.load()
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub fn suppressed_samples(&self) -> u64 {
        self.suppressed_samples
    }

    /// Load `collection` and resolve its starting position in one call.
    pub fn load(
        &mut self,
        collection: Collection,
        deep_link: Option<&DeepLinkTarget>,
        viewport: &mut dyn Viewport,
    ) -> Resolution {
        self.begin_load(collection, viewport);
        self.complete_restore(deep_link, viewport)
    }

    /// Enter `Restoring` for a new collection.
    ///
    /// If another collection was loaded this is a swap: its position is
    /// discarded and the viewport returns to the origin.
    pub fn begin_load(&mut self, collection: Collection, viewport: &mut dyn Viewport) {
        if let Some(previous) = self.collection.as_ref() {
            info!(
                from = %previous.key(),
                to = %collection.key(),
                "Swapping collection; resetting position"
            );
            self.reset(viewport);
        }
        debug!(key = %collection.key(), records = collection.len(), "Restoring position");
        self.collection = Some(collection);
        self.progress.publish(0.0);
        self.resolution = None;
        self.suppressed_samples = 0;
        self.phase = SyncPhase::Restoring;
    }

    /// Decide the starting position and become `Ready`.
    pub fn complete_restore(
        &mut self,
        deep_link: Option<&DeepLinkTarget>,
        viewport: &mut dyn Viewport,
    ) -> Resolution {
        let Some(collection) = self.collection.as_ref() else {
            warn!("complete_restore called without a collection");
            return Resolution::Default;
        };
        if self.phase != SyncPhase::Restoring {
            warn!(phase = ?self.phase, "complete_restore called outside Restoring");
            return self.resolution.unwrap_or(Resolution::Default);
        }

        let key = collection.key().clone();
        let linked = deep_link.and_then(|target| deep_link::resolve(target, collection));
        let (resolution, fraction) = match linked {
            Some(fraction) => (Resolution::DeepLink, fraction),
            None => match self.store.read(&key) {
                Some(fraction) => (Resolution::Restored, fraction),
                None => (Resolution::Default, 0.0),
            },
        };

        self.progress.publish(fraction);
        if resolution != Resolution::Default {
            viewport.scroll_to(fraction * viewport.max_scroll_offset());
        }
        self.resolution = Some(resolution);
        self.phase = SyncPhase::Ready;
        info!(
            %key,
            ?resolution,
            fraction,
            suppressed = self.suppressed_samples,
            "Position ready"
        );
        resolution
    }

    /// Feed one tracker sample.
    pub fn observe(&mut self, fraction: f64) -> SampleOutcome {
        match self.phase {
            SyncPhase::Uninitialized => SampleOutcome::Ignored,
            SyncPhase::Restoring => {
                self.suppressed_samples += 1;
                trace!(fraction, "Sample before restore completed; not persisted");
                SampleOutcome::Suppressed
            }
            SyncPhase::Ready => {
                self.progress.publish(fraction);
                if let Some(collection) = self.collection.as_ref() {
                    self.store.write(collection.key(), fraction);
                }
                SampleOutcome::Adopted
            }
        }
    }

    /// Drop the loaded collection and return the viewport to the origin.
    pub fn reset(&mut self, viewport: &mut dyn Viewport) {
        self.collection = None;
        self.resolution = None;
        self.suppressed_samples = 0;
        self.progress.publish(0.0);
        self.phase = SyncPhase::Uninitialized;
        viewport.scroll_to(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionKey, numbered};
    use crate::scroll::HeadlessViewport;
    use crate::store::{MemoryMedium, storage_key};
    use std::sync::Arc;

    fn fixture() -> (PositionSynchronizer, Arc<MemoryMedium>, HeadlessViewport) {
        let medium = Arc::new(MemoryMedium::default());
        let store = ProgressStore::new(medium.clone());
        let sync = PositionSynchronizer::new(store, ProgressCell::default());
        (sync, medium, HeadlessViewport::new(900.0, 18_900.0))
    }

    #[test]
    fn nothing_stored_starts_at_zero_without_moving_viewport() {
        let (mut sync, medium, mut viewport) = fixture();

        let resolution = sync.load(numbered("Génesis/1", 100), None, &mut viewport);

        assert_eq!(resolution, Resolution::Default);
        assert_eq!(sync.phase(), SyncPhase::Ready);
        assert_eq!(sync.progress(), 0.0);
        assert!(viewport.moves().is_empty());
        assert!(medium.is_empty());
    }

    #[test]
    fn persisted_position_is_restored_and_viewport_moved() {
        let (mut sync, medium, mut viewport) = fixture();
        medium_set(&medium, "Génesis/1", "0.25");

        let resolution = sync.load(numbered("Génesis/1", 100), None, &mut viewport);

        assert_eq!(resolution, Resolution::Restored);
        assert_eq!(sync.progress(), 0.25);
        assert_eq!(viewport.moves(), &[4_500.0]);
    }

    #[test]
    fn deep_link_wins_over_persisted_position() {
        let (mut sync, medium, mut viewport) = fixture();
        medium_set(&medium, "Génesis/1", "0.9");
        let target = DeepLinkTarget::new(CollectionKey::new("Génesis/1"), 76);

        let resolution = sync.load(numbered("Génesis/1", 150), Some(&target), &mut viewport);

        assert_eq!(resolution, Resolution::DeepLink);
        assert_eq!(sync.progress(), 0.5);
        assert_eq!(viewport.moves(), &[9_000.0]);
    }

    #[test]
    fn unmatched_deep_link_falls_back_to_persisted_then_zero() {
        let (mut sync, medium, mut viewport) = fixture();
        medium_set(&medium, "Juan/3", "0.3");
        let past_end = DeepLinkTarget::new(CollectionKey::new("Juan/3"), 400);

        assert_eq!(
            sync.load(numbered("Juan/3", 36), Some(&past_end), &mut viewport),
            Resolution::Restored
        );
        assert_eq!(sync.progress(), 0.3);

        let (mut fresh, _, mut viewport) = fixture();
        assert_eq!(
            fresh.load(numbered("Juan/3", 36), Some(&past_end), &mut viewport),
            Resolution::Default
        );
        assert_eq!(fresh.progress(), 0.0);
    }

    #[test]
    fn samples_during_restore_are_never_persisted() {
        let (mut sync, medium, mut viewport) = fixture();
        medium_set(&medium, "Génesis/1", "0.6");

        sync.begin_load(numbered("Génesis/1", 100), &mut viewport);
        // Mount-time notification in the same turn as load start.
        assert_eq!(sync.observe(0.0), SampleOutcome::Suppressed);
        assert_eq!(sync.observe(0.0), SampleOutcome::Suppressed);
        assert_eq!(medium_get(&medium, "Génesis/1").as_deref(), Some("0.6"));

        sync.complete_restore(None, &mut viewport);

        assert_eq!(sync.progress(), 0.6);
        assert_eq!(medium_get(&medium, "Génesis/1").as_deref(), Some("0.6"));
        assert_eq!(medium.len(), 1);
    }

    #[test]
    fn ready_samples_update_progress_and_write_through() {
        let (mut sync, medium, mut viewport) = fixture();
        sync.load(numbered("Génesis/1", 100), None, &mut viewport);

        assert_eq!(sync.observe(0.5), SampleOutcome::Adopted);

        assert_eq!(sync.progress(), 0.5);
        assert_eq!(medium_get(&medium, "Génesis/1").as_deref(), Some("0.5"));
    }

    #[test]
    fn swap_discards_previous_fraction_and_rewinds_viewport() {
        let (mut sync, medium, mut viewport) = fixture();
        sync.load(numbered("Génesis/1", 100), None, &mut viewport);
        sync.observe(0.8);

        let resolution = sync.load(numbered("Éxodo/1", 22), None, &mut viewport);

        assert_eq!(resolution, Resolution::Default);
        assert_eq!(sync.progress(), 0.0);
        assert_eq!(viewport.moves(), &[0.0]);
        assert_eq!(sync.collection().map(|c| c.len()), Some(22));
        assert_eq!(medium_get(&medium, "Génesis/1").as_deref(), Some("0.8"));
        assert_eq!(medium_get(&medium, "Éxodo/1"), None);
    }

    #[test]
    fn swap_back_restores_that_collection_own_position() {
        let (mut sync, _medium, mut viewport) = fixture();
        sync.load(numbered("Génesis/1", 100), None, &mut viewport);
        sync.observe(0.8);
        sync.load(numbered("Éxodo/1", 22), None, &mut viewport);
        sync.observe(0.1);

        let resolution = sync.load(numbered("Génesis/1", 100), None, &mut viewport);

        assert_eq!(resolution, Resolution::Restored);
        assert_eq!(sync.progress(), 0.8);
    }

    #[test]
    fn samples_without_collection_are_ignored() {
        let (mut sync, medium, _) = fixture();
        assert_eq!(sync.observe(0.4), SampleOutcome::Ignored);
        assert_eq!(sync.progress(), 0.0);
        assert!(medium.is_empty());
    }

    fn medium_set(medium: &MemoryMedium, key: &str, value: &str) {
        use crate::store::KeyValueMedium;
        medium.set(&storage_key(&CollectionKey::new(key)), value.to_string());
    }

    fn medium_get(medium: &MemoryMedium, key: &str) -> Option<String> {
        use crate::store::KeyValueMedium;
        medium.get(&storage_key(&CollectionKey::new(key)))
    }
}
