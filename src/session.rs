//! One host's navigation session.
//!
//! `Navigator` owns the current generation (scroll tracker + frame loop) and
//! wires tracker samples into the synchronizer, cursor and camera. Commands
//! come in, an event with a fresh snapshot goes out.

use crate::camera::{CameraPose, CameraRig};
use crate::cancellation::Subscription;
use crate::collection::{Collection, CollectionKey, DeepLinkTarget};
use crate::config::NavigatorConfig;
use crate::frame::{CameraSurface, FrameLoop, FrameLoopSpec, FrameScheduler};
use crate::hud::HudView;
use crate::scroll::{ScrollSample, ScrollTracker, Viewport};
use crate::signal::ProgressCell;
use crate::store::ProgressStore;
use crate::sync::{PositionSynchronizer, Resolution, SampleOutcome, SyncPhase};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct NavigatorSnapshot {
    pub collection_key: Option<CollectionKey>,
    pub record_count: usize,
    pub phase: SyncPhase,
    pub resolution: Option<Resolution>,
    pub progress: f64,
    pub hud: HudView,
    pub camera_target: Option<CameraPose>,
    pub camera_pose: CameraPose,
    #[ts(type = "number")]
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum NavigatorCommand {
    GetSnapshot,
    LoadCollection {
        collection: Collection,
        deep_link: Option<DeepLinkTarget>,
    },
    Scrolled {
        offset: f64,
        max_offset: f64,
    },
    Teardown,
}

impl NavigatorCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "navigator_get_snapshot",
            Self::LoadCollection { .. } => "navigator_load_collection",
            Self::Scrolled { .. } => "navigator_scrolled",
            Self::Teardown => "navigator_teardown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigatorEvent {
    pub action: &'static str,
    /// The HUD record differs from the one in the previous event.
    pub hud_changed: bool,
    pub snapshot: NavigatorSnapshot,
}

struct Generation {
    id: u64,
    tracker: ScrollTracker,
    frame_loop: FrameLoop,
}

impl Generation {
    fn cancel(&mut self) {
        self.tracker.teardown();
        self.frame_loop.cancel();
        debug!(generation = self.id, "Generation cancelled");
    }
}

pub struct Navigator<V: Viewport> {
    viewport: V,
    synchronizer: PositionSynchronizer,
    store: ProgressStore,
    progress: ProgressCell,
    scheduler: Box<dyn FrameScheduler>,
    rig: CameraRig,
    frame_interval: Duration,
    surface: CameraSurface,
    current: Option<Generation>,
    next_generation: u64,
    hud: HudView,
}

impl<V: Viewport> Navigator<V> {
    pub fn new(
        config: &NavigatorConfig,
        store: ProgressStore,
        viewport: V,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Self {
        let rig = CameraRig::from_config(config);
        let progress = ProgressCell::default();
        Self {
            viewport,
            synchronizer: PositionSynchronizer::new(store.clone(), progress.clone()),
            store,
            progress,
            scheduler,
            rig,
            frame_interval: config.frame_interval(),
            surface: CameraSurface::new(rig.rest_pose()),
            current: None,
            next_generation: 1,
            hud: HudView::empty(),
        }
    }

    pub fn apply_command(&mut self, command: NavigatorCommand) -> NavigatorEvent {
        let action = command.action();
        let previous_hud = self.hud.clone();
        match command {
            NavigatorCommand::GetSnapshot => {}
            NavigatorCommand::LoadCollection {
                collection,
                deep_link,
            } => {
                self.load_collection(collection, deep_link.as_ref());
            }
            NavigatorCommand::Scrolled { offset, max_offset } => {
                self.handle_scrolled(ScrollSample { offset, max_offset });
            }
            NavigatorCommand::Teardown => self.teardown(),
        }
        NavigatorEvent {
            action,
            hud_changed: self.hud.record_changed(&previous_hud),
            snapshot: self.snapshot(),
        }
    }

    /// Replace the active collection, cancelling the previous generation first.
    pub fn load_collection(
        &mut self,
        collection: Collection,
        deep_link: Option<&DeepLinkTarget>,
    ) -> Resolution {
        if let Some(mut old) = self.current.take() {
            old.cancel();
        }

        let record_count = collection.len();
        let key = collection.key().clone();
        let resolution = self
            .synchronizer
            .load(collection, deep_link, &mut self.viewport);

        let id = self.next_generation;
        self.next_generation += 1;
        let frame_loop = FrameLoop::start(
            self.scheduler.as_ref(),
            FrameLoopSpec {
                generation: id,
                record_count,
                rig: self.rig,
                interval: self.frame_interval,
            },
            self.progress.reader(),
            self.surface.clone(),
        );
        self.current = Some(Generation {
            id,
            tracker: ScrollTracker::new(),
            frame_loop,
        });
        self.refresh_hud();
        info!(
            %key,
            generation = id,
            record_count,
            ?resolution,
            progress = self.progress.load(),
            "Collection loaded"
        );
        resolution
    }

    /// One viewport scroll notification.
    pub fn handle_scrolled(&mut self, sample: ScrollSample) -> SampleOutcome {
        let Some(generation) = self.current.as_mut() else {
            return SampleOutcome::Ignored;
        };
        let Some(fraction) = generation.tracker.notify(sample) else {
            return SampleOutcome::Ignored;
        };
        let outcome = self.synchronizer.observe(fraction);
        if outcome == SampleOutcome::Adopted {
            self.refresh_hud();
        }
        outcome
    }

    /// Listen to every fraction published by the current generation's tracker.
    ///
    /// The subscription ends with the generation.
    pub fn subscribe_progress(
        &mut self,
        listener: impl FnMut(f64) + Send + 'static,
    ) -> Option<Subscription> {
        self.current
            .as_mut()
            .map(|generation| generation.tracker.subscribe(listener))
    }

    /// Cancel the active generation and flush persisted progress.
    pub fn teardown(&mut self) {
        if let Some(mut generation) = self.current.take() {
            generation.cancel();
        }
        self.store.flush();
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        let collection = self.synchronizer.collection();
        let progress = self.progress.load();
        NavigatorSnapshot {
            collection_key: collection.map(|c| c.key().clone()),
            record_count: collection.map_or(0, Collection::len),
            phase: self.synchronizer.phase(),
            resolution: self.synchronizer.resolution(),
            progress,
            hud: self.hud.clone(),
            camera_target: collection.map(|c| self.rig.target(progress, c.len())),
            camera_pose: self.surface.pose(),
            generation: self.current.as_ref().map_or(0, |g| g.id),
        }
    }

    pub fn hud(&self) -> &HudView {
        &self.hud
    }

    pub fn progress(&self) -> f64 {
        self.progress.load()
    }

    pub fn camera_surface(&self) -> &CameraSurface {
        &self.surface
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    fn refresh_hud(&mut self) {
        self.hud = match self.synchronizer.collection() {
            Some(collection) => HudView::derive(self.progress.load(), collection),
            None => HudView::empty(),
        };
    }
}

impl<V: Viewport> Drop for Navigator<V> {
    fn drop(&mut self) {
        if let Some(mut generation) = self.current.take() {
            generation.cancel();
        }
    }
}
