//! Scroll-synchronized flight through an ordered collection of records.
//!
//! A scroll position is normalized to a progress fraction, persisted per
//! collection, restored on load (deep link first), and drives both the
//! current-record cursor and a smoothed camera that travels along the path.

pub mod bindings;
pub mod camera;
pub mod cancellation;
pub mod collection;
pub mod config;
pub mod cursor;
pub mod deep_link;
pub mod frame;
pub mod hud;
pub mod scroll;
pub mod session;
pub mod signal;
pub mod store;
pub mod sync;

pub use bindings::export_ts_bindings;
pub use camera::{CameraInterpolator, CameraPose, CameraRig};
pub use collection::{
    Collection, CollectionKey, DeepLinkTarget, Record, load_collection, parse_collection,
};
pub use config::{LogLevel, NavigatorConfig, load_config, serialize_config};
pub use frame::{FrameScheduler, ManualFrameScheduler, ThreadFrameScheduler};
pub use hud::HudView;
pub use scroll::{HeadlessViewport, ScrollSample, Viewport};
pub use session::{Navigator, NavigatorCommand, NavigatorEvent, NavigatorSnapshot};
pub use store::{FileMedium, KeyValueMedium, MemoryMedium, ProgressStore};
pub use sync::{Resolution, SyncPhase};
