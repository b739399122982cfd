//! Smoothed camera travel along the verse path.
//!
//! Records sit `record_spacing` apart on the x axis. Each frame the camera
//! moves a fixed fraction of the remaining distance toward the point derived
//! from progress, hovering at a constant altitude (y) and distance (z). The
//! approach is asymptotic: no snapping on jumps and no overshoot.

use crate::config::NavigatorConfig;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CameraPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CameraPose {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn lerp(self, target: CameraPose, t: f64) -> CameraPose {
        CameraPose {
            x: lerp(self.x, target.x, t),
            y: lerp(self.y, target.y, t),
            z: lerp(self.z, target.z, t),
        }
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Fixed geometry of the flight path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub record_spacing: f64,
    pub altitude: f64,
    pub distance: f64,
    pub smoothing_factor: f64,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            record_spacing: 40.0,
            altitude: 5.0,
            distance: 30.0,
            smoothing_factor: 0.05,
        }
    }
}

impl CameraRig {
    pub fn from_config(config: &NavigatorConfig) -> Self {
        Self {
            record_spacing: config.record_spacing,
            altitude: config.camera_altitude,
            distance: config.camera_distance,
            smoothing_factor: config.smoothing_factor,
        }
    }

    /// Total length of the path for `record_count` records.
    pub fn extent(&self, record_count: usize) -> f64 {
        record_count as f64 * self.record_spacing
    }

    pub fn target(&self, progress: f64, record_count: usize) -> CameraPose {
        let progress = if progress.is_finite() { progress } else { 0.0 };
        CameraPose::new(
            progress * self.extent(record_count),
            self.altitude,
            self.distance,
        )
    }

    /// Where a freshly mounted camera starts: the head of the path.
    pub fn rest_pose(&self) -> CameraPose {
        CameraPose::new(0.0, self.altitude, self.distance)
    }
}

#[derive(Debug, Clone)]
pub struct CameraInterpolator {
    rig: CameraRig,
    pose: CameraPose,
    frames: u64,
}

impl CameraInterpolator {
    pub fn new(rig: CameraRig) -> Self {
        Self {
            pose: rig.rest_pose(),
            rig,
            frames: 0,
        }
    }

    pub fn with_pose(rig: CameraRig, pose: CameraPose) -> Self {
        Self {
            rig,
            pose,
            frames: 0,
        }
    }

    /// Advance one frame toward the target for `progress`.
    pub fn tick(&mut self, progress: f64, record_count: usize) -> CameraPose {
        let target = self.rig.target(progress, record_count);
        self.pose = self.pose.lerp(target, self.rig.smoothing_factor);
        self.frames += 1;
        self.pose
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
