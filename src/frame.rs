//! Per-frame camera updates, decoupled from scroll events.
//!
//! A `FrameLoop` is one generation's repeating task. It reads the latest
//! published progress, advances its interpolator and writes the pose to the
//! shared render surface. Cancelling the loop takes the surface lock, so once
//! `cancel` returns no tick of that generation can write again.

use crate::camera::{CameraInterpolator, CameraPose, CameraRig};
use crate::cancellation::CancellationToken;
use crate::signal::ProgressReader;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, trace, warn};

pub type FrameTask = Box<dyn FnMut() + Send>;

/// Source of display-cadence ticks.
pub trait FrameScheduler: Send {
    /// Run `task` every `interval` until the returned token is cancelled.
    fn schedule_repeating(&self, interval: Duration, task: FrameTask) -> CancellationToken;
}

/// Runs each repeating task on its own thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadFrameScheduler;

impl FrameScheduler for ThreadFrameScheduler {
    fn schedule_repeating(&self, interval: Duration, mut task: FrameTask) -> CancellationToken {
        let token = CancellationToken::new();
        let thread_token = token.clone();
        let spawned = std::thread::Builder::new()
            .name("frame-loop".to_string())
            .spawn(move || {
                while thread_token.check_cancelled("frame").is_ok() {
                    task();
                    std::thread::sleep(interval);
                }
                trace!("Frame thread exiting");
            });
        if let Err(err) = spawned {
            warn!("Failed to spawn frame thread: {err}");
            token.cancel();
        }
        token
    }
}

/// Scheduler stepped by hand; ticks happen only inside `advance`.
#[derive(Clone, Default)]
pub struct ManualFrameScheduler {
    tasks: Arc<Mutex<Vec<(CancellationToken, FrameTask)>>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick every live task `frames` times.
    pub fn advance(&self, frames: usize) {
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };
        for _ in 0..frames {
            tasks.retain(|(token, _)| !token.is_cancelled());
            for (_, task) in tasks.iter_mut() {
                task();
            }
        }
        tasks.retain(|(token, _)| !token.is_cancelled());
    }

    pub fn live_tasks(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().filter(|(t, _)| !t.is_cancelled()).count())
            .unwrap_or(0)
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn schedule_repeating(&self, _interval: Duration, task: FrameTask) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push((token.clone(), task));
        } else {
            token.cancel();
        }
        token
    }
}

#[derive(Debug, Clone, Copy)]
struct SurfaceState {
    pose: CameraPose,
    generation: u64,
    frames: u64,
}

/// The single camera pose the renderer draws from.
#[derive(Debug, Clone)]
pub struct CameraSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl CameraSurface {
    pub fn new(pose: CameraPose) -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                pose,
                generation: 0,
                frames: 0,
            })),
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.state
            .lock()
            .map(|s| s.pose)
            .unwrap_or_else(|poisoned| poisoned.into_inner().pose)
    }

    /// Generation that wrote the current pose.
    pub fn generation(&self) -> u64 {
        self.state.lock().map(|s| s.generation).unwrap_or(0)
    }

    /// Frames written by the current generation.
    pub fn frames(&self) -> u64 {
        self.state.lock().map(|s| s.frames).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameLoopSpec {
    pub generation: u64,
    pub record_count: usize,
    pub rig: CameraRig,
    pub interval: Duration,
}

pub struct FrameLoop {
    generation: u64,
    guard: CancellationToken,
    schedule: CancellationToken,
    surface: CameraSurface,
}

impl FrameLoop {
    /// Start a generation's loop, continuing from the surface's current pose.
    pub fn start(
        scheduler: &dyn FrameScheduler,
        spec: FrameLoopSpec,
        progress: ProgressReader,
        surface: CameraSurface,
    ) -> Self {
        let guard = CancellationToken::new();
        let mut camera = CameraInterpolator::with_pose(spec.rig, surface.pose());
        let task_guard = guard.clone();
        let task_surface = surface.clone();
        let generation = spec.generation;
        let record_count = spec.record_count;

        if let Ok(mut state) = surface.state.lock() {
            state.generation = generation;
            state.frames = 0;
        }

        let task: FrameTask = Box::new(move || {
            let Ok(mut state) = task_surface.state.lock() else {
                return;
            };
            if task_guard.is_cancelled() {
                return;
            }
            let pose = camera.tick(progress.load(), record_count);
            state.pose = pose;
            state.frames += 1;
            trace!(generation, x = pose.x, y = pose.y, z = pose.z, "Camera frame");
        });
        let schedule = scheduler.schedule_repeating(spec.interval, task);
        debug!(generation, record_count, "Frame loop started");
        Self {
            generation,
            guard,
            schedule,
            surface,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        !self.guard.is_cancelled() && !self.schedule.is_cancelled()
    }

    pub fn cancel(&self) {
        if self.guard.is_cancelled() {
            return;
        }
        // Holding the surface lock here waits out any tick in flight.
        let _state = self.surface.state.lock();
        self.guard.cancel();
        self.schedule.cancel();
        debug!(generation = self.generation, "Frame loop cancelled");
    }
}
