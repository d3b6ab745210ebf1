//! Pose sinks (where sampled poses go) and observers (who watches the samples).

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use nalgebra::Vector3;

use crate::config::MovementMode;
use crate::outputs::PathEvent;
use crate::pose::Pose;

/// Receives every pose the driver writes.
pub trait PoseSink {
    fn apply_pose(&mut self, pose: &Pose);
}

/// Default sink: keeps the latest pose, like a local transform component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalTransform {
    pose: Pose,
    writes: u64,
}

impl LocalTransform {
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Number of poses written so far.
    #[inline]
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl PoseSink for LocalTransform {
    fn apply_pose(&mut self, pose: &Pose) {
        self.pose = *pose;
        self.writes += 1;
    }
}

/// Keeps every written pose in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSink {
    pub poses: Vec<Pose>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&Pose> {
        self.poses.last()
    }
}

impl PoseSink for RecordingSink {
    fn apply_pose(&mut self, pose: &Pose) {
        self.poses.push(*pose);
    }
}

/// Forwards poses to a closure.
pub struct FnSink<F>(pub F);

impl<F: FnMut(&Pose)> PoseSink for FnSink<F> {
    fn apply_pose(&mut self, pose: &Pose) {
        (self.0)(pose)
    }
}

/// One sampled pose as seen by observers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSample {
    pub mode: MovementMode,
    /// Normalized path parameter.
    pub u: f32,
    pub distance: f32,
    pub pose: Pose,
    pub dt: f32,
}

/// Debug hooks. All methods default to no-ops.
pub trait PathObserver: Send + Sync {
    fn on_sample(&mut self, _sample: &PathSample) {}
    fn on_event(&mut self, _event: &PathEvent) {}
    /// Playback restarted or path parameters changed.
    fn on_reset(&mut self) {}
}

/// Jumps longer than this clear the trail.
pub const TRAIL_JUMP_LIMIT: f32 = 2.0;
pub const DEFAULT_TRAIL_CAPACITY: usize = 1000;

/// Shared read handle to a [`TrailRecorder`]'s positions.
#[derive(Clone, Debug, Default)]
pub struct TrailHandle(Arc<Mutex<Vec<Vector3<f32>>>>);

impl TrailHandle {
    pub fn positions(&self) -> Vec<Vector3<f32>> {
        self.0.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Records a bounded trail of sampled positions.
///
/// A jump longer than [`TRAIL_JUMP_LIMIT`] clears the trail; jumps away from the path ends
/// (0.1 < u < 0.9) are logged as warnings.
#[derive(Debug)]
pub struct TrailRecorder {
    trail: TrailHandle,
    capacity: usize,
}

impl Default for TrailRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_CAPACITY)
    }
}

impl TrailRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            trail: TrailHandle::default(),
            capacity: capacity.max(1),
        }
    }

    pub fn handle(&self) -> TrailHandle {
        self.trail.clone()
    }
}

impl PathObserver for TrailRecorder {
    fn on_sample(&mut self, sample: &PathSample) {
        let Ok(mut trail) = self.trail.0.lock() else {
            return;
        };
        let position = sample.pose.position;
        if let Some(prev) = trail.last() {
            let jump = (position - prev).norm();
            if jump > TRAIL_JUMP_LIMIT {
                if sample.u > 0.1 && sample.u < 0.9 {
                    warn!(
                        "path sample jumped {:.3} at u={:.3} (distance {:.3}); trail cleared",
                        jump, sample.u, sample.distance
                    );
                }
                trail.clear();
            }
        }
        trail.push(position);
        if trail.len() > self.capacity {
            let excess = trail.len() - self.capacity;
            trail.drain(..excess);
        }
    }

    fn on_reset(&mut self) {
        if let Ok(mut trail) = self.trail.0.lock() {
            trail.clear();
        }
    }
}

/// Logs samples at debug level, at most once per `interval` seconds of playback.
#[derive(Clone, Debug)]
pub struct SampleLogger {
    interval: f32,
    since_last: f32,
}

impl SampleLogger {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            since_last: f32::INFINITY,
        }
    }
}

impl PathObserver for SampleLogger {
    fn on_sample(&mut self, sample: &PathSample) {
        self.since_last += sample.dt;
        if self.since_last < self.interval {
            return;
        }
        self.since_last = 0.0;
        let p = sample.pose.position;
        debug!(
            "{:?} u={:.4} distance={:.4} position=({:.3}, {:.3}, {:.3})",
            sample.mode, sample.u, sample.distance, p.x, p.y, p.z
        );
    }

    fn on_event(&mut self, event: &PathEvent) {
        debug!("path event: {event:?}");
    }

    fn on_reset(&mut self) {
        self.since_last = f32::INFINITY;
    }
}
