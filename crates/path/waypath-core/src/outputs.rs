//! Output contracts from the driver.
//!
//! Outputs carry the pose written this tick (if any) and the semantic events raised since
//! the previous tick. Adapters apply the pose to the host and transport events.

use serde::{Deserialize, Serialize};

use crate::config::MovementMode;
use crate::pose::Pose;

/// Discrete semantic signals emitted by the driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PathEvent {
    PlaybackStarted {
        mode: MovementMode,
    },
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    /// A climb step was appended; `queued` counts steps waiting behind the active one.
    SegmentQueued {
        distance: f32,
        duration: f32,
        queued: usize,
    },
    SegmentStarted {
        start: f32,
        target: f32,
        duration: f32,
    },
    /// A dequeued step was too short to move.
    SegmentDiscarded {
        distance: f32,
    },
    SegmentFinished {
        distance: f32,
    },
    /// The end of the path was reached. Fired once per traversal.
    SequenceFinished {
        distance: f32,
    },
}

/// Outputs returned by `AnimationDriver::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub pose: Option<Pose>,
    #[serde(default)]
    pub events: Vec<PathEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.pose = None;
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: PathEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pose.is_none() && self.events.is_empty()
    }

    /// True when this tick completed the path.
    pub fn finished(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, PathEvent::SequenceFinished { .. }))
    }
}
