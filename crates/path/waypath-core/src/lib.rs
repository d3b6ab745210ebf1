//! Waypath Core (engine-agnostic)
//!
//! Moves one object's local pose along a waypoint path. A path is built once from
//! configuration (two endpoints plus an offset waypoint, or a waypoint list), sampled as a
//! polyline or a smooth curve, and played back either as one timed traversal
//! (`MovementMode::AutoAnimation`) or as a queue of externally requested climb steps
//! (`MovementMode::PathAnimation`). Hosts receive poses through a [`PoseSink`] and
//! completion through [`PathEvent::SequenceFinished`].

pub mod config;
pub mod driver;
pub mod error;
pub mod interp;
pub mod outputs;
pub mod path;
pub mod pose;
pub mod sampling;
pub mod scheduler;
pub mod sink;
pub mod speed;
pub mod timing;

// Re-exports for consumers (adapters)
pub use config::{
    parse_path_config_json, DiagnosticsCfg, LineType, MovementMode, PathConfig, PathControl,
    PointSource, SampleCounts,
};
pub use driver::{AnimationDriver, AnimationState, ClimbAllTask};
pub use error::PathError;
pub use outputs::{Outputs, PathEvent};
pub use path::{AnchorSource, ControlPoint, Path, PathBuilder, StaticAnchor};
pub use pose::{euler_degrees_to_quat, OffsetDescriptor, PathFrame, Pose, Waypoint};
pub use sampling::{base_position, sample, sample_in_segment};
pub use scheduler::{ClimbSegment, SegmentQueue, SegmentSpan};
pub use sink::{
    FnSink, LocalTransform, PathObserver, PathSample, PoseSink, RecordingSink, SampleLogger,
    TrailHandle, TrailRecorder,
};
pub use speed::{normalize, SpeedCurve, SpeedKey, SpeedProfile};
pub use timing::{DistanceTimeTable, SegmentProgress};
