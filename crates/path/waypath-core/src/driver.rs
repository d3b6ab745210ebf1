//! Animation driver: owns the built path and playback state and turns ticks into poses.
//!
//! Methods:
//! - new, with_anchor, update (tick → sample → sink)
//! - play, pause, resume, stop, reset_to_start
//! - climb_distance, climb_distance_default, climb_all_remaining, reset_climb,
//!   force_complete_current_segment (PathAnimation only)
//!
//! Control operations never write outputs directly; poses and events they produce are
//! delivered by the next `update`.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{MovementMode, PathConfig, PathControl, PointSource, MIN_DURATION};
use crate::error::PathError;
use crate::outputs::{Outputs, PathEvent};
use crate::path::{AnchorSource, Path, PathBuilder};
use crate::pose::Pose;
use crate::sampling::{sample, sample_in_segment};
use crate::scheduler::{
    ClimbSegment, SegmentCompletion, SegmentQueue, SegmentStart, StartOutcome, DISTANCE_EPSILON,
};
use crate::sink::{
    LocalTransform, PathObserver, PathSample, PoseSink, SampleLogger, TrailHandle, TrailRecorder,
};
use crate::speed::{normalize, SpeedProfile};
use crate::timing::DistanceTimeTable;

/// Polled state of `climb_all_remaining`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ClimbAllTask {
    #[default]
    Idle,
    /// Waiting for the issued `step` to finish; `remaining` counts the step.
    AwaitingSegment { remaining: f32, step: f32 },
}

/// Read-only snapshot of playback state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub mode: MovementMode,
    pub is_playing: bool,
    pub timer: f32,
    pub current_distance: f32,
    pub target_distance: f32,
    pub active_segment: Option<ClimbSegment>,
    pub queued: usize,
}

pub struct AnimationDriver<S: PoseSink = LocalTransform> {
    config: PathConfig,
    sink: S,

    path: Option<Path>,
    profile: Option<SpeedProfile>,
    table: Option<DistanceTimeTable>,
    queue: SegmentQueue,
    climb_all: ClimbAllTask,

    anchor: Option<Box<dyn AnchorSource>>,
    /// Anchor children captured at activation; cleared by `set_anchor` and reloads.
    anchor_poses: Option<Vec<Pose>>,

    diagnostics: Vec<Box<dyn PathObserver>>,
    observers: Vec<Box<dyn PathObserver>>,
    trail: Option<TrailHandle>,

    /// AutoAnimation elapsed time.
    timer: f32,
    is_playing: bool,
    enabled: bool,
    /// Completion latch; `SequenceFinished` fires once per traversal.
    finished: bool,
    structure_hash: u64,

    pending_pose: Option<Pose>,
    pending: Vec<PathEvent>,
    outputs: Outputs,
}

impl AnimationDriver<LocalTransform> {
    pub fn with_config(config: PathConfig) -> Self {
        Self::new(config, LocalTransform::default())
    }
}

impl<S: PoseSink> AnimationDriver<S> {
    /// Build the path and move to its start. AutoAnimation starts playing immediately;
    /// PathAnimation waits for a climb request. Build failures are logged and leave the
    /// driver without a path.
    pub fn new(config: PathConfig, sink: S) -> Self {
        let config = config.sanitized();
        let mut driver = Self {
            structure_hash: config.structure_hash(),
            queue: SegmentQueue::new(0.0),
            config,
            sink,
            path: None,
            profile: None,
            table: None,
            climb_all: ClimbAllTask::Idle,
            anchor: None,
            anchor_poses: None,
            diagnostics: Vec::new(),
            observers: Vec::new(),
            trail: None,
            timer: 0.0,
            is_playing: false,
            enabled: true,
            finished: false,
            pending_pose: None,
            pending: Vec::new(),
            outputs: Outputs::default(),
        };
        driver.install_diagnostics();
        driver.activate();
        driver
    }

    /// Attach an anchor and rebuild from its children.
    pub fn with_anchor(mut self, anchor: impl AnchorSource + 'static) -> Self {
        self.set_anchor(anchor);
        self.activate();
        self
    }

    fn activate(&mut self) {
        if let Err(err) = self.rebuild() {
            warn!("path build failed: {err}");
        }
        self.restart();
        self.start_auto_playback();
    }

    /// AutoAnimation plays as soon as a path exists, including paths built late from an anchor.
    fn start_auto_playback(&mut self) {
        let mode = self.config.movement_mode;
        if mode != MovementMode::AutoAnimation || self.path.is_none() || self.is_playing {
            return;
        }
        self.is_playing = true;
        self.enabled = true;
        self.emit(PathEvent::PlaybackStarted { mode });
    }

    fn install_diagnostics(&mut self) {
        self.diagnostics.clear();
        self.trail = None;
        let diag = self.config.diagnostics;
        if diag.record_trail {
            let recorder = TrailRecorder::default();
            self.trail = Some(recorder.handle());
            self.diagnostics.push(Box::new(recorder));
        }
        if diag.log_samples {
            self.diagnostics
                .push(Box::new(SampleLogger::new(diag.log_interval)));
        }
    }

    /// Rebuild path, speed profile and table from the current config. On failure the
    /// previous path is kept.
    fn rebuild(&mut self) -> Result<(), PathError> {
        self.load_anchor_poses();
        let path = PathBuilder::build_with_anchor(&self.config, self.anchor_poses.as_deref())?;
        let profile = normalize(&self.config.speed_curve, path.real_length());
        let table = DistanceTimeTable::build(&profile, self.config.samples.table);
        debug!("{}", path.describe());
        self.path = Some(path);
        self.profile = Some(profile);
        self.table = Some(table);
        Ok(())
    }

    fn load_anchor_poses(&mut self) {
        if self.config.path_control != PathControl::MultiPoint
            || self.config.point_source != PointSource::Anchor
            || self.anchor_poses.is_some()
        {
            return;
        }
        match &self.anchor {
            Some(anchor) => {
                let poses = anchor.child_poses();
                info!("loaded {} waypoints from anchor", poses.len());
                self.anchor_poses = Some(poses);
            }
            None => warn!("{}; using configured waypoints", PathError::AnchorUnavailable),
        }
    }

    /// Back to the first waypoint with a fresh timer, queue and completion latch.
    fn restart(&mut self) {
        self.timer = 0.0;
        self.finished = false;
        self.climb_all = ClimbAllTask::Idle;
        self.reset_queue();
        self.snap_to_start();
    }

    fn reset_queue(&mut self) {
        self.queue.reset(self.real_length());
        if let Some(distance) = self.config.next_climb_distance {
            self.queue.set_next_climb_distance(distance);
        }
    }

    /// Per-tick entry point. A no-op while stopped, paused or without a path.
    pub fn update(&mut self, dt: f32) -> &Outputs {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if self.enabled && self.is_playing && self.path.is_some() {
            match self.config.movement_mode {
                MovementMode::AutoAnimation => self.tick_auto(dt),
                MovementMode::PathAnimation => {
                    self.tick_path(dt);
                    self.poll_climb_all();
                }
            }
        }
        self.outputs.pose = self.pending_pose.take();
        self.outputs.events.clear();
        self.outputs.events.append(&mut self.pending);
        &self.outputs
    }

    fn tick_auto(&mut self, dt: f32) {
        self.timer += dt;
        let duration = self.config.duration.max(MIN_DURATION);
        let (Some(path), Some(table)) = (self.path.as_ref(), self.table.as_ref()) else {
            return;
        };
        let t = (self.timer / duration).clamp(0.0, 1.0);
        let distance = table.distance_at_time(t);
        let u = path.fraction_at(distance);
        let pose = sample(path, u);
        let last = path.last_pose();
        let length = path.real_length();

        if self.timer < duration {
            self.write_pose(pose, u, distance, dt);
            return;
        }
        self.is_playing = false;
        self.write_pose(last, 1.0, length, dt);
        info!("auto animation finished after {:.3}s", self.timer);
        self.finish(length);
    }

    fn tick_path(&mut self, dt: f32) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let length = path.real_length();
        let Some(report) = self.queue.tick(
            dt,
            length,
            &self.config.speed_curve,
            self.config.samples.segment_progress,
        ) else {
            return;
        };
        let u = path.fraction_at(report.live_distance);
        let pose = sample_in_segment(path, report.span, u);
        let last = path.last_pose();

        match report.completion {
            None => self.write_pose(pose, u, report.live_distance, dt),
            Some(SegmentCompletion::ReachedEnd) => {
                self.write_pose(last, 1.0, length, dt);
                self.emit(PathEvent::SegmentFinished { distance: length });
                info!("climb reached path end at {length:.3}");
                self.finish(length);
            }
            Some(SegmentCompletion::Continued(start)) => {
                self.write_pose(pose, u, report.live_distance, dt);
                self.emit(PathEvent::SegmentFinished {
                    distance: report.span.target,
                });
                self.handle_start(start, length);
            }
        }
    }

    fn handle_start(&mut self, start: SegmentStart, length: f32) {
        for segment in start.discarded {
            debug!("discarded climb step of {:.4}", segment.distance);
            self.emit(PathEvent::SegmentDiscarded {
                distance: segment.distance,
            });
        }
        match start.outcome {
            StartOutcome::Started { span, duration } => {
                debug!(
                    "climb segment {:.3} -> {:.3} over {:.3}s",
                    span.start, span.target, duration
                );
                self.emit(PathEvent::SegmentStarted {
                    start: span.start,
                    target: span.target,
                    duration,
                });
            }
            StartOutcome::Idle => {
                debug!("climb queue drained at {:.3}", self.queue.climbed_distance());
            }
            StartOutcome::ReachedEnd => {
                self.snap_to_end();
                info!("climb queue reached path end at {length:.3}");
                self.finish(length);
            }
        }
    }

    fn poll_climb_all(&mut self) {
        let ClimbAllTask::AwaitingSegment { remaining, step } = self.climb_all else {
            return;
        };
        if self.queue.is_active() {
            return;
        }
        let remaining = remaining - step;
        if remaining > DISTANCE_EPSILON && self.is_playing && !self.finished {
            let next = self.queue.next_climb_distance().min(remaining);
            if next > DISTANCE_EPSILON {
                debug!("climb-all: next step {next:.3}, {remaining:.3} remaining");
                self.climb_all = ClimbAllTask::AwaitingSegment {
                    remaining,
                    step: next,
                };
                if let Err(err) = self.climb_distance_default(next) {
                    warn!("climb-all cancelled: {err}");
                    self.climb_all = ClimbAllTask::Idle;
                }
                return;
            }
        }
        self.climb_all = ClimbAllTask::Idle;
        if self.queue.at_end(self.real_length()) {
            self.snap_to_end();
        }
        info!("climb-all finished at {:.3}", self.queue.climbed_distance());
    }

    fn finish(&mut self, distance: f32) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.emit(PathEvent::SequenceFinished { distance });
    }

    fn emit(&mut self, event: PathEvent) {
        for observer in self.diagnostics.iter_mut().chain(self.observers.iter_mut()) {
            observer.on_event(&event);
        }
        self.pending.push(event);
    }

    fn write_pose(&mut self, pose: Pose, u: f32, distance: f32, dt: f32) {
        self.sink.apply_pose(&pose);
        self.pending_pose = Some(pose);
        let sample = PathSample {
            mode: self.config.movement_mode,
            u,
            distance,
            pose,
            dt,
        };
        for observer in self.diagnostics.iter_mut().chain(self.observers.iter_mut()) {
            observer.on_sample(&sample);
        }
    }

    fn notify_reset(&mut self) {
        for observer in self.diagnostics.iter_mut().chain(self.observers.iter_mut()) {
            observer.on_reset();
        }
    }

    fn snap_to_start(&mut self) {
        if let Some(pose) = self.path.as_ref().map(Path::first_pose) {
            self.write_pose(pose, 0.0, 0.0, 0.0);
        }
    }

    fn snap_to_end(&mut self) {
        if let Some((pose, length)) = self.path.as_ref().map(|p| (p.last_pose(), p.real_length())) {
            self.write_pose(pose, 1.0, length, 0.0);
        }
    }

    fn require_mode(&self, operation: &'static str, expected: MovementMode) -> Result<(), PathError> {
        let actual = self.config.movement_mode;
        if actual == expected {
            return Ok(());
        }
        let err = PathError::InvalidMode {
            operation,
            expected,
            actual,
        };
        warn!("{err}");
        Err(err)
    }

    // ----- playback control -----

    /// Rebuild the path and start from the first waypoint.
    pub fn play(&mut self) -> Result<(), PathError> {
        if let Err(err) = self.rebuild() {
            warn!("play: path rebuild failed: {err}");
            if self.path.is_none() {
                return Err(err);
            }
        }
        self.notify_reset();
        self.restart();
        self.is_playing = true;
        self.enabled = true;
        let mode = self.config.movement_mode;
        info!("playback started ({mode:?}, length {:.3})", self.real_length());
        self.emit(PathEvent::PlaybackStarted { mode });
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.is_playing {
            return;
        }
        self.is_playing = false;
        self.emit(PathEvent::PlaybackPaused);
    }

    /// Continue from the current position. Ignored after `stop`.
    pub fn resume(&mut self) {
        if !self.enabled || self.is_playing || self.path.is_none() {
            return;
        }
        self.is_playing = true;
        self.emit(PathEvent::PlaybackResumed);
    }

    /// Halt and disable ticking until `play` or `climb_distance`. Cancels climb-all.
    pub fn stop(&mut self) {
        self.is_playing = false;
        self.enabled = false;
        self.climb_all = ClimbAllTask::Idle;
        self.emit(PathEvent::PlaybackStopped);
    }

    /// Timer to zero and pose to the first waypoint. In PathAnimation mode also clears the
    /// queue, the climbed distance and any climb-all task.
    pub fn reset_to_start(&mut self) {
        self.timer = 0.0;
        self.finished = false;
        if self.config.movement_mode == MovementMode::PathAnimation {
            self.climb_all = ClimbAllTask::Idle;
            self.reset_queue();
        }
        self.snap_to_start();
    }

    // ----- climbing (PathAnimation) -----

    /// Queue a climb step of `distance` over `duration` seconds. Starts playback if needed;
    /// the path is rebuilt first when no segment is running.
    pub fn climb_distance(&mut self, distance: f32, duration: f32) -> Result<(), PathError> {
        self.require_mode("climb_distance", MovementMode::PathAnimation)?;
        if !self.queue.is_active() {
            if let Err(err) = self.rebuild() {
                warn!("climb_distance: path rebuild failed: {err}");
            }
        }
        let Some(length) = self.path.as_ref().map(Path::real_length) else {
            warn!("climb_distance: {}", PathError::NoPath);
            return Err(PathError::NoPath);
        };
        if !self.is_playing {
            self.is_playing = true;
            self.emit(PathEvent::PlaybackStarted {
                mode: MovementMode::PathAnimation,
            });
        }
        self.enabled = true;

        let segment = ClimbSegment::new(distance, duration);
        let queued = self.queue.enqueue(segment);
        debug!(
            "queued climb {:.3} over {:.3}s ({queued} waiting)",
            segment.distance, segment.duration
        );
        self.emit(PathEvent::SegmentQueued {
            distance: segment.distance,
            duration: segment.duration,
            queued,
        });
        if !self.queue.is_active() {
            let start = self.queue.start_next(
                length,
                &self.config.speed_curve,
                self.config.samples.segment_progress,
            );
            self.handle_start(start, length);
        }
        Ok(())
    }

    /// `climb_distance` with the configured `duration`.
    pub fn climb_distance_default(&mut self, distance: f32) -> Result<(), PathError> {
        self.climb_distance(distance, self.config.duration)
    }

    /// Climb the rest of the path in steps of the suggested next distance. Rejected while a
    /// segment is running.
    pub fn climb_all_remaining(&mut self) -> Result<(), PathError> {
        self.require_mode("climb_all_remaining", MovementMode::PathAnimation)?;
        if self.queue.is_active() {
            let err = PathError::SegmentActive {
                operation: "climb_all_remaining",
            };
            warn!("{err}");
            return Err(err);
        }
        let Some(length) = self.path.as_ref().map(Path::real_length) else {
            return Err(PathError::NoPath);
        };
        self.is_playing = true;
        self.enabled = true;
        let remaining = length - self.queue.climbed_distance();
        if remaining <= DISTANCE_EPSILON {
            info!("climb_all_remaining: already at path end");
            return Ok(());
        }
        let step = self.queue.next_climb_distance().min(remaining);
        if step <= DISTANCE_EPSILON {
            return Ok(());
        }
        self.climb_all = ClimbAllTask::AwaitingSegment { remaining, step };
        if let Err(err) = self.climb_distance_default(step) {
            self.climb_all = ClimbAllTask::Idle;
            return Err(err);
        }
        Ok(())
    }

    /// Back to the first waypoint with nothing climbed; keeps playing.
    pub fn reset_climb(&mut self) -> Result<(), PathError> {
        self.require_mode("reset_climb", MovementMode::PathAnimation)?;
        self.notify_reset();
        self.restart();
        self.is_playing = true;
        info!("climb reset");
        Ok(())
    }

    /// Jump the running segment to its target, drop queued steps and cancel climb-all.
    /// Landing on the path end fires `SequenceFinished`.
    pub fn force_complete_current_segment(&mut self) -> Result<(), PathError> {
        self.require_mode("force_complete_current_segment", MovementMode::PathAnimation)?;
        self.climb_all = ClimbAllTask::Idle;
        let Some(span) = self.queue.active_span() else {
            return Ok(());
        };
        let Some(distance) = self.queue.force_complete() else {
            return Ok(());
        };
        debug!("force-completed segment at {distance:.3}");
        self.emit(PathEvent::SegmentFinished { distance });
        let length = self.real_length();
        if self.queue.at_end(length) {
            self.snap_to_end();
            info!("forced climb reached path end at {length:.3}");
            self.finish(length);
        } else if let Some(path) = self.path.as_ref() {
            let u = path.fraction_at(distance);
            let pose = sample_in_segment(path, span, u);
            self.write_pose(pose, u, distance, 0.0);
        }
        Ok(())
    }

    // ----- configuration -----

    /// Replace the configuration. Takes effect at the next build (`play`, idle
    /// `climb_distance`, anchor reload). Layout changes reset observers.
    pub fn set_config(&mut self, config: PathConfig) -> Result<(), PathError> {
        config.validate()?;
        let config = config.sanitized();
        let hash = config.structure_hash();
        let diagnostics_changed = config.diagnostics != self.config.diagnostics;
        self.config = config;
        if diagnostics_changed {
            self.install_diagnostics();
        }
        if hash != self.structure_hash {
            debug!("path parameters changed; resetting observers");
            self.structure_hash = hash;
            self.anchor_poses = None;
            self.notify_reset();
        }
        Ok(())
    }

    /// Attach a waypoint anchor. Its children are read at the next build.
    pub fn set_anchor(&mut self, anchor: impl AnchorSource + 'static) {
        self.anchor = Some(Box::new(anchor));
        self.anchor_poses = None;
    }

    /// Re-read the anchor's children, rebuild and restart from the first waypoint.
    pub fn force_reload_from_anchor(&mut self) -> Result<(), PathError> {
        if self.anchor.is_none() {
            warn!("force_reload_from_anchor: {}", PathError::AnchorUnavailable);
            return Err(PathError::AnchorUnavailable);
        }
        if self.queue.is_active() {
            return Err(PathError::SegmentActive {
                operation: "force_reload_from_anchor",
            });
        }
        self.anchor_poses = None;
        self.rebuild()?;
        self.notify_reset();
        self.restart();
        self.start_auto_playback();
        Ok(())
    }

    pub fn add_observer(&mut self, observer: impl PathObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ----- accessors -----

    pub fn state(&self) -> AnimationState {
        let current_distance = match self.config.movement_mode {
            MovementMode::AutoAnimation => self
                .table
                .as_ref()
                .map(|t| t.distance_at_time(self.timer / self.config.duration.max(MIN_DURATION)))
                .unwrap_or(0.0),
            MovementMode::PathAnimation => self.queue.current_distance(),
        };
        AnimationState {
            mode: self.config.movement_mode,
            is_playing: self.is_playing,
            timer: self.timer,
            current_distance,
            target_distance: self.queue.target_distance(),
            active_segment: self.queue.active_segment(),
            queued: self.queue.queued(),
        }
    }

    #[inline]
    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    #[inline]
    pub fn speed_profile(&self) -> Option<&SpeedProfile> {
        self.profile.as_ref()
    }

    #[inline]
    pub fn table(&self) -> Option<&DistanceTimeTable> {
        self.table.as_ref()
    }

    pub fn real_length(&self) -> f32 {
        self.path.as_ref().map(Path::real_length).unwrap_or(0.0)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// A climb segment is running.
    #[inline]
    pub fn is_path_animating(&self) -> bool {
        self.queue.is_active()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn climb_all_task(&self) -> ClimbAllTask {
        self.climb_all
    }

    #[inline]
    pub fn climbed_distance(&self) -> f32 {
        self.queue.climbed_distance()
    }

    #[inline]
    pub fn next_climb_distance(&self) -> f32 {
        self.queue.next_climb_distance()
    }

    pub fn set_next_climb_distance(&mut self, distance: f32) {
        self.queue.set_next_climb_distance(distance);
    }

    #[inline]
    pub fn trail(&self) -> Option<&TrailHandle> {
        self.trail.as_ref()
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: PoseSink + fmt::Debug> fmt::Debug for AnimationDriver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("mode", &self.config.movement_mode)
            .field("is_playing", &self.is_playing)
            .field("enabled", &self.enabled)
            .field("timer", &self.timer)
            .field("real_length", &self.real_length())
            .field("queue", &self.queue)
            .field("climb_all", &self.climb_all)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Waypoint;
    use crate::sink::RecordingSink;

    fn straight(mode: MovementMode, length: f32) -> PathConfig {
        PathConfig::multi_point(vec![
            Waypoint::at(0.0, 0.0, 0.0),
            Waypoint::at(length, 0.0, 0.0),
        ])
        .with_mode(mode)
        .with_duration(1.0)
    }

    #[test]
    fn path_mode_waits_for_climb() {
        let mut driver = AnimationDriver::new(
            straight(MovementMode::PathAnimation, 10.0),
            RecordingSink::default(),
        );
        assert!(!driver.is_playing());
        assert_eq!(driver.sink().poses.len(), 1);
        let out = driver.update(0.5);
        assert!(out.events.is_empty());
        assert_eq!(driver.sink().poses.len(), 1);
    }

    #[test]
    fn auto_mode_rejects_climb_operations() {
        let mut driver = AnimationDriver::with_config(straight(MovementMode::AutoAnimation, 4.0));
        assert!(matches!(
            driver.climb_distance(1.0, 1.0),
            Err(PathError::InvalidMode { .. })
        ));
        assert!(matches!(
            driver.climb_all_remaining(),
            Err(PathError::InvalidMode { .. })
        ));
        assert!(driver.reset_climb().is_err());
        assert!(driver.force_complete_current_segment().is_err());
    }

    #[test]
    fn control_events_arrive_with_next_update() {
        let mut driver = AnimationDriver::with_config(straight(MovementMode::PathAnimation, 10.0));
        driver.climb_distance(2.0, 1.0).expect("climb");
        let out = driver.update(0.0);
        assert_eq!(
            out.events[0],
            PathEvent::PlaybackStarted {
                mode: MovementMode::PathAnimation
            }
        );
        assert!(matches!(out.events[1], PathEvent::SegmentQueued { queued: 1, .. }));
        assert!(matches!(out.events[2], PathEvent::SegmentStarted { .. }));
        assert!(driver.update(0.0).events.is_empty());
    }

    #[test]
    fn climb_all_rejected_while_segment_runs() {
        let mut driver = AnimationDriver::with_config(straight(MovementMode::PathAnimation, 10.0));
        driver.climb_distance(2.0, 1.0).expect("climb");
        assert_eq!(
            driver.climb_all_remaining(),
            Err(PathError::SegmentActive {
                operation: "climb_all_remaining"
            })
        );
    }

    #[test]
    fn missing_path_is_inert() {
        let cfg = PathConfig::multi_point(vec![]).with_mode(MovementMode::PathAnimation);
        let mut driver = AnimationDriver::with_config(cfg);
        assert!(driver.path().is_none());
        assert_eq!(driver.climb_distance(1.0, 1.0), Err(PathError::NoPath));
        assert!(driver.update(1.0).is_empty());
        assert!(driver.play().is_err());
    }

    #[test]
    fn stop_disables_until_play() {
        let mut driver = AnimationDriver::with_config(straight(MovementMode::AutoAnimation, 4.0));
        driver.update(0.25);
        driver.stop();
        driver.resume();
        assert!(!driver.is_playing());
        let out = driver.update(0.25);
        assert!(out.pose.is_none());
        assert_eq!(out.events, vec![PathEvent::PlaybackStopped]);
        driver.play().expect("play");
        let out = driver.update(0.25);
        assert!(out.pose.is_some());
    }
}
