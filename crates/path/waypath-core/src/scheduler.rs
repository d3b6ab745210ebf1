//! FIFO climb-step scheduler for PathAnimation mode.
//!
//! The queue owns the committed climbed distance and at most one active segment. It produces
//! outcomes only; the driver turns them into poses and events.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::interp::functions::{clamp01, lerp_f32};
use crate::speed::{normalize, SpeedCurve};
use crate::timing::SegmentProgress;

/// Remaining lengths and step lengths at or below this are treated as zero.
pub const DISTANCE_EPSILON: f32 = 1e-3;
/// Distance from the path end within which a finished segment snaps to the end.
pub const END_TOLERANCE: f32 = 1e-2;
pub const MIN_SEGMENT_DURATION: f32 = 1e-4;

/// One requested climb step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClimbSegment {
    pub distance: f32,
    pub duration: f32,
}

impl ClimbSegment {
    /// Negative distances clamp to zero, durations to [`MIN_SEGMENT_DURATION`].
    pub fn new(distance: f32, duration: f32) -> Self {
        Self {
            distance: distance.max(0.0),
            duration: duration.max(MIN_SEGMENT_DURATION),
        }
    }
}

/// Absolute distances covered by the active segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub start: f32,
    pub target: f32,
}

impl SegmentSpan {
    #[inline]
    pub fn length(&self) -> f32 {
        self.target - self.start
    }
}

#[derive(Clone, Debug)]
struct ActiveSegment {
    span: SegmentSpan,
    duration: f32,
    timer: f32,
    progress: SegmentProgress,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StartOutcome {
    Started { span: SegmentSpan, duration: f32 },
    /// Queue drained before the path end; hold position.
    Idle,
    ReachedEnd,
}

/// Result of trying to start the next queued segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentStart {
    pub outcome: StartOutcome,
    /// Steps dequeued and dropped because they were too short.
    pub discarded: Vec<ClimbSegment>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SegmentCompletion {
    ReachedEnd,
    Continued(SegmentStart),
}

/// What one tick of the active segment produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub span: SegmentSpan,
    pub live_distance: f32,
    pub linear: f32,
    pub weighted: f32,
    pub completion: Option<SegmentCompletion>,
}

#[derive(Clone, Debug, Default)]
pub struct SegmentQueue {
    queue: VecDeque<ClimbSegment>,
    active: Option<ActiveSegment>,
    climbed: f32,
    live: f32,
    target: f32,
    next_climb_distance: f32,
}

impl SegmentQueue {
    pub fn new(real_length: f32) -> Self {
        let mut queue = Self::default();
        queue.reset(real_length);
        queue
    }

    /// Zero all distances and drop queued and active segments.
    pub fn reset(&mut self, real_length: f32) {
        self.queue.clear();
        self.active = None;
        self.climbed = 0.0;
        self.live = 0.0;
        self.target = 0.0;
        self.next_climb_distance = real_length.max(0.0);
    }

    /// Append a step; returns how many steps are waiting.
    pub fn enqueue(&mut self, segment: ClimbSegment) -> usize {
        self.queue.push_back(segment);
        self.queue.len()
    }

    /// Dequeue until a segment starts, the queue drains or the path end is reached.
    pub fn start_next(
        &mut self,
        real_length: f32,
        curve: &SpeedCurve,
        progress_samples: usize,
    ) -> SegmentStart {
        let mut discarded = Vec::new();
        loop {
            if self.queue.is_empty() {
                self.active = None;
                return SegmentStart {
                    outcome: StartOutcome::Idle,
                    discarded,
                };
            }
            let remaining = real_length - self.climbed;
            if remaining <= DISTANCE_EPSILON {
                self.settle_at_end(real_length);
                return SegmentStart {
                    outcome: StartOutcome::ReachedEnd,
                    discarded,
                };
            }
            let Some(segment) = self.queue.pop_front() else {
                continue;
            };
            let length = segment.distance.min(remaining);
            if length <= DISTANCE_EPSILON {
                discarded.push(segment);
                continue;
            }

            let duration = segment.duration.max(MIN_SEGMENT_DURATION);
            let span = SegmentSpan {
                start: self.climbed,
                target: (self.climbed + length).clamp(0.0, real_length),
            };
            let profile = normalize(curve, length);
            self.active = Some(ActiveSegment {
                span,
                duration,
                timer: 0.0,
                progress: SegmentProgress::new(&profile, progress_samples),
            });
            self.live = self.climbed;
            self.target = span.target;
            self.next_climb_distance = real_length - self.climbed;
            return SegmentStart {
                outcome: StartOutcome::Started { span, duration },
                discarded,
            };
        }
    }

    /// Advance the active segment. Returns `None` while idle.
    pub fn tick(
        &mut self,
        dt: f32,
        real_length: f32,
        curve: &SpeedCurve,
        progress_samples: usize,
    ) -> Option<TickReport> {
        let active = self.active.as_mut()?;
        active.timer += dt;
        let linear = clamp01(active.timer / active.duration);
        let weighted = active.progress.weighted_progress(linear);
        let span = active.span;
        self.live = lerp_f32(span.start, span.target, weighted).min(real_length);

        if linear < 1.0 {
            return Some(TickReport {
                span,
                live_distance: self.live,
                linear,
                weighted,
                completion: None,
            });
        }

        self.active = None;
        self.climbed = span.target;
        self.live = span.target;
        let completion = if (self.climbed - real_length).abs() < END_TOLERANCE {
            self.settle_at_end(real_length);
            SegmentCompletion::ReachedEnd
        } else {
            SegmentCompletion::Continued(self.start_next(real_length, curve, progress_samples))
        };
        Some(TickReport {
            span,
            live_distance: span.target,
            linear,
            weighted,
            completion: Some(completion),
        })
    }

    /// Jump the active segment to its target and drop every queued step.
    /// Returns the settled distance when a segment was active.
    pub fn force_complete(&mut self) -> Option<f32> {
        self.queue.clear();
        let active = self.active.take()?;
        self.climbed = active.span.target;
        self.live = self.climbed;
        self.target = self.climbed;
        Some(self.climbed)
    }

    fn settle_at_end(&mut self, real_length: f32) {
        self.queue.clear();
        self.active = None;
        self.climbed = real_length;
        self.live = real_length;
        self.target = real_length;
    }

    /// Committed or targeted distance is within [`DISTANCE_EPSILON`] of the end.
    pub fn at_end(&self, real_length: f32) -> bool {
        (real_length - self.climbed).abs() < DISTANCE_EPSILON
            || (real_length - self.target).abs() < DISTANCE_EPSILON
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Effective length and duration of the running segment.
    pub fn active_segment(&self) -> Option<ClimbSegment> {
        self.active.as_ref().map(|a| ClimbSegment {
            distance: a.span.length(),
            duration: a.duration,
        })
    }

    pub fn active_span(&self) -> Option<SegmentSpan> {
        self.active.as_ref().map(|a| a.span)
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn climbed_distance(&self) -> f32 {
        self.climbed
    }

    /// Live distance including the active segment's progress.
    #[inline]
    pub fn current_distance(&self) -> f32 {
        self.live
    }

    #[inline]
    pub fn target_distance(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn next_climb_distance(&self) -> f32 {
        self.next_climb_distance
    }

    pub fn set_next_climb_distance(&mut self, distance: f32) {
        self.next_climb_distance = distance.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    fn run_to_completion(q: &mut SegmentQueue, length: f32) -> Vec<TickReport> {
        let curve = SpeedCurve::default();
        let mut reports = Vec::new();
        for _ in 0..1000 {
            match q.tick(0.05, length, &curve, 100) {
                Some(r) => {
                    let done = r.completion.is_some();
                    reports.push(r);
                    if done && !q.is_active() {
                        break;
                    }
                }
                None => break,
            }
        }
        reports
    }

    #[test]
    fn steps_run_in_order_without_reaching_end() {
        let curve = SpeedCurve::default();
        let mut q = SegmentQueue::new(10.0);
        q.enqueue(ClimbSegment::new(3.0, 1.0));
        q.enqueue(ClimbSegment::new(4.0, 1.0));
        let start = q.start_next(10.0, &curve, 100);
        assert_eq!(
            start.outcome,
            StartOutcome::Started {
                span: SegmentSpan { start: 0.0, target: 3.0 },
                duration: 1.0
            }
        );
        let mut finished = Vec::new();
        for _ in 0..100 {
            if let Some(report) = q.tick(0.1, 10.0, &curve, 100) {
                if let Some(completion) = report.completion {
                    finished.push(q.climbed_distance());
                    assert!(!matches!(completion, SegmentCompletion::ReachedEnd));
                }
            }
        }
        assert_eq!(finished.len(), 2);
        assert!(approx(finished[0], 3.0, 1e-5));
        assert!(approx(finished[1], 7.0, 1e-5));
        assert!(!q.is_active());
    }

    #[test]
    fn overshooting_step_clamps_and_reaches_end() {
        let curve = SpeedCurve::default();
        let mut q = SegmentQueue::new(5.0);
        q.enqueue(ClimbSegment::new(50.0, 1.0));
        q.start_next(5.0, &curve, 100);
        assert_eq!(q.target_distance(), 5.0);
        let reports = run_to_completion(&mut q, 5.0);
        let last = reports.last().expect("report");
        assert_eq!(last.completion, Some(SegmentCompletion::ReachedEnd));
        assert_eq!(q.climbed_distance(), 5.0);
    }

    #[test]
    fn tiny_steps_are_discarded() {
        let curve = SpeedCurve::default();
        let mut q = SegmentQueue::new(5.0);
        q.enqueue(ClimbSegment::new(0.0005, 1.0));
        q.enqueue(ClimbSegment::new(-2.0, 1.0));
        let start = q.start_next(5.0, &curve, 100);
        assert_eq!(start.outcome, StartOutcome::Idle);
        assert_eq!(start.discarded.len(), 2);
        assert_eq!(q.climbed_distance(), 0.0);
    }

    #[test]
    fn start_at_end_clears_queue() {
        let curve = SpeedCurve::default();
        let mut q = SegmentQueue::new(5.0);
        q.enqueue(ClimbSegment::new(5.0, 0.2));
        q.start_next(5.0, &curve, 100);
        run_to_completion(&mut q, 5.0);
        q.enqueue(ClimbSegment::new(1.0, 1.0));
        q.enqueue(ClimbSegment::new(1.0, 1.0));
        let start = q.start_next(5.0, &curve, 100);
        assert_eq!(start.outcome, StartOutcome::ReachedEnd);
        assert_eq!(q.queued(), 0);
    }

    #[test]
    fn force_complete_settles_target() {
        let curve = SpeedCurve::default();
        let mut q = SegmentQueue::new(10.0);
        q.enqueue(ClimbSegment::new(4.0, 2.0));
        q.enqueue(ClimbSegment::new(4.0, 2.0));
        q.start_next(10.0, &curve, 100);
        q.tick(1.0, 10.0, &curve, 100);
        assert!(approx(q.current_distance(), 2.0, 1e-3));
        assert_eq!(q.force_complete(), Some(4.0));
        assert_eq!(q.queued(), 0);
        assert!(!q.is_active());
        assert_eq!(q.force_complete(), None);
    }

    #[test]
    fn next_climb_suggestion_tracks_remaining() {
        let curve = SpeedCurve::default();
        let mut q = SegmentQueue::new(10.0);
        assert_eq!(q.next_climb_distance(), 10.0);
        q.enqueue(ClimbSegment::new(3.0, 0.5));
        q.enqueue(ClimbSegment::new(3.0, 0.5));
        q.start_next(10.0, &curve, 100);
        assert_eq!(q.next_climb_distance(), 10.0);
        q.tick(0.5, 10.0, &curve, 100);
        assert!(approx(q.next_climb_distance(), 7.0, 1e-5));
        q.reset(10.0);
        assert_eq!(q.next_climb_distance(), 10.0);
        assert_eq!(q.current_distance(), 0.0);
    }
}
