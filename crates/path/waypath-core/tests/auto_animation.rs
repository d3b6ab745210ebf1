use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nalgebra::Vector3;
use waypath_core::{
    parse_path_config_json, AnimationDriver, LocalTransform, MovementMode, PathConfig, PathEvent,
    PathObserver, RecordingSink, SpeedCurve, Waypoint,
};
use waypath_test_fixtures as fixtures;

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn load(name: &str) -> PathConfig {
    let json = fixtures::paths::json(name).expect("fixture json");
    parse_path_config_json(&json).expect("fixture parses")
}

fn count_finished(events: &[PathEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, PathEvent::SequenceFinished { .. }))
        .count()
}

#[test]
fn flat_curve_reaches_half_length_at_half_duration() {
    let mut driver = AnimationDriver::with_config(load("two-point-arc"));
    let length = driver.real_length();
    let out = driver.update(1.0);
    let pose = out.pose.expect("pose written");
    assert!(approx(driver.state().current_distance, length * 0.5, 1e-2));
    // Half of a symmetric two-leg polyline is the offset waypoint.
    assert!((pose.position - Vector3::new(5.0, 2.0, 0.0)).norm() < 2e-2);
}

#[test]
fn completion_fires_once_and_snaps_to_end() {
    let mut driver = AnimationDriver::new(load("two-point-arc"), RecordingSink::default());
    let mut finished = 0;
    for _ in 0..40 {
        finished += count_finished(&driver.update(0.1).events);
    }
    assert_eq!(finished, 1);
    assert!(!driver.is_playing());
    let end = driver.path().expect("path").last_pose();
    assert_eq!(driver.sink().last(), Some(&end));
}

#[test]
fn playback_time_matches_duration_for_any_curve() {
    let mut cfg = load("two-point-bezier");
    for curve in [
        SpeedCurve::default(),
        SpeedCurve::linear(0.0, 5.0, 1.0, 0.2),
        SpeedCurve::ease_in_out(0.0, 0.1, 2.0, 3.0),
    ] {
        cfg.speed_curve = curve;
        let mut driver = AnimationDriver::with_config(cfg.clone());
        let mut elapsed = 0.0;
        loop {
            elapsed += 0.01;
            if driver.update(0.01).finished() {
                break;
            }
            assert!(elapsed < 10.0, "never finished");
        }
        assert!(approx(elapsed, cfg.duration, 0.015), "finished at {elapsed}");
    }
}

#[test]
fn slow_start_curve_lags_behind_linear_progress() {
    let cfg = load("two-point-bezier");
    let mut driver = AnimationDriver::with_config(cfg.clone());
    driver.update(cfg.duration * 0.5);
    assert!(driver.state().current_distance < driver.real_length() * 0.5);
}

#[test]
fn pause_and_resume_hold_position() {
    let mut driver = AnimationDriver::with_config(load("two-point-arc"));
    driver.update(0.5);
    let held = driver.sink().pose().position;
    driver.pause();
    let out = driver.update(0.5);
    assert_eq!(out.events, vec![PathEvent::PlaybackPaused]);
    assert!(out.pose.is_none());
    assert_eq!(driver.sink().pose().position, held);
    driver.resume();
    let out = driver.update(0.5);
    assert_eq!(out.events, vec![PathEvent::PlaybackResumed]);
    assert!(approx(driver.state().timer, 1.0, 1e-6));
}

#[test]
fn reset_to_start_rewinds_and_allows_another_completion() {
    let mut driver = AnimationDriver::with_config(load("two-point-arc"));
    driver.update(5.0);
    assert!(driver.is_finished());
    driver.reset_to_start();
    assert_eq!(driver.state().timer, 0.0);
    let start = driver.path().expect("path").first_pose();
    assert_eq!(*driver.sink().pose(), start);
    driver.resume();
    assert_eq!(count_finished(&driver.update(5.0).events), 1);
}

#[test]
fn play_rebuilds_from_changed_config() {
    let mut driver = AnimationDriver::with_config(load("two-point-arc"));
    driver.update(0.0);
    let mut cfg = driver.config().clone();
    cfg.end = Some(Waypoint::at(20.0, 0.0, 0.0));
    cfg.offset.position = [0.0; 3];
    driver.set_config(cfg).expect("valid config");
    assert!(approx(driver.real_length(), 10.77, 1e-2));
    driver.play().expect("play");
    assert!(approx(driver.real_length(), 20.0, 1e-4));
    assert_eq!(
        driver.update(0.0).events,
        vec![PathEvent::PlaybackStarted {
            mode: MovementMode::AutoAnimation
        }]
    );
}

#[derive(Clone, Default)]
struct Counter {
    samples: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
}

impl PathObserver for Counter {
    fn on_sample(&mut self, _sample: &waypath_core::PathSample) {
        self.samples.fetch_add(1, Ordering::SeqCst);
    }

    fn on_reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn observers_and_trail_follow_playback() {
    let mut driver: AnimationDriver<LocalTransform> =
        AnimationDriver::with_config(load("multi-spline"));
    let counter = Counter::default();
    driver.add_observer(counter.clone());
    for _ in 0..10 {
        driver.update(0.1);
    }
    assert_eq!(counter.samples.load(Ordering::SeqCst), 10);
    let trail = driver.trail().expect("trail enabled by fixture").clone();
    assert!(trail.len() >= 10);

    driver.play().expect("play");
    assert_eq!(counter.resets.load(Ordering::SeqCst), 1);
    // The restart pose is the only entry left after the reset.
    assert_eq!(trail.len(), 1);
}
