//! Distance/time reparameterization.
//!
//! [`DistanceTimeTable`] maps normalized playback time to travelled distance for a whole
//! path; [`SegmentProgress`] does the same inversion for a single climb segment.

use crate::config::{MAX_TABLE_SAMPLES, MIN_TABLE_SAMPLES};
use crate::interp::functions::{clamp01, lerp_f32};
use crate::speed::SpeedProfile;

/// Lengths at or below this produce identity tables.
const DEGENERATE_LENGTH: f32 = 1e-6;
const TIME_EPSILON: f32 = 1e-6;

/// Normalized cumulative time at uniform distance steps.
///
/// `times[i]` is the fraction of total travel time needed to reach `i * length / n`.
/// The first entry is 0, the last is 1 and entries never decrease.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceTimeTable {
    times: Vec<f32>,
    length: f32,
    total_time: f32,
}

impl DistanceTimeTable {
    /// Midpoint integration of `ds / speed` over `sample_count` buckets.
    pub fn build(profile: &SpeedProfile, sample_count: usize) -> Self {
        let n = sample_count.clamp(MIN_TABLE_SAMPLES, MAX_TABLE_SAMPLES);
        let length = profile.length();
        if length <= DEGENERATE_LENGTH {
            return Self::identity(n, length.max(0.0));
        }

        let ds = length / n as f32;
        let mut times = Vec::with_capacity(n + 1);
        times.push(0.0);
        let mut acc = 0.0f32;
        for i in 0..n {
            let s = (i as f32 + 0.5) * ds;
            acc += ds / profile.speed_at(s);
            times.push(acc);
        }
        if !(acc.is_finite() && acc > 0.0) {
            return Self::identity(n, length);
        }
        let total_time = acc;
        for t in times.iter_mut() {
            *t /= total_time;
        }
        if let Some(last) = times.last_mut() {
            *last = 1.0;
        }
        Self {
            times,
            length,
            total_time,
        }
    }

    fn identity(n: usize, length: f32) -> Self {
        Self {
            times: (0..=n).map(|i| i as f32 / n as f32).collect(),
            length,
            total_time: 0.0,
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Raw `∫ ds / v` over the whole path (0 for identity tables).
    #[inline]
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.times.len() - 1
    }

    #[inline]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    fn step(&self) -> f32 {
        self.length / self.sample_count() as f32
    }

    /// Travelled distance at normalized time `t`.
    pub fn distance_at_time(&self, t: f32) -> f32 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return self.length;
        }
        let step = self.step();
        // First sample at or past t; times[0] == 0 < t so hi >= 1.
        let hi = self.times.partition_point(|&x| x < t).min(self.times.len() - 1);
        if (self.times[hi] - t).abs() <= TIME_EPSILON {
            return hi as f32 * step;
        }
        let lo = hi - 1;
        let (t0, t1) = (self.times[lo], self.times[hi]);
        let w = if t1 - t0 > TIME_EPSILON {
            (t - t0) / (t1 - t0)
        } else {
            0.0
        };
        lerp_f32(lo as f32 * step, hi as f32 * step, w).min(self.length)
    }

    /// Normalized time at which distance `s` is reached.
    pub fn time_at_distance(&self, s: f32) -> f32 {
        if self.length <= DEGENERATE_LENGTH {
            return 0.0;
        }
        let n = self.sample_count();
        let exact = clamp01(s / self.length) * n as f32;
        let i = (exact.floor() as usize).min(n - 1);
        lerp_f32(self.times[i], self.times[i + 1], exact - i as f32)
    }
}

/// Speed-weighted progress inside one climb segment.
///
/// `weighted_progress(p)` returns the distance fraction `x / L` at which `p` of the segment's
/// total travel time has elapsed.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentProgress {
    length: f32,
    bucket_times: Vec<f32>,
    total_time: f32,
}

impl SegmentProgress {
    pub fn new(profile: &SpeedProfile, sample_count: usize) -> Self {
        let n = sample_count.max(1);
        let length = profile.length();
        let ds = length / n as f32;
        let bucket_times: Vec<f32> = (0..n)
            .map(|i| ds / profile.speed_at((i as f32 + 0.5) * ds))
            .collect();
        let total_time = bucket_times.iter().sum();
        Self {
            length,
            bucket_times,
            total_time,
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn weighted_progress(&self, linear: f32) -> f32 {
        let p = clamp01(linear);
        if p >= 1.0 || self.length <= DEGENERATE_LENGTH || !(self.total_time > 0.0) {
            return p;
        }
        let ds = self.length / self.bucket_times.len() as f32;
        let target = p * self.total_time;
        let mut acc = 0.0;
        for (i, dt) in self.bucket_times.iter().enumerate() {
            if acc + dt >= target {
                let local = if *dt > 0.0 { (target - acc) / dt } else { 0.0 };
                return clamp01((i as f32 + local) * ds / self.length);
            }
            acc += dt;
        }
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speed::{normalize, SpeedCurve};

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn flat_profile_is_linear() {
        let table = DistanceTimeTable::build(&normalize(&SpeedCurve::default(), 10.0), 200);
        assert_eq!(table.times()[0], 0.0);
        assert_eq!(*table.times().last().unwrap(), 1.0);
        assert!(approx(table.distance_at_time(0.5), 5.0, 1e-3));
        assert!(approx(table.distance_at_time(0.123), 1.23, 1e-3));
        assert!(approx(table.total_time(), 10.0, 1e-3));
        assert_eq!(table.distance_at_time(1.0), 10.0);
        assert_eq!(table.distance_at_time(-2.0), 0.0);
    }

    #[test]
    fn fast_start_covers_more_distance_early() {
        let curve = SpeedCurve::linear(0.0, 4.0, 1.0, 1.0);
        let table = DistanceTimeTable::build(&normalize(&curve, 10.0), 200);
        assert!(table.distance_at_time(0.5) > 5.0);
        assert!(table.times().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn time_and_distance_lookups_invert() {
        let curve = SpeedCurve::ease_in_out(0.0, 0.5, 1.0, 3.0);
        let table = DistanceTimeTable::build(&normalize(&curve, 7.0), 300);
        for s in [0.5f32, 2.0, 3.5, 6.9] {
            let t = table.time_at_distance(s);
            assert!(approx(table.distance_at_time(t), s, 1e-2), "s={s}");
        }
        assert!(approx(table.time_at_distance(7.0), 1.0, 1e-6));
    }

    #[test]
    fn sample_count_is_clamped() {
        let profile = normalize(&SpeedCurve::default(), 1.0);
        assert_eq!(DistanceTimeTable::build(&profile, 1).sample_count(), MIN_TABLE_SAMPLES);
        assert_eq!(
            DistanceTimeTable::build(&profile, 10_000).sample_count(),
            MAX_TABLE_SAMPLES
        );
    }

    #[test]
    fn zero_length_gives_identity() {
        let table = DistanceTimeTable::build(&normalize(&SpeedCurve::default(), 0.0), 20);
        assert_eq!(table.total_time(), 0.0);
        assert_eq!(table.distance_at_time(0.5), 0.0);
        assert!(approx(table.times()[10], 0.5, 1e-6));
    }

    #[test]
    fn segment_progress_flat_is_identity() {
        let progress = SegmentProgress::new(&normalize(&SpeedCurve::default(), 4.0), 100);
        for p in [0.0f32, 0.25, 0.5, 0.9, 1.0] {
            assert!(approx(progress.weighted_progress(p), p, 1e-4), "p={p}");
        }
    }

    #[test]
    fn segment_progress_slow_end_lags() {
        let curve = SpeedCurve::linear(0.0, 2.0, 1.0, 0.5);
        let progress = SegmentProgress::new(&normalize(&curve, 4.0), 100);
        assert!(progress.weighted_progress(0.5) > 0.5);
        assert_eq!(progress.weighted_progress(1.0), 1.0);
        assert_eq!(progress.weighted_progress(0.0), 0.0);
    }
}
