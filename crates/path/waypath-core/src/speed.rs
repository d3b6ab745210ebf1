//! Speed curves and their normalization onto a distance range.
//!
//! A [`SpeedCurve`] is authored over any time range; [`normalize`] stretches it over
//! `[0, length]` so it can be read as speed as a function of travelled distance.

use serde::{Deserialize, Serialize};

use crate::interp::functions::hermite_f32;

/// Speeds below this are raised to it before integrating `ds / v`.
pub const MIN_SPEED: f32 = 1e-3;
/// Lower bound for the last key time when computing the stretch factor.
pub const NORMALIZE_EPSILON: f32 = 1e-3;
const TANGENT_SCALE_FLOOR: f32 = 1e-6;

/// One Hermite key. Tangents are slopes (value per unit time).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl SpeedKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }
}

/// Piecewise cubic Hermite curve. Evaluation clamps outside the key range; an empty curve
/// evaluates to 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSpeedCurve")]
pub struct SpeedCurve {
    pub keys: Vec<SpeedKey>,
}

/// Wire form; keys are sorted on the way in.
#[derive(Deserialize)]
struct RawSpeedCurve {
    #[serde(default)]
    keys: Vec<SpeedKey>,
}

impl From<RawSpeedCurve> for SpeedCurve {
    fn from(raw: RawSpeedCurve) -> Self {
        Self::new(raw.keys)
    }
}

impl Default for SpeedCurve {
    fn default() -> Self {
        Self::flat(1.0)
    }
}

impl SpeedCurve {
    /// Keys are sorted by time.
    pub fn new(mut keys: Vec<SpeedKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    /// Constant unit speed over `[0, length]`.
    pub fn flat(length: f32) -> Self {
        Self::linear(0.0, 1.0, length, 1.0)
    }

    /// Straight line between two keys; both tangents equal the slope.
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        let span = t1 - t0;
        let slope = if span.abs() > f32::EPSILON {
            (v1 - v0) / span
        } else {
            0.0
        };
        Self::new(vec![
            SpeedKey::new(t0, v0).with_tangents(slope, slope),
            SpeedKey::new(t1, v1).with_tangents(slope, slope),
        ])
    }

    /// Two keys with flat tangents.
    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Self::new(vec![SpeedKey::new(t0, v0), SpeedKey::new(t1, v1)])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn last_time(&self) -> Option<f32> {
        self.keys.last().map(|k| k.time)
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 1.0,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        let i = self.keys.partition_point(|k| k.time <= time);
        let (k0, k1) = (&self.keys[i - 1], &self.keys[i]);
        let span = k1.time - k0.time;
        if span <= f32::EPSILON {
            return k1.value;
        }
        let m0 = k0.out_tangent * span;
        let m1 = k1.in_tangent * span;
        if !m0.is_finite() || !m1.is_finite() {
            // Infinite tangents hold the left value.
            return k0.value;
        }
        hermite_f32(k0.value, m0, m1, k1.value, (time - k0.time) / span)
    }
}

/// A speed curve stretched over `[0, length]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedProfile {
    curve: SpeedCurve,
    length: f32,
}

impl SpeedProfile {
    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    pub fn curve(&self) -> &SpeedCurve {
        &self.curve
    }

    /// Speed at travelled distance `s`, never below [`MIN_SPEED`].
    #[inline]
    pub fn speed_at(&self, s: f32) -> f32 {
        let v = self.curve.evaluate(s);
        if v.is_nan() {
            MIN_SPEED
        } else {
            v.max(MIN_SPEED)
        }
    }
}

/// Stretch `curve` so its keys span `[0, length]`.
///
/// Key times are multiplied by `length / last_time` and tangents divided by the same factor
/// so the curve keeps its shape. An empty curve becomes a flat unit curve.
pub fn normalize(curve: &SpeedCurve, length: f32) -> SpeedProfile {
    let length = length.max(0.0);
    let Some(last_time) = curve.last_time() else {
        return SpeedProfile {
            curve: SpeedCurve::flat(length.max(NORMALIZE_EPSILON)),
            length,
        };
    };
    let scale = length / last_time.max(NORMALIZE_EPSILON);
    let tangent_scale = scale.max(TANGENT_SCALE_FLOOR);
    let keys = curve
        .keys
        .iter()
        .map(|k| SpeedKey {
            time: k.time * scale,
            value: k.value,
            in_tangent: k.in_tangent / tangent_scale,
            out_tangent: k.out_tangent / tangent_scale,
        })
        .collect();
    SpeedProfile {
        curve: SpeedCurve::new(keys),
        length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn deserialized_keys_are_sorted() {
        let json = r#"{ "keys": [
            { "time": 2.0, "value": 3.0 },
            { "time": 0.0, "value": 1.0 }
        ] }"#;
        let curve: SpeedCurve = serde_json::from_str(json).expect("curve");
        assert_eq!(curve.keys[0].time, 0.0);
        assert_eq!(curve.last_time(), Some(2.0));
        assert_eq!(curve.evaluate(0.0), 1.0);
        assert_eq!(curve.evaluate(5.0), 3.0);
    }

    #[test]
    fn empty_curve_is_unit_speed() {
        assert_eq!(SpeedCurve::empty().evaluate(3.0), 1.0);
        let profile = normalize(&SpeedCurve::empty(), 10.0);
        assert_eq!(profile.speed_at(5.0), 1.0);
        assert_eq!(profile.length(), 10.0);
    }

    #[test]
    fn evaluation_clamps_outside_keys() {
        let curve = SpeedCurve::linear(0.0, 2.0, 1.0, 4.0);
        assert_eq!(curve.evaluate(-1.0), 2.0);
        assert_eq!(curve.evaluate(5.0), 4.0);
        assert!(approx(curve.evaluate(0.5), 3.0, 1e-5));
    }

    #[test]
    fn normalize_preserves_shape() {
        let curve = SpeedCurve::new(vec![
            SpeedKey::new(0.0, 1.0).with_tangents(0.0, 2.0),
            SpeedKey::new(1.0, 3.0).with_tangents(2.0, 0.0),
        ]);
        let profile = normalize(&curve, 20.0);
        for i in 0..=10 {
            let u = i as f32 / 10.0;
            assert!(
                approx(profile.speed_at(u * 20.0), curve.evaluate(u), 1e-4),
                "u={u}"
            );
        }
    }

    #[test]
    fn speed_is_floored() {
        let curve = SpeedCurve::linear(0.0, 0.0, 1.0, -5.0);
        let profile = normalize(&curve, 1.0);
        assert_eq!(profile.speed_at(0.5), MIN_SPEED);
    }

    #[test]
    fn unsorted_keys_are_sorted() {
        let curve = SpeedCurve::new(vec![SpeedKey::new(1.0, 5.0), SpeedKey::new(0.0, 1.0)]);
        assert_eq!(curve.keys[0].time, 0.0);
        assert_eq!(curve.evaluate(0.0), 1.0);
    }
}
