#![allow(dead_code)]
//! Interpolation helpers:
//! - scalar/vector lerp and inverse lerp
//! - quaternion NLERP/SLERP with shortest-arc normalization
//! - quadratic Bezier and Catmull-Rom (Hermite form) evaluation
//! - offset strength falloff and piecewise segment lookup

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Above this |dot| SLERP degenerates numerically and NLERP is used instead.
const SLERP_NLERP_THRESHOLD: f32 = 0.9995;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Position of `v` between `a` and `b`, clamped to [0,1]. Returns 0 when `a == b`.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        0.0
    } else {
        clamp01((v - a) / (b - a))
    }
}

#[inline]
pub fn lerp_vec3(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
#[inline]
pub fn nlerp_quat(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    let mut end = b.coords;
    if a.coords.dot(&end) < 0.0 {
        end = -end;
    }
    UnitQuaternion::new_normalize(Quaternion::from(a.coords.lerp(&end, t)))
}

/// Quaternion SLERP with shortest-arc correction. Antipodal inputs are well defined
/// (the sign flip makes them identical), nearly parallel inputs fall back to NLERP.
pub fn slerp_quat(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    let mut end = b.coords;
    let mut dot = a.coords.dot(&end);
    if dot < 0.0 {
        end = -end;
        dot = -dot;
    }
    if dot > SLERP_NLERP_THRESHOLD {
        return UnitQuaternion::new_normalize(Quaternion::from(a.coords.lerp(&end, t)));
    }
    let theta = dot.min(1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    UnitQuaternion::new_normalize(Quaternion::from(a.coords * wa + end * wb))
}

/// Quadratic Bezier through `p0`, control `p1`, `p2`.
#[inline]
pub fn quadratic_bezier(
    p0: &Vector3<f32>,
    p1: &Vector3<f32>,
    p2: &Vector3<f32>,
    t: f32,
) -> Vector3<f32> {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// Cubic Hermite basis functions at `t`.
#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    (
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    )
}

/// Scalar cubic Hermite between `v0` and `v1` with tangents already scaled by the span.
#[inline]
pub fn hermite_f32(v0: f32, m0: f32, m1: f32, v1: f32, t: f32) -> f32 {
    let (h00, h10, h01, h11) = hermite_basis(t);
    h00 * v0 + h10 * m0 + h01 * v1 + h11 * m1
}

/// Uniform Catmull-Rom between `p1` and `p2`, written in Hermite form with
/// tangents `(p2 - p0) / 2` and `(p3 - p1) / 2`.
#[inline]
pub fn catmull_rom(
    p0: &Vector3<f32>,
    p1: &Vector3<f32>,
    p2: &Vector3<f32>,
    p3: &Vector3<f32>,
    t: f32,
) -> Vector3<f32> {
    let m1 = (p2 - p0) * 0.5;
    let m2 = (p3 - p1) * 0.5;
    let (h00, h10, h01, h11) = hermite_basis(t);
    p1 * h00 + m1 * h10 + p2 * h01 + m2 * h11
}

/// Weight of the offset waypoint at `t` within a span: 1 at `ratio`, falling off
/// quadratically to 0 at the farther span end.
#[inline]
pub fn offset_strength(t: f32, ratio: f32) -> f32 {
    let reach = ratio.max(1.0 - ratio);
    if reach <= f32::EPSILON {
        return 1.0;
    }
    let s = clamp01(1.0 - (t - ratio).abs() / reach);
    s * s
}

/// Map `u ∈ [0,1]` onto `segment_count` equal pieces: (index, fraction within piece).
/// `u = 1` lands on the end of the last piece.
#[inline]
pub fn segment_index(u: f32, segment_count: usize) -> (usize, f32) {
    if segment_count == 0 {
        return (0, 0.0);
    }
    let exact = clamp01(u) * segment_count as f32;
    let index = (exact.floor() as usize).min(segment_count - 1);
    (index, clamp01(exact - index as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn inverse_lerp_clamps_and_handles_equal_bounds() {
        assert!(approx(inverse_lerp(2.0, 4.0, 3.0), 0.5, 1e-6));
        assert_eq!(inverse_lerp(2.0, 4.0, 9.0), 1.0);
        assert_eq!(inverse_lerp(1.0, 1.0, 5.0), 0.0);
    }

    #[test]
    fn nlerp_and_slerp_take_shortest_arc() {
        let a = UnitQuaternion::identity();
        let b = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0);
        let flipped = UnitQuaternion::new_unchecked(-b.into_inner());
        for q in [nlerp_quat(&a, &flipped, 0.5), slerp_quat(&a, &flipped, 0.5)] {
            assert!(approx(q.angle(), 0.5, 1e-3), "angle {}", q.angle());
        }
    }

    #[test]
    fn slerp_is_constant_speed() {
        let a = UnitQuaternion::identity();
        let b = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 2.0);
        assert!(approx(slerp_quat(&a, &b, 0.25).angle(), 0.5, 1e-4));
        assert!(approx(slerp_quat(&a, &b, 1.0).angle(), 2.0, 1e-4));
    }

    #[test]
    fn catmull_rom_passes_through_interior_points() {
        let p = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 2.0, 0.0),
            Vector3::new(3.0, 1.0, 0.0),
            Vector3::new(4.0, 4.0, 0.0),
        ];
        assert!((catmull_rom(&p[0], &p[1], &p[2], &p[3], 0.0) - p[1]).norm() < 1e-6);
        assert!((catmull_rom(&p[0], &p[1], &p[2], &p[3], 1.0) - p[2]).norm() < 1e-6);
    }

    #[test]
    fn bezier_midpoint() {
        let m = quadratic_bezier(
            &Vector3::zeros(),
            &Vector3::new(5.0, 2.0, 0.0),
            &Vector3::new(10.0, 0.0, 0.0),
            0.5,
        );
        assert!((m - Vector3::new(5.0, 1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn offset_strength_peaks_at_ratio() {
        assert_eq!(offset_strength(0.3, 0.3), 1.0);
        assert!(approx(offset_strength(1.0, 0.3), 0.0, 1e-6));
        assert!(approx(offset_strength(0.0, 0.5), 0.0, 1e-6));
        assert!(approx(offset_strength(0.75, 0.5), 0.25, 1e-6));
    }

    #[test]
    fn segment_index_covers_end() {
        assert_eq!(segment_index(0.0, 4), (0, 0.0));
        assert_eq!(segment_index(1.0, 4), (3, 1.0));
        let (i, f) = segment_index(0.6, 4);
        assert_eq!(i, 2);
        assert!(approx(f, 0.4, 1e-5));
    }
}
