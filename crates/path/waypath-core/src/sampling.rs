//! Path sampling: normalized parameter (and climb span) to pose.
//!
//! - `sample` evaluates the whole path at `u ∈ [0,1]`.
//! - `base_position` is the offset-free position used to anchor climb segments.
//! - `sample_in_segment` builds a local curve between two base positions and pushes it through
//!   a segment-local offset waypoint.

use nalgebra::{UnitQuaternion, Vector3};

use crate::config::{LineType, PathControl};
use crate::interp::functions::{
    catmull_rom, inverse_lerp, lerp_vec3, offset_strength, quadratic_bezier, segment_index,
    slerp_quat,
};
use crate::path::{offset_waypoint, ControlPoint, Path};
use crate::pose::{OffsetDescriptor, PathFrame, Pose};
use crate::scheduler::SegmentSpan;

const RATIO_EPSILON: f32 = 1e-4;
const SEGMENT_EPSILON: f32 = 1e-6;

/// Pose at normalized parameter `u01` (clamped). The endpoints return the exact first and
/// last control points.
pub fn sample(path: &Path, u01: f32) -> Pose {
    let points = path.points();
    match points {
        [] => return Pose::identity(),
        [only] => return only.pose,
        _ => {}
    }
    let u = clamp_param(u01);
    if u <= 0.0 {
        return path.first_pose();
    }
    if u >= 1.0 {
        return path.last_pose();
    }

    match (path.control(), path.line_type()) {
        (_, LineType::Polyline) => sample_polyline(path, u),
        (PathControl::TwoPoint, LineType::Spline) => match points {
            [a, m, b] => {
                let position =
                    quadratic_bezier(&a.pose.position, &m.pose.position, &b.pose.position, u);
                // Rotation and scale switch halves at u = 0.5 regardless of the offset ratio.
                let (rotation, scale) = if u <= 0.5 {
                    blend_rotation_scale(&a.pose, &m.pose, u * 2.0)
                } else {
                    blend_rotation_scale(&m.pose, &b.pose, (u - 0.5) * 2.0)
                };
                Pose::new(position, rotation, scale)
            }
            _ => sample_polyline(path, u),
        },
        (PathControl::MultiPoint, LineType::Spline) => {
            let position = spline_position(path, u);
            let (index, fraction) = segment_index(u, points.len() - 1);
            let (rotation, scale) =
                blend_rotation_scale(&points[index].pose, &points[index + 1].pose, fraction);
            let (rotation, scale) = apply_offset_blend(path, rotation, scale, fraction);
            Pose::new(position, rotation, scale)
        }
    }
}

/// Offset-free position at `u01`.
///
/// Two-point paths use the straight start→end line, multi-point polylines a
/// length-proportional point and multi-point splines the Catmull-Rom curve.
pub fn base_position(path: &Path, u01: f32) -> Vector3<f32> {
    let points = path.points();
    if points.len() < 2 {
        return path.first_pose().position;
    }
    let u = clamp_param(u01);
    if u <= 0.0 {
        return path.first_pose().position;
    }
    if u >= 1.0 {
        return path.last_pose().position;
    }
    match (path.control(), path.line_type()) {
        (PathControl::TwoPoint, _) => {
            lerp_vec3(&path.first_pose().position, &path.last_pose().position, u)
        }
        (PathControl::MultiPoint, LineType::Polyline) => {
            let (index, local) = locate_polyline(path, u);
            lerp_vec3(
                &points[index].pose.position,
                &points[index + 1].pose.position,
                local,
            )
        }
        (PathControl::MultiPoint, LineType::Spline) => {
            let (index, fraction) = segment_index(u, points.len() - 1);
            let [p0, p1, p2, p3] = catmull_window(points, index);
            catmull_rom(&p0, &p1, &p2, &p3, fraction)
        }
    }
}

/// Pose inside a climb segment spanning `span`, at whole-path parameter `u01`.
pub fn sample_in_segment(path: &Path, span: SegmentSpan, u01: f32) -> Pose {
    let points = path.points();
    if points.len() < 2 {
        return path.first_pose();
    }
    let start_u = path.fraction_at(span.start);
    let end_u = path.fraction_at(span.target);
    let seg_start = base_position(path, start_u);
    let seg_end = base_position(path, end_u);
    let segment_u = inverse_lerp(start_u, end_u, clamp_param(u01));

    let ratio = path.offset_ratio();
    let frame = PathFrame::from_direction(seg_end - seg_start);
    let offset_point =
        lerp_vec3(&seg_start, &seg_end, ratio) + frame.transform_vector(&path.offset().position_vector());
    let position = match path.line_type() {
        LineType::Polyline => through_offset(&seg_start, &offset_point, &seg_end, segment_u, ratio),
        LineType::Spline => quadratic_bezier(&seg_start, &offset_point, &seg_end, segment_u),
    };

    let (rotation, scale) = piecewise_rotation_scale(points, u01);
    let (rotation, scale) = apply_offset_blend(path, rotation, scale, segment_u);
    Pose::new(position, rotation, scale)
}

/// Catmull-Rom position with the offset after-effect applied per segment.
pub(crate) fn spline_position(path: &Path, u: f32) -> Vector3<f32> {
    let points = path.points();
    let (index, fraction) = segment_index(u, points.len().saturating_sub(1));
    let [p0, p1, p2, p3] = catmull_window(points, index);
    let mut position = catmull_rom(&p0, &p1, &p2, &p3, fraction);
    let offset = path.offset();
    if offset.has_position() {
        let frame = PathFrame::from_direction(p2 - p1);
        position += frame.transform_vector(&offset.position_vector())
            * offset_strength(fraction, path.offset_ratio());
    }
    position
}

#[inline]
fn clamp_param(u: f32) -> f32 {
    if u.is_nan() {
        0.0
    } else {
        u.clamp(0.0, 1.0)
    }
}

/// Neighbourhood of segment `index`; the path ends are duplicated as virtual neighbours.
fn catmull_window(points: &[ControlPoint], index: usize) -> [Vector3<f32>; 4] {
    let last = points.len().saturating_sub(1);
    let at = |i: usize| points[i.min(last)].pose.position;
    [
        at(index.saturating_sub(1)),
        at(index),
        at(index + 1),
        at(index + 2),
    ]
}

/// Segment index and local fraction for `u` by cumulative straight-line length.
fn locate_polyline(path: &Path, u: f32) -> (usize, f32) {
    let cumulative = path.cumulative();
    let segments = cumulative.len().saturating_sub(1);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if segments == 0 || total <= SEGMENT_EPSILON {
        return segment_index(u, segments);
    }
    let target = u * total;
    let index = cumulative
        .partition_point(|&c| c < target)
        .saturating_sub(1)
        .min(segments - 1);
    let seg_len = cumulative[index + 1] - cumulative[index];
    let local = if seg_len > SEGMENT_EPSILON {
        ((target - cumulative[index]) / seg_len).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (index, local)
}

fn sample_polyline(path: &Path, u: f32) -> Pose {
    let points = path.points();
    let (index, local) = locate_polyline(path, u);
    let (a, b) = (&points[index].pose, &points[index + 1].pose);
    if path.control() == PathControl::MultiPoint && path.polyline_segment_offset() {
        let ratio = path.offset_ratio();
        let mid = offset_waypoint(a, b, path.offset(), ratio);
        return through_offset_pose(a, &mid, b, local, ratio);
    }
    blend(a, b, local)
}

fn blend(a: &Pose, b: &Pose, t: f32) -> Pose {
    let (rotation, scale) = blend_rotation_scale(a, b, t);
    Pose::new(lerp_vec3(&a.position, &b.position, t), rotation, scale)
}

fn blend_rotation_scale(a: &Pose, b: &Pose, t: f32) -> (UnitQuaternion<f32>, Vector3<f32>) {
    (
        slerp_quat(&a.rotation, &b.rotation, t),
        lerp_vec3(&a.scale, &b.scale, t),
    )
}

/// Rotation and scale interpolated over the control points by `u * (N - 1)`.
fn piecewise_rotation_scale(
    points: &[ControlPoint],
    u01: f32,
) -> (UnitQuaternion<f32>, Vector3<f32>) {
    let u = clamp_param(u01);
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f.pose, l.pose),
        _ => return (UnitQuaternion::identity(), Vector3::repeat(1.0)),
    };
    if u <= 0.0 || points.len() < 2 {
        return (first.rotation, first.scale);
    }
    if u >= 1.0 {
        return (last.rotation, last.scale);
    }
    let (index, fraction) = segment_index(u, points.len() - 1);
    blend_rotation_scale(&points[index].pose, &points[index + 1].pose, fraction)
}

/// Blend the offset rotation and scale in by `offset_strength(t)`. Applies to every
/// offset: the default scale of 1 pulls scaled waypoints back towards unit scale at `ratio`.
fn apply_offset_blend(
    path: &Path,
    rotation: UnitQuaternion<f32>,
    scale: Vector3<f32>,
    t: f32,
) -> (UnitQuaternion<f32>, Vector3<f32>) {
    let offset: &OffsetDescriptor = path.offset();
    let strength = offset_strength(t, path.offset_ratio());
    (
        rotation * slerp_quat(&UnitQuaternion::identity(), &offset.rotation_quat(), strength),
        lerp_vec3(&scale, &offset.scale_vector(), strength),
    )
}

/// Piecewise-linear position through `mid`, which sits at `ratio`. Degenerate ratios fall
/// back to the straight line.
fn through_offset(
    a: &Vector3<f32>,
    mid: &Vector3<f32>,
    b: &Vector3<f32>,
    t: f32,
    ratio: f32,
) -> Vector3<f32> {
    if ratio <= RATIO_EPSILON || ratio >= 1.0 - RATIO_EPSILON {
        lerp_vec3(a, b, t)
    } else if t <= ratio {
        lerp_vec3(a, mid, t / ratio)
    } else {
        lerp_vec3(mid, b, (t - ratio) / (1.0 - ratio))
    }
}

fn through_offset_pose(a: &Pose, mid: &Pose, b: &Pose, t: f32, ratio: f32) -> Pose {
    if ratio <= RATIO_EPSILON || ratio >= 1.0 - RATIO_EPSILON {
        blend(a, b, t)
    } else if t <= ratio {
        blend(a, mid, t / ratio)
    } else {
        blend(mid, b, (t - ratio) / (1.0 - ratio))
    }
}
