//! Control-point paths and their construction from configuration.

use std::fmt::Write as _;

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::{LineType, PathConfig, PathControl, PointSource};
use crate::error::PathError;
use crate::interp::functions::{lerp_vec3, nlerp_quat, quadratic_bezier};
use crate::pose::{OffsetDescriptor, PathFrame, Pose, Waypoint};
use crate::sampling;

const LENGTH_EPSILON: f32 = 1e-6;

/// Supplies multi-point waypoints from a host object's children, in child order.
pub trait AnchorSource: Send + Sync {
    fn child_poses(&self) -> Vec<Pose>;
}

/// Fixed list of anchor child poses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticAnchor(pub Vec<Pose>);

impl StaticAnchor {
    pub fn new(poses: Vec<Pose>) -> Self {
        Self(poses)
    }
}

impl AnchorSource for StaticAnchor {
    fn child_poses(&self) -> Vec<Pose> {
        self.0.clone()
    }
}

/// A pose tagged with its position in the path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub index: usize,
    pub pose: Pose,
}

/// Immutable built path. Rebuilding is the only way to change it.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    points: Vec<ControlPoint>,
    control: PathControl,
    line_type: LineType,
    offset: OffsetDescriptor,
    offset_ratio: f32,
    polyline_segment_offset: bool,
    /// Straight-line distance from the first point to each point.
    cumulative: Vec<f32>,
    real_length: f32,
}

impl Path {
    #[inline]
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_pose(&self) -> Pose {
        self.points.first().map(|p| p.pose).unwrap_or_default()
    }

    pub fn last_pose(&self) -> Pose {
        self.points.last().map(|p| p.pose).unwrap_or_default()
    }

    #[inline]
    pub fn control(&self) -> PathControl {
        self.control
    }

    #[inline]
    pub fn line_type(&self) -> LineType {
        self.line_type
    }

    #[inline]
    pub fn offset(&self) -> &OffsetDescriptor {
        &self.offset
    }

    #[inline]
    pub fn offset_ratio(&self) -> f32 {
        self.offset_ratio
    }

    #[inline]
    pub fn polyline_segment_offset(&self) -> bool {
        self.polyline_segment_offset
    }

    /// Authoritative arc length used by playback and climbing.
    #[inline]
    pub fn real_length(&self) -> f32 {
        self.real_length
    }

    #[inline]
    pub(crate) fn cumulative(&self) -> &[f32] {
        &self.cumulative
    }

    /// Distance along the path as a fraction of `real_length`, clamped to [0,1].
    pub fn fraction_at(&self, distance: f32) -> f32 {
        if self.real_length <= LENGTH_EPSILON || distance.is_nan() {
            return 0.0;
        }
        (distance / self.real_length).clamp(0.0, 1.0)
    }

    /// Multi-line summary of the control points.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{:?} {:?} path: {} points, length {:.3}",
            self.control,
            self.line_type,
            self.points.len(),
            self.real_length
        );
        for cp in &self.points {
            let p = cp.pose.position;
            let s = cp.pose.scale;
            let (roll, pitch, yaw) = cp.pose.rotation.euler_angles();
            let _ = write!(
                out,
                "\n  [{}] position=({:.3}, {:.3}, {:.3}) rotation_rad=({:.3}, {:.3}, {:.3}) scale=({:.3}, {:.3}, {:.3})",
                cp.index, p.x, p.y, p.z, roll, pitch, yaw, s.x, s.y, s.z
            );
        }
        out
    }
}

/// The pose placed between `start` and `end` at `ratio`, displaced by `offset` in the span's
/// [`PathFrame`]. Rotation blends the endpoints then applies the offset rotation; scale is
/// taken from the offset as is.
pub fn offset_waypoint(start: &Pose, end: &Pose, offset: &OffsetDescriptor, ratio: f32) -> Pose {
    let frame = PathFrame::from_direction(end.position - start.position);
    Pose {
        position: lerp_vec3(&start.position, &end.position, ratio)
            + frame.transform_vector(&offset.position_vector()),
        rotation: nlerp_quat(&start.rotation, &end.rotation, ratio) * offset.rotation_quat(),
        scale: offset.scale_vector(),
    }
}

/// Builds [`Path`]s from configuration. Deterministic and side-effect free.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathBuilder;

impl PathBuilder {
    pub fn build(config: &PathConfig) -> Result<Path, PathError> {
        Self::build_with_anchor(config, None)
    }

    /// Build using `anchor_poses` as the waypoint list when the config selects the anchor
    /// point source.
    pub fn build_with_anchor(
        config: &PathConfig,
        anchor_poses: Option<&[Pose]>,
    ) -> Result<Path, PathError> {
        let poses = match config.path_control {
            PathControl::TwoPoint => {
                let start = config
                    .start
                    .as_ref()
                    .map(Pose::from_waypoint)
                    .ok_or(PathError::MissingEndpoint { which: "start" })?;
                let end = config
                    .end
                    .as_ref()
                    .map(Pose::from_waypoint)
                    .ok_or(PathError::MissingEndpoint { which: "end" })?;
                let ratio = config.offset_ratio.clamp(0.0, 1.0);
                let mid = offset_waypoint(&start, &end, &config.offset, ratio);
                vec![start, mid, end]
            }
            PathControl::MultiPoint => match (config.point_source, anchor_poses) {
                (PointSource::Anchor, Some(poses)) => poses.to_vec(),
                _ => config.waypoints.iter().map(Pose::from_waypoint).collect(),
            },
        };
        if config.path_control == PathControl::MultiPoint && poses.len() < 2 {
            return Err(PathError::TooFewWaypoints { count: poses.len() });
        }
        let path = Self::assemble(poses, config);
        debug!(
            "built {:?} {:?} path: {} points, length {:.4}",
            path.control,
            path.line_type,
            path.points.len(),
            path.real_length
        );
        Ok(path)
    }

    /// Convenience for two-point paths without a full config.
    pub fn two_point(
        start: Waypoint,
        end: Waypoint,
        offset: OffsetDescriptor,
        ratio: f32,
        line_type: LineType,
    ) -> Result<Path, PathError> {
        let config = PathConfig::two_point(start, end)
            .with_offset(offset, ratio)
            .with_line_type(line_type);
        Self::build(&config)
    }

    fn assemble(poses: Vec<Pose>, config: &PathConfig) -> Path {
        let points: Vec<ControlPoint> = poses
            .into_iter()
            .enumerate()
            .map(|(index, pose)| ControlPoint { index, pose })
            .collect();
        let mut cumulative = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        for (i, cp) in points.iter().enumerate() {
            if i > 0 {
                acc += (cp.pose.position - points[i - 1].pose.position).norm();
            }
            cumulative.push(acc);
        }
        let mut path = Path {
            points,
            control: config.path_control,
            line_type: config.line_type,
            offset: config.offset,
            offset_ratio: config.offset_ratio.clamp(0.0, 1.0),
            polyline_segment_offset: config.polyline_segment_offset,
            cumulative,
            real_length: acc,
        };
        let real_length = match (path.control, path.line_type) {
            (_, LineType::Polyline) => acc,
            (PathControl::TwoPoint, LineType::Spline) => {
                bezier_length(&path, config.samples.bezier_length.max(1))
            }
            (PathControl::MultiPoint, LineType::Spline) => {
                sampled_length(config.samples.spline_length.max(1), |u| {
                    sampling::spline_position(&path, u)
                })
            }
        };
        path.real_length = real_length;
        path
    }
}

fn bezier_length(path: &Path, samples: usize) -> f32 {
    match path.points() {
        [a, m, b] => sampled_length(samples, |u| {
            quadratic_bezier(&a.pose.position, &m.pose.position, &b.pose.position, u)
        }),
        _ => path.cumulative().last().copied().unwrap_or(0.0),
    }
}

fn sampled_length(samples: usize, eval: impl Fn(f32) -> Vector3<f32>) -> f32 {
    let mut prev = eval(0.0);
    let mut total = 0.0;
    for i in 1..=samples {
        let p = eval(i as f32 / samples as f32);
        total += (p - prev).norm();
        prev = p;
    }
    total
}
