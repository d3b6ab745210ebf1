//! Pose values, waypoint configuration records and the path-local frame used to place
//! offset waypoints.

use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

const FRAME_EPSILON: f32 = 1e-6;

/// Position, rotation and scale snapshot of one object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn new(
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn from_waypoint(waypoint: &Waypoint) -> Self {
        Self {
            position: Vector3::from(waypoint.position),
            rotation: euler_degrees_to_quat(waypoint.rotation),
            scale: Vector3::from(waypoint.scale),
        }
    }

    /// Component-wise comparison; rotations compare by |dot| so q and -q are equal.
    pub fn approx_eq(&self, other: &Pose, eps: f32) -> bool {
        let close = |a: &Vector3<f32>, b: &Vector3<f32>| (a - b).iter().all(|d| d.abs() <= eps);
        close(&self.position, &other.position)
            && close(&self.scale, &other.scale)
            && self.rotation.coords.dot(&other.rotation.coords).abs() >= 1.0 - eps
    }
}

/// Configuration form of a pose: euler rotation in degrees, scale defaults to one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Waypoint {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Waypoint {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Waypoint {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, euler_degrees: [f32; 3]) -> Self {
        self.rotation = euler_degrees;
        self
    }

    pub fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }
}

/// Extra waypoint injected between a start and an end pose, expressed in the [`PathFrame`]
/// of that span.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetDescriptor {
    pub position: [f32; 3],
    /// Euler angles in degrees.
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for OffsetDescriptor {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl OffsetDescriptor {
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::default()
        }
    }

    #[inline]
    pub fn position_vector(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }

    #[inline]
    pub fn rotation_quat(&self) -> UnitQuaternion<f32> {
        euler_degrees_to_quat(self.rotation)
    }

    #[inline]
    pub fn scale_vector(&self) -> Vector3<f32> {
        Vector3::from(self.scale)
    }

    #[inline]
    pub fn has_position(&self) -> bool {
        self.position.iter().any(|c| *c != 0.0)
    }
}

/// Euler angles in degrees to a quaternion. Y-up convention: rotate about Z, then X, then Y.
pub fn euler_degrees_to_quat(euler: [f32; 3]) -> UnitQuaternion<f32> {
    let [x, y, z] = euler.map(f32::to_radians);
    let qx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x);
    let qy = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y);
    let qz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z);
    qy * qx * qz
}

/// Orthonormal frame whose forward axis follows a path direction.
///
/// `right = up × forward` against world up; when the direction is parallel to up the
/// world-forward axis is used instead. A zero direction yields the identity frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathFrame {
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    pub forward: Vector3<f32>,
}

impl Default for PathFrame {
    fn default() -> Self {
        Self::identity()
    }
}

impl PathFrame {
    pub fn identity() -> Self {
        Self {
            right: Vector3::x(),
            up: Vector3::y(),
            forward: Vector3::z(),
        }
    }

    pub fn from_direction(direction: Vector3<f32>) -> Self {
        let Some(forward) = direction.try_normalize(FRAME_EPSILON) else {
            return Self::identity();
        };
        let right = Vector3::y()
            .cross(&forward)
            .try_normalize(FRAME_EPSILON)
            .or_else(|| Vector3::z().cross(&forward).try_normalize(FRAME_EPSILON))
            .unwrap_or_else(Vector3::x);
        let up = forward.cross(&right).normalize();
        Self { right, up, forward }
    }

    /// Rotation whose columns are `right`, `up` and `forward`.
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_basis_unchecked(&[
            self.right,
            self.up,
            self.forward,
        ]))
    }

    /// Map a frame-local vector into the parent space.
    #[inline]
    pub fn transform_vector(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.right * local.x + self.up * local.y + self.forward * local.z
    }
}
