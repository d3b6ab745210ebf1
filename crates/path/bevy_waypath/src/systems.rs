use bevy::log::{debug, warn};
use bevy::prelude::*;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use waypath_core::{PathEvent, Pose, StaticAnchor};

use crate::components::{PathAnchorRef, PathFinished, PathFollower};

pub fn pose_to_transform(pose: &Pose) -> Transform {
    let p = pose.position;
    let q = pose.rotation.coords;
    let s = pose.scale;
    Transform {
        translation: Vec3::new(p.x, p.y, p.z),
        rotation: Quat::from_xyzw(q.x, q.y, q.z, q.w),
        scale: Vec3::new(s.x, s.y, s.z),
    }
}

pub fn transform_to_pose(transform: &Transform) -> Pose {
    let t = transform.translation;
    let r = transform.rotation;
    let s = transform.scale;
    Pose::new(
        Vector3::new(t.x, t.y, t.z),
        UnitQuaternion::new_normalize(Quaternion::new(r.w, r.x, r.y, r.z)),
        Vector3::new(s.x, s.y, s.z),
    )
}

/// Collects the anchor's child transforms (child order) whenever a follower's anchor
/// reference is added or changed, then rebuilds that follower's path.
pub fn attach_anchor_waypoints_system(
    mut followers: Query<(Entity, &mut PathFollower, &PathAnchorRef), Changed<PathAnchorRef>>,
    children: Query<&Children>,
    transforms: Query<&Transform>,
) {
    for (entity, mut follower, anchor) in followers.iter_mut() {
        let poses: Vec<Pose> = children
            .get(anchor.0)
            .map(|kids| {
                kids.iter()
                    .filter_map(|child| transforms.get(*child).ok())
                    .map(transform_to_pose)
                    .collect()
            })
            .unwrap_or_default();
        debug!("{entity:?}: {} anchor waypoints from {:?}", poses.len(), anchor.0);
        follower.0.set_anchor(StaticAnchor::new(poses));
        if let Err(err) = follower.0.force_reload_from_anchor() {
            warn!("{entity:?}: anchor reload failed: {err}");
        }
    }
}

/// Advances every follower by the frame delta and mirrors its pose into `Transform`.
pub fn tick_path_followers_system(
    time: Res<Time>,
    mut followers: Query<(Entity, &mut PathFollower, &mut Transform)>,
    mut finished: EventWriter<PathFinished>,
) {
    let dt = time.delta_seconds();
    for (entity, mut follower, mut transform) in followers.iter_mut() {
        let completed = follower
            .0
            .update(dt)
            .events
            .iter()
            .find_map(|event| match event {
                PathEvent::SequenceFinished { distance } => Some(*distance),
                _ => None,
            });
        let sink = follower.0.sink();
        if sink.writes() > 0 {
            transform.set_if_neq(pose_to_transform(sink.pose()));
        }
        if let Some(distance) = completed {
            finished.send(PathFinished { entity, distance });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypath_core::euler_degrees_to_quat;

    #[test]
    fn transform_conversion_preserves_pose() {
        let pose = Pose::new(
            Vector3::new(1.0, -2.0, 3.5),
            euler_degrees_to_quat([10.0, 45.0, -30.0]),
            Vector3::new(2.0, 1.0, 0.5),
        );
        let back = transform_to_pose(&pose_to_transform(&pose));
        assert!(back.approx_eq(&pose, 1e-5));
    }
}
