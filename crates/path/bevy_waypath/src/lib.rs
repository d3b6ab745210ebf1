//! Bevy adapter for `waypath-core`.
//!
//! Entities carrying a [`PathFollower`] are ticked every `Update` from `Time`, their
//! `Transform` follows the sampled pose and path completion is forwarded as a
//! [`PathFinished`] event. A [`PathAnchorRef`] sources multi-point waypoints from the
//! referenced entity's children.

use bevy::prelude::*;

mod components;
mod systems;

pub use components::{PathAnchorRef, PathFinished, PathFollower};
pub use systems::{
    attach_anchor_waypoints_system, pose_to_transform, tick_path_followers_system,
    transform_to_pose,
};
pub use waypath_core;

pub struct WaypathPlugin;

impl Plugin for WaypathPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PathFinished>().add_systems(
            Update,
            (attach_anchor_waypoints_system, tick_path_followers_system).chain(),
        );
    }
}
