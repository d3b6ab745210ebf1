use bevy::prelude::*;
use waypath_core::{AnimationDriver, PathConfig};

/// Drives this entity's `Transform` along a path.
#[derive(Component, Debug)]
pub struct PathFollower(pub AnimationDriver);

impl PathFollower {
    pub fn new(config: PathConfig) -> Self {
        Self(AnimationDriver::with_config(config))
    }
}

/// Use the children of the referenced entity as waypoints (multi-point, anchor source).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathAnchorRef(pub Entity);

/// Sent when a follower reaches the end of its path.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PathFinished {
    pub entity: Entity,
    pub distance: f32,
}
