//! Path and playback configuration.
//!
//! Configuration is read when a path is built (activation, `play`, `climb_distance` while idle,
//! `force_reload_from_anchor`). Changing it through `AnimationDriver::set_config` takes effect
//! at the next build.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::pose::{OffsetDescriptor, Waypoint};
use crate::speed::SpeedCurve;

pub const MIN_DURATION: f32 = 0.01;
pub const MIN_TABLE_SAMPLES: usize = 10;
pub const MAX_TABLE_SAMPLES: usize = 500;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    /// One timed traversal of the whole path.
    #[default]
    AutoAnimation,
    /// Externally requested climb steps, run in order.
    PathAnimation,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathControl {
    /// Start and end waypoints plus an offset waypoint between them.
    #[default]
    TwoPoint,
    /// An ordered waypoint list (manual or anchor children).
    MultiPoint,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    #[default]
    Polyline,
    #[serde(alias = "Bezier")]
    Spline,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointSource {
    #[default]
    Manual,
    /// Children of an anchor object, in child order.
    Anchor,
}

/// Sample counts for numeric integration and length estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleCounts {
    /// Distance-time table buckets (clamped to 10..=500).
    pub table: usize,
    /// Catmull-Rom samples for multi-point spline length.
    pub spline_length: usize,
    /// Quadratic Bezier samples for two-point spline length.
    pub bezier_length: usize,
    /// Buckets used to invert the speed integral inside one climb segment.
    pub segment_progress: usize,
}

impl Default for SampleCounts {
    fn default() -> Self {
        Self {
            table: 200,
            spline_length: 50,
            bezier_length: 20,
            segment_progress: 100,
        }
    }
}

/// Debug observers installed by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsCfg {
    /// Log sampled poses at debug level.
    pub log_samples: bool,
    /// Seconds between logged samples.
    pub log_interval: f32,
    /// Keep a trail of recent positions.
    pub record_trail: bool,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        Self {
            log_samples: false,
            log_interval: 0.1,
            record_trail: false,
        }
    }
}

/// Full configuration for one path follower.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub movement_mode: MovementMode,
    pub path_control: PathControl,
    pub line_type: LineType,
    pub point_source: PointSource,

    /// Two-point endpoints.
    pub start: Option<Waypoint>,
    pub end: Option<Waypoint>,
    /// Multi-point waypoints (manual source).
    pub waypoints: Vec<Waypoint>,

    pub offset: OffsetDescriptor,
    /// Where the offset waypoint sits between start and end, in [0,1].
    pub offset_ratio: f32,

    /// AutoAnimation traversal time and default climb step duration, in seconds.
    pub duration: f32,
    pub speed_curve: SpeedCurve,
    pub samples: SampleCounts,

    /// Re-centre the offset waypoint inside every multi-point polyline segment.
    pub polyline_segment_offset: bool,
    /// Suggested climb step after a reset; the full path length when unset.
    pub next_climb_distance: Option<f32>,

    pub diagnostics: DiagnosticsCfg,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            movement_mode: MovementMode::default(),
            path_control: PathControl::default(),
            line_type: LineType::default(),
            point_source: PointSource::default(),
            start: None,
            end: None,
            waypoints: Vec::new(),
            offset: OffsetDescriptor::default(),
            offset_ratio: 0.5,
            duration: 2.0,
            speed_curve: SpeedCurve::default(),
            samples: SampleCounts::default(),
            polyline_segment_offset: false,
            next_climb_distance: None,
            diagnostics: DiagnosticsCfg::default(),
        }
    }
}

impl PathConfig {
    pub fn two_point(start: Waypoint, end: Waypoint) -> Self {
        Self {
            path_control: PathControl::TwoPoint,
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn multi_point(waypoints: Vec<Waypoint>) -> Self {
        Self {
            path_control: PathControl::MultiPoint,
            waypoints,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: MovementMode) -> Self {
        self.movement_mode = mode;
        self
    }

    pub fn with_line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }

    pub fn with_point_source(mut self, source: PointSource) -> Self {
        self.point_source = source;
        self
    }

    pub fn with_offset(mut self, offset: OffsetDescriptor, ratio: f32) -> Self {
        self.offset = offset;
        self.offset_ratio = ratio;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_speed_curve(mut self, curve: SpeedCurve) -> Self {
        self.speed_curve = curve;
        self
    }

    /// Reject values that cannot be clamped into range.
    pub fn validate(&self) -> Result<(), PathError> {
        if !self.duration.is_finite() {
            return Err(PathError::invalid_config("duration must be finite"));
        }
        if !self.offset_ratio.is_finite() {
            return Err(PathError::invalid_config("offset_ratio must be finite"));
        }
        if let Some(d) = self.next_climb_distance {
            if !d.is_finite() || d < 0.0 {
                return Err(PathError::invalid_config(
                    "next_climb_distance must be finite and non-negative",
                ));
            }
        }
        if !self.diagnostics.log_interval.is_finite() {
            return Err(PathError::invalid_config("log_interval must be finite"));
        }
        let waypoints = self
            .start
            .iter()
            .chain(self.end.iter())
            .chain(self.waypoints.iter());
        for w in waypoints {
            let finite = w
                .position
                .iter()
                .chain(w.rotation.iter())
                .chain(w.scale.iter())
                .all(|c| c.is_finite());
            if !finite {
                return Err(PathError::invalid_config("waypoint values must be finite"));
            }
        }
        if self.speed_curve.keys.iter().any(|k| !k.time.is_finite() || !k.value.is_finite()) {
            return Err(PathError::invalid_config("speed curve keys must be finite"));
        }
        Ok(())
    }

    /// Copy with every ranged value clamped into range.
    pub fn sanitized(&self) -> Self {
        let mut cfg = self.clone();
        cfg.duration = cfg.duration.max(MIN_DURATION);
        cfg.offset_ratio = cfg.offset_ratio.clamp(0.0, 1.0);
        cfg.samples.table = cfg.samples.table.clamp(MIN_TABLE_SAMPLES, MAX_TABLE_SAMPLES);
        cfg.samples.spline_length = cfg.samples.spline_length.max(1);
        cfg.samples.bezier_length = cfg.samples.bezier_length.max(1);
        cfg.samples.segment_progress = cfg.samples.segment_progress.max(1);
        cfg.diagnostics.log_interval = cfg.diagnostics.log_interval.max(0.0);
        cfg.speed_curve = SpeedCurve::new(std::mem::take(&mut cfg.speed_curve.keys));
        cfg
    }

    /// Hash of the parameters whose change invalidates debug trails.
    pub(crate) fn structure_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.movement_mode.hash(&mut hasher);
        self.path_control.hash(&mut hasher);
        self.line_type.hash(&mut hasher);
        self.point_source.hash(&mut hasher);
        self.waypoints.len().hash(&mut hasher);
        self.offset_ratio.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}

/// Parse a JSON path configuration, validate it and clamp ranged values.
pub fn parse_path_config_json(s: &str) -> Result<PathConfig, PathError> {
    let cfg: PathConfig = serde_json::from_str(s)?;
    cfg.validate()?;
    Ok(cfg.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PathConfig::default();
        assert_eq!(cfg.samples.table, 200);
        assert_eq!(cfg.samples.spline_length, 50);
        assert_eq!(cfg.samples.bezier_length, 20);
        assert_eq!(cfg.samples.segment_progress, 100);
        assert_eq!(cfg.diagnostics.log_interval, 0.1);
        assert_eq!(cfg.movement_mode, MovementMode::AutoAnimation);
    }

    #[test]
    fn parse_clamps_ranges() {
        let json = r#"{
            "path_control": "MultiPoint",
            "line_type": "Bezier",
            "waypoints": [{ "position": [0, 0, 0] }, { "position": [1, 0, 0] }],
            "offset_ratio": 3.0,
            "duration": 0.0,
            "samples": { "table": 5000 }
        }"#;
        let cfg = parse_path_config_json(json).expect("parse");
        assert_eq!(cfg.line_type, LineType::Spline);
        assert_eq!(cfg.offset_ratio, 1.0);
        assert_eq!(cfg.duration, MIN_DURATION);
        assert_eq!(cfg.samples.table, MAX_TABLE_SAMPLES);
        assert_eq!(cfg.samples.spline_length, 50);
        assert_eq!(cfg.waypoints[1].scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn parse_rejects_bad_json_and_negative_step() {
        assert!(matches!(
            parse_path_config_json("{ not json"),
            Err(PathError::Parse { .. })
        ));
        assert!(matches!(
            parse_path_config_json(r#"{ "next_climb_distance": -1.0 }"#),
            Err(PathError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn sanitized_sorts_speed_keys() {
        use crate::speed::SpeedKey;
        let mut cfg = PathConfig::default();
        cfg.speed_curve.keys = vec![SpeedKey::new(1.0, 2.0), SpeedKey::new(0.0, 0.5)];
        let cfg = cfg.sanitized();
        let times: Vec<f32> = cfg.speed_curve.keys.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0]);
    }

    #[test]
    fn structure_hash_tracks_layout_changes() {
        let a = PathConfig::multi_point(vec![Waypoint::at(0.0, 0.0, 0.0); 3]);
        let mut b = a.clone();
        b.duration = 9.0;
        assert_eq!(a.structure_hash(), b.structure_hash());
        b.waypoints.push(Waypoint::default());
        assert_ne!(a.structure_hash(), b.structure_hash());
    }
}
