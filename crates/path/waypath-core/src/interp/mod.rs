//! Interpolation and curve evaluation helpers shared by path building and sampling.

pub mod functions;

pub use functions::{
    catmull_rom, clamp01, inverse_lerp, lerp_f32, lerp_vec3, nlerp_quat, offset_strength,
    quadratic_bezier, segment_index, slerp_quat,
};
