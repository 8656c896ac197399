//! Cascaded Shadow Map Data
//!
//! The culling system computes each cascade's matrices and culling sphere.
//! This module turns those spheres into the data the shading pass uses to
//! pick and blend cascades.
//!
//! # Shared cascade geometry
//!
//! All directional lights share one set of cascade splits, so the spheres and
//! per-cascade data are taken from the first reserved directional light only.

use core::f32::consts::SQRT_2;

use glam::Vec4;

/// Maximum supported cascade count
pub const MAX_CASCADES: usize = 4;

/// Culling factor that lets casters fully covered by the previous cascade be
/// skipped, reduced as the cascade fade region grows
pub fn cascade_blend_culling_factor(cascade_fade: f32) -> f32 {
    (0.8 - cascade_fade).max(0.0)
}

/// Shading data for one cascade
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CascadeDatum {
    /// xyz = center, w = squared radius shrunk by the filter footprint
    pub culling_sphere: Vec4,

    /// 1 / squared shrunk radius
    pub inverse_radius_sq: f32,

    /// Filter footprint scaled to the texel diagonal
    pub filter_blend: f32,
}

impl CascadeDatum {
    /// Build from the culling sphere of a cascade rendered into a tile of
    /// `tile_size` texels with a filter kernel of `kernel_width` texels
    ///
    /// The sphere is pulled in by the filter footprint so the shading pass
    /// never selects a cascade whose kernel would sample outside the tile.
    pub fn from_culling_sphere(sphere: Vec4, tile_size: u32, kernel_width: f32) -> Self {
        let texel_size = 2.0 * sphere.w / tile_size as f32;
        let filter_size = texel_size * kernel_width;
        let radius = sphere.w - filter_size;
        let radius_sq = radius * radius;

        Self {
            culling_sphere: sphere.truncate().extend(radius_sq),
            inverse_radius_sq: 1.0 / radius_sq,
            filter_blend: SQRT_2 * filter_size,
        }
    }

    /// Packed form published to shaders
    pub fn data_vec4(&self) -> Vec4 {
        Vec4::new(self.inverse_radius_sq, self.filter_blend, 0.0, 0.0)
    }
}

/// Cascade spheres and data for the current frame
#[derive(Clone, Debug, Default)]
pub struct CascadeSet {
    /// Active cascades
    pub count: usize,

    pub culling_spheres: [Vec4; MAX_CASCADES],

    pub data: [Vec4; MAX_CASCADES],
}

impl CascadeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous frame's cascades, keeping storage in place
    pub fn reset(&mut self, count: usize) {
        self.count = count.min(MAX_CASCADES);
        self.culling_spheres = [Vec4::ZERO; MAX_CASCADES];
        self.data = [Vec4::ZERO; MAX_CASCADES];
    }

    /// Record one cascade
    pub fn set(&mut self, index: usize, datum: &CascadeDatum) {
        self.culling_spheres[index] = datum.culling_sphere;
        self.data[index] = datum.data_vec4();
    }

    /// Spheres of the active cascades
    pub fn active_spheres(&self) -> &[Vec4] {
        &self.culling_spheres[..self.count]
    }
}
