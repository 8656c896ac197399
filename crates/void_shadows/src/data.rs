//! GPU Shadow Data Structures
//!
//! Snapshot of everything the shadow system publishes in a frame, laid out as
//! uniform blocks for backends that upload buffers instead of setting
//! individual globals. All structures are bytemuck Pod/Zeroable.

use glam::{Mat4, Vec4};
use serde::{Serialize, Deserialize};

use crate::cascade::MAX_CASCADES;
use crate::reservation::MAX_SHADOWED_OTHER_LIGHTS;

/// Directional atlas tiles (4 lights x 4 cascades)
pub const MAX_DIRECTIONAL_TILES: usize = 16;

/// Atlas-wide shadow uniforms
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuShadowGlobals {
    /// (1 / max distance, 1 / distance fade, 1 / (1 - (1 - cascade fade)^2), 0)
    pub distance_fade: [f32; 4],

    /// (directional size, 1 / directional size, other size, 1 / other size)
    pub atlas_size: [f32; 4],

    /// Active cascades (0 when no directional light has shadows)
    pub cascade_count: i32,

    /// Padding to align to 16 bytes
    pub _pad: [f32; 3],
}

impl GpuShadowGlobals {
    pub fn new(distance_fade: Vec4, atlas_size: Vec4, cascade_count: usize) -> Self {
        Self {
            distance_fade: distance_fade.to_array(),
            atlas_size: atlas_size.to_array(),
            cascade_count: cascade_count as i32,
            _pad: [0.0; 3],
        }
    }
}

/// Directional atlas sampling data
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuDirectionalShadows {
    /// Atlas matrix per tile (light slot * cascade count + cascade)
    pub matrices: [[[f32; 4]; 4]; MAX_DIRECTIONAL_TILES],

    /// Shrunk culling sphere per cascade (w = squared radius)
    pub culling_spheres: [[f32; 4]; MAX_CASCADES],

    /// (1 / squared radius, filter blend, 0, 0) per cascade
    pub cascade_data: [[f32; 4]; MAX_CASCADES],
}

impl Default for GpuDirectionalShadows {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl GpuDirectionalShadows {
    pub fn new(
        matrices: &[Mat4; MAX_DIRECTIONAL_TILES],
        culling_spheres: &[Vec4; MAX_CASCADES],
        cascade_data: &[Vec4; MAX_CASCADES],
    ) -> Self {
        Self {
            matrices: matrices.map(|m| m.to_cols_array_2d()),
            culling_spheres: culling_spheres.map(|v| v.to_array()),
            cascade_data: cascade_data.map(|v| v.to_array()),
        }
    }
}

/// Spot and point light atlas sampling data
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuOtherShadows {
    /// Atlas matrix per slot (point lights use six consecutive slots)
    pub matrices: [[[f32; 4]; 4]; MAX_SHADOWED_OTHER_LIGHTS],

    /// Border-corrected (min x, min y, scale, normal bias) per slot
    pub tiles: [[f32; 4]; MAX_SHADOWED_OTHER_LIGHTS],
}

impl Default for GpuOtherShadows {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl GpuOtherShadows {
    pub fn new(matrices: &[Mat4; MAX_SHADOWED_OTHER_LIGHTS], tiles: &[Vec4; MAX_SHADOWED_OTHER_LIGHTS]) -> Self {
        Self {
            matrices: matrices.map(|m| m.to_cols_array_2d()),
            tiles: tiles.map(|v| v.to_array()),
        }
    }
}

/// All published shadow data for one frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShadowFrameData {
    pub globals: GpuShadowGlobals,
    pub directional: GpuDirectionalShadows,
    pub other: GpuOtherShadows,
}

impl ShadowFrameData {
    /// Get global uniform data as bytes
    pub fn globals_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.globals)
    }

    /// Get directional shadow data as bytes
    pub fn directional_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.directional)
    }

    /// Get other-light shadow data as bytes
    pub fn other_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.other)
    }
}
