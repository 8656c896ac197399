//! Atlas-space projection
//!
//! Converts a light's view-projection matrix into a matrix that maps world
//! positions straight into the UV and depth range of one atlas tile. The
//! NDC-to-UV remap and the tile transform are folded into the matrix rows so
//! the shading pass only needs one multiply and one homogeneous divide.

use core::f32::consts::SQRT_2;

use glam::{Mat4, Vec2, Vec4};
use serde::{Serialize, Deserialize};

/// Depth range convention of the active device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthConvention {
    /// Near plane maps to the smallest depth
    #[default]
    Standard,
    /// Near plane maps to the largest depth
    Reversed,
}

/// Device-layer conventions the shadow matrices must match
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConventions {
    pub depth: DepthConvention,

    /// Cube faces are rendered upside down and need their view Y axis flipped
    pub flip_cube_face_y: bool,
}

impl DeviceConventions {
    /// Reversed depth with flipped cube faces (D3D-style backends)
    pub fn reversed_z() -> Self {
        Self {
            depth: DepthConvention::Reversed,
            flip_cube_face_y: true,
        }
    }
}

/// Convert a view-projection matrix into an atlas tile sampling matrix
///
/// `tile_offset` is the tile's grid position (column, row) and `split` the
/// number of tiles per atlas row.
pub fn to_atlas_matrix(view_proj: Mat4, tile_offset: Vec2, split: u32, depth: DepthConvention) -> Mat4 {
    let mut rows = [
        view_proj.row(0),
        view_proj.row(1),
        view_proj.row(2),
        view_proj.row(3),
    ];

    if depth == DepthConvention::Reversed {
        rows[2] = -rows[2];
    }

    // [-1, 1] -> [0, 1]
    let w = rows[3];
    for row in rows.iter_mut().take(3) {
        *row = 0.5 * (*row + w);
    }

    let scale = 1.0 / split as f32;
    rows[0] = scale * (rows[0] + tile_offset.x * w);
    rows[1] = scale * (rows[1] + tile_offset.y * w);

    Mat4::from_cols(rows[0], rows[1], rows[2], rows[3]).transpose()
}

/// Flip the Y row of a cube face view matrix
pub fn flip_view_y(view: Mat4) -> Mat4 {
    let mut rows = [view.row(0), view.row(1), view.row(2), view.row(3)];
    rows[1] = -rows[1];
    Mat4::from_cols(rows[0], rows[1], rows[2], rows[3]).transpose()
}

/// Border-corrected tile bounds for spot and point light sampling
///
/// The tile is shrunk by half an atlas texel on every side so bilinear
/// filtering never reads across a tile seam.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OtherTile {
    /// Tile minimum corner in atlas UV
    pub min: [f32; 2],

    /// Tile edge length in atlas UV
    pub scale: f32,

    /// World-space normal bias for this tile
    pub normal_bias: f32,
}

impl OtherTile {
    pub fn new(tile_offset: Vec2, tile_scale: f32, atlas_texel_size: f32, normal_bias: f32) -> Self {
        let border = 0.5 * atlas_texel_size;
        Self {
            min: [
                tile_offset.x * tile_scale + border,
                tile_offset.y * tile_scale + border,
            ],
            scale: tile_scale - border - border,
            normal_bias,
        }
    }

    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.min[0], self.min[1], self.scale, self.normal_bias)
    }
}

/// Filter footprint and normal bias of a perspective shadow tile
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileFilter {
    /// Filter footprint in world units at unit distance
    pub filter_size: f32,

    /// Normal bias scaled to cover the filter footprint
    pub normal_bias: f32,
}

impl TileFilter {
    /// Spot light tile; `proj_x_scale` is the projection's `[0][0]` element
    pub fn spot(tile_size: u32, proj_x_scale: f32, kernel_width: f32, normal_bias: f32) -> Self {
        let texel_size = 2.0 / (tile_size as f32 * proj_x_scale);
        Self::from_texel_size(texel_size, kernel_width, normal_bias)
    }

    /// Point light cube face tile (90 degree field of view)
    pub fn point(tile_size: u32, kernel_width: f32, normal_bias: f32) -> Self {
        let texel_size = 2.0 / tile_size as f32;
        Self::from_texel_size(texel_size, kernel_width, normal_bias)
    }

    fn from_texel_size(texel_size: f32, kernel_width: f32, normal_bias: f32) -> Self {
        let filter_size = texel_size * kernel_width;
        Self {
            filter_size,
            normal_bias: SQRT_2 * filter_size * normal_bias,
        }
    }

    /// Degrees to widen a cube face frustum so filtering at the face edge
    /// still finds casters rendered into this face
    pub fn cube_fov_bias(&self) -> f32 {
        (1.0 + self.filter_size + self.normal_bias).atan().to_degrees() * 2.0 - 90.0
    }
}
