//! External collaborator interfaces
//!
//! The shadow system does not cull, rasterize or own GPU resources. It talks
//! to three collaborators supplied by the host renderer:
//!
//! - [`ShadowCulling`]: caster bounds and light-space matrices per light
//! - [`ShadowCommandBuffer`]: records GPU commands and global shader data
//! - [`ShadowDebugHooks`]: optional editor/debug notifications
//!
//! Commands are only meaningful in the order they are recorded; the shadow
//! system records them in exactly the order the GPU must execute them.

use glam::{Mat4, Vec3, Vec4};

use crate::atlas::{AtlasKind, TileRect};
use crate::properties::PropertyId;
use crate::renderer::ShadowFrameStats;

/// World-space bounds of the shadow casters affecting one light
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CasterBounds {
    pub center: Vec3,
    pub extents: Vec3,
}

/// Culling data for one shadow render
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShadowSplitData {
    /// Culling sphere (xyz = center, w = radius)
    pub culling_sphere: Vec4,

    /// Fraction of the previous cascade's sphere in which casters may be culled
    pub cascade_blend_culling_factor: f32,
}

/// Light-space matrices computed by the culling system
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowMatrices {
    pub view: Mat4,
    pub proj: Mat4,
    pub split: ShadowSplitData,
}

impl ShadowMatrices {
    /// Combined view-projection (projection applied last)
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

/// Cube map face rendered for a point light
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All faces in atlas slot order
    pub const ALL: [CubeFace; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Transient depth texture request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowMapDesc {
    /// Edge length in texels (square)
    pub size: u32,
    /// Depth buffer precision
    pub depth_bits: u32,
}

impl ShadowMapDesc {
    pub fn new(size: u32) -> Self {
        Self { size, depth_bits: 32 }
    }

    /// 1x1 texture bound when no light needs the atlas
    pub fn placeholder() -> Self {
        Self::new(1)
    }

    pub fn is_placeholder(&self) -> bool {
        self.size == 1
    }
}

/// Geometry culling collaborator
pub trait ShadowCulling {
    /// Bounds of the shadow casters visible to a light, `None` if nothing casts
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<CasterBounds>;

    /// Matrices and culling sphere for one directional cascade
    fn directional_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        cascade_index: usize,
        cascade_count: usize,
        split_ratios: [f32; 3],
        tile_size: u32,
        near_plane_offset: f32,
    ) -> ShadowMatrices;

    /// Matrices for a spot light
    fn spot_shadow_matrices(&mut self, visible_light_index: usize) -> ShadowMatrices;

    /// Matrices for one face of a point light, field of view widened by `fov_bias` degrees
    fn point_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        face: CubeFace,
        fov_bias: f32,
    ) -> ShadowMatrices;
}

/// GPU command recording collaborator
pub trait ShadowCommandBuffer {
    /// Acquire a transient depth texture bound globally under `id`
    fn get_temporary_shadow_map(&mut self, id: PropertyId, desc: ShadowMapDesc);

    /// Release a transient depth texture
    fn release_temporary_shadow_map(&mut self, id: PropertyId);

    /// Render into the texture bound under `id` and clear its depth
    fn set_render_target(&mut self, id: PropertyId);

    fn set_viewport(&mut self, rect: TileRect);

    fn set_view_projection(&mut self, view: Mat4, proj: Mat4);

    fn set_depth_bias(&mut self, constant: f32, slope_scale: f32);

    /// Rasterize the shadow casters of a light (fire-and-forget)
    fn draw_shadow_casters(&mut self, visible_light_index: usize, split: &ShadowSplitData);

    fn set_global_int(&mut self, id: PropertyId, value: i32);

    fn set_global_float(&mut self, id: PropertyId, value: f32);

    fn set_global_vector(&mut self, id: PropertyId, value: Vec4);

    fn set_global_vector_array(&mut self, id: PropertyId, values: &[Vec4]);

    fn set_global_matrix_array(&mut self, id: PropertyId, values: &[Mat4]);

    fn set_keyword(&mut self, keyword: &'static str, enabled: bool);

    /// Open a named profiling scope
    fn begin_sample(&mut self, _name: &'static str) {}

    /// Close the innermost profiling scope
    fn end_sample(&mut self, _name: &'static str) {}

    /// Hand recorded commands to the GPU context
    fn submit(&mut self) {}
}

/// Editor and debug notifications
///
/// Every method defaults to a no-op; hosts without tooling pass [`NoDebugHooks`].
pub trait ShadowDebugHooks {
    /// A tile of an atlas was rendered
    fn tile_rendered(&mut self, _atlas: AtlasKind, _tile_index: usize, _rect: TileRect) {}

    /// Shadow data for the frame was published
    fn frame_published(&mut self, _stats: &ShadowFrameStats) {}
}

/// Hooks that do nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDebugHooks;

impl ShadowDebugHooks for NoDebugHooks {}
