//! Shadow Rendering
//!
//! The execution half of the frame. [`ShadowSystem`] owns the reservation
//! tables and the [`ShadowRenderer`], and enforces the frame protocol:
//!
//! ```text
//! Idle -> Reserving -> DirectionalPass -> OtherPass -> Published -> Idle
//!          begin_frame    render()                       cleanup()
//! ```
//!
//! Each pass acquires its transient atlas, renders every reserved tile through
//! the command buffer and publishes its sampling data once at the end. An
//! atlas with nothing to render is still acquired as a 1x1 placeholder so the
//! shading pass always has a texture bound.

use glam::{Mat4, Vec4};

use crate::atlas::{AtlasKind, AtlasLayout};
use crate::cascade::{cascade_blend_culling_factor, CascadeDatum, CascadeSet};
use crate::collaborators::{
    CubeFace, ShadowCommandBuffer, ShadowCulling, ShadowDebugHooks, ShadowMapDesc, ShadowSplitData,
};
use crate::config::ShadowSettings;
use crate::data::{
    GpuDirectionalShadows, GpuOtherShadows, GpuShadowGlobals, ShadowFrameData,
    MAX_DIRECTIONAL_TILES,
};
use crate::error::{Result, ShadowError};
use crate::keywords;
use crate::light::VisibleLight;
use crate::projection::{flip_view_y, to_atlas_matrix, DeviceConventions, OtherTile, TileFilter};
use crate::properties::ShadowPropertyIds;
use crate::reservation::{
    ShadowParams, ShadowReservation, ShadowedDirectionalLight, ShadowedOtherLight,
    MAX_SHADOWED_OTHER_LIGHTS,
};

/// Profiling scope recorded around each pass
const SAMPLE_NAME: &str = "Shadows";

/// Where a frame is in the reserve/render protocol
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FramePhase {
    /// No frame in progress
    #[default]
    Idle,
    /// Lights may request shadow space
    Reserving,
    /// Rendering the directional atlas
    DirectionalPass,
    /// Rendering the spot/point atlas
    OtherPass,
    /// Data published, atlases still held
    Published,
}

/// Counters for the last rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowFrameStats {
    /// Directional lights with shadows
    pub directional_lights: u32,

    /// Spot and point lights with shadows
    pub other_lights: u32,

    /// Occupied other-light slots
    pub other_slots: u32,

    /// Atlas tiles rendered (cascades and cube faces included)
    pub tiles_rendered: u32,

    /// Shadow caster draws issued
    pub draw_calls: u32,

    /// Lights turned away for lack of atlas space
    pub rejected_lights: u32,

    pub uses_shadow_mask: bool,
}

/// Renders reserved lights into the two atlases and publishes sampling data
pub struct ShadowRenderer {
    conventions: DeviceConventions,
    ids: ShadowPropertyIds,

    directional_matrices: [Mat4; MAX_DIRECTIONAL_TILES],
    other_matrices: [Mat4; MAX_SHADOWED_OTHER_LIGHTS],
    other_tiles: [Vec4; MAX_SHADOWED_OTHER_LIGHTS],
    cascades: CascadeSet,

    /// (dir size, 1 / dir size, other size, 1 / other size)
    atlas_sizes: Vec4,
    distance_fade: Vec4,
    published_cascade_count: usize,

    directional_layout: Option<AtlasLayout>,
    other_layout: Option<AtlasLayout>,

    stats: ShadowFrameStats,
}

impl ShadowRenderer {
    pub fn new(conventions: DeviceConventions, ids: ShadowPropertyIds) -> Self {
        Self {
            conventions,
            ids,
            directional_matrices: [Mat4::IDENTITY; MAX_DIRECTIONAL_TILES],
            other_matrices: [Mat4::IDENTITY; MAX_SHADOWED_OTHER_LIGHTS],
            other_tiles: [Vec4::ZERO; MAX_SHADOWED_OTHER_LIGHTS],
            cascades: CascadeSet::new(),
            atlas_sizes: Vec4::ONE,
            distance_fade: Vec4::ZERO,
            published_cascade_count: 0,
            directional_layout: None,
            other_layout: None,
            stats: ShadowFrameStats::default(),
        }
    }

    /// Reset per-frame state for a new render
    pub fn prepare(&mut self, reservation: &ShadowReservation) {
        self.cascades.reset(reservation.cascade_count());
        self.atlas_sizes = Vec4::ONE;
        self.directional_layout = None;
        self.other_layout = None;
        self.stats = ShadowFrameStats {
            directional_lights: reservation.directional_count() as u32,
            other_lights: reservation.other_lights().count() as u32,
            other_slots: reservation.other_slot_count() as u32,
            rejected_lights: reservation.rejected_count(),
            uses_shadow_mask: reservation.uses_shadow_mask(),
            ..Default::default()
        };
    }

    /// Render every reserved directional cascade, or bind the placeholder
    pub fn render_directional(
        &mut self,
        settings: &ShadowSettings,
        reservation: &ShadowReservation,
        culling: &mut impl ShadowCulling,
        commands: &mut impl ShadowCommandBuffer,
        hooks: &mut impl ShadowDebugHooks,
    ) {
        let lights = reservation.directional_lights();
        if lights.is_empty() {
            commands.get_temporary_shadow_map(self.ids.directional_atlas, ShadowMapDesc::placeholder());
            return;
        }

        let directional = &settings.directional;
        let resolution = directional.atlas_size.texels();
        self.atlas_sizes.x = resolution as f32;
        self.atlas_sizes.y = 1.0 / resolution as f32;

        commands.get_temporary_shadow_map(self.ids.directional_atlas, ShadowMapDesc::new(resolution));
        commands.set_render_target(self.ids.directional_atlas);
        commands.set_global_float(self.ids.pancaking, 1.0);
        commands.begin_sample(SAMPLE_NAME);
        commands.submit();

        let layout = AtlasLayout::for_count(reservation.directional_tile_count(), resolution);
        log::debug!(
            "Directional shadows: {} lights x {} cascades, split {} tile {}px",
            lights.len(),
            reservation.cascade_count(),
            layout.split,
            layout.tile_size
        );

        for (slot, light) in lights.iter().enumerate() {
            self.render_directional_light(settings, reservation.cascade_count(), slot, light, &layout, culling, commands, hooks);
        }

        commands.set_global_vector_array(self.ids.cascade_culling_spheres, &self.cascades.culling_spheres);
        commands.set_global_vector_array(self.ids.cascade_data, &self.cascades.data);
        commands.set_global_matrix_array(self.ids.directional_matrices, &self.directional_matrices);
        keywords::DIRECTIONAL_FILTER.apply(commands, directional.filter.keyword_index());
        keywords::CASCADE_BLEND.apply(commands, directional.cascade_blend.keyword_index());
        commands.end_sample(SAMPLE_NAME);
        commands.submit();

        self.directional_layout = Some(layout);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_directional_light(
        &mut self,
        settings: &ShadowSettings,
        cascade_count: usize,
        slot: usize,
        light: &ShadowedDirectionalLight,
        layout: &AtlasLayout,
        culling: &mut impl ShadowCulling,
        commands: &mut impl ShadowCommandBuffer,
        hooks: &mut impl ShadowDebugHooks,
    ) {
        let directional = &settings.directional;
        let culling_factor = cascade_blend_culling_factor(directional.cascade_fade);
        let kernel = directional.filter.kernel_width();
        let first_tile = slot * cascade_count;

        for cascade in 0..cascade_count {
            let mut matrices = culling.directional_shadow_matrices(
                light.visible_light_index,
                cascade,
                cascade_count,
                directional.cascade_ratios,
                layout.tile_size,
                light.near_plane_offset,
            );
            matrices.split.cascade_blend_culling_factor = culling_factor;

            // Cascade geometry is shared, so only the first light defines it
            if slot == 0 {
                let datum = CascadeDatum::from_culling_sphere(
                    matrices.split.culling_sphere,
                    layout.tile_size,
                    kernel,
                );
                self.cascades.set(cascade, &datum);
            }

            let tile = first_tile + cascade;
            let rect = layout.tile_rect(tile);
            self.directional_matrices[tile] = to_atlas_matrix(
                matrices.view_proj(),
                layout.tile_offset(tile),
                layout.split,
                self.conventions.depth,
            );

            commands.set_viewport(rect);
            commands.set_view_projection(matrices.view, matrices.proj);
            commands.set_depth_bias(0.0, light.slope_scale_bias);
            commands.submit();
            commands.draw_shadow_casters(light.visible_light_index, &matrices.split);
            commands.set_depth_bias(0.0, 0.0);

            self.stats.tiles_rendered += 1;
            self.stats.draw_calls += 1;
            hooks.tile_rendered(AtlasKind::Directional, tile, rect);
            log::trace!("Directional tile {} cascade {} at {:?}", tile, cascade, rect);
        }
    }

    /// Render every reserved spot light and point light face, or bind the placeholder
    pub fn render_other(
        &mut self,
        settings: &ShadowSettings,
        reservation: &ShadowReservation,
        culling: &mut impl ShadowCulling,
        commands: &mut impl ShadowCommandBuffer,
        hooks: &mut impl ShadowDebugHooks,
    ) {
        if reservation.other_slot_count() == 0 {
            commands.get_temporary_shadow_map(self.ids.other_atlas, ShadowMapDesc::placeholder());
            return;
        }

        let resolution = settings.other.atlas_size.texels();
        self.atlas_sizes.z = resolution as f32;
        self.atlas_sizes.w = 1.0 / resolution as f32;

        commands.get_temporary_shadow_map(self.ids.other_atlas, ShadowMapDesc::new(resolution));
        commands.set_render_target(self.ids.other_atlas);
        commands.set_global_float(self.ids.pancaking, 0.0);
        commands.begin_sample(SAMPLE_NAME);
        commands.submit();

        let layout = AtlasLayout::for_count(reservation.other_slot_count(), resolution);
        log::debug!(
            "Other shadows: {} slots, split {} tile {}px",
            reservation.other_slot_count(),
            layout.split,
            layout.tile_size
        );

        let kernel = settings.other.filter.kernel_width();
        for (slot, light) in reservation.other_lights() {
            if light.is_point {
                self.render_point_light(slot, light, &layout, kernel, culling, commands, hooks);
            } else {
                self.render_spot_light(slot, light, &layout, kernel, culling, commands, hooks);
            }
        }

        commands.set_global_matrix_array(self.ids.other_matrices, &self.other_matrices);
        commands.set_global_vector_array(self.ids.other_tiles, &self.other_tiles);
        keywords::OTHER_FILTER.apply(commands, settings.other.filter.keyword_index());
        commands.end_sample(SAMPLE_NAME);
        commands.submit();

        self.other_layout = Some(layout);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_spot_light(
        &mut self,
        slot: usize,
        light: &ShadowedOtherLight,
        layout: &AtlasLayout,
        kernel: f32,
        culling: &mut impl ShadowCulling,
        commands: &mut impl ShadowCommandBuffer,
        hooks: &mut impl ShadowDebugHooks,
    ) {
        let matrices = culling.spot_shadow_matrices(light.visible_light_index);
        let filter = TileFilter::spot(layout.tile_size, matrices.proj.x_axis.x, kernel, light.normal_bias);

        self.write_other_tile(slot, matrices.view_proj(), layout, filter.normal_bias);
        self.draw_other_tile(slot, light, layout, matrices.view, matrices.proj, &matrices.split, commands, hooks);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_point_light(
        &mut self,
        first_slot: usize,
        light: &ShadowedOtherLight,
        layout: &AtlasLayout,
        kernel: f32,
        culling: &mut impl ShadowCulling,
        commands: &mut impl ShadowCommandBuffer,
        hooks: &mut impl ShadowDebugHooks,
    ) {
        let filter = TileFilter::point(layout.tile_size, kernel, light.normal_bias);
        let fov_bias = filter.cube_fov_bias();

        for face in CubeFace::ALL {
            let matrices = culling.point_shadow_matrices(light.visible_light_index, face, fov_bias);
            let view = if self.conventions.flip_cube_face_y {
                flip_view_y(matrices.view)
            } else {
                matrices.view
            };

            let slot = first_slot + face.index();
            self.write_other_tile(slot, matrices.proj * view, layout, filter.normal_bias);
            self.draw_other_tile(slot, light, layout, view, matrices.proj, &matrices.split, commands, hooks);
        }
    }

    fn write_other_tile(&mut self, slot: usize, view_proj: Mat4, layout: &AtlasLayout, normal_bias: f32) {
        let offset = layout.tile_offset(slot);
        let tile = OtherTile::new(offset, layout.tile_scale(), self.atlas_sizes.w, normal_bias);

        self.other_tiles[slot] = tile.to_vec4();
        self.other_matrices[slot] = to_atlas_matrix(view_proj, offset, layout.split, self.conventions.depth);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_other_tile(
        &mut self,
        slot: usize,
        light: &ShadowedOtherLight,
        layout: &AtlasLayout,
        view: Mat4,
        proj: Mat4,
        split: &ShadowSplitData,
        commands: &mut impl ShadowCommandBuffer,
        hooks: &mut impl ShadowDebugHooks,
    ) {
        let rect = layout.tile_rect(slot);

        commands.set_viewport(rect);
        commands.set_view_projection(view, proj);
        commands.set_depth_bias(0.0, light.slope_scale_bias);
        commands.submit();
        commands.draw_shadow_casters(light.visible_light_index, split);
        commands.set_depth_bias(0.0, 0.0);

        self.stats.tiles_rendered += 1;
        self.stats.draw_calls += 1;
        hooks.tile_rendered(AtlasKind::Other, slot, rect);
        log::trace!("Other tile {} at {:?}", slot, rect);
    }

    /// Publish the atlas-wide globals after both passes
    pub fn publish_globals(
        &mut self,
        settings: &ShadowSettings,
        reservation: &ShadowReservation,
        commands: &mut impl ShadowCommandBuffer,
    ) {
        commands.begin_sample(SAMPLE_NAME);

        let mask = reservation
            .uses_shadow_mask()
            .then(|| settings.shadow_mask_mode.keyword_index());
        keywords::SHADOW_MASK.apply(commands, mask);

        self.published_cascade_count = if reservation.directional_count() > 0 {
            reservation.cascade_count()
        } else {
            0
        };
        commands.set_global_int(self.ids.cascade_count, self.published_cascade_count as i32);

        let t = 1.0 - settings.directional.cascade_fade;
        self.distance_fade = Vec4::new(
            1.0 / settings.max_distance,
            1.0 / settings.distance_fade,
            1.0 / (1.0 - t * t),
            0.0,
        );
        commands.set_global_vector(self.ids.distance_fade, self.distance_fade);
        commands.set_global_vector(self.ids.atlas_size, self.atlas_sizes);

        commands.end_sample(SAMPLE_NAME);
        commands.submit();

        log::debug!(
            "Shadows published: {} tiles, {} draws, {} rejected",
            self.stats.tiles_rendered,
            self.stats.draw_calls,
            self.stats.rejected_lights
        );
    }

    /// Release both transient atlases
    pub fn release(&self, commands: &mut impl ShadowCommandBuffer) {
        commands.release_temporary_shadow_map(self.ids.directional_atlas);
        commands.release_temporary_shadow_map(self.ids.other_atlas);
        commands.submit();
    }

    /// Published data as GPU uniform blocks
    pub fn frame_data(&self) -> ShadowFrameData {
        ShadowFrameData {
            globals: GpuShadowGlobals::new(self.distance_fade, self.atlas_sizes, self.published_cascade_count),
            directional: GpuDirectionalShadows::new(
                &self.directional_matrices,
                &self.cascades.culling_spheres,
                &self.cascades.data,
            ),
            other: GpuOtherShadows::new(&self.other_matrices, &self.other_tiles),
        }
    }

    pub fn stats(&self) -> &ShadowFrameStats {
        &self.stats
    }

    /// Directional grid of the last frame, `None` for the placeholder
    pub fn directional_layout(&self) -> Option<&AtlasLayout> {
        self.directional_layout.as_ref()
    }

    /// Other-light grid of the last frame, `None` for the placeholder
    pub fn other_layout(&self) -> Option<&AtlasLayout> {
        self.other_layout.as_ref()
    }

    pub fn directional_matrix(&self, tile: usize) -> Option<&Mat4> {
        self.directional_matrices.get(tile)
    }

    pub fn other_matrix(&self, slot: usize) -> Option<&Mat4> {
        self.other_matrices.get(slot)
    }

    pub fn other_tile(&self, slot: usize) -> Option<&Vec4> {
        self.other_tiles.get(slot)
    }

    pub fn cascades(&self) -> &CascadeSet {
        &self.cascades
    }

    pub fn atlas_sizes(&self) -> Vec4 {
        self.atlas_sizes
    }

    pub fn conventions(&self) -> DeviceConventions {
        self.conventions
    }
}

/// Shadow system driving one frame at a time through the reserve/render protocol
pub struct ShadowSystem {
    settings: ShadowSettings,
    reservation: ShadowReservation,
    renderer: ShadowRenderer,
    phase: FramePhase,
    frame: u64,
}

impl ShadowSystem {
    /// Create with hashed property handles
    pub fn new(conventions: DeviceConventions) -> Self {
        Self::with_properties(conventions, ShadowPropertyIds::default())
    }

    /// Create with handles resolved by the host
    pub fn with_properties(conventions: DeviceConventions, ids: ShadowPropertyIds) -> Self {
        Self {
            settings: ShadowSettings::default(),
            reservation: ShadowReservation::new(),
            renderer: ShadowRenderer::new(conventions, ids),
            phase: FramePhase::Idle,
            frame: 0,
        }
    }

    fn expect_phase(&self, operation: &'static str, expected: FramePhase) -> Result<()> {
        if self.phase != expected {
            return Err(ShadowError::InvalidPhase {
                operation,
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    /// Start a frame with the given settings
    ///
    /// A frame that was reserved but never rendered may be restarted. A frame
    /// that was published must be cleaned up first so its atlases are released.
    /// Out-of-range settings are clamped for the frame.
    pub fn begin_frame(&mut self, settings: &ShadowSettings) -> Result<()> {
        if self.phase != FramePhase::Reserving {
            self.expect_phase("begin_frame", FramePhase::Idle)?;
        }

        self.settings = settings.clone();
        self.settings.validate();
        self.reservation.reset(self.settings.directional.cascade_count as usize);
        self.phase = FramePhase::Reserving;
        self.frame += 1;
        Ok(())
    }

    /// Request atlas space for a directional light
    pub fn reserve_directional(
        &mut self,
        light: &VisibleLight,
        visible_light_index: usize,
        culling: &impl ShadowCulling,
    ) -> Result<ShadowParams> {
        self.expect_phase("reserve_directional", FramePhase::Reserving)?;
        Ok(self.reservation.reserve_directional(light, visible_light_index, culling))
    }

    /// Request atlas space for a spot or point light
    pub fn reserve_other(
        &mut self,
        light: &VisibleLight,
        visible_light_index: usize,
        culling: &impl ShadowCulling,
    ) -> Result<ShadowParams> {
        self.expect_phase("reserve_other", FramePhase::Reserving)?;
        Ok(self.reservation.reserve_other(light, visible_light_index, culling))
    }

    /// Render both atlases and publish all shadow data
    pub fn render(
        &mut self,
        culling: &mut impl ShadowCulling,
        commands: &mut impl ShadowCommandBuffer,
        hooks: &mut impl ShadowDebugHooks,
    ) -> Result<ShadowFrameStats> {
        self.expect_phase("render", FramePhase::Reserving)?;

        self.phase = FramePhase::DirectionalPass;
        self.renderer.prepare(&self.reservation);
        self.renderer
            .render_directional(&self.settings, &self.reservation, culling, commands, hooks);

        self.phase = FramePhase::OtherPass;
        self.renderer
            .render_other(&self.settings, &self.reservation, culling, commands, hooks);

        self.renderer
            .publish_globals(&self.settings, &self.reservation, commands);
        self.phase = FramePhase::Published;

        let stats = *self.renderer.stats();
        hooks.frame_published(&stats);
        Ok(stats)
    }

    /// Release the frame's atlases and return to idle
    pub fn cleanup(&mut self, commands: &mut impl ShadowCommandBuffer) -> Result<()> {
        self.expect_phase("cleanup", FramePhase::Published)?;
        self.renderer.release(commands);
        self.phase = FramePhase::Idle;
        Ok(())
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Frames begun since creation
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn reservation(&self) -> &ShadowReservation {
        &self.reservation
    }

    pub fn renderer(&self) -> &ShadowRenderer {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CasterBounds, NoDebugHooks, ShadowMatrices};
    use crate::atlas::TileRect;
    use crate::cascade::MAX_CASCADES;
    use crate::light::ShadowMode;
    use crate::properties::PropertyId;
    use glam::Vec3;

    /// Culling stub returning identity matrices
    #[derive(Default)]
    struct Identity {
        point_fov_bias: Option<f32>,
    }

    impl Identity {
        fn matrices(radius: f32) -> ShadowMatrices {
            ShadowMatrices {
                view: Mat4::IDENTITY,
                proj: Mat4::IDENTITY,
                split: ShadowSplitData {
                    culling_sphere: Vec4::new(0.0, 0.0, 0.0, radius),
                    cascade_blend_culling_factor: 0.0,
                },
            }
        }
    }

    impl ShadowCulling for Identity {
        fn shadow_caster_bounds(&self, _: usize) -> Option<CasterBounds> {
            Some(CasterBounds { center: Vec3::ZERO, extents: Vec3::ONE })
        }

        fn directional_shadow_matrices(
            &mut self,
            _: usize,
            cascade_index: usize,
            _: usize,
            _: [f32; 3],
            _: u32,
            _: f32,
        ) -> ShadowMatrices {
            Self::matrices(10.0 * (cascade_index + 1) as f32)
        }

        fn spot_shadow_matrices(&mut self, _: usize) -> ShadowMatrices {
            Self::matrices(0.0)
        }

        fn point_shadow_matrices(&mut self, _: usize, _: CubeFace, fov_bias: f32) -> ShadowMatrices {
            self.point_fov_bias = Some(fov_bias);
            Self::matrices(0.0)
        }
    }

    /// Command buffer that only counts
    #[derive(Default)]
    struct Counting {
        draws: usize,
        viewports: Vec<TileRect>,
        acquired: Vec<(PropertyId, ShadowMapDesc)>,
    }

    impl ShadowCommandBuffer for Counting {
        fn get_temporary_shadow_map(&mut self, id: PropertyId, desc: ShadowMapDesc) {
            self.acquired.push((id, desc));
        }
        fn release_temporary_shadow_map(&mut self, _: PropertyId) {}
        fn set_render_target(&mut self, _: PropertyId) {}
        fn set_viewport(&mut self, rect: TileRect) {
            self.viewports.push(rect);
        }
        fn set_view_projection(&mut self, _: Mat4, _: Mat4) {}
        fn set_depth_bias(&mut self, _: f32, _: f32) {}
        fn draw_shadow_casters(&mut self, _: usize, _: &ShadowSplitData) {
            self.draws += 1;
        }
        fn set_global_int(&mut self, _: PropertyId, _: i32) {}
        fn set_global_float(&mut self, _: PropertyId, _: f32) {}
        fn set_global_vector(&mut self, _: PropertyId, _: Vec4) {}
        fn set_global_vector_array(&mut self, _: PropertyId, _: &[Vec4]) {}
        fn set_global_matrix_array(&mut self, _: PropertyId, _: &[Mat4]) {}
        fn set_keyword(&mut self, _: &'static str, _: bool) {}
    }

    fn shadowed_sun(id: u64) -> VisibleLight {
        VisibleLight::directional(id, [0.0, -1.0, 0.0]).with_shadows(ShadowMode::Soft, 1.0)
    }

    #[test]
    fn test_phase_order_enforced() {
        let mut system = ShadowSystem::new(DeviceConventions::default());
        let mut culling = Identity::default();
        let mut commands = Counting::default();

        let err = system.reserve_directional(&shadowed_sun(1), 0, &culling).unwrap_err();
        assert!(matches!(
            err,
            ShadowError::InvalidPhase { expected: FramePhase::Reserving, found: FramePhase::Idle, .. }
        ));
        assert!(system.render(&mut culling, &mut commands, &mut NoDebugHooks).is_err());
        assert!(system.cleanup(&mut commands).is_err());

        system.begin_frame(&ShadowSettings::default()).unwrap();
        system.render(&mut culling, &mut commands, &mut NoDebugHooks).unwrap();
        assert_eq!(system.phase(), FramePhase::Published);

        // Atlases still held
        assert!(system.begin_frame(&ShadowSettings::default()).is_err());
        assert!(system.reserve_other(&shadowed_sun(1), 0, &culling).is_err());

        system.cleanup(&mut commands).unwrap();
        assert_eq!(system.phase(), FramePhase::Idle);
    }

    #[test]
    fn test_dropped_frame_can_restart() {
        let mut system = ShadowSystem::new(DeviceConventions::default());
        let culling = Identity::default();

        system.begin_frame(&ShadowSettings::default()).unwrap();
        system.reserve_directional(&shadowed_sun(1), 0, &culling).unwrap();
        system.begin_frame(&ShadowSettings::default()).unwrap();

        assert_eq!(system.reservation().directional_count(), 0);
        assert_eq!(system.frame(), 2);
    }

    #[test]
    fn test_cascade_spheres_from_first_light_only() {
        let mut system = ShadowSystem::new(DeviceConventions::default());
        let mut culling = Identity::default();
        let mut commands = Counting::default();

        system.begin_frame(&ShadowSettings::default()).unwrap();
        system.reserve_directional(&shadowed_sun(1), 0, &culling).unwrap();
        system.reserve_directional(&shadowed_sun(2), 1, &culling).unwrap();
        let stats = system.render(&mut culling, &mut commands, &mut NoDebugHooks).unwrap();

        // 2 lights x 4 cascades
        assert_eq!(stats.tiles_rendered, 8);
        assert_eq!(commands.draws, 8);
        assert_eq!(system.renderer().directional_layout().map(|l| l.split), Some(4));

        let cascades = system.renderer().cascades();
        assert_eq!(cascades.count, 4);
        for i in 0..4 {
            let radius = 10.0 * (i + 1) as f32;
            assert!(cascades.culling_spheres[i].w < radius * radius);
            assert!(cascades.culling_spheres[i].w > 0.0);
        }
    }

    #[test]
    fn test_point_fov_bias_positive() {
        let mut system = ShadowSystem::new(DeviceConventions::default());
        let mut culling = Identity::default();
        let mut commands = Counting::default();

        let light = VisibleLight::point(1, [0.0; 3], 4.0).with_shadows(ShadowMode::Hard, 1.0);

        system.begin_frame(&ShadowSettings::default()).unwrap();
        system.reserve_other(&light, 0, &culling).unwrap();
        system.render(&mut culling, &mut commands, &mut NoDebugHooks).unwrap();

        assert!(culling.point_fov_bias.is_some_and(|bias| bias > 0.0));
        assert_eq!(commands.draws, 6);
        assert_eq!(system.renderer().other_layout().map(|l| l.split), Some(4));
    }

    #[test]
    fn test_placeholders_without_lights() {
        let mut system = ShadowSystem::new(DeviceConventions::default());
        let mut culling = Identity::default();
        let mut commands = Counting::default();

        system.begin_frame(&ShadowSettings::default()).unwrap();
        system.render(&mut culling, &mut commands, &mut NoDebugHooks).unwrap();

        assert_eq!(commands.acquired.len(), 2);
        assert!(commands.acquired.iter().all(|(_, desc)| desc.is_placeholder()));
        assert!(commands.viewports.is_empty());
        assert_eq!(system.renderer().atlas_sizes(), Vec4::ONE);
        assert_eq!(system.renderer().frame_data().globals.cascade_count, 0);
    }

    #[test]
    fn test_begin_frame_clamps_settings() {
        let mut system = ShadowSystem::new(DeviceConventions::default());
        let mut culling = Identity::default();
        let mut commands = Counting::default();

        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 5;
        settings.max_distance = 0.0;
        settings.distance_fade = 0.0;
        settings.directional.cascade_fade = 0.0;

        system.begin_frame(&settings).unwrap();
        assert_eq!(system.settings().directional.cascade_count, MAX_CASCADES as u32);
        for id in 1..=4 {
            system.reserve_directional(&shadowed_sun(id), id as usize - 1, &culling).unwrap();
        }
        let stats = system.render(&mut culling, &mut commands, &mut NoDebugHooks).unwrap();

        assert_eq!(stats.tiles_rendered, 16);
        assert_eq!(system.renderer().cascades().count, MAX_CASCADES);

        let globals = system.renderer().frame_data().globals;
        assert_eq!(globals.cascade_count, MAX_CASCADES as i32);
        assert!(globals.distance_fade.iter().all(|v| v.is_finite()));
    }
}
