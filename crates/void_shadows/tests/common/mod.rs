//! Recording collaborators shared by the integration tests

#![allow(dead_code)]

use glam::{Mat4, Vec3, Vec4};
use void_shadows::{
    AtlasKind, CasterBounds, CubeFace, PropertyId, ShadowCommandBuffer, ShadowCulling,
    ShadowDebugHooks, ShadowFrameStats, ShadowMapDesc, ShadowMatrices, ShadowSplitData, TileRect,
};

/// Every call made on the command buffer, in order
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Acquire(PropertyId, ShadowMapDesc),
    Release(PropertyId),
    RenderTarget(PropertyId),
    Viewport(TileRect),
    ViewProjection(Mat4, Mat4),
    DepthBias(f32, f32),
    Draw(usize, ShadowSplitData),
    Int(PropertyId, i32),
    Float(PropertyId, f32),
    Vector(PropertyId, Vec4),
    VectorArray(PropertyId, Vec<Vec4>),
    MatrixArray(PropertyId, Vec<Mat4>),
    Keyword(&'static str, bool),
    BeginSample(&'static str),
    EndSample(&'static str),
    Submit,
}

#[derive(Default)]
pub struct Recorder {
    pub commands: Vec<Command>,
}

impl Recorder {
    pub fn draws(&self) -> Vec<(usize, ShadowSplitData)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw(index, split) => Some((*index, *split)),
                _ => None,
            })
            .collect()
    }

    pub fn acquired(&self) -> Vec<(PropertyId, ShadowMapDesc)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Acquire(id, desc) => Some((*id, *desc)),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<PropertyId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Release(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn viewports(&self) -> Vec<TileRect> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Viewport(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn view_projections(&self) -> Vec<(Mat4, Mat4)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::ViewProjection(view, proj) => Some((*view, *proj)),
                _ => None,
            })
            .collect()
    }

    pub fn last_int(&self, id: PropertyId) -> Option<i32> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::Int(i, value) if *i == id => Some(*value),
            _ => None,
        })
    }

    pub fn last_float(&self, id: PropertyId) -> Option<f32> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::Float(i, value) if *i == id => Some(*value),
            _ => None,
        })
    }

    pub fn last_vector(&self, id: PropertyId) -> Option<Vec4> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::Vector(i, value) if *i == id => Some(*value),
            _ => None,
        })
    }

    pub fn last_vector_array(&self, id: PropertyId) -> Option<Vec<Vec4>> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::VectorArray(i, values) if *i == id => Some(values.clone()),
            _ => None,
        })
    }

    pub fn last_matrix_array(&self, id: PropertyId) -> Option<Vec<Mat4>> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::MatrixArray(i, values) if *i == id => Some(values.clone()),
            _ => None,
        })
    }

    /// Final state of a keyword, `None` if never touched
    pub fn keyword(&self, name: &str) -> Option<bool> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::Keyword(k, enabled) if *k == name => Some(*enabled),
            _ => None,
        })
    }

    pub fn index_of(&self, command: &Command) -> Option<usize> {
        self.commands.iter().position(|c| c == command)
    }
}

impl ShadowCommandBuffer for Recorder {
    fn get_temporary_shadow_map(&mut self, id: PropertyId, desc: ShadowMapDesc) {
        self.commands.push(Command::Acquire(id, desc));
    }

    fn release_temporary_shadow_map(&mut self, id: PropertyId) {
        self.commands.push(Command::Release(id));
    }

    fn set_render_target(&mut self, id: PropertyId) {
        self.commands.push(Command::RenderTarget(id));
    }

    fn set_viewport(&mut self, rect: TileRect) {
        self.commands.push(Command::Viewport(rect));
    }

    fn set_view_projection(&mut self, view: Mat4, proj: Mat4) {
        self.commands.push(Command::ViewProjection(view, proj));
    }

    fn set_depth_bias(&mut self, constant: f32, slope_scale: f32) {
        self.commands.push(Command::DepthBias(constant, slope_scale));
    }

    fn draw_shadow_casters(&mut self, visible_light_index: usize, split: &ShadowSplitData) {
        self.commands.push(Command::Draw(visible_light_index, *split));
    }

    fn set_global_int(&mut self, id: PropertyId, value: i32) {
        self.commands.push(Command::Int(id, value));
    }

    fn set_global_float(&mut self, id: PropertyId, value: f32) {
        self.commands.push(Command::Float(id, value));
    }

    fn set_global_vector(&mut self, id: PropertyId, value: Vec4) {
        self.commands.push(Command::Vector(id, value));
    }

    fn set_global_vector_array(&mut self, id: PropertyId, values: &[Vec4]) {
        self.commands.push(Command::VectorArray(id, values.to_vec()));
    }

    fn set_global_matrix_array(&mut self, id: PropertyId, values: &[Mat4]) {
        self.commands.push(Command::MatrixArray(id, values.to_vec()));
    }

    fn set_keyword(&mut self, keyword: &'static str, enabled: bool) {
        self.commands.push(Command::Keyword(keyword, enabled));
    }

    fn begin_sample(&mut self, name: &'static str) {
        self.commands.push(Command::BeginSample(name));
    }

    fn end_sample(&mut self, name: &'static str) {
        self.commands.push(Command::EndSample(name));
    }

    fn submit(&mut self) {
        self.commands.push(Command::Submit);
    }
}

/// A directional cascade request seen by the culling mock
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeRequest {
    pub visible_light_index: usize,
    pub cascade_index: usize,
    pub cascade_count: usize,
    pub split_ratios: [f32; 3],
    pub tile_size: u32,
    pub near_plane_offset: f32,
}

/// Culling mock with simple light-space matrices
#[derive(Default)]
pub struct MockCulling {
    /// Visible-light indices reporting no casters
    pub without_casters: Vec<usize>,
    pub cascade_requests: Vec<CascadeRequest>,
    pub spot_requests: Vec<usize>,
    pub face_requests: Vec<(usize, CubeFace, f32)>,
}

impl MockCulling {
    pub fn cascade_radius(cascade_index: usize) -> f32 {
        5.0 * (cascade_index + 1) as f32
    }

    fn face_view(face: CubeFace) -> Mat4 {
        let (forward, up) = match face {
            CubeFace::PositiveX => (Vec3::X, Vec3::NEG_Y),
            CubeFace::NegativeX => (Vec3::NEG_X, Vec3::NEG_Y),
            CubeFace::PositiveY => (Vec3::Y, Vec3::Z),
            CubeFace::NegativeY => (Vec3::NEG_Y, Vec3::NEG_Z),
            CubeFace::PositiveZ => (Vec3::Z, Vec3::NEG_Y),
            CubeFace::NegativeZ => (Vec3::NEG_Z, Vec3::NEG_Y),
        };
        Mat4::look_to_rh(Vec3::new(1.0, 2.0, 3.0), forward, up)
    }
}

impl ShadowCulling for MockCulling {
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<CasterBounds> {
        if self.without_casters.contains(&visible_light_index) {
            None
        } else {
            Some(CasterBounds {
                center: Vec3::ZERO,
                extents: Vec3::splat(10.0),
            })
        }
    }

    fn directional_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        cascade_index: usize,
        cascade_count: usize,
        split_ratios: [f32; 3],
        tile_size: u32,
        near_plane_offset: f32,
    ) -> ShadowMatrices {
        self.cascade_requests.push(CascadeRequest {
            visible_light_index,
            cascade_index,
            cascade_count,
            split_ratios,
            tile_size,
            near_plane_offset,
        });

        let radius = Self::cascade_radius(cascade_index);
        ShadowMatrices {
            view: Mat4::look_to_rh(Vec3::new(0.0, 50.0, 0.0), Vec3::NEG_Y, Vec3::Z),
            proj: Mat4::orthographic_rh_gl(-radius, radius, -radius, radius, 0.1, 100.0),
            split: ShadowSplitData {
                culling_sphere: Vec4::new(0.0, 0.0, radius, radius),
                cascade_blend_culling_factor: 0.0,
            },
        }
    }

    fn spot_shadow_matrices(&mut self, visible_light_index: usize) -> ShadowMatrices {
        self.spot_requests.push(visible_light_index);
        ShadowMatrices {
            view: Mat4::look_to_rh(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, Vec3::Z),
            proj: Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 20.0),
            split: ShadowSplitData::default(),
        }
    }

    fn point_shadow_matrices(
        &mut self,
        visible_light_index: usize,
        face: CubeFace,
        fov_bias: f32,
    ) -> ShadowMatrices {
        self.face_requests.push((visible_light_index, face, fov_bias));
        ShadowMatrices {
            view: Self::face_view(face),
            proj: Mat4::perspective_rh_gl((90.0 + fov_bias).to_radians(), 1.0, 0.1, 10.0),
            split: ShadowSplitData::default(),
        }
    }
}

/// Debug hooks that remember what they were told
#[derive(Default)]
pub struct RecordingHooks {
    pub tiles: Vec<(AtlasKind, usize, TileRect)>,
    pub published: Vec<ShadowFrameStats>,
}

impl ShadowDebugHooks for RecordingHooks {
    fn tile_rendered(&mut self, atlas: AtlasKind, tile_index: usize, rect: TileRect) {
        self.tiles.push((atlas, tile_index, rect));
    }

    fn frame_published(&mut self, stats: &ShadowFrameStats) {
        self.published.push(*stats);
    }
}

/// Install a logger once; output shows with `RUST_LOG=debug`
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
