//! Lighting Setup
//!
//! Walks the frame's visible-light list in order, packs the lights the shading
//! pass can handle into fixed arrays and asks the shadow system for each
//! light's shadow parameters along the way. This is the consumer of the
//! reservation vectors; it must run between `begin_frame` and `render`.
//!
//! # Light Limits
//!
//! - Directional lights: 4
//! - Spot and point lights: 64
//!
//! Lights beyond the limits are skipped entirely (no lighting, no shadows).

use glam::{Vec3, Vec4};
use serde::{Serialize, Deserialize};

use crate::collaborators::{ShadowCommandBuffer, ShadowCulling};
use crate::error::Result;
use crate::light::{LightKind, VisibleLight};
use crate::properties::{HashedPropertyResolver, PropertyId, PropertyResolver};
use crate::renderer::ShadowSystem;

/// Maximum directional lights
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
/// Maximum spot and point lights
pub const MAX_OTHER_LIGHTS: usize = 64;

/// GPU-ready directional light data
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuDirectionalLight {
    /// Linear RGB color, w unused
    pub color: [f32; 4],
    /// Direction towards the light, w unused
    pub direction: [f32; 4],
    /// Reservation vector
    pub shadow: [f32; 4],
}

/// GPU-ready spot or point light data
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuOtherLight {
    /// Linear RGB color, w unused
    pub color: [f32; 4],
    /// World position, w = 1 / range²
    pub position: [f32; 4],
    /// Direction towards the light (spot only), w unused
    pub direction: [f32; 4],
    /// Spot attenuation (scale, offset); (0, 1) for point lights
    pub spot_angle: [f32; 4],
    /// Reservation vector
    pub shadow: [f32; 4],
}

/// Spot cone attenuation as `saturate(d * x + y)` where `d = dot(spot dir, light dir)`
pub fn spot_angle_attenuation(inner_degrees: f32, outer_degrees: f32) -> [f32; 2] {
    let inner_cos = (0.5 * inner_degrees).to_radians().cos();
    let outer_cos = (0.5 * outer_degrees).to_radians().cos();
    let angle_range_inv = 1.0 / (inner_cos - outer_cos).max(0.001);
    [angle_range_inv, -outer_cos * angle_range_inv]
}

fn inverse_range_sq(range: f32) -> f32 {
    1.0 / (range * range).max(0.00001)
}

/// Per-field vector arrays for directional lights, as the shading pass reads them
#[derive(Clone, Copy, Debug)]
struct DirectionalColumns {
    colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    shadow_data: [Vec4; MAX_DIRECTIONAL_LIGHTS],
}

impl DirectionalColumns {
    const EMPTY: Self = Self {
        colors: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
        directions: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
        shadow_data: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
    };

    fn write(&mut self, index: usize, light: &GpuDirectionalLight) {
        self.colors[index] = Vec4::from_array(light.color);
        self.directions[index] = Vec4::from_array(light.direction);
        self.shadow_data[index] = Vec4::from_array(light.shadow);
    }
}

/// Per-field vector arrays for spot and point lights
#[derive(Clone, Copy, Debug)]
struct OtherColumns {
    colors: [Vec4; MAX_OTHER_LIGHTS],
    positions: [Vec4; MAX_OTHER_LIGHTS],
    directions: [Vec4; MAX_OTHER_LIGHTS],
    spot_angles: [Vec4; MAX_OTHER_LIGHTS],
    shadow_data: [Vec4; MAX_OTHER_LIGHTS],
}

impl OtherColumns {
    const EMPTY: Self = Self {
        colors: [Vec4::ZERO; MAX_OTHER_LIGHTS],
        positions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
        directions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
        spot_angles: [Vec4::ZERO; MAX_OTHER_LIGHTS],
        shadow_data: [Vec4::ZERO; MAX_OTHER_LIGHTS],
    };

    fn write(&mut self, index: usize, light: &GpuOtherLight) {
        self.colors[index] = Vec4::from_array(light.color);
        self.positions[index] = Vec4::from_array(light.position);
        self.directions[index] = Vec4::from_array(light.direction);
        self.spot_angles[index] = Vec4::from_array(light.spot_angle);
        self.shadow_data[index] = Vec4::from_array(light.shadow);
    }
}

/// Global property handles for light arrays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightingPropertyIds {
    pub directional_count: PropertyId,
    pub directional_colors: PropertyId,
    pub directional_directions: PropertyId,
    pub directional_shadow_data: PropertyId,
    pub other_count: PropertyId,
    pub other_colors: PropertyId,
    pub other_positions: PropertyId,
    pub other_directions: PropertyId,
    pub other_spot_angles: PropertyId,
    pub other_shadow_data: PropertyId,
}

impl LightingPropertyIds {
    /// Resolve all handles once
    pub fn resolve(resolver: &impl PropertyResolver) -> Self {
        Self {
            directional_count: resolver.resolve("_DirectionalLightCount"),
            directional_colors: resolver.resolve("_DirectionalLightColors"),
            directional_directions: resolver.resolve("_DirectionalLightDirections"),
            directional_shadow_data: resolver.resolve("_DirectionalLightShadowData"),
            other_count: resolver.resolve("_OtherLightCount"),
            other_colors: resolver.resolve("_OtherLightColors"),
            other_positions: resolver.resolve("_OtherLightPositions"),
            other_directions: resolver.resolve("_OtherLightDirections"),
            other_spot_angles: resolver.resolve("_OtherLightSpotAngles"),
            other_shadow_data: resolver.resolve("_OtherLightShadowData"),
        }
    }
}

impl Default for LightingPropertyIds {
    fn default() -> Self {
        Self::resolve(&HashedPropertyResolver)
    }
}

/// Per-frame light arrays for the shading pass
pub struct LightingSetup {
    ids: LightingPropertyIds,

    directional: [GpuDirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    directional_columns: DirectionalColumns,
    directional_count: usize,

    other: [GpuOtherLight; MAX_OTHER_LIGHTS],
    other_columns: OtherColumns,
    other_count: usize,

    /// Lights dropped for exceeding the limits
    skipped: usize,
}

impl Default for LightingSetup {
    fn default() -> Self {
        Self::new(LightingPropertyIds::default())
    }
}

impl LightingSetup {
    pub fn new(ids: LightingPropertyIds) -> Self {
        Self {
            ids,
            directional: [GpuDirectionalLight::default(); MAX_DIRECTIONAL_LIGHTS],
            directional_columns: DirectionalColumns::EMPTY,
            directional_count: 0,
            other: [GpuOtherLight::default(); MAX_OTHER_LIGHTS],
            other_columns: OtherColumns::EMPTY,
            other_count: 0,
            skipped: 0,
        }
    }

    /// Pack the visible lights and reserve their shadows
    ///
    /// `shadows` must be in the reserving phase.
    pub fn setup(
        &mut self,
        lights: &[VisibleLight],
        shadows: &mut ShadowSystem,
        culling: &impl ShadowCulling,
    ) -> Result<()> {
        self.directional_count = 0;
        self.other_count = 0;
        self.skipped = 0;

        for (index, light) in lights.iter().enumerate() {
            match light.kind {
                LightKind::Directional if self.directional_count < MAX_DIRECTIONAL_LIGHTS => {
                    let shadow = shadows.reserve_directional(light, index, culling)?;
                    let packed = GpuDirectionalLight {
                        color: light.color_vec4().to_array(),
                        direction: (-Vec3::from(light.direction)).extend(0.0).to_array(),
                        shadow: shadow.to_vec4().to_array(),
                    };
                    self.directional_columns.write(self.directional_count, &packed);
                    self.directional[self.directional_count] = packed;
                    self.directional_count += 1;
                }
                LightKind::Spot | LightKind::Point if self.other_count < MAX_OTHER_LIGHTS => {
                    let shadow = shadows.reserve_other(light, index, culling)?;
                    let packed = Self::other_light(light, shadow.to_vec4());
                    self.other_columns.write(self.other_count, &packed);
                    self.other[self.other_count] = packed;
                    self.other_count += 1;
                }
                _ => self.skipped += 1,
            }
        }

        if self.skipped > 0 {
            log::warn!("{} lights over the shading limits were skipped", self.skipped);
        }
        log::debug!(
            "Lighting setup: {} directional, {} other lights",
            self.directional_count,
            self.other_count
        );

        Ok(())
    }

    fn other_light(light: &VisibleLight, shadow: Vec4) -> GpuOtherLight {
        let position = Vec3::from(light.position).extend(inverse_range_sq(light.range));

        let (direction, spot_angle) = match light.kind {
            LightKind::Spot => {
                let [scale, offset] = spot_angle_attenuation(light.spot_angles[0], light.spot_angles[1]);
                (
                    (-Vec3::from(light.direction)).extend(0.0),
                    Vec4::new(scale, offset, 0.0, 0.0),
                )
            }
            _ => (Vec4::ZERO, Vec4::new(0.0, 1.0, 0.0, 0.0)),
        };

        GpuOtherLight {
            color: light.color_vec4().to_array(),
            position: position.to_array(),
            direction: direction.to_array(),
            spot_angle: spot_angle.to_array(),
            shadow: shadow.to_array(),
        }
    }

    /// Publish light counts and arrays
    pub fn publish(&self, commands: &mut impl ShadowCommandBuffer) {
        let count = self.directional_count;
        commands.set_global_int(self.ids.directional_count, count as i32);
        if count > 0 {
            let columns = &self.directional_columns;
            commands.set_global_vector_array(self.ids.directional_colors, &columns.colors[..count]);
            commands.set_global_vector_array(self.ids.directional_directions, &columns.directions[..count]);
            commands.set_global_vector_array(self.ids.directional_shadow_data, &columns.shadow_data[..count]);
        }

        let count = self.other_count;
        commands.set_global_int(self.ids.other_count, count as i32);
        if count > 0 {
            let columns = &self.other_columns;
            commands.set_global_vector_array(self.ids.other_colors, &columns.colors[..count]);
            commands.set_global_vector_array(self.ids.other_positions, &columns.positions[..count]);
            commands.set_global_vector_array(self.ids.other_directions, &columns.directions[..count]);
            commands.set_global_vector_array(self.ids.other_spot_angles, &columns.spot_angles[..count]);
            commands.set_global_vector_array(self.ids.other_shadow_data, &columns.shadow_data[..count]);
        }
    }

    pub fn directional_lights(&self) -> &[GpuDirectionalLight] {
        &self.directional[..self.directional_count]
    }

    pub fn other_lights(&self) -> &[GpuOtherLight] {
        &self.other[..self.other_count]
    }

    /// Get directional light data as bytes
    pub fn directional_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.directional_lights())
    }

    /// Get spot and point light data as bytes
    pub fn other_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.other_lights())
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped
    }
}
