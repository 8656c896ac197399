//! Visible light descriptions
//!
//! Lights are owned by the scene and culling systems. The shadow system only
//! sees the per-frame visible-light list and refers to entries by their index
//! in that list.

use glam::{Vec3, Vec4};
use serde::{Serialize, Deserialize};

/// Unique identifier for a light (entity ID or similar)
pub type LightId = u64;

/// Light type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Spot,
    Point,
}

impl LightKind {
    /// Number of other-light atlas slots a shadowed light of this kind takes
    pub fn slot_count(self) -> usize {
        match self {
            Self::Directional => 0,
            Self::Spot => 1,
            Self::Point => 6,
        }
    }
}

/// Realtime shadow mode of a light
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMode {
    #[default]
    None,
    Hard,
    Soft,
}

/// How a light is baked into lightmaps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BakeType {
    #[default]
    Realtime,
    Baked,
    Mixed,
}

/// Mixed lighting output for lights with `BakeType::Mixed`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixedLightingMode {
    #[default]
    IndirectOnly,
    Shadowmask,
    Subtractive,
}

/// Result of light baking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightBakeOutput {
    pub bake_type: BakeType,
    pub mixed_mode: MixedLightingMode,
    /// Shadow mask channel holding this light's baked occlusion (-1 = none)
    pub occlusion_mask_channel: i32,
}

impl Default for LightBakeOutput {
    fn default() -> Self {
        Self {
            bake_type: BakeType::Realtime,
            mixed_mode: MixedLightingMode::IndirectOnly,
            occlusion_mask_channel: -1,
        }
    }
}

impl LightBakeOutput {
    /// Baked shadow mask for a mixed light
    pub fn shadowmask(channel: i32) -> Self {
        Self {
            bake_type: BakeType::Mixed,
            mixed_mode: MixedLightingMode::Shadowmask,
            occlusion_mask_channel: channel,
        }
    }

    /// Shadow mask channel if this light writes to the baked shadow mask
    pub fn shadow_mask_channel(&self) -> Option<i32> {
        (self.bake_type == BakeType::Mixed && self.mixed_mode == MixedLightingMode::Shadowmask)
            .then_some(self.occlusion_mask_channel)
    }
}

/// A light that survived visibility culling this frame
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisibleLight {
    /// Light entity that owns this entry
    pub id: LightId,

    pub kind: LightKind,

    /// Final color (linear RGB, intensity applied)
    pub color: [f32; 3],

    /// World position (ignored for directional lights)
    pub position: [f32; 3],

    /// Direction the light travels (normalized)
    pub direction: [f32; 3],

    /// Range for spot and point lights
    pub range: f32,

    /// Spot cone angles in degrees (inner, outer)
    pub spot_angles: [f32; 2],

    pub shadows: ShadowMode,

    /// Shadow strength (0 = no shadow, 1 = full shadow)
    pub shadow_strength: f32,

    /// Slope-scaled depth bias
    pub shadow_bias: f32,

    /// Normal-based offset to prevent acne
    pub shadow_normal_bias: f32,

    /// Near plane offset for the shadow camera
    pub shadow_near_plane: f32,

    pub bake: LightBakeOutput,
}

impl Default for VisibleLight {
    fn default() -> Self {
        Self {
            id: 0,
            kind: LightKind::Directional,
            color: [1.0; 3],
            position: [0.0; 3],
            direction: [0.0, -1.0, 0.0],
            range: 10.0,
            spot_angles: [21.8, 30.0],
            shadows: ShadowMode::None,
            shadow_strength: 1.0,
            shadow_bias: 0.05,
            shadow_normal_bias: 0.4,
            shadow_near_plane: 0.2,
            bake: LightBakeOutput::default(),
        }
    }
}

impl VisibleLight {
    /// Create a directional light
    pub fn directional(id: LightId, direction: [f32; 3]) -> Self {
        Self {
            id,
            kind: LightKind::Directional,
            direction,
            ..Default::default()
        }
    }

    /// Create a spot light
    pub fn spot(id: LightId, position: [f32; 3], direction: [f32; 3], range: f32) -> Self {
        Self {
            id,
            kind: LightKind::Spot,
            position,
            direction,
            range,
            ..Default::default()
        }
    }

    /// Create a point light
    pub fn point(id: LightId, position: [f32; 3], range: f32) -> Self {
        Self {
            id,
            kind: LightKind::Point,
            position,
            range,
            ..Default::default()
        }
    }

    /// Enable shadows with the given strength
    pub fn with_shadows(mut self, mode: ShadowMode, strength: f32) -> Self {
        self.shadows = mode;
        self.shadow_strength = strength;
        self
    }

    /// Set bake output
    pub fn with_bake(mut self, bake: LightBakeOutput) -> Self {
        self.bake = bake;
        self
    }

    /// Whether this light wants realtime shadows at all
    pub fn casts_shadows(&self) -> bool {
        self.shadows != ShadowMode::None && self.shadow_strength > 0.0
    }

    pub fn is_point(&self) -> bool {
        self.kind == LightKind::Point
    }

    /// Color as a GPU vector
    pub fn color_vec4(&self) -> Vec4 {
        Vec3::from(self.color).extend(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_counts() {
        assert_eq!(LightKind::Spot.slot_count(), 1);
        assert_eq!(LightKind::Point.slot_count(), 6);
    }

    #[test]
    fn test_casts_shadows() {
        let light = VisibleLight::directional(1, [0.0, -1.0, 0.0]);
        assert!(!light.casts_shadows());

        let light = light.with_shadows(ShadowMode::Soft, 0.0);
        assert!(!light.casts_shadows());

        let light = light.with_shadows(ShadowMode::Hard, 0.7);
        assert!(light.casts_shadows());
    }

    #[test]
    fn test_shadow_mask_channel() {
        assert_eq!(LightBakeOutput::default().shadow_mask_channel(), None);
        assert_eq!(LightBakeOutput::shadowmask(2).shadow_mask_channel(), Some(2));

        let subtractive = LightBakeOutput {
            bake_type: BakeType::Mixed,
            mixed_mode: MixedLightingMode::Subtractive,
            occlusion_mask_channel: 1,
        };
        assert_eq!(subtractive.shadow_mask_channel(), None);
    }
}
